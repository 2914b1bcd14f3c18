//! Per-message handling
//!
//! Commands are answered directly; any other text goes through the
//! conversation manager. Nothing here propagates errors: delivery and log
//! failures are reported through `tracing` and the next message is unaffected.

use std::sync::Arc;

use chrono::Utc;

use crate::channels::{Channel, IncomingMessage, OutgoingMessage};
use crate::chat_log::ChatLog;
use crate::commands::{self, Command};
use crate::conversation::ConversationManager;

/// Best-effort apology after a failed delivery
pub const SEND_FAILURE_REPLY: &str = "Sorry, something went wrong! 😅";

/// Routes incoming messages to commands or reply generation
pub struct MessageHandler {
    conversations: Arc<ConversationManager>,
    chat_log: ChatLog,
}

impl MessageHandler {
    #[must_use]
    pub const fn new(conversations: Arc<ConversationManager>, chat_log: ChatLog) -> Self {
        Self {
            conversations,
            chat_log,
        }
    }

    /// Handle one incoming message end to end
    pub async fn handle(&self, channel: &dyn Channel, msg: IncomingMessage) {
        if msg.is_command {
            if let Some(command) = Command::parse(&msg.content) {
                self.handle_command(channel, &msg, command).await;
            }
            return;
        }

        self.handle_text(channel, &msg).await;
    }

    async fn handle_command(&self, channel: &dyn Channel, msg: &IncomingMessage, command: Command) {
        let chat_id = msg.channel_id.as_str();
        tracing::info!(chat_id, command = ?command, "command received");

        let reply = match command {
            Command::Start => {
                self.conversations.reset(chat_id);
                commands::start_reply(&msg.sender_name)
            }
            Command::Clear => {
                self.conversations.reset(chat_id);
                commands::CLEARED_REPLY.to_string()
            }
            Command::Logs => {
                match self
                    .chat_log
                    .recent(commands::LOGS_LINES, commands::LOGS_MAX_CHARS)
                {
                    Ok(recent) => commands::logs_reply(&recent),
                    Err(e) => {
                        tracing::error!(chat_id, error = %e, "failed to read chat log");
                        commands::LOGS_ERROR_REPLY.to_string()
                    }
                }
            }
            Command::Stats => match self.chat_log.stats(Utc::now().date_naive()) {
                Ok(stats) => commands::stats_reply(stats, self.conversations.active_sessions()),
                Err(e) => {
                    tracing::error!(chat_id, error = %e, "failed to read chat log stats");
                    commands::STATS_ERROR_REPLY.to_string()
                }
            },
            Command::Help => commands::HELP_REPLY.to_string(),
            Command::Unknown(name) => {
                tracing::debug!(chat_id, command = %name, "ignoring unknown command");
                return;
            }
        };

        if let Err(e) = channel.send(OutgoingMessage::text(chat_id, reply)).await {
            tracing::error!(chat_id, error = %e, "failed to send command reply");
        }
    }

    async fn handle_text(&self, channel: &dyn Channel, msg: &IncomingMessage) {
        let chat_id = msg.channel_id.as_str();
        tracing::info!(
            chat_id,
            sender = %msg.sender_name,
            chars = msg.content.chars().count(),
            "message received"
        );

        if let Err(e) = channel.send_typing(chat_id).await {
            tracing::warn!(chat_id, error = %e, "failed to send typing indicator");
        }

        let reply = self
            .conversations
            .generate_reply(chat_id, &msg.content)
            .await;

        let logged_reply = match channel
            .send(OutgoingMessage::text(chat_id, reply.text.clone()))
            .await
        {
            Ok(()) => {
                tracing::info!(chat_id, fallback = reply.is_fallback(), "reply sent");
                reply.text
            }
            Err(e) => {
                tracing::error!(chat_id, error = %e, "failed to send reply");
                if let Err(apology_err) = channel
                    .send(OutgoingMessage::text(chat_id, SEND_FAILURE_REPLY))
                    .await
                {
                    tracing::warn!(chat_id, error = %apology_err, "failed to send apology");
                }
                format!("[ERROR: {e}]")
            }
        };

        if let Err(e) = self
            .chat_log
            .append_exchange(&msg.sender_name, &msg.content, &logged_reply)
        {
            tracing::warn!(chat_id, error = %e, "failed to write chat log");
        }
    }
}
