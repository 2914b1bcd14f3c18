//! Telegram channel adapter
//!
//! Long-polls `getUpdates` for incoming messages and sends plain text replies
//! through the Bot API.

mod api;
pub mod chunking;
pub mod dedup;
pub mod polling;
pub mod types;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc;

use super::{Channel, IncomingMessage, OutgoingMessage};
use crate::{Error, Result};

pub use dedup::UpdateDedup;
pub use types::{BotCommand, BotUser};

/// Incoming message queue depth
const MESSAGE_QUEUE_SIZE: usize = 100;

/// Telegram channel adapter
#[derive(Clone)]
pub struct TelegramChannel {
    token: String,
    api_base: String,
    client: Client,
    message_tx: Option<mpsc::Sender<IncomingMessage>>,
    connected: bool,
    bot_username: Option<String>,
}

impl TelegramChannel {
    /// Create a new Telegram channel adapter
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token,
            api_base: types::API_BASE.to_string(),
            client: Client::new(),
            message_tx: None,
            connected: false,
            bot_username: None,
        }
    }

    /// Create with a message receiver for polling mode
    ///
    /// Returns the channel and a receiver for incoming messages
    #[must_use]
    pub fn with_receiver(token: String) -> (Self, mpsc::Receiver<IncomingMessage>) {
        let (tx, rx) = mpsc::channel(MESSAGE_QUEUE_SIZE);
        let mut channel = Self::new(token);
        channel.message_tx = Some(tx);
        (channel, rx)
    }

    /// Send Bot API calls to `api_base` (everything before the token)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Username reported by `getMe`, once connected
    #[must_use]
    pub fn bot_username(&self) -> Option<&str> {
        self.bot_username.as_deref()
    }
}

fn parse_chat_id(channel_id: &str) -> Result<i64> {
    channel_id
        .parse()
        .map_err(|_| Error::Channel(format!("Invalid chat ID: {channel_id}")))
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn connect(&mut self) -> Result<()> {
        let me = self.get_me().await?;
        tracing::info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or(&me.first_name),
            "Telegram channel connected"
        );
        self.bot_username = me.username;
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        tracing::info!("Telegram channel disconnected");
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        let chat_id = parse_chat_id(&message.channel_id)?;
        self.send_message(chat_id, &message.content).await
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send_typing(&self, channel_id: &str) -> Result<()> {
        let chat_id = parse_chat_id(channel_id)?;
        self.send_chat_action(chat_id, "typing").await?;
        tracing::debug!(chat_id, "Telegram typing indicator sent");
        Ok(())
    }
}
