//! Telegram polling mode: getUpdates loop and message conversion

use std::time::Duration;

use tokio::sync::mpsc;

use super::dedup::UpdateDedup;
use super::types::Update;
use crate::channels::IncomingMessage;
use crate::{Error, Result};

impl super::TelegramChannel {
    /// Spawn a background task that long-polls Telegram's getUpdates API
    ///
    /// Received text messages are forwarded into the receiver returned by
    /// [`with_receiver`](super::TelegramChannel::with_receiver). The task ends
    /// when that receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the channel was built without a receiver
    pub fn start_polling(&self, interval: Duration) -> Result<tokio::task::JoinHandle<()>> {
        let tx = self.message_tx.clone().ok_or_else(|| {
            Error::Channel("polling requires a message receiver (use with_receiver)".to_string())
        })?;
        let channel = self.clone();

        Ok(tokio::spawn(async move {
            polling_loop(channel, tx, interval).await;
        }))
    }
}

/// Run the polling loop (background task)
async fn polling_loop(
    channel: super::TelegramChannel,
    tx: mpsc::Sender<IncomingMessage>,
    interval: Duration,
) {
    if let Err(e) = channel.delete_webhook().await {
        tracing::warn!(error = %e, "failed to delete Telegram webhook before polling");
    }

    let mut offset: Option<i64> = None;
    let mut dedup = UpdateDedup::default();

    tracing::info!(interval_ms = interval.as_millis(), "Telegram polling started");

    loop {
        match channel.get_updates(offset).await {
            Ok(updates) => {
                for update in &updates {
                    offset = Some(update.update_id + 1);

                    if dedup.is_duplicate(update.update_id) {
                        continue;
                    }

                    if let Some(msg) = update_to_incoming(update)
                        && tx.send(msg).await.is_err()
                    {
                        tracing::info!("message receiver closed, stopping Telegram polling");
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Telegram getUpdates error");
            }
        }

        if tx.is_closed() {
            tracing::info!("message receiver closed, stopping Telegram polling");
            return;
        }

        tokio::time::sleep(interval).await;
    }
}

/// Convert a polling update into an `IncomingMessage`
///
/// Only text messages from human senders are kept.
fn update_to_incoming(update: &Update) -> Option<IncomingMessage> {
    let msg = update.message.as_ref()?;

    if msg.from.as_ref().is_some_and(|u| u.is_bot) {
        return None;
    }

    let text = msg.text.as_deref().filter(|t| !t.trim().is_empty())?;

    let sender_id = msg
        .from
        .as_ref()
        .map_or_else(|| msg.chat.id.to_string(), |u| u.id.to_string());
    let sender_name = msg.from.as_ref().and_then(|u| u.first_name.as_deref());

    Some(IncomingMessage::new(
        msg.message_id.to_string(),
        msg.chat.id.to_string(),
        sender_id,
        sender_name,
        text,
    ))
}
