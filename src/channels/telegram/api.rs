//! Raw Telegram Bot API calls

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::chunking::{DEFAULT_LIMIT, split_message};
use super::types::{
    BotCommand, BotUser, GetUpdatesRequest, SendChatActionRequest, SendMessageRequest,
    SetMyCommandsRequest, TelegramResponse, Update,
};
use crate::{Error, Result};

/// Long-poll timeout passed to getUpdates, in seconds
pub(crate) const LONG_POLL_TIMEOUT_SECS: u64 = 30;

impl super::TelegramChannel {
    pub(crate) fn method_url(&self, method: &str) -> String {
        format!("{}{}/{method}", self.api_base, self.token)
    }

    /// POST `body` to `method` and unwrap the `result` field
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Telegram {method} error: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Channel(format!("Telegram {method} response read error: {e}")))?;

        let parsed: TelegramResponse<T> = serde_json::from_str(&text).map_err(|e| {
            Error::Channel(format!("Telegram {method} error: {status} - {e}: {text}"))
        })?;

        match parsed {
            TelegramResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            TelegramResponse { description, .. } => Err(Error::TelegramApi {
                method: method.to_string(),
                status: status.as_u16(),
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }

    /// Send plain text to a chat, split into several messages when too long
    ///
    /// # Errors
    ///
    /// Returns error if any chunk is rejected; earlier chunks stay delivered
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let chunks = split_message(text, DEFAULT_LIMIT);
        for chunk in &chunks {
            let request = SendMessageRequest {
                chat_id,
                text: chunk,
            };
            let _: serde_json::Value = self.call("sendMessage", &request).await?;
        }

        tracing::debug!(chat_id, chunks = chunks.len(), "Telegram message sent");
        Ok(())
    }

    /// Send a chat action (typing indicator, etc.)
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<()> {
        let request = SendChatActionRequest { chat_id, action };
        let _: bool = self.call("sendChatAction", &request).await?;
        Ok(())
    }

    /// Sync bot commands with Telegram via `setMyCommands`
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn sync_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let request = SetMyCommandsRequest { commands };
        let _: bool = self.call("setMyCommands", &request).await?;

        tracing::info!(count = commands.len(), "Telegram bot commands synced");
        Ok(())
    }

    /// Validate the bot token by calling `getMe`
    ///
    /// # Errors
    ///
    /// Returns [`Error::TelegramApi`] if Telegram rejects the token, or a
    /// channel error if the API cannot be reached
    pub async fn get_me(&self) -> Result<BotUser> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Remove any webhook so `getUpdates` is allowed
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", &serde_json::json!({})).await?;
        Ok(())
    }

    /// Fetch updates after `offset`, waiting up to the long-poll timeout
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub(crate) async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: LONG_POLL_TIMEOUT_SECS,
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &request).await
    }
}
