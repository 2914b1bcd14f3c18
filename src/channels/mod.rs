//! Messaging channel adapters
//!
//! A channel delivers incoming chat messages and sends text replies.

pub mod telegram;

use async_trait::async_trait;

pub use telegram::TelegramChannel;

use crate::Result;

/// Display name used when the platform gives none
pub const DEFAULT_SENDER_NAME: &str = "there";

/// An incoming message from a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Message identifier (platform-specific)
    pub id: String,

    /// Chat identifier, also the session id
    pub channel_id: String,

    /// Sender identifier
    pub sender_id: String,

    /// Sender display name
    pub sender_name: String,

    /// Message text
    pub content: String,

    /// Whether the text starts with `/`
    pub is_command: bool,
}

impl IncomingMessage {
    /// Build a message, deriving `is_command` from the text
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        sender_id: impl Into<String>,
        sender_name: Option<&str>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let sender_name = sender_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SENDER_NAME)
            .to_string();

        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            sender_id: sender_id.into(),
            sender_name,
            is_command: content.starts_with('/'),
            content,
        }
    }
}

/// A message to send to a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Chat identifier
    pub channel_id: String,

    /// Plain text content
    pub content: String,
}

impl OutgoingMessage {
    /// Create a simple `text` message
    #[must_use]
    pub fn text(channel_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            content: content.into(),
        }
    }
}

/// Trait for messaging channel adapters
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &'static str;

    /// Connect to the channel
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from the channel
    async fn disconnect(&mut self) -> Result<()>;

    /// Send a message
    async fn send(&self, message: OutgoingMessage) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send typing indicator to show the bot is processing
    ///
    /// Default implementation is a no-op for channels that don't support typing
    async fn send_typing(&self, _channel_id: &str) -> Result<()> {
        Ok(())
    }
}
