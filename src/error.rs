//! Error types for Yomi

use thiserror::Error;

/// Result type alias for Yomi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Yomi
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credentials, bad values)
    #[error("configuration error: {0}")]
    Config(String),

    /// Channel error
    #[error("channel error: {0}")]
    Channel(String),

    /// Telegram answered a Bot API call with `ok: false`
    #[error("Telegram {method} error: {status} - {description}")]
    TelegramApi {
        /// Bot API method that was called
        method: String,
        /// HTTP status of the reply
        status: u16,
        /// Telegram's description of the failure
        description: String,
    },

    /// Generation service error
    #[error("generation error: {0}")]
    Generation(#[from] crate::generation::GenerationError),

    /// Persona artifact error
    #[error("persona error: {0}")]
    Persona(String),

    /// Transcript produced no usable messages
    #[error("no messages from {speaker} found in transcript")]
    NoMessages {
        /// Speaker label that was searched for
        speaker: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Atomic file publish failed
    #[error("failed to publish file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl Error {
    /// Whether Telegram refused the bot token itself
    ///
    /// Telegram answers 401 for a revoked or wrong token and 404 for one that
    /// is malformed.
    #[must_use]
    pub const fn is_token_rejection(&self) -> bool {
        matches!(self, Self::TelegramApi { status: 401 | 404, .. })
    }
}
