//! Text generation collaborators
//!
//! A `Generator` turns a persona prompt, prior conversation turns and a new
//! input into a reply. Failures carry a typed kind so callers can pick a
//! matching fallback without inspecting message text.

mod gemini;

use std::fmt;

use async_trait::async_trait;

pub use gemini::{DEFAULT_MODEL, GeminiGenerator};

/// Speaker of a context turn as the generation service sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRole {
    User,
    Model,
}

impl ContextRole {
    /// Wire name used by the generation API
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One prior turn passed to the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextTurn {
    pub role: ContextRole,
    pub text: String,
}

/// Everything the generator needs for one reply
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Persona prompt
    pub system_instruction: String,

    /// Prior turns, oldest first, without the pinned pair
    pub context: Vec<ContextTurn>,

    /// The new user message
    pub input: String,

    pub temperature: f32,

    pub max_output_tokens: u32,
}

/// Category of a generation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationErrorKind {
    /// Credential rejected or missing
    Auth,
    /// Rate limit or quota exhausted
    Quota,
    /// Anything else
    Other,
}

impl GenerationErrorKind {
    /// Classify an untyped error message by keyword
    ///
    /// Approximate: only used when no HTTP status is available or the status
    /// is not one of the known auth or quota codes.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        if message.contains("API_KEY_INVALID") || message.contains("401") {
            Self::Auth
        } else if message.contains("429") || message.to_lowercase().contains("quota") {
            Self::Quota
        } else {
            Self::Other
        }
    }

    /// Kind implied by an HTTP status, if any
    #[must_use]
    pub const fn from_status(status: u16) -> Option<Self> {
        match status {
            401 | 403 => Some(Self::Auth),
            429 => Some(Self::Quota),
            _ => None,
        }
    }
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auth => "auth",
            Self::Quota => "quota",
            Self::Other => "other",
        })
    }
}

/// A failed generation call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} failure: {message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    #[must_use]
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Error whose kind is inferred from its message
    #[must_use]
    pub fn classified(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: GenerationErrorKind::classify(&message),
            message,
        }
    }
}

/// Text generation backend
#[async_trait]
pub trait Generator: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Produce a reply for `request`
    ///
    /// # Errors
    ///
    /// Returns a classified error if the backend rejects or fails the call
    async fn generate(&self, request: &GenerationRequest)
    -> std::result::Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_keywords() {
        assert_eq!(
            GenerationErrorKind::classify("[400] API_KEY_INVALID: key not valid"),
            GenerationErrorKind::Auth
        );
        assert_eq!(
            GenerationErrorKind::classify("got status 401"),
            GenerationErrorKind::Auth
        );
        assert_eq!(
            GenerationErrorKind::classify("status 429 too many requests"),
            GenerationErrorKind::Quota
        );
        assert_eq!(
            GenerationErrorKind::classify("Resource exhausted: Quota exceeded"),
            GenerationErrorKind::Quota
        );
        assert_eq!(
            GenerationErrorKind::classify("connection reset by peer"),
            GenerationErrorKind::Other
        );
    }

    #[test]
    fn status_takes_known_codes_only() {
        assert_eq!(GenerationErrorKind::from_status(401), Some(GenerationErrorKind::Auth));
        assert_eq!(GenerationErrorKind::from_status(403), Some(GenerationErrorKind::Auth));
        assert_eq!(GenerationErrorKind::from_status(429), Some(GenerationErrorKind::Quota));
        assert_eq!(GenerationErrorKind::from_status(500), None);
    }

    #[test]
    fn error_display_includes_kind() {
        let err = GenerationError::classified("429 rate limited");
        assert_eq!(err.kind, GenerationErrorKind::Quota);
        assert_eq!(err.to_string(), "quota failure: 429 rate limited");
    }
}
