//! Yomi - a Telegram chat bot that texts in your style
//!
//! Two halves share this crate:
//! - The style extractor reads a chat transcript, samples one speaker's
//!   messages and renders a persona prompt artifact.
//! - The bot loads that persona and answers Telegram messages through Gemini,
//!   keeping a bounded history per chat.
//!
//! # Architecture
//!
//! ```text
//! transcript ──► style ──► persona artifact (JSON)
//!                                │
//! Telegram ──► channels ──► handler ──► conversation ──► generation (Gemini)
//!                              │              │
//!                          chat_log        session store
//! ```

pub mod channels;
pub mod chat_log;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod daemon;
pub mod error;
pub mod generation;
pub mod handler;
pub mod persona;
pub mod session;
pub mod style;

pub use config::Config;
pub use conversation::{ConversationManager, GenerationParams, Reply, ReplyOutcome};
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use persona::{PersonaArtifact, PersonaPrompt};
pub use style::StyleExtractor;
