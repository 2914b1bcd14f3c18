//! Conversation manager
//!
//! Ties the persona, the session store and the generator together. Replies
//! never fail outward: generation errors turn into fixed fallback texts and
//! leave the session's history as it was.

use std::sync::Arc;

use crate::generation::{
    ContextRole, ContextTurn, GenerationErrorKind, GenerationRequest, Generator,
};
use crate::persona::PersonaPrompt;
use crate::session::{History, Role, SessionHandle, SessionStore};

/// Reply sent when the generation service rejects the credential
pub const AUTH_FALLBACK: &str =
    "Sorry, there's an issue with my API key. Please check the configuration.";

/// Reply sent when the generation service is rate limiting
pub const QUOTA_FALLBACK: &str = "Hey! I'm getting a lot of messages right now. Give me a sec! 😅";

/// Reply sent for every other generation failure
pub const OTHER_FALLBACK: &str = "Hey! Something went wrong on my end, but I'll be back soon! 💕";

/// Fixed fallback text for a failure kind
#[must_use]
pub const fn fallback_for(kind: GenerationErrorKind) -> &'static str {
    match kind {
        GenerationErrorKind::Auth => AUTH_FALLBACK,
        GenerationErrorKind::Quota => QUOTA_FALLBACK,
        GenerationErrorKind::Other => OTHER_FALLBACK,
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            max_output_tokens: 300,
        }
    }
}

/// How a reply was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    Generated,
    Fallback(GenerationErrorKind),
}

/// Text to send back plus how it was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub outcome: ReplyOutcome,
}

impl Reply {
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.outcome, ReplyOutcome::Fallback(_))
    }
}

/// Conversation prior turns as the generator sees them
///
/// Skips the pinned pair and any turn whose text is blank.
#[must_use]
pub fn project_context(history: &History) -> Vec<ContextTurn> {
    history
        .conversation()
        .iter()
        .filter_map(|turn| {
            let text = turn.text.trim();
            if text.is_empty() {
                return None;
            }
            let role = match turn.role {
                Role::User => ContextRole::User,
                Role::Assistant => ContextRole::Model,
                Role::Instruction | Role::Acknowledgement => return None,
            };
            Some(ContextTurn {
                role,
                text: text.to_string(),
            })
        })
        .collect()
}

/// Per-chat conversation state and reply generation
pub struct ConversationManager {
    persona: PersonaPrompt,
    generator: Arc<dyn Generator>,
    store: Arc<dyn SessionStore>,
    params: GenerationParams,
}

impl ConversationManager {
    #[must_use]
    pub fn new(
        persona: PersonaPrompt,
        generator: Arc<dyn Generator>,
        store: Arc<dyn SessionStore>,
        params: GenerationParams,
    ) -> Self {
        Self {
            persona,
            generator,
            store,
            params,
        }
    }

    /// Session handle, creating a seeded history on first use
    #[must_use]
    pub fn get_or_init_history(&self, session_id: &str) -> SessionHandle {
        self.store.get_or_create(session_id)
    }

    /// Append one turn to a session, creating it if needed
    pub async fn append_turn(&self, session_id: &str, role: Role, text: &str) {
        let handle = self.store.get_or_create(session_id);
        let mut history = handle.lock().await;
        history.push(role, text);
        tracing::debug!(
            session = session_id,
            role = role.as_str(),
            turns = history.turn_count(),
            "turn appended"
        );
    }

    /// Replace a session's history with the pinned pair
    pub fn reset(&self, session_id: &str) {
        self.store.reset(session_id);
    }

    /// Number of sessions currently held
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    /// Generate a reply to `user_text` in `session_id`
    ///
    /// The session lock is held for the whole call, so concurrent messages for
    /// one session are answered in arrival order of lock acquisition. History
    /// changes only when generation succeeds.
    pub async fn generate_reply(&self, session_id: &str, user_text: &str) -> Reply {
        let handle = self.store.get_or_create(session_id);
        let mut history = handle.lock().await;

        let request = GenerationRequest {
            system_instruction: self.persona.as_str().to_string(),
            context: project_context(&history),
            input: user_text.to_string(),
            temperature: self.params.temperature,
            max_output_tokens: self.params.max_output_tokens,
        };

        match self.generator.generate(&request).await {
            Ok(text) => {
                let text = text.trim().to_string();
                history.push(Role::User, user_text);
                history.push(Role::Assistant, text.clone());
                tracing::debug!(
                    session = session_id,
                    generator = self.generator.name(),
                    turns = history.turn_count(),
                    "reply generated"
                );
                Reply {
                    text,
                    outcome: ReplyOutcome::Generated,
                }
            }
            Err(e) => {
                tracing::error!(
                    session = session_id,
                    generator = self.generator.name(),
                    kind = %e.kind,
                    error = %e.message,
                    "generation failed, sending fallback"
                );
                Reply {
                    text: fallback_for(e.kind).to_string(),
                    outcome: ReplyOutcome::Fallback(e.kind),
                }
            }
        }
    }
}
