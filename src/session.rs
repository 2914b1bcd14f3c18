//! Per-chat conversation histories
//!
//! Every history starts with two pinned turns (the persona prompt and a fixed
//! acknowledgement) followed by at most `max_history` conversation turns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::persona::PersonaPrompt;

/// Synthetic model confirmation pinned as the second turn
pub const ACKNOWLEDGEMENT: &str = "Got it! I understand how to text like you. Ready to chat!";

/// Default number of conversation turns kept after the pinned pair
pub const DEFAULT_MAX_HISTORY: usize = 30;

/// Number of pinned turns at the head of every history
pub const PINNED_TURNS: usize = 2;

/// Originator of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The persona prompt
    Instruction,
    /// The fixed confirmation of the persona prompt
    Acknowledgement,
    /// Message from the chat counterpart
    User,
    /// Generated reply
    Assistant,
}

impl Role {
    /// Lowercase role name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instruction => "instruction",
            Self::Acknowledgement => "acknowledgement",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message unit in a history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Bounded conversation history for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    turns: Vec<Turn>,
    max_history: usize,
}

impl History {
    /// Fresh history holding only the pinned turns
    #[must_use]
    pub fn new(persona: &PersonaPrompt, max_history: usize) -> Self {
        let mut turns = Vec::with_capacity(PINNED_TURNS + max_history + 1);
        turns.push(Turn::new(Role::Instruction, persona.as_str()));
        turns.push(Turn::new(Role::Acknowledgement, ACKNOWLEDGEMENT));
        Self { turns, max_history }
    }

    /// Append a turn, dropping the oldest conversation turns past the cap
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn::new(role, text));

        let cap = PINNED_TURNS + self.max_history;
        if self.turns.len() > cap {
            let excess = self.turns.len() - cap;
            self.turns.drain(PINNED_TURNS..PINNED_TURNS + excess);
        }
    }

    /// Discard every turn after the pinned pair
    pub fn reset(&mut self) {
        self.turns.truncate(PINNED_TURNS);
    }

    /// All turns, pinned pair included
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The instruction and acknowledgement turns
    #[must_use]
    pub fn pinned(&self) -> &[Turn] {
        &self.turns[..PINNED_TURNS]
    }

    /// Turns after the pinned pair, oldest first
    #[must_use]
    pub fn conversation(&self) -> &[Turn] {
        &self.turns[PINNED_TURNS..]
    }

    /// Total number of turns, pinned pair included
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Configured conversation-turn cap
    #[must_use]
    pub const fn max_history(&self) -> usize {
        self.max_history
    }
}

/// Shared handle to one session's history
///
/// Holding the lock serializes work on a session, including across the
/// generation call.
pub type SessionHandle = Arc<tokio::sync::Mutex<History>>;

/// Owner of every session's history
pub trait SessionStore: Send + Sync {
    /// Existing history for `session_id`, or a new one seeded with the pinned turns
    fn get_or_create(&self, session_id: &str) -> SessionHandle;

    /// Existing history for `session_id`
    fn get(&self, session_id: &str) -> Option<SessionHandle>;

    /// Replace the session's history with a fresh pinned pair
    ///
    /// Holders of the previous handle keep a detached copy; nothing they
    /// append reaches the new history.
    fn reset(&self, session_id: &str) -> SessionHandle;

    /// Forget a session entirely; returns whether it existed
    fn evict(&self, session_id: &str) -> bool;

    /// Forget sessions untouched for longer than `max_idle`; returns how many
    fn evict_idle(&self, max_idle: Duration) -> usize;

    /// Number of sessions currently held
    fn len(&self) -> usize;

    /// Whether no sessions are held
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct SessionSlot {
    handle: SessionHandle,
    last_used: Instant,
}

/// Process-lifetime session store kept in memory
pub struct InMemorySessionStore {
    persona: PersonaPrompt,
    max_history: usize,
    sessions: Mutex<HashMap<String, SessionSlot>>,
}

impl InMemorySessionStore {
    /// Create an empty store whose histories are seeded from `persona`
    #[must_use]
    pub fn new(persona: PersonaPrompt, max_history: usize) -> Self {
        Self {
            persona,
            max_history,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn fresh_handle(&self) -> SessionHandle {
        Arc::new(tokio::sync::Mutex::new(History::new(
            &self.persona,
            self.max_history,
        )))
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionSlot>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, session_id: &str) -> SessionHandle {
        let mut sessions = self.sessions();
        let now = Instant::now();

        if let Some(slot) = sessions.get_mut(session_id) {
            slot.last_used = now;
            return Arc::clone(&slot.handle);
        }

        let handle = self.fresh_handle();
        sessions.insert(
            session_id.to_string(),
            SessionSlot {
                handle: Arc::clone(&handle),
                last_used: now,
            },
        );
        tracing::debug!(session = session_id, "session created");
        handle
    }

    fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions()
            .get(session_id)
            .map(|slot| Arc::clone(&slot.handle))
    }

    fn reset(&self, session_id: &str) -> SessionHandle {
        let handle = self.fresh_handle();
        self.sessions().insert(
            session_id.to_string(),
            SessionSlot {
                handle: Arc::clone(&handle),
                last_used: Instant::now(),
            },
        );
        tracing::debug!(session = session_id, "session reset");
        handle
    }

    fn evict(&self, session_id: &str) -> bool {
        self.sessions().remove(session_id).is_some()
    }

    fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions();
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, slot| now.duration_since(slot.last_used) < max_idle);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    fn len(&self) -> usize {
        self.sessions().len()
    }
}
