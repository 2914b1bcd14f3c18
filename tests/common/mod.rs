//! Shared test utilities
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use yomi::channels::{Channel, IncomingMessage, OutgoingMessage};
use yomi::chat_log::ChatLog;
use yomi::generation::{GenerationError, GenerationErrorKind, GenerationRequest, Generator};
use yomi::handler::MessageHandler;
use yomi::session::{DEFAULT_MAX_HISTORY, InMemorySessionStore, SessionStore};
use yomi::{ConversationManager, GenerationParams, PersonaPrompt};

/// Persona text used across tests
pub const TEST_PERSONA: &str = "You are responding as me (duke.sol).";

/// Mock channel that records everything sent through it
#[derive(Default)]
pub struct MockChannel {
    connected: bool,
    sent: Mutex<Vec<OutgoingMessage>>,
    typing: AtomicUsize,
    sends_to_fail: AtomicUsize,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` sends
    pub fn fail_next_sends(&self, n: usize) {
        self.sends_to_fail.store(n, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent().await.into_iter().map(|m| m.content).collect()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&mut self) -> yomi::Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> yomi::Result<()> {
        self.connected = false;
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> yomi::Result<()> {
        let fail = self
            .sends_to_fail
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(yomi::Error::Channel("chat not reachable".to_string()));
        }
        self.sent.lock().await.push(message);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send_typing(&self, _channel_id: &str) -> yomi::Result<()> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Generator that replays scripted outcomes and records every request
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    delay: Duration,
    in_flight: AtomicUsize,
    overlapped: AtomicBool,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            overlapped: AtomicBool::new(false),
        }
    }

    /// Always answer with `reply`
    pub fn replying(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    /// Always fail with `kind`
    pub fn failing(kind: GenerationErrorKind) -> Self {
        Self::new(vec![Err(GenerationError::new(kind, "scripted failure"))])
    }

    /// Sleep for `delay` inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    /// Whether two calls were ever in flight at once
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.requests.lock().await.push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        // The last scripted outcome repeats once the script runs out
        let outcome = {
            let mut script = self.script.lock().await;
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome.unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// Conversation manager over an in-memory store and `generator`
pub fn manager(generator: Arc<ScriptedGenerator>) -> Arc<ConversationManager> {
    let persona = PersonaPrompt::inline(TEST_PERSONA);
    let store: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::new(persona.clone(), DEFAULT_MAX_HISTORY));
    Arc::new(ConversationManager::new(
        persona,
        generator,
        store,
        GenerationParams::default(),
    ))
}

/// Message handler logging into `log_dir`
pub fn handler(generator: Arc<ScriptedGenerator>, log_dir: &std::path::Path) -> MessageHandler {
    let chat_log = ChatLog::open(log_dir).expect("failed to open chat log");
    MessageHandler::new(manager(generator), chat_log)
}

/// Incoming text from Sam in chat 42
pub fn incoming(text: &str) -> IncomingMessage {
    incoming_in("42", text)
}

/// Incoming text from Sam in `chat_id`
pub fn incoming_in(chat_id: &str, text: &str) -> IncomingMessage {
    IncomingMessage::new("1", chat_id, "7", Some("Sam"), text)
}
