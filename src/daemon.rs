//! Daemon - the long-running bot service
//!
//! Wires configuration, persona, generator, session store and the Telegram
//! channel together, then serves messages until Ctrl-C.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::channels::{Channel, IncomingMessage, TelegramChannel};
use crate::chat_log::ChatLog;
use crate::commands;
use crate::conversation::ConversationManager;
use crate::generation::{GeminiGenerator, Generator};
use crate::handler::MessageHandler;
use crate::persona::PersonaPrompt;
use crate::session::{InMemorySessionStore, SessionStore};
use crate::{Config, Error, Result};

/// How often idle sessions are swept when eviction is enabled
const EVICTION_SWEEP_SECS: u64 = 60;

/// The Yomi daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if a required credential is missing
    pub fn new(config: Config) -> Result<Self> {
        config.require_api_keys()?;
        Ok(Self { config })
    }

    /// Run the bot until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if startup fails (bad token, unwritable log directory)
    pub async fn run(self) -> Result<()> {
        let (telegram_token, gemini_key) = self.config.require_api_keys()?;

        let persona = PersonaPrompt::load(&self.config.persona_path);
        if persona.is_fallback() {
            tracing::warn!("running with the generic persona; run `yomi extract` to build one");
        }

        let generator: Arc<dyn Generator> =
            Arc::new(GeminiGenerator::new(gemini_key, self.config.model.clone()));
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(
            persona.clone(),
            self.config.max_history,
        ));
        let conversations = Arc::new(ConversationManager::new(
            persona,
            generator,
            Arc::clone(&store),
            self.config.generation,
        ));
        let chat_log = ChatLog::open(&self.config.logs_dir)?;
        tracing::info!(dir = %chat_log.dir().display(), "chat log ready");
        let handler = Arc::new(MessageHandler::new(conversations, chat_log));

        let (mut telegram, rx) = TelegramChannel::with_receiver(telegram_token.to_string());
        connect_telegram(&mut telegram).await?;

        if let Err(e) = telegram.sync_commands(&commands::menu()).await {
            tracing::warn!(error = %e, "failed to sync Telegram command menu");
        }

        let poller = telegram.start_polling(self.config.poll_interval)?;
        let sweeper = self
            .config
            .session_idle_ttl
            .map(|ttl| spawn_idle_eviction(Arc::clone(&store), ttl));

        tracing::info!(
            bot = telegram.bot_username().unwrap_or("unknown"),
            model = %self.config.model,
            max_history = self.config.max_history,
            "yomi bot is running"
        );

        let channel: Arc<dyn Channel> = Arc::new(telegram.clone());
        serve(handler, channel, rx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

        tracing::info!("shutting down yomi bot");
        poller.abort();
        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        telegram.disconnect().await?;
        Ok(())
    }
}

/// Connect to Telegram, failing only when the token is refused
///
/// An unreachable API is logged and tolerated; the polling loop keeps
/// retrying `getUpdates` until Telegram answers.
///
/// # Errors
///
/// Returns error if Telegram rejects the bot token
pub async fn connect_telegram(telegram: &mut TelegramChannel) -> Result<()> {
    match telegram.connect().await {
        Ok(()) => Ok(()),
        Err(e) if e.is_token_rejection() => {
            Err(Error::Config(format!("Invalid Telegram bot token: {e}")))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Telegram unreachable at startup, polling anyway");
            Ok(())
        }
    }
}

/// Dispatch messages from `rx` until it closes or `shutdown` resolves
///
/// Each message runs in its own task; per-session locks keep replies within a
/// chat ordered. In-flight tasks are awaited before returning.
pub async fn serve<S>(
    handler: Arc<MessageHandler>,
    channel: Arc<dyn Channel>,
    mut rx: mpsc::Receiver<IncomingMessage>,
    shutdown: S,
) where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                let handler = Arc::clone(&handler);
                let channel = Arc::clone(&channel);
                tasks.spawn(async move {
                    handler.handle(channel.as_ref(), msg).await;
                });
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "message task failed");
                }
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "message task failed");
        }
    }
}

/// Periodically drop sessions idle for longer than `ttl`
fn spawn_idle_eviction(store: Arc<dyn SessionStore>, ttl: Duration) -> tokio::task::JoinHandle<()> {
    tracing::info!(ttl_secs = ttl.as_secs(), "idle session eviction enabled");
    let period = ttl.min(Duration::from_secs(EVICTION_SWEEP_SECS));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // Skip the first immediate tick
        interval.tick().await;

        loop {
            interval.tick().await;
            store.evict_idle(ttl);
        }
    })
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Answer one HTTP request with `status_line` and a JSON `body`
    async fn respond_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Read up to the end of the headers; getMe bodies are tiny
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}/bot")
    }

    #[tokio::test]
    async fn rejected_token_is_fatal() {
        let api_base = respond_once(
            "401 Unauthorized",
            r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#,
        )
        .await;
        let mut telegram = TelegramChannel::new("123:bad".to_string()).with_api_base(api_base);

        let err = connect_telegram(&mut telegram).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Invalid Telegram bot token"));
        assert!(!telegram.is_connected());
    }

    #[tokio::test]
    async fn unreachable_api_is_tolerated() {
        // Bind then drop to get a port nothing listens on
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let mut telegram = TelegramChannel::new("123:abc".to_string())
            .with_api_base(format!("http://{addr}/bot"));

        connect_telegram(&mut telegram).await.unwrap();
        assert!(!telegram.is_connected());
        assert!(telegram.bot_username().is_none());
    }

    #[tokio::test]
    async fn valid_token_connects() {
        let api_base = respond_once(
            "200 OK",
            r#"{"ok":true,
                "result":{"id":7,"is_bot":true,"first_name":"Yomi","username":"yomi_bot"}}"#,
        )
        .await;
        let mut telegram = TelegramChannel::new("123:abc".to_string()).with_api_base(api_base);

        connect_telegram(&mut telegram).await.unwrap();
        assert!(telegram.is_connected());
        assert_eq!(telegram.bot_username(), Some("yomi_bot"));
    }

    #[test]
    fn only_token_refusals_count_as_rejection() {
        let refused = Error::TelegramApi {
            method: "getMe".to_string(),
            status: 401,
            description: "Unauthorized".to_string(),
        };
        assert!(refused.is_token_rejection());

        let throttled = Error::TelegramApi {
            method: "getMe".to_string(),
            status: 429,
            description: "Too Many Requests".to_string(),
        };
        assert!(!throttled.is_token_rejection());
        let transport = Error::Channel("Telegram getMe error: timed out".to_string());
        assert!(!transport.is_token_rejection());
    }
}
