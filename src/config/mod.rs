//! Configuration management for Yomi
//!
//! Values are layered: environment > TOML file > defaults. A `.env` file in
//! the working directory is loaded into the environment by the binary first.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::conversation::GenerationParams;
use crate::generation::DEFAULT_MODEL;
use crate::session::DEFAULT_MAX_HISTORY;
use crate::{Error, Result};

/// Default persona artifact path
pub const DEFAULT_PERSONA_PATH: &str = "textingStyle.json";

/// Default chat log directory
pub const DEFAULT_LOGS_DIR: &str = "chat_logs";

/// Default speaker label for `yomi extract`
pub const DEFAULT_SPEAKER: &str = "duke.sol";

/// Default pause between getUpdates calls
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Yomi configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Credentials for external services
    pub api_keys: ApiKeys,

    /// Gemini model name
    pub model: String,

    /// Sampling parameters for every reply
    pub generation: GenerationParams,

    /// Persona artifact written by `extract` and read by `run`
    pub persona_path: PathBuf,

    /// Chat log directory
    pub logs_dir: PathBuf,

    /// Conversation turns kept per session after the pinned pair
    pub max_history: usize,

    /// Evict sessions idle for longer than this; never when unset
    pub session_idle_ttl: Option<Duration>,

    /// Pause between getUpdates calls
    pub poll_interval: Duration,

    /// Default speaker label for style extraction
    pub speaker: String,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// Telegram bot token
    pub telegram: Option<String>,

    /// Gemini API key
    pub gemini: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("ApiKeys")
            .field("telegram", &redact(&self.telegram))
            .field("gemini", &redact(&self.gemini))
            .finish()
    }
}

impl Config {
    /// Load configuration from the environment and the optional TOML file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is out of range
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(config_path);
        Self::from_sources(|key| std::env::var(key).ok(), fc)
    }

    /// Build configuration from an environment lookup and a parsed file
    ///
    /// Empty environment values count as unset.
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is out of range
    pub fn from_sources<F>(env: F, fc: file::YomiConfigFile) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // Load API keys (env > toml > None)
        let api_keys = ApiKeys {
            telegram: var("BOT_TOKEN")
                .or_else(|| var("TELEGRAM_BOT_TOKEN"))
                .or(fc.telegram.token),
            gemini: var("GEMINI_API_KEY").or(fc.gemini.api_key),
        };

        let defaults = GenerationParams::default();
        let generation = GenerationParams {
            temperature: parse_var("YOMI_TEMPERATURE", var("YOMI_TEMPERATURE"))
                .or(fc.gemini.temperature)
                .unwrap_or(defaults.temperature),
            max_output_tokens: parse_var("YOMI_MAX_OUTPUT_TOKENS", var("YOMI_MAX_OUTPUT_TOKENS"))
                .or(fc.gemini.max_output_tokens)
                .unwrap_or(defaults.max_output_tokens),
        };

        let config = Self {
            api_keys,
            model: var("YOMI_MODEL")
                .or(fc.gemini.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            generation,
            persona_path: var("YOMI_PERSONA_PATH")
                .map(PathBuf::from)
                .or(fc.bot.persona_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PERSONA_PATH)),
            logs_dir: var("YOMI_LOGS_DIR")
                .map(PathBuf::from)
                .or(fc.bot.logs_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGS_DIR)),
            max_history: parse_var("YOMI_MAX_HISTORY", var("YOMI_MAX_HISTORY"))
                .or(fc.bot.max_history)
                .unwrap_or(DEFAULT_MAX_HISTORY),
            session_idle_ttl: parse_var(
                "YOMI_SESSION_IDLE_TTL_SECS",
                var("YOMI_SESSION_IDLE_TTL_SECS"),
            )
            .or(fc.bot.session_idle_ttl_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
            poll_interval: Duration::from_millis(
                parse_var("YOMI_POLL_INTERVAL_MS", var("YOMI_POLL_INTERVAL_MS"))
                    .or(fc.telegram.poll_interval_ms)
                    .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            speaker: var("YOMI_SPEAKER")
                .or(fc.extract.speaker)
                .unwrap_or_else(|| DEFAULT_SPEAKER.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_history == 0 {
            return Err(Error::Config("max_history must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.generation.temperature
            )));
        }
        if self.generation.max_output_tokens == 0 {
            return Err(Error::Config(
                "max_output_tokens must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Both credentials needed to run the bot
    ///
    /// # Errors
    ///
    /// Returns error naming the first missing credential
    pub fn require_api_keys(&self) -> Result<(&str, &str)> {
        let telegram = self.api_keys.telegram.as_deref().ok_or_else(|| {
            Error::Config("BOT_TOKEN is not set (add it to .env or the config file)".to_string())
        })?;
        let gemini = self.api_keys.gemini.as_deref().ok_or_else(|| {
            Error::Config(
                "GEMINI_API_KEY is not set (add it to .env or the config file)".to_string(),
            )
        })?;
        Ok((telegram, gemini))
    }
}

/// Parse an optional variable, ignoring values that don't parse
fn parse_var<T: std::str::FromStr>(key: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "ignoring unparseable environment value");
            None
        }
    }
}
