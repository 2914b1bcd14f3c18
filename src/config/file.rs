//! TOML configuration file loading
//!
//! Supports `~/.config/yomi/config.toml` as a persistent config source.
//! All fields are optional: the file is a partial overlay on top of defaults.
//!
//! ```toml
//! [telegram]
//! token = "123456:ABC-DEF"
//! poll_interval_ms = 500
//!
//! [gemini]
//! api_key = "..."
//! model = "gemini-2.5-flash"
//! temperature = 0.9
//! max_output_tokens = 300
//!
//! [bot]
//! persona_path = "textingStyle.json"
//! logs_dir = "chat_logs"
//! max_history = 30
//! session_idle_ttl_secs = 86400
//!
//! [extract]
//! speaker = "duke.sol"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct YomiConfigFile {
    #[serde(default)]
    pub telegram: TelegramFileConfig,

    #[serde(default)]
    pub gemini: GeminiFileConfig,

    #[serde(default)]
    pub bot: BotFileConfig,

    #[serde(default)]
    pub extract: ExtractFileConfig,
}

/// Telegram connection settings
#[derive(Debug, Default, Deserialize)]
pub struct TelegramFileConfig {
    pub token: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

/// Gemini generation settings
#[derive(Debug, Default, Deserialize)]
pub struct GeminiFileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

/// Bot runtime settings
#[derive(Debug, Default, Deserialize)]
pub struct BotFileConfig {
    pub persona_path: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub max_history: Option<usize>,
    pub session_idle_ttl_secs: Option<u64>,
}

/// Style extraction settings
#[derive(Debug, Default, Deserialize)]
pub struct ExtractFileConfig {
    pub speaker: Option<String>,
}

/// Load the TOML config file
///
/// Uses `explicit` if given, else `$YOMI_CONFIG`, else the standard path.
/// Returns `YomiConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(explicit: Option<&Path>) -> YomiConfigFile {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("YOMI_CONFIG").map(PathBuf::from))
        .or_else(config_file_path);

    let Some(path) = path else {
        return YomiConfigFile::default();
    };

    if !path.exists() {
        if explicit.is_some() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
        }
        return YomiConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                YomiConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            YomiConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config(content: &str) -> crate::Result<YomiConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Return the config file path: `~/.config/yomi/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("yomi").join("config.toml"))
}
