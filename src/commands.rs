//! Slash commands and their fixed replies

use crate::channels::telegram::BotCommand;
use crate::chat_log::{LogStats, RecentLog};

/// Lines of the cumulative log shown by `/logs`
pub const LOGS_LINES: usize = 40;

/// Most characters of log text shown by `/logs`
pub const LOGS_MAX_CHARS: usize = 4000;

pub const CLEARED_REPLY: &str = "Conversation history cleared! Starting fresh. 😊";
pub const NO_LOG_ENTRIES_REPLY: &str = "No conversations logged yet.";
pub const NO_LOG_FILE_REPLY: &str = "No log file found yet. Conversations will be saved here.";
pub const LOGS_ERROR_REPLY: &str = "Error reading logs. Check the chat_logs folder.";
pub const STATS_ERROR_REPLY: &str = "Error getting stats.";

pub const HELP_REPLY: &str = "\
🤖 Yomi Bot Commands:

/start - Start a new conversation
/clear - Clear conversation history
/logs - View recent conversations
/stats - See bot statistics
/help - Show this help message

Just send a message to chat with me! 💕";

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Clear,
    Logs,
    Stats,
    Help,
    /// Anything else starting with `/`
    Unknown(String),
}

impl Command {
    /// Parse `text` as a command; `None` unless it starts with `/`
    ///
    /// Only the first word counts, and a `@botname` suffix is ignored, so
    /// `/clear@yomi_bot please` parses as [`Command::Clear`].
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split_once('@').map_or(word, |(name, _)| name);

        Some(match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "clear" => Self::Clear,
            "logs" => Self::Logs,
            "stats" => Self::Stats,
            "help" => Self::Help,
            _ => Self::Unknown(name.to_string()),
        })
    }
}

/// Entries for Telegram's command menu
#[must_use]
pub fn menu() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start a new conversation"),
        BotCommand::new("clear", "Clear conversation history"),
        BotCommand::new("logs", "View recent conversations"),
        BotCommand::new("stats", "See bot statistics"),
        BotCommand::new("help", "Show this help message"),
    ]
}

/// Greeting for `/start`
#[must_use]
pub fn start_reply(first_name: &str) -> String {
    format!("Hey {first_name}! 👋 I'm here and ready to chat. What's up?")
}

/// Reply for `/logs`
#[must_use]
pub fn logs_reply(recent: &RecentLog) -> String {
    match recent {
        RecentLog::Missing => NO_LOG_FILE_REPLY.to_string(),
        RecentLog::Empty => NO_LOG_ENTRIES_REPLY.to_string(),
        RecentLog::Lines(text) => format!("📋 Recent conversations:\n\n{text}"),
    }
}

/// Reply for `/stats`
#[must_use]
pub fn stats_reply(stats: LogStats, active_chats: usize) -> String {
    format!(
        "📊 Bot Statistics:\n\n\
         💬 Total messages: {}\n\
         📅 Today's messages: {}\n\
         🔄 Active chats: {active_chats}\n\n\
         Bot is running and ready! 🚀",
        stats.total, stats.today
    )
}
