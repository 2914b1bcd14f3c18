//! Plain-text conversation log
//!
//! Every exchange is appended to a per-day file and to one cumulative file in
//! the logs directory:
//!
//! ```text
//! [10/14/2026, 09:15:02 PM] Sam: hey
//! [10/14/2026, 09:15:02 PM] Bot: heyy what's up
//!
//! ```

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::Result;

/// Cumulative log file name
pub const CUMULATIVE_FILE: &str = "all_conversations.txt";

/// Marker counted as one exchange by [`ChatLog::stats`]
const BOT_MARKER: &str = "Bot:";

/// Entry timestamp format, e.g. `10/14/2026, 09:15:02 PM`
const TIMESTAMP_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

/// Recent tail of the cumulative log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecentLog {
    /// No cumulative log file exists
    Missing,
    /// The file exists but holds only whitespace in the requested range
    Empty,
    /// Joined lines, truncated to the character limit
    Lines(String),
}

/// Exchange counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Exchanges in the cumulative log
    pub total: usize,
    /// Exchanges in today's file
    pub today: usize,
}

/// Append-only chat log in one directory
#[derive(Debug, Clone)]
pub struct ChatLog {
    dir: PathBuf,
}

impl ChatLog {
    /// Use `dir` for log files, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Log directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Per-day file for `date`
    #[must_use]
    pub fn daily_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("chat_{}.txt", date.format("%Y-%m-%d")))
    }

    /// Cumulative file
    #[must_use]
    pub fn cumulative_path(&self) -> PathBuf {
        self.dir.join(CUMULATIVE_FILE)
    }

    /// Append one exchange stamped with the current time
    ///
    /// # Errors
    ///
    /// Returns error if either file cannot be written
    pub fn append_exchange(&self, sender: &str, message: &str, reply: &str) -> Result<()> {
        self.append_exchange_at(Utc::now(), sender, message, reply)
    }

    /// Append one exchange stamped with `at`
    ///
    /// The entry shows local time; the daily file is keyed by the UTC date.
    ///
    /// # Errors
    ///
    /// Returns error if either file cannot be written
    pub fn append_exchange_at(
        &self,
        at: DateTime<Utc>,
        sender: &str,
        message: &str,
        reply: &str,
    ) -> Result<()> {
        let stamp = at.with_timezone(&Local).format(TIMESTAMP_FORMAT);
        let entry = format!("[{stamp}] {sender}: {message}\n[{stamp}] Bot: {reply}\n\n");

        append(&self.daily_path(at.date_naive()), &entry)?;
        append(&self.cumulative_path(), &entry)?;
        Ok(())
    }

    /// Last `lines` lines of the cumulative log, at most `max_chars` characters
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read
    pub fn recent(&self, lines: usize, max_chars: usize) -> Result<RecentLog> {
        let path = self.cumulative_path();
        if !path.exists() {
            return Ok(RecentLog::Missing);
        }

        let content = std::fs::read_to_string(&path)?;
        let all: Vec<&str> = content.split('\n').collect();
        let tail = all[all.len().saturating_sub(lines)..].join("\n");

        if tail.trim().is_empty() {
            return Ok(RecentLog::Empty);
        }

        Ok(RecentLog::Lines(tail.chars().take(max_chars).collect()))
    }

    /// Exchange counts for the cumulative log and the daily file of `today`
    ///
    /// # Errors
    ///
    /// Returns error if an existing file cannot be read
    pub fn stats(&self, today: NaiveDate) -> Result<LogStats> {
        Ok(LogStats {
            total: count_exchanges(&self.cumulative_path())?,
            today: count_exchanges(&self.daily_path(today))?,
        })
    }
}

fn append(path: &Path, entry: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(entry.as_bytes())?;
    Ok(())
}

fn count_exchanges(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().filter(|line| line.contains(BOT_MARKER)).count())
}
