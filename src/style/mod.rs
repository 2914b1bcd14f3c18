//! Texting-style extraction from exported chat transcripts
//!
//! Reads a transcript made of lines shaped like `<prefix>] <speaker>: <text>`,
//! keeps one speaker's messages, deduplicates them and samples a
//! recency-weighted set of examples for the persona prompt.
//!
//! ```text
//! transcript ─▶ parse ─▶ unique_messages ─▶ bands ─▶ blend ─▶ examples
//!                                           early   (stride)
//!                                           middle  (stride)
//!                                           recent  (all)
//! ```

mod sampling;
mod template;

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

pub use sampling::{Bands, EARLY_SHARE, MIDDLE_SHARE, blend, partition, stride};
pub use template::{GENERIC_PERSONA, MAX_PROMPT_EXAMPLES, render_prompt};

use crate::{Error, Result};

/// Substrings that mark platform notices rather than real messages
pub const SYSTEM_NOTICE_MARKERS: &[&str] = &[
    "end-to-end encrypted",
    "omitted",
    "blocked",
    "unblocked",
];

/// Case-sensitive prefix of boilerplate lines in exported transcripts
pub const BOILERPLATE_PREFIX: &str = "you are";

/// Matches text with no letters or digits at all (emoji-only, punctuation)
static NO_WORD_CONTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\W]*$").expect("valid regex"));

/// A message attributed to the target speaker
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMessage {
    /// Message text as written
    pub text: String,

    /// Trimmed, lowercased text used only for deduplication
    pub normalized: String,

    /// Position of the source line as a fraction of the transcript (0.0-1.0)
    pub position: f64,
}

impl ExtractedMessage {
    /// Create a message from its text and transcript position
    #[must_use]
    pub fn new(text: impl Into<String>, position: f64) -> Self {
        let text = text.into();
        let normalized = text.trim().to_lowercase();
        Self {
            text,
            normalized,
            position,
        }
    }
}

/// Length thresholds applied while extracting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Parsed messages at or under this many characters are dropped
    pub short_message_len: usize,

    /// Sampled examples at or under this many characters are dropped
    pub short_example_len: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            short_message_len: 2,
            short_example_len: 3,
        }
    }
}

impl ExtractOptions {
    /// Options that keep messages of any length
    #[must_use]
    pub const fn unfiltered() -> Self {
        Self {
            short_message_len: 0,
            short_example_len: 0,
        }
    }
}

/// Transcript positions covered by one band, as fractions of the line count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSpan {
    /// Position of the band's first message
    pub start: f64,
    /// Position of the band's last message
    pub end: f64,
}

impl BandSpan {
    /// Span of `band`; `None` when it is empty
    #[must_use]
    pub fn of(band: &[ExtractedMessage]) -> Option<Self> {
        Some(Self {
            start: band.first()?.position,
            end: band.last()?.position,
        })
    }
}

/// Counts gathered during one extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtractionReport {
    /// Messages from the speaker that passed the content filters
    pub matched: usize,
    /// Messages left after deduplication
    pub unique: usize,
    /// Size of the early band (first 30%)
    pub early: usize,
    /// Size of the middle band (30%-70%)
    pub middle: usize,
    /// Size of the recent band (last 30%)
    pub recent: usize,
    /// Where the early band sits in the transcript
    pub early_span: Option<BandSpan>,
    /// Where the middle band sits in the transcript
    pub middle_span: Option<BandSpan>,
    /// Where the recent band sits in the transcript
    pub recent_span: Option<BandSpan>,
    /// Examples in the final sample
    pub examples: usize,
}

/// Result of running the extractor over a transcript
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Sampled examples, recent band first
    pub examples: Vec<ExtractedMessage>,
    /// Statistics for the run
    pub report: ExtractionReport,
}

impl Extraction {
    /// Example texts in sample order
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.examples.iter().map(|m| m.text.clone()).collect()
    }
}

/// Extracts one speaker's messages from a transcript
#[derive(Debug, Clone)]
pub struct StyleExtractor {
    speaker: String,
    marker: String,
    pattern: Regex,
    options: ExtractOptions,
}

impl StyleExtractor {
    /// Create an extractor for the given speaker label
    ///
    /// # Errors
    ///
    /// Returns error if the label cannot be compiled into a pattern
    pub fn new(speaker: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r"\]\s+{}:\s*(.+)", regex::escape(speaker)))
            .map_err(|e| Error::Config(format!("invalid speaker label {speaker:?}: {e}")))?;

        Ok(Self {
            speaker: speaker.to_string(),
            marker: format!("] {speaker}:"),
            pattern,
            options: ExtractOptions::default(),
        })
    }

    /// Override the length thresholds
    #[must_use]
    pub const fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse the speaker's messages in transcript order, before deduplication
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn parse(&self, transcript: &str) -> Vec<ExtractedMessage> {
        let lines: Vec<&str> = transcript.split('\n').map(str::trim).collect();
        let total = lines.len().max(1) as f64;

        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !is_notice(line))
            .filter(|(_, line)| line.contains(&self.marker))
            .filter_map(|(index, line)| {
                let text = self.pattern.captures(line)?.get(1)?.as_str().trim();
                self.keeps_message(text)
                    .then(|| ExtractedMessage::new(text, index as f64 / total))
            })
            .collect()
    }

    /// Run the full pipeline: parse, deduplicate, band, sample, filter
    #[must_use]
    pub fn extract(&self, transcript: &str) -> Extraction {
        let parsed = self.parse(transcript);
        let matched = parsed.len();
        let unique = unique_messages(parsed);

        let bands = partition(&unique);
        let mut report = ExtractionReport {
            matched,
            unique: unique.len(),
            early: bands.early.len(),
            middle: bands.middle.len(),
            recent: bands.recent.len(),
            early_span: BandSpan::of(bands.early),
            middle_span: BandSpan::of(bands.middle),
            recent_span: BandSpan::of(bands.recent),
            examples: 0,
        };

        let examples: Vec<ExtractedMessage> = blend(&unique)
            .into_iter()
            .filter(|m| m.text.chars().count() > self.options.short_example_len)
            .collect();
        report.examples = examples.len();

        tracing::debug!(
            speaker = %self.speaker,
            matched = report.matched,
            unique = report.unique,
            early = report.early,
            middle = report.middle,
            recent = report.recent,
            examples = report.examples,
            "extracted style examples"
        );

        Extraction { examples, report }
    }

    fn keeps_message(&self, text: &str) -> bool {
        text.chars().count() > self.options.short_message_len && !NO_WORD_CONTENT.is_match(text)
    }
}

/// Extract sampled example texts for `speaker` with the default options
///
/// # Errors
///
/// Returns error if the speaker label cannot be compiled into a pattern
pub fn extract(transcript: &str, speaker: &str) -> Result<Vec<ExtractedMessage>> {
    Ok(StyleExtractor::new(speaker)?.extract(transcript).examples)
}

/// Read a transcript file, replacing invalid UTF-8 with U+FFFD
///
/// # Errors
///
/// Returns error if the file cannot be read
pub fn read_transcript(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                valid_up_to = e.utf8_error().valid_up_to(),
                "transcript is not valid UTF-8, replacing invalid bytes"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(text)
}

/// Drop messages whose normalized text was already seen, keeping first occurrences in order
#[must_use]
pub fn unique_messages(messages: Vec<ExtractedMessage>) -> Vec<ExtractedMessage> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|m| seen.insert(m.normalized.clone()))
        .collect()
}

fn is_notice(line: &str) -> bool {
    line.is_empty()
        || line.starts_with(BOILERPLATE_PREFIX)
        || SYSTEM_NOTICE_MARKERS.iter().any(|marker| line.contains(marker))
}
