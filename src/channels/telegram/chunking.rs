//! Reply splitting for Telegram's message size limit
//!
//! Telegram rejects messages over 4096 characters. Replies longer than the
//! limit are cut at the last paragraph break, line break or space that fits,
//! falling back to a hard cut on a character boundary.

/// Default chunk size (margin below the 4096 hard cap)
pub const DEFAULT_LIMIT: usize = 4000;

/// Split `text` into chunks of at most `limit` characters
///
/// A `limit` of 0 means [`DEFAULT_LIMIT`]. Chunks are trimmed and never empty;
/// blank input yields no chunks.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };

    let mut chunks = Vec::new();
    let mut remaining = text.trim();

    while !remaining.is_empty() {
        let Some(window_end) = byte_offset_of_char(remaining, limit) else {
            chunks.push(remaining.to_string());
            break;
        };

        let cut = if remaining[window_end..].starts_with(char::is_whitespace) {
            window_end
        } else {
            split_point(&remaining[..window_end])
        };
        let (head, tail) = remaining.split_at(cut);
        let head = head.trim_end();
        if !head.is_empty() {
            chunks.push(head.to_string());
        }
        remaining = tail.trim_start();
    }

    chunks
}

/// Byte offset where char number `n` starts, or `None` if the text is shorter
fn byte_offset_of_char(text: &str, n: usize) -> Option<usize> {
    text.char_indices().nth(n).map(|(i, _)| i)
}

/// Best byte offset to cut `window` at
///
/// Prefers the end of a paragraph, then a line, then a word.
fn split_point(window: &str) -> usize {
    for boundary in ["\n\n", "\n", " "] {
        if let Some(pos) = window.rfind(boundary)
            && pos > 0
        {
            return pos + boundary.len();
        }
    }
    window.len()
}
