//! The `<epoch_ms>,<payload>` record format.

use memchr::memchr;
use std::fmt;

/// One timestamped record. Payloads may contain commas; only the first comma delimits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp_ms: i64,
    pub payload: String,
}

impl LogLine {
    pub fn new(timestamp_ms: i64, payload: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            payload: payload.into(),
        }
    }

    /// Serialized form including the trailing newline.
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }

    /// Parse a stored record (trailing newline optional).
    pub fn parse(text: &str) -> Option<Self> {
        split_record(text).map(|(timestamp_ms, payload)| Self::new(timestamp_ms, payload))
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.timestamp_ms, self.payload)
    }
}

/// Borrowing split of a stored record into its timestamp and payload.
///
/// Returns `None` for lines with no comma or a non-numeric timestamp, which is what a
/// reader sees when it races the writer on the last line of a live segment.
pub fn split_record(text: &str) -> Option<(i64, &str)> {
    let text = text.trim_end_matches(['\n', '\r']);
    let comma = memchr(b',', text.as_bytes())?;
    let timestamp_ms = text[..comma].parse::<i64>().ok()?;
    Some((timestamp_ms, &text[comma + 1..]))
}
