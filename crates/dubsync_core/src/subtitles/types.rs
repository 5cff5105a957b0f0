//! Cue value type.

use serde::{Deserialize, Serialize};

/// One timed subtitle entry.
///
/// Times are seconds from the start of the track. A cue is immutable once
/// parsed; the parser guarantees `end > start` and `start >= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Index as written in the cue track. Unique, not necessarily contiguous.
    pub index: u32,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Cue text (may span several lines).
    pub text: String,
}

impl Cue {
    pub fn new(index: u32, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// Length of the cue window in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
