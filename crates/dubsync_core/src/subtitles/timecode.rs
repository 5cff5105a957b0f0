//! Cue timestamp parsing and formatting.
//!
//! Accepted forms:
//! - `H:MM:SS,mmm` / `H:MM:SS.mmm` (hours 1-2 digits)
//! - `H:MM:SS` (milliseconds implicitly zero)
//!
//! Matching is anchored at the start of the (trimmed) input only, so any
//! trailing characters after a valid prefix are ignored.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::TimecodeError;

static WITH_MILLIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})\.(\d{3})").unwrap());

static WITHOUT_MILLIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})").unwrap());

/// Parse a cue timestamp into seconds.
///
/// Comma is treated as the decimal separator. Returns
/// `h*3600 + m*60 + s + ms/1000`.
pub fn parse_timestamp(value: &str) -> Result<f64, TimecodeError> {
    let normalized = value.trim().replace(',', ".");

    if let Some(caps) = WITH_MILLIS.captures(&normalized) {
        let h = field(&caps[1], value)?;
        let m = field(&caps[2], value)?;
        let s = field(&caps[3], value)?;
        let ms = field(&caps[4], value)?;
        return Ok(h * 3600.0 + m * 60.0 + s + ms / 1000.0);
    }

    if let Some(caps) = WITHOUT_MILLIS.captures(&normalized) {
        let h = field(&caps[1], value)?;
        let m = field(&caps[2], value)?;
        let s = field(&caps[3], value)?;
        return Ok(h * 3600.0 + m * 60.0 + s);
    }

    Err(TimecodeError::invalid(value))
}

fn field(digits: &str, original: &str) -> Result<f64, TimecodeError> {
    digits
        .parse::<u32>()
        .map(f64::from)
        .map_err(|_| TimecodeError::invalid(original))
}

/// Format seconds as `HH:MM:SS,mmm` (rounded to the nearest millisecond).
///
/// Negative input is clamped to zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}
