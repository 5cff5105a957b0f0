//! Subtitle cue track handling.
//!
//! This module turns a SubRip-style cue track into an ordered list of
//! [`Cue`]s that the rest of the pipeline schedules clips against.
//!
//! # Components
//!
//! - [`timecode`] - timestamp parsing/formatting (pure, no I/O)
//! - [`parser`] - lenient block extraction from cue track text
//! - [`types`] - the immutable [`Cue`] value
//!
//! # Example
//!
//! ```
//! use dubsync_core::subtitles::parse_cue_track;
//!
//! let cues = parse_cue_track("1\n00:00:01,000 --> 00:00:02,500\nHello\n");
//! assert_eq!(cues.len(), 1);
//! assert!((cues[0].duration() - 1.5).abs() < 1e-9);
//! ```

pub mod error;
pub mod parser;
pub mod timecode;
pub mod types;

pub use error::{CueTrackError, TimecodeError};
pub use parser::{load_cue_track, parse_cue_track};
pub use timecode::{format_timestamp, parse_timestamp};
pub use types::Cue;
