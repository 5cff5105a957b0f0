//! Clip-to-cue matches and per-cue outcomes.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::stretch::StretchPlan;
use crate::subtitles::Cue;

/// A cue paired with the clip that will play during it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMatch {
    pub cue: Cue,
    /// Source clip as found in the clip directory.
    pub clip_path: PathBuf,
    /// Probed clip length in seconds.
    pub clip_duration: f64,
    /// How the clip is fitted into the cue window.
    pub stretch: StretchPlan,
    /// Normalized clip in the scratch directory, set once processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_path: Option<PathBuf>,
}

impl ClipMatch {
    pub fn new(cue: Cue, clip_path: PathBuf, clip_duration: f64, stretch: StretchPlan) -> Self {
        Self {
            cue,
            clip_path,
            clip_duration,
            stretch,
            processed_path: None,
        }
    }

    pub fn needs_compression(&self) -> bool {
        self.stretch.needs_compression
    }

    pub fn speed_factor(&self) -> f64 {
        self.stretch.speed_factor
    }

    pub fn is_processed(&self) -> bool {
        self.processed_path.is_some()
    }
}

/// Why a cue produced no audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CueFailure {
    /// Reading the clip's duration failed.
    Probe(String),
    /// Stretch planning rejected the durations.
    Plan(String),
    /// Transcoding/stretching the clip failed.
    Processing(String),
    /// The run was cancelled before this cue was handled.
    Cancelled,
}

impl fmt::Display for CueFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CueFailure::Probe(msg) => write!(f, "probe failed: {}", msg),
            CueFailure::Plan(msg) => write!(f, "cannot fit clip: {}", msg),
            CueFailure::Processing(msg) => write!(f, "processing failed: {}", msg),
            CueFailure::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of handling one cue. No error crosses the per-cue boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CueOutcome {
    /// A clip was found, probed and planned (and possibly processed).
    Matched(ClipMatch),
    /// No clip file carries this cue's index.
    Unmatched { cue: Cue },
    /// A clip was found but could not be used.
    Failed {
        cue: Cue,
        clip_path: Option<PathBuf>,
        reason: CueFailure,
    },
}

impl CueOutcome {
    pub fn failed(cue: Cue, clip_path: Option<PathBuf>, reason: CueFailure) -> Self {
        Self::Failed {
            cue,
            clip_path,
            reason,
        }
    }

    pub fn cue(&self) -> &Cue {
        match self {
            CueOutcome::Matched(m) => &m.cue,
            CueOutcome::Unmatched { cue } | CueOutcome::Failed { cue, .. } => cue,
        }
    }

    pub fn as_match(&self) -> Option<&ClipMatch> {
        match self {
            CueOutcome::Matched(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, CueOutcome::Matched(_))
    }
}
