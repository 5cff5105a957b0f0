//! Subtitle error types.

use std::path::PathBuf;

/// Errors from timestamp parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimecodeError {
    /// Neither `H:MM:SS[.,]mmm` nor `H:MM:SS` matched.
    #[error("Invalid timestamp format: '{0}'")]
    InvalidFormat(String),
}

impl TimecodeError {
    /// Create an invalid format error.
    pub fn invalid(value: impl Into<String>) -> Self {
        Self::InvalidFormat(value.into())
    }
}

/// Errors that can occur while loading a cue track.
#[derive(Debug, thiserror::Error)]
pub enum CueTrackError {
    /// Failed to read the cue track file.
    #[error("Failed to read cue track '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CueTrackError {
    /// Create a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
