//! Engine types: errors, command output, and the normalized audio format.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sample rate used when none is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

/// Sample rates offered by the CLI.
pub const COMMON_SAMPLE_RATES: [u32; 3] = [24000, 44100, 48000];

/// Errors from external engine invocations.
///
/// Every variant is scoped to a single engine call; callers decide whether
/// it is fatal (assembly) or recorded per cue (probe, clip processing).
#[derive(Error, Debug)]
pub enum EngineError {
    /// Input file does not exist.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// The engine binary could not be started.
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// I/O while talking to the process or preparing its inputs.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The engine exited with a non-zero status.
    #[error("{tool} failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        stderr: String,
    },

    /// The engine ran longer than the caller allowed and was killed.
    #[error("{tool} timed out after {seconds:.1}s")]
    Timeout { tool: String, seconds: f64 },

    /// The run was cancelled while the engine was working; the process was killed.
    #[error("{tool} was cancelled")]
    Cancelled { tool: String },

    /// The engine succeeded but its output made no sense.
    #[error("Unexpected {tool} output: {message}")]
    InvalidOutput { tool: String, message: String },
}

impl EngineError {
    pub fn spawn(tool: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            tool: tool.into(),
            source,
        }
    }

    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn invalid_output(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOutput {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from a user-requested stop.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Captured stderr lines, if the engine produced any.
    pub fn stderr_lines(&self) -> Vec<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => stderr.lines().collect(),
            _ => Vec::new(),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Captured output of one engine process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Normalized intermediate/output format: mono, 16-bit PCM, fixed rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
}

impl AudioFormat {
    pub const CHANNELS: u32 = 1;
    pub const CODEC: &'static str = "pcm_s16le";

    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}
