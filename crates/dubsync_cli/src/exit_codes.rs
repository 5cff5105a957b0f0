//! Exit codes for the CLI.
//!
//! Scripts can tell an unusable engine apart from a failed or cancelled
//! sync without parsing output.

/// Exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,
    /// General/unspecified error (config, I/O)
    GeneralError = 1,
    /// Invalid command-line arguments or input paths
    InvalidArguments = 2,
    /// FFmpeg/FFprobe missing or not runnable
    EngineUnavailable = 3,
    /// The sync ran but produced no output
    SyncFailed = 4,
    /// Stopped by Ctrl+C
    Cancelled = 5,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::GeneralError => write!(f, "general error"),
            ExitCode::InvalidArguments => write!(f, "invalid arguments"),
            ExitCode::EngineUnavailable => write!(f, "engine unavailable"),
            ExitCode::SyncFailed => write!(f, "sync failed"),
            ExitCode::Cancelled => write!(f, "cancelled"),
        }
    }
}
