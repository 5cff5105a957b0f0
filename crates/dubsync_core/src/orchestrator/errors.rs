//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → Operation → Detail

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;
use crate::subtitles::CueTrackError;
use crate::timeline::AssemblyError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Input validation failed before pipeline started.
    #[error("Job '{job_name}' failed validation: {message}")]
    ValidationFailed { job_name: String, message: String },

    /// Pipeline was cancelled.
    #[error("Job '{job_name}' was cancelled")]
    Cancelled { job_name: String },

    /// Failed to set up the run (scratch dir, log file, worker pool).
    #[error("Job '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn validation_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The step error behind a `StepFailed`, if any.
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            Self::StepFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// A required file or directory was not found.
    #[error("Required path not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The subtitle file could not be read.
    #[error(transparent)]
    CueTrack(#[from] CueTrackError),

    /// The subtitle file holds no usable cue.
    #[error("No cues found in {}", path.display())]
    EmptyTrack { path: PathBuf },

    /// No cue ended up with a usable clip.
    #[error("No usable clips: 0 of {total} cues matched")]
    NoUsableClips { total: usize },

    /// Building the output failed.
    #[error("Assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    /// An engine call outside the per-cue boundary failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The run was cancelled while the step was working.
    #[error("Step was cancelled")]
    Cancelled,

    /// Generic step error with message.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn empty_track(path: impl Into<PathBuf>) -> Self {
        Self::EmptyTrack { path: path.into() }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// True for a cancel signal, including one surfacing from the engine.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Engine(e) | Self::Assembly(AssemblyError::Engine(e)) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_displays_context() {
        let err = StepError::NoUsableClips { total: 12 };
        assert_eq!(err.to_string(), "No usable clips: 0 of 12 cues matched");
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::empty_track("/subs/ep01.srt");
        let pipeline_err = PipelineError::step_failed("ep01", "Parse", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("ep01"));
        assert!(msg.contains("Parse"));
        assert!(msg.contains("No cues found"));
        assert!(matches!(
            pipeline_err.step_error(),
            Some(StepError::EmptyTrack { .. })
        ));
    }

    #[test]
    fn engine_cancel_counts_as_cancel() {
        let err = StepError::from(AssemblyError::Engine(EngineError::Cancelled {
            tool: "ffmpeg".into(),
        }));
        assert!(err.is_cancelled());
        assert!(!StepError::other("x").is_cancelled());
    }
}
