//! External audio engine boundary.
//!
//! The core never decodes or encodes audio itself. Everything goes through
//! two capabilities of an [`AudioEngine`]:
//!
//! - `probe_duration(path)` - length of a media file in seconds
//! - `run(job)` - one transcode/stretch, silence, or concat job
//!
//! [`FfmpegEngine`] implements both on top of the FFmpeg/FFprobe command
//! line tools. Calls are blocking; each takes a [`CancelHandle`] and kills
//! its child process when the run is cancelled.

mod discovery;
mod ffmpeg;
mod jobs;
pub mod probe;
mod runner;
mod types;

pub use discovery::{ffprobe_for, EnginePaths};
pub use ffmpeg::{FfmpegEngine, DEFAULT_PROBE_TIMEOUT_SECS};
pub use jobs::EngineJob;
pub use runner::{tool_name, CommandRunner};
pub use types::{
    AudioFormat, CommandOutput, EngineError, EngineResult, COMMON_SAMPLE_RATES,
    DEFAULT_SAMPLE_RATE,
};

use std::path::Path;

use crate::orchestrator::CancelHandle;

/// Capabilities the pipeline needs from an audio engine.
///
/// Implementations must be safe to call from several worker threads at
/// once; each call works on its own files.
pub trait AudioEngine: Send + Sync {
    /// Engine name for logs.
    fn name(&self) -> &str;

    /// Duration of `path` in seconds.
    fn probe_duration(&self, path: &Path, cancel: &CancelHandle) -> EngineResult<f64>;

    /// Run a job to completion. Non-zero exit is an error carrying stderr.
    fn run(&self, job: &EngineJob, cancel: &CancelHandle) -> EngineResult<CommandOutput>;
}
