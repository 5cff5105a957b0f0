//! FFmpeg-backed [`AudioEngine`].

use std::path::Path;
use std::time::Duration;

use crate::orchestrator::CancelHandle;

use super::discovery::EnginePaths;
use super::jobs::EngineJob;
use super::probe;
use super::runner::{tool_name, CommandRunner};
use super::types::{CommandOutput, EngineError, EngineResult};
use super::AudioEngine;

/// Default limit for duration probes.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Limit for the `-version` self-test.
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs probes with FFprobe and jobs with FFmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    paths: EnginePaths,
    probe_runner: CommandRunner,
    job_runner: CommandRunner,
}

impl FfmpegEngine {
    /// Engine with the default probe timeout and unbounded jobs.
    pub fn new(paths: EnginePaths) -> Self {
        Self {
            paths,
            probe_runner: CommandRunner::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            job_runner: CommandRunner::new(),
        }
    }

    /// Override timeouts (`0` = unbounded).
    pub fn with_timeouts(mut self, probe_secs: u64, job_secs: u64) -> Self {
        self.probe_runner = CommandRunner::from_secs(probe_secs);
        self.job_runner = CommandRunner::from_secs(job_secs);
        self
    }

    pub fn paths(&self) -> &EnginePaths {
        &self.paths
    }

    /// Run `ffmpeg -version` and return its first line.
    pub fn version(&self) -> EngineResult<String> {
        let runner = CommandRunner::with_timeout(VERSION_TIMEOUT);
        let output = runner.run(&self.paths.ffmpeg, ["-version"], &CancelHandle::new())?;
        let output = require_success(&self.paths.ffmpeg, output)?;

        Ok(output
            .stdout
            .lines()
            .next()
            .map(str::to_string)
            .unwrap_or_else(|| "Unknown version".to_string()))
    }
}

impl AudioEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn probe_duration(&self, path: &Path, cancel: &CancelHandle) -> EngineResult<f64> {
        if !path.exists() {
            return Err(EngineError::NotFound(path.to_path_buf()));
        }

        let output =
            self.probe_runner
                .run(&self.paths.ffprobe, probe::duration_args(path), cancel)?;
        let output = require_success(&self.paths.ffprobe, output)?;
        probe::parse_duration(&output.stdout)
    }

    fn run(&self, job: &EngineJob, cancel: &CancelHandle) -> EngineResult<CommandOutput> {
        if let Some(input) = job.input() {
            if !input.exists() {
                return Err(EngineError::NotFound(input.to_path_buf()));
            }
        }

        let output = self
            .job_runner
            .run(&self.paths.ffmpeg, job.to_args(), cancel)?;
        let output = require_success(&self.paths.ffmpeg, output)?;

        tracing::debug!(
            "{} job wrote {}",
            job.label(),
            job.output().display()
        );
        Ok(output)
    }
}

fn require_success(program: &Path, output: CommandOutput) -> EngineResult<CommandOutput> {
    if output.success() {
        Ok(output)
    } else {
        Err(EngineError::command_failed(
            tool_name(program),
            output.exit_code,
            output.stderr.trim(),
        ))
    }
}
