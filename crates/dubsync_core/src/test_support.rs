//! In-process engine for tests.
//!
//! Media files are plain text holding their duration in seconds, so probes
//! and jobs can be checked without FFmpeg installed.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::engine::{AudioEngine, CommandOutput, EngineError, EngineJob, EngineResult};
use crate::orchestrator::CancelHandle;

#[derive(Debug, Default)]
pub struct FakeEngine {
    jobs: Mutex<Vec<EngineJob>>,
    failing: Mutex<HashSet<PathBuf>>,
    cancel_after: Mutex<Option<(usize, CancelHandle)>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every probe or job touching `path` fail.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().insert(path.into());
    }

    /// Trip `handle` once `jobs` jobs have finished, as a user pressing
    /// Ctrl+C mid-run would.
    pub fn cancel_after(&self, jobs: usize, handle: CancelHandle) {
        *self.cancel_after.lock() = Some((jobs, handle));
    }

    pub fn jobs(&self) -> Vec<EngineJob> {
        self.jobs.lock().clone()
    }

    fn check_failing(&self, path: &Path) -> EngineResult<()> {
        if self.failing.lock().contains(path) {
            Err(EngineError::command_failed("fake", 1, "forced failure"))
        } else {
            Ok(())
        }
    }
}

/// Write a fake clip of `secs` seconds.
pub fn write_clip(path: &Path, secs: f64) {
    fs::write(path, format!("{}", secs)).unwrap();
}

pub fn read_duration(path: &Path) -> EngineResult<f64> {
    let text = fs::read_to_string(path).map_err(|e| EngineError::io("read fake media", e))?;
    text.trim()
        .parse()
        .map_err(|_| EngineError::invalid_output("fake", text.clone()))
}

fn tempo_product(filter: &str) -> f64 {
    filter
        .split(',')
        .filter_map(|stage| stage.strip_prefix("atempo="))
        .filter_map(|v| v.parse::<f64>().ok())
        .product()
}

fn manifest_entries(manifest: &Path) -> EngineResult<Vec<PathBuf>> {
    let text = fs::read_to_string(manifest).map_err(|e| EngineError::io("read manifest", e))?;
    Ok(text
        .lines()
        .filter_map(|line| line.strip_prefix("file '")?.strip_suffix('\''))
        .map(|quoted| PathBuf::from(quoted.replace("'\\''", "'")))
        .collect())
}

impl AudioEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn probe_duration(&self, path: &Path, cancel: &CancelHandle) -> EngineResult<f64> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled { tool: "fake".into() });
        }
        self.check_failing(path)?;
        if !path.exists() {
            return Err(EngineError::NotFound(path.to_path_buf()));
        }
        read_duration(path)
    }

    fn run(&self, job: &EngineJob, cancel: &CancelHandle) -> EngineResult<CommandOutput> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled { tool: "fake".into() });
        }
        if let Some(input) = job.input() {
            self.check_failing(input)?;
        }
        self.jobs.lock().push(job.clone());

        let duration = match job {
            EngineJob::Transcode { input, filter, .. } => {
                let secs = read_duration(input)?;
                match filter {
                    Some(chain) => secs / tempo_product(chain),
                    None => secs,
                }
            }
            EngineJob::Silence { duration_secs, .. } => *duration_secs,
            EngineJob::Concat { manifest, .. } => manifest_entries(manifest)?
                .iter()
                .map(|p| read_duration(p))
                .sum::<EngineResult<f64>>()?,
        };

        fs::write(job.output(), format!("{}", duration))
            .map_err(|e| EngineError::io("write fake media", e))?;

        if let Some((after, handle)) = &*self.cancel_after.lock() {
            if self.jobs.lock().len() >= *after {
                handle.cancel();
            }
        }

        Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        })
    }
}
