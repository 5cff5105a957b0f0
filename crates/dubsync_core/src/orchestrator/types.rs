//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::engine::AudioEngine;
use crate::logging::JobLogger;
use crate::models::{ClipMatch, MatchReport, SyncRequest};
use crate::processing::WorkerPool;
use crate::subtitles::Cue;
use crate::timeline::TimelinePlan;

use super::pipeline::CancelHandle;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, fraction_complete in `0.0..=1.0`, message)
pub type ProgressCallback = Box<dyn Fn(&str, f64, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Contains run configuration and shared resources that steps can read
/// but not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// Subtitle file, clip directory and output.
    pub request: SyncRequest,
    /// Application settings.
    pub settings: Settings,
    /// Run name/identifier.
    pub job_name: String,
    /// Per-run scratch directory for processed clips and silences.
    pub work_dir: PathBuf,
    /// Per-run logger.
    pub logger: Arc<JobLogger>,
    /// Engine for probes and jobs.
    pub engine: Arc<dyn AudioEngine>,
    /// Pool for per-cue work.
    pub pool: WorkerPool,
    /// Shared stop flag.
    pub cancel: CancelHandle,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        request: SyncRequest,
        settings: Settings,
        work_dir: PathBuf,
        logger: Arc<JobLogger>,
        engine: Arc<dyn AudioEngine>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            request,
            settings,
            job_name: logger.job_name().to_string(),
            work_dir,
            logger,
            engine,
            pool,
            cancel: CancelHandle::new(),
            progress_callback: None,
        }
    }

    /// Share an existing cancel flag (e.g. wired to Ctrl+C).
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Report progress to the callback (if set) and the run log.
    pub fn report_progress(&self, step_name: &str, fraction: f64, message: &str) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.logger.progress((fraction * 100.0).round() as u32);
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, fraction, message);
        }
    }
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique run identifier.
    pub job_id: String,
    /// When the run started.
    pub started_at: Option<String>,
    /// Parsed cues, in index order (from Parse).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cues: Option<Vec<Cue>>,
    /// Per-cue outcomes (from Match, updated by Process).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<MatchReport>,
    /// Laid-out segments (from Assemble).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<TimelinePlan>,
    /// Written output (from Assemble).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembly: Option<AssembleOutput>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    pub fn cue_count(&self) -> usize {
        self.cues.as_ref().map_or(0, Vec::len)
    }

    /// Matched clips that have a processed file.
    pub fn processed_matches(&self) -> Vec<ClipMatch> {
        self.report
            .as_ref()
            .map(|r| r.matches().filter(|m| m.is_processed()).cloned().collect())
            .unwrap_or_default()
    }
}

/// Output from the Assemble step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembleOutput {
    pub output_path: PathBuf,
    pub segment_count: usize,
    pub silence_count: usize,
    /// End of the last placed cue.
    pub expected_duration: f64,
}
