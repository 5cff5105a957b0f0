//! Pipeline orchestrator for coordinating a sync run.
//!
//! A run is a sequence of steps that validate, execute, and record their
//! results in a shared [`JobState`]. [`SyncRunner`] sets up everything
//! around the pipeline (log file, scratch directory, worker pool) and
//! tears it down again.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Parse     (subtitle file -> cues)
//!     ├── Step: Match     (cue -> clip, duration, stretch plan)
//!     ├── Step: Process   (clip -> normalized, compressed WAV)
//!     └── Step: Assemble  (clips + silences -> output file)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dubsync_core::config::Settings;
//! use dubsync_core::models::SyncRequest;
//! use dubsync_core::orchestrator::{engine_from_settings, SyncRunner};
//!
//! let settings = Settings::default();
//! let engine = Arc::new(engine_from_settings(&settings.engine));
//! let request = SyncRequest::new("episode.srt", "voice_clips");
//!
//! let summary = SyncRunner::new(settings, "logs", engine).run(&request)?;
//! println!("{} of {} cues placed", summary.matched, summary.total_cues);
//! # Ok::<(), dubsync_core::orchestrator::PipelineError>(())
//! ```

mod errors;
mod pipeline;
mod runner;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use runner::{
    check_engine, engine_from_settings, leftover_scratch_dirs, SyncRunner, SyncSummary,
};
pub use step::PipelineStep;
pub use steps::{AssembleStep, MatchStep, ParseStep, ProcessStep};
pub use types::{AssembleOutput, Context, JobState, ProgressCallback};

/// Create the sync pipeline with all steps in order.
///
/// 1. Parse - read the subtitle file
/// 2. Match - locate, probe and plan a clip per cue
/// 3. Process - normalize and compress every matched clip
/// 4. Assemble - lay clips and silences out and concatenate
pub fn create_sync_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(ParseStep::new())
        .with_step(MatchStep::new())
        .with_step(ProcessStep::new())
        .with_step(AssembleStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_pipeline_has_steps_in_order() {
        let pipeline = create_sync_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec!["Parse", "Match", "Process", "Assemble"]
        );
    }
}
