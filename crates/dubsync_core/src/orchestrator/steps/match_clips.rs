//! Match step - finds, probes and plans a clip for every cue.
//!
//! Cues are handled independently on the worker pool. Whatever happens to
//! one cue (no clip, unreadable clip) is recorded as its outcome and never
//! stops the batch.

use std::sync::Arc;

use crate::engine::AudioEngine;
use crate::matching::ClipLocator;
use crate::models::{ClipMatch, CueFailure, CueOutcome, MatchReport};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pipeline::CancelHandle;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};
use crate::stretch::StretchPlan;
use crate::subtitles::Cue;

const PROGRESS_AFTER_MATCH: f64 = 0.3;

pub struct MatchStep;

impl MatchStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MatchStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate, probe and plan one cue.
pub fn match_cue(
    cue: Cue,
    locator: &ClipLocator,
    engine: &dyn AudioEngine,
    cancel: &CancelHandle,
) -> CueOutcome {
    if cancel.is_cancelled() {
        return CueOutcome::failed(cue, None, CueFailure::Cancelled);
    }

    let Some(clip_path) = locator.locate(&cue) else {
        return CueOutcome::Unmatched { cue };
    };

    let clip_duration = match engine.probe_duration(&clip_path, cancel) {
        Ok(secs) => secs,
        Err(e) if e.is_cancelled() => {
            return CueOutcome::failed(cue, Some(clip_path), CueFailure::Cancelled)
        }
        Err(e) => {
            return CueOutcome::failed(cue, Some(clip_path), CueFailure::Probe(e.to_string()))
        }
    };

    match StretchPlan::for_durations(clip_duration, cue.duration()) {
        Ok(plan) => CueOutcome::Matched(ClipMatch::new(cue, clip_path, clip_duration, plan)),
        Err(e) => CueOutcome::failed(cue, Some(clip_path), CueFailure::Plan(e.to_string())),
    }
}

impl PipelineStep for MatchStep {
    fn name(&self) -> &str {
        "Match"
    }

    fn description(&self) -> &str {
        "Matching clips"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.request.audio_dir.is_dir() {
            return Err(StepError::file_not_found(&ctx.request.audio_dir));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let cues = state
            .cues
            .clone()
            .ok_or_else(|| StepError::invalid_input("Subtitles have not been parsed"))?;
        let total = cues.len();

        let locator = ClipLocator::new(&ctx.request.audio_dir);
        ctx.logger.debug(&format!(
            "{} audio files in {}",
            locator.candidate_count(),
            locator.dir().display()
        ));

        let engine: Arc<dyn AudioEngine> = Arc::clone(&ctx.engine);
        let cancel = ctx.cancel.clone();
        let outcomes = ctx.pool.map(
            cues,
            |cue| match_cue(cue, &locator, engine.as_ref(), &cancel),
            |_, _| {},
        );

        if ctx.is_cancelled() {
            return Err(StepError::Cancelled);
        }

        for outcome in &outcomes {
            match outcome {
                CueOutcome::Matched(m) => ctx.logger.cue_status(m),
                CueOutcome::Unmatched { cue } => {
                    ctx.logger
                        .warn(&format!("No clip found for cue {}", cue.index));
                }
                CueOutcome::Failed {
                    cue,
                    clip_path,
                    reason,
                } => {
                    let clip = clip_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    ctx.logger
                        .error(&format!("Cue {} ({}): {}", cue.index, clip, reason));
                }
            }
        }

        let report = MatchReport::new(outcomes);
        ctx.logger.match_summary(&report);

        if report.matched_count() == 0 {
            return Err(StepError::NoUsableClips { total });
        }

        state.report = Some(report);
        ctx.report_progress(self.name(), PROGRESS_AFTER_MATCH, "Clips matched");
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.report {
            Some(report) if report.total() == state.cue_count() => Ok(()),
            Some(_) => Err(StepError::invalid_output(
                "Match report does not cover every cue",
            )),
            None => Err(StepError::invalid_output("Match report not recorded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_clip, FakeEngine};
    use tempfile::tempdir;

    #[test]
    fn unmatched_cue_is_reported() {
        let dir = tempdir().unwrap();
        let locator = ClipLocator::new(dir.path());
        let outcome = match_cue(
            Cue::new(4, 0.0, 1.0, ""),
            &locator,
            &FakeEngine::new(),
            &CancelHandle::new(),
        );
        assert!(matches!(outcome, CueOutcome::Unmatched { .. }));
    }

    #[test]
    fn probe_failure_is_scoped_to_the_cue() {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("0002.wav");
        write_clip(&clip, 1.0);
        let engine = FakeEngine::new();
        engine.fail_on(clip.clone());

        let outcome = match_cue(
            Cue::new(2, 0.0, 1.0, ""),
            &ClipLocator::new(dir.path()),
            &engine,
            &CancelHandle::new(),
        );

        assert!(matches!(
            outcome,
            CueOutcome::Failed { reason: CueFailure::Probe(_), clip_path: Some(ref p), .. } if p == &clip
        ));
    }

    #[test]
    fn overrunning_clip_gets_a_speed_factor() {
        let dir = tempdir().unwrap();
        write_clip(&dir.path().join("0001_line.wav"), 3.0);

        let outcome = match_cue(
            Cue::new(1, 10.0, 12.0, ""),
            &ClipLocator::new(dir.path()),
            &FakeEngine::new(),
            &CancelHandle::new(),
        );

        let m = outcome.as_match().unwrap();
        assert!(m.needs_compression());
        assert!((m.speed_factor() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn cancelled_cue_is_not_probed() {
        let dir = tempdir().unwrap();
        write_clip(&dir.path().join("0001.wav"), 1.0);
        let cancel = CancelHandle::new();
        cancel.cancel();

        let outcome = match_cue(
            Cue::new(1, 0.0, 1.0, ""),
            &ClipLocator::new(dir.path()),
            &FakeEngine::new(),
            &cancel,
        );
        assert!(matches!(
            outcome,
            CueOutcome::Failed {
                reason: CueFailure::Cancelled,
                ..
            }
        ));
    }
}
