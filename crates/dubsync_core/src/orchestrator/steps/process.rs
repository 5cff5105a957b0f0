//! Process step - normalizes and time-compresses every matched clip.

use crate::models::{CueFailure, CueOutcome};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};
use crate::processing::ClipProcessor;

/// Processing spans progress from 0.3 to 0.8.
const PROGRESS_START: f64 = 0.3;
const PROGRESS_SPAN: f64 = 0.5;

pub struct ProcessStep;

impl ProcessStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ProcessStep {
    fn name(&self) -> &str {
        "Process"
    }

    fn description(&self) -> &str {
        "Processing clips"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.work_dir.is_dir() {
            return Err(StepError::file_not_found(&ctx.work_dir));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let mut report = state
            .report
            .take()
            .ok_or_else(|| StepError::invalid_input("Clips have not been matched"))?;
        let total_cues = report.total();

        let pending = report.take_matches();
        let total = pending.len();
        ctx.logger.info(&format!(
            "Processing {} clips at {} Hz with {} workers",
            total,
            ctx.settings.processing.sample_rate,
            ctx.pool.threads()
        ));

        let processor = ClipProcessor::new(
            ctx.engine.clone(),
            &ctx.work_dir,
            ctx.settings.processing.audio_format(),
        );
        let cancel = ctx.cancel.clone();

        let processed = ctx.pool.map(
            pending,
            |mut clip| {
                if cancel.is_cancelled() {
                    return CueOutcome::failed(clip.cue, Some(clip.clip_path), CueFailure::Cancelled);
                }
                match processor.process(&mut clip, &cancel) {
                    Ok(_) => CueOutcome::Matched(clip),
                    Err(e) if e.is_cancelled() => {
                        CueOutcome::failed(clip.cue, Some(clip.clip_path), CueFailure::Cancelled)
                    }
                    Err(e) => {
                        ctx.logger
                            .engine_failure(&format!("Cue {}", clip.cue.index), &e);
                        let reason = CueFailure::Processing(e.to_string());
                        CueOutcome::failed(clip.cue, Some(clip.clip_path), reason)
                    }
                }
            },
            |done, total| {
                let fraction = PROGRESS_START + PROGRESS_SPAN * done as f64 / total as f64;
                ctx.report_progress(
                    self.name(),
                    fraction,
                    &format!("Processed clip {}/{}", done, total),
                );
            },
        );

        report.outcomes.extend(processed);
        report.outcomes.sort_by_key(|o| o.cue().index);

        // Clips not yet started when the run was stopped are marked cancelled.
        if ctx.is_cancelled() {
            state.report = Some(report);
            return Err(StepError::Cancelled);
        }

        let ready = report.matched_count();
        if ready < total {
            ctx.logger
                .warn(&format!("{} of {} clips failed to process", total - ready, total));
        }
        if ready == 0 {
            state.report = Some(report);
            return Err(StepError::NoUsableClips { total: total_cues });
        }

        ctx.logger.info(&format!("Processed {}/{} clips", ready, total));
        state.report = Some(report);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let report = state
            .report
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Match report missing after processing"))?;

        if let Some(m) = report.matches().find(|m| {
            m.processed_path
                .as_ref()
                .map_or(true, |p| !p.is_file())
        }) {
            return Err(StepError::invalid_output(format!(
                "Processed file for cue {} is missing",
                m.cue.index
            )));
        }
        Ok(())
    }
}
