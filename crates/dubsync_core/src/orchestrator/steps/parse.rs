//! Parse step - reads the subtitle file into cues.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};
use crate::subtitles::load_cue_track;

/// Fraction reported once the subtitle file is parsed.
const PROGRESS_AFTER_PARSE: f64 = 0.1;

pub struct ParseStep;

impl ParseStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ParseStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ParseStep {
    fn name(&self) -> &str {
        "Parse"
    }

    fn description(&self) -> &str {
        "Reading subtitles"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.request.srt_path.is_file() {
            return Err(StepError::file_not_found(&ctx.request.srt_path));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let path = &ctx.request.srt_path;
        let cues = load_cue_track(path)?;

        if cues.is_empty() {
            return Err(StepError::empty_track(path));
        }

        ctx.logger
            .info(&format!("Read {} cues from {}", cues.len(), path.display()));
        if let (Some(first), Some(last)) = (cues.first(), cues.last()) {
            ctx.logger
                .debug(&format!("Cue indices {}..={}", first.index, last.index));
        }

        state.cues = Some(cues);
        ctx.report_progress(self.name(), PROGRESS_AFTER_PARSE, "Subtitles parsed");
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.cue_count() == 0 {
            return Err(StepError::invalid_output("Cues not recorded"));
        }
        Ok(())
    }
}
