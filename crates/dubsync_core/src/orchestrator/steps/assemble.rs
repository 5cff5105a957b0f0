//! Assemble step - lays processed clips on the timeline and writes the output.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{AssembleOutput, Context, JobState};
use crate::subtitles::format_timestamp;
use crate::timeline::{plan_timeline, AssemblyError, TimelineAssembler};

pub struct AssembleStep;

impl AssembleStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AssembleStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for AssembleStep {
    fn name(&self) -> &str {
        "Assemble"
    }

    fn description(&self) -> &str {
        "Building timeline"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let matches = state.processed_matches();
        let plan = plan_timeline(&matches, ctx.settings.processing.gap_epsilon);

        if plan.clip_count() == 0 {
            return Err(StepError::NoUsableClips {
                total: state.cue_count(),
            });
        }

        ctx.logger.info(&format!(
            "{} clips, {} gaps ({:.2}s of silence), ends at {}",
            plan.clip_count(),
            plan.silence_count(),
            plan.total_silence(),
            format_timestamp(plan.expected_duration)
        ));

        let output = ctx.request.output_path();
        let assembler = TimelineAssembler::new(
            ctx.engine.clone(),
            &ctx.work_dir,
            ctx.settings.processing.audio_format(),
        );

        let written = match assembler.assemble(&plan, &output, &ctx.cancel) {
            Ok(written) => written,
            Err(AssemblyError::Engine(e)) if !e.is_cancelled() => {
                ctx.logger.engine_failure("Assemble", &e);
                return Err(AssemblyError::Engine(e).into());
            }
            Err(e) => return Err(e.into()),
        };

        state.assembly = Some(AssembleOutput {
            output_path: written.output,
            segment_count: written.segment_count,
            silence_count: written.silence_files.len(),
            expected_duration: plan.expected_duration,
        });
        state.timeline = Some(plan);

        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let assembly = state
            .assembly
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Assembly not recorded"))?;

        if !assembly.output_path.is_file() {
            return Err(StepError::file_not_found(&assembly.output_path));
        }
        Ok(())
    }
}
