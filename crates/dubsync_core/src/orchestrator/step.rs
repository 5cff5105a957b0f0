//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, JobState};

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step produced valid output
///
/// # Example
///
/// ```ignore
/// struct ParseStep;
///
/// impl PipelineStep for ParseStep {
///     fn name(&self) -> &str { "Parse" }
///
///     fn validate_input(&self, ctx: &Context) -> StepResult<()> {
///         if !ctx.request.srt_path.is_file() {
///             return Err(StepError::file_not_found(&ctx.request.srt_path));
///         }
///         Ok(())
///     }
///
///     fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
///         state.cues = Some(load_cue_track(&ctx.request.srt_path)?);
///         Ok(())
///     }
///
///     fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
///         if state.cues.is_none() {
///             return Err(StepError::invalid_output("Cues not recorded"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Step name (for logging and error context).
    fn name(&self) -> &str;

    /// Check preconditions (files exist, previous steps recorded output).
    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Perform the step's processing and record results in `state`.
    ///
    /// Use `ctx.logger` for logging and `ctx.report_progress()` for progress.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()>;

    /// Called after `execute` succeeds.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
