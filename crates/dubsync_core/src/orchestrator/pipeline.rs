//! Pipeline runner that executes steps in sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::PipelineStep;
use super::types::{Context, JobState};

/// Pipeline that runs a sequence of steps.
///
/// Steps run in order with validation before and after each one. The
/// context's cancel flag is checked at every step boundary.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run the pipeline with the given context and state.
    ///
    /// Executes each step in order:
    /// 1. Check for cancellation
    /// 2. Run `validate_input`
    /// 3. Run `execute`
    /// 4. Run `validate_output`
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
        };

        for step in &self.steps {
            let step_name = step.name();

            if ctx.is_cancelled() {
                ctx.logger
                    .warn(&format!("Pipeline cancelled before step '{}'", step_name));
                return Err(PipelineError::cancelled(&ctx.job_name));
            }

            ctx.logger.phase(step.description());

            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", step_name));
            if let Err(e) = step.execute(ctx, state) {
                return Err(self.fail(ctx, step_name, e));
            }

            ctx.logger
                .debug(&format!("Validating output for '{}'", step_name));
            if let Err(e) = step.validate_output(ctx, state) {
                ctx.logger.error(&format!("Output validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            ctx.logger.debug(&format!("{} completed", step_name));
            result.steps_completed.push(step_name.to_string());
        }

        ctx.report_progress("Complete", 1.0, "Pipeline finished");
        Ok(result)
    }

    fn fail(&self, ctx: &Context, step_name: &str, e: StepError) -> PipelineError {
        if e.is_cancelled() || ctx.is_cancelled() {
            ctx.logger
                .warn(&format!("Stopped during '{}' by user request", step_name));
            return PipelineError::cancelled(&ctx.job_name);
        }
        ctx.logger.error(&format!("{} failed: {}", step_name, e));
        PipelineError::step_failed(&ctx.job_name, step_name, e)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for cancelling a running sync.
///
/// Clones share one flag. Steps stop at the next boundary, per-cue jobs
/// that have not started are skipped, and a running engine process is
/// killed.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Names of the steps that ran, in order.
    pub steps_completed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::{JobLogger, LogConfig};
    use crate::models::SyncRequest;
    use crate::processing::WorkerPool;
    use crate::test_support::FakeEngine;
    use std::sync::atomic::AtomicUsize;
    use tempfile::{tempdir, TempDir};

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingStep {
        fn new(name: &'static str, counter: &Arc<AtomicUsize>) -> Self {
            Self {
                name,
                execute_count: Arc::clone(counter),
                fail: false,
            }
        }
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> Result<(), StepError> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> Result<(), StepError> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StepError::other("boom"))
            } else {
                Ok(())
            }
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> Result<(), StepError> {
            Ok(())
        }
    }

    fn context(dir: &TempDir) -> Context {
        let logger = JobLogger::new("pipeline_test", dir.path(), LogConfig::default(), None).unwrap();
        Context::new(
            SyncRequest::new(dir.path().join("a.srt"), dir.path()),
            Settings::default(),
            dir.path().to_path_buf(),
            Arc::new(logger),
            Arc::new(FakeEngine::new()),
            WorkerPool::new(1).unwrap(),
        )
    }

    #[test]
    fn pipeline_builds_correctly() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(CountingStep::new("Step1", &counter))
            .with_step(CountingStep::new("Step2", &counter));

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn runs_every_step() {
        let dir = tempdir().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(CountingStep::new("Step1", &counter))
            .with_step(CountingStep::new("Step2", &counter));

        let result = pipeline
            .run(&context(&dir), &mut JobState::new("t"))
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(result.steps_completed, vec!["Step1", "Step2"]);
    }

    #[test]
    fn failure_names_the_step() {
        let dir = tempdir().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let mut failing = CountingStep::new("Broken", &counter);
        failing.fail = true;
        let pipeline = Pipeline::new()
            .with_step(failing)
            .with_step(CountingStep::new("After", &counter));

        let err = pipeline
            .run(&context(&dir), &mut JobState::new("t"))
            .unwrap_err();

        assert!(matches!(err, PipelineError::StepFailed { ref step_name, .. } if step_name == "Broken"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelled_context_stops_before_first_step() {
        let dir = tempdir().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new().with_step(CountingStep::new("Step1", &counter));

        let cancel = CancelHandle::new();
        let ctx = context(&dir).with_cancel_handle(cancel.clone());
        cancel.cancel();

        let err = pipeline.run(&ctx, &mut JobState::new("t")).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancel_handle_clones_share_flag() {
        let handle = CancelHandle::new();
        let other = handle.clone();

        assert!(!other.is_cancelled());
        handle.cancel();
        assert!(other.is_cancelled());
    }
}
