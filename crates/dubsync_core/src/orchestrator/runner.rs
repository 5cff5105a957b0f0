//! Sync runner - drives one complete sync from request to output file.
//!
//! Owns everything around the pipeline: the run log, the scratch
//! directory, the worker pool and the final report.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tempfile::TempDir;

use crate::config::{EngineSettings, Settings};
use crate::engine::{AudioEngine, EnginePaths, EngineResult, FfmpegEngine};
use crate::logging::{JobLogger, JobLoggerBuilder, LogCallback};
use crate::models::SyncRequest;
use crate::processing::WorkerPool;

use super::errors::{PipelineError, PipelineResult};
use super::pipeline::CancelHandle;
use super::types::{Context, JobState, ProgressCallback};
use super::create_sync_pipeline;

/// Output durations further than this from the timeline get a warning.
const DURATION_TOLERANCE_SECS: f64 = 0.1;

/// Summary of a finished sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub job_name: String,
    pub output_path: PathBuf,
    pub total_cues: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub failed: usize,
    /// End of the last placed cue.
    pub expected_duration: f64,
    /// Probed length of the written file, if the probe worked.
    pub output_duration: Option<f64>,
    pub log_path: PathBuf,
    /// Scratch directory left on disk when `keep_temp` is set.
    pub kept_scratch: Option<PathBuf>,
}

/// Runs sync requests with one set of settings and one engine.
pub struct SyncRunner {
    settings: Settings,
    logs_dir: PathBuf,
    engine: Arc<dyn AudioEngine>,
    cancel: CancelHandle,
    log_callback: Option<LogCallback>,
    progress_callback: Option<ProgressCallback>,
}

impl SyncRunner {
    pub fn new(settings: Settings, logs_dir: impl Into<PathBuf>, engine: Arc<dyn AudioEngine>) -> Self {
        Self {
            settings,
            logs_dir: logs_dir.into(),
            engine,
            cancel: CancelHandle::new(),
            log_callback: None,
            progress_callback: None,
        }
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Receive every formatted log line (in addition to the log file).
    pub fn with_log_callback(mut self, callback: LogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Handle that stops this runner when cancelled.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run one sync.
    ///
    /// The scratch directory is removed afterwards whatever the outcome,
    /// unless `keep_temp` is set.
    pub fn run(self, request: &SyncRequest) -> PipelineResult<SyncSummary> {
        let job_name = request.job_name();

        self.settings
            .validate()
            .map_err(|msg| PipelineError::validation_failed(&job_name, msg))?;

        let mut builder = JobLoggerBuilder::new(&job_name, &self.logs_dir)
            .config(self.settings.logging.to_log_config());
        if let Some(callback) = self.log_callback {
            builder = builder.callback(callback);
        }
        let logger = Arc::new(builder.build().map_err(|e| {
            PipelineError::setup_failed(&job_name, format!("Failed to create log file: {}", e))
        })?);

        let output_path = request.output_path();
        logger.section(&format!("Sync: {}", job_name));
        logger.info(&format!("Subtitles: {}", request.srt_path.display()));
        logger.info(&format!("Clips: {}", request.audio_dir.display()));
        logger.info(&format!("Output: {}", output_path.display()));
        logger.debug(&format!("Engine: {}", self.engine.name()));

        let scratch = create_scratch_dir(&self.settings).map_err(|e| {
            logger.error(&format!("Failed to create scratch directory: {}", e));
            PipelineError::setup_failed(&job_name, format!("Failed to create scratch directory: {}", e))
        })?;
        logger.debug(&format!("Scratch: {}", scratch.path().display()));

        let pool = WorkerPool::new(self.settings.processing.workers).map_err(|e| {
            logger.error(&format!("Failed to start workers: {}", e));
            PipelineError::setup_failed(&job_name, format!("Failed to start workers: {}", e))
        })?;

        let keep_temp = self.settings.processing.keep_temp;
        let mut ctx = Context::new(
            request.clone(),
            self.settings,
            scratch.path().to_path_buf(),
            Arc::clone(&logger),
            Arc::clone(&self.engine),
            pool,
        )
        .with_cancel_handle(self.cancel.clone());
        if let Some(callback) = self.progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = JobState::new(&job_name);
        let result = create_sync_pipeline().run(&ctx, &mut state);
        drop(ctx);

        let kept_scratch = finish_scratch(scratch, keep_temp, &logger);

        if let Err(e) = result {
            if e.is_cancelled() {
                logger.warn("Sync cancelled");
            } else {
                logger.error(&format!("Sync failed: {}", e));
            }
            logger.flush();
            return Err(e);
        }

        let output_duration = match self.engine.probe_duration(&output_path, &self.cancel) {
            Ok(secs) => {
                logger.info(&format!(
                    "Total duration: {:.2}s ({:.1} min)",
                    secs,
                    secs / 60.0
                ));
                Some(secs)
            }
            Err(e) => {
                logger.warn(&format!("Could not read output duration: {}", e));
                None
            }
        };

        let expected_duration = state
            .assembly
            .as_ref()
            .map_or(0.0, |a| a.expected_duration);
        if let Some(actual) = output_duration {
            if (actual - expected_duration).abs() > DURATION_TOLERANCE_SECS {
                logger.warn(&format!(
                    "Output is {:.2}s, timeline ends at {:.2}s",
                    actual, expected_duration
                ));
            }
        }

        let (total_cues, matched, unmatched, failed) = state.report.as_ref().map_or(
            (state.cue_count(), 0, 0, 0),
            |r| (r.total(), r.matched_count(), r.unmatched_count(), r.failed_count()),
        );

        logger.success(&format!("Saved: {}", output_path.display()));
        if let Some(report) = &state.report {
            logger.match_summary(report);
        }
        logger.flush();

        Ok(SyncSummary {
            job_name,
            output_path,
            total_cues,
            matched,
            unmatched,
            failed,
            expected_duration,
            output_duration,
            log_path: logger.log_path().to_path_buf(),
            kept_scratch,
        })
    }
}

/// Create the per-run scratch directory under the configured temp root.
fn create_scratch_dir(settings: &Settings) -> std::io::Result<TempDir> {
    let root = match settings.paths.temp_root.trim() {
        "" => env::temp_dir(),
        root => PathBuf::from(root),
    };
    fs::create_dir_all(&root)?;
    tempfile::Builder::new().prefix("dubsync_").tempdir_in(root)
}

fn finish_scratch(scratch: TempDir, keep: bool, logger: &JobLogger) -> Option<PathBuf> {
    if keep {
        let path = scratch.keep();
        logger.info(&format!("Scratch files kept in {}", path.display()));
        return Some(path);
    }

    let path = scratch.path().to_path_buf();
    match scratch.close() {
        Ok(()) => logger.debug("Removed scratch files"),
        Err(e) => logger.warn(&format!(
            "Could not remove scratch files in {}: {}",
            path.display(),
            e
        )),
    }
    None
}

/// Build the FFmpeg engine described by the settings.
pub fn engine_from_settings(settings: &EngineSettings) -> FfmpegEngine {
    let paths = EnginePaths::resolve(settings.ffmpeg_override(), settings.ffprobe_override());
    FfmpegEngine::new(paths).with_timeouts(settings.probe_timeout_secs, settings.job_timeout_secs)
}

/// Resolve the engine binaries and ask FFmpeg for its version line.
pub fn check_engine(settings: &EngineSettings) -> EngineResult<(EnginePaths, String)> {
    let engine = engine_from_settings(settings);
    let version = engine.version()?;
    Ok((engine.paths().clone(), version))
}

/// Scratch directories created by runs under `root`.
pub fn leftover_scratch_dirs(root: &Path) -> Vec<PathBuf> {
    fs::read_dir(root)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| {
                    p.is_dir()
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| n.starts_with("dubsync_"))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_tracing;
    use crate::orchestrator::StepError;
    use crate::test_support::{read_duration, write_clip, FakeEngine};
    use parking_lot::Mutex;
    use std::fs;
    use tempfile::tempdir;

    const THREE_CUES: &str = "1\n00:00:00,000 --> 00:00:01,500\nHello\n\n\
                              2\n00:00:02,000 --> 00:00:03,000\nNo clip\n\n\
                              3\n00:00:05,000 --> 00:00:06,000\nToo long\n";

    struct Fixture {
        dir: TempDir,
        request: SyncRequest,
        settings: Settings,
    }

    impl Fixture {
        fn new(srt: &str) -> Self {
            init_test_tracing();
            let dir = tempdir().unwrap();
            let srt_path = dir.path().join("episode.srt");
            fs::write(&srt_path, srt).unwrap();
            let clips = dir.path().join("clips");
            fs::create_dir(&clips).unwrap();

            let mut settings = Settings::default();
            settings.paths.temp_root = dir.path().join("tmp").to_string_lossy().into_owned();
            settings.processing.workers = 2;
            settings.logging.compact = false;

            let request = SyncRequest::new(srt_path, clips);
            Self {
                dir,
                request,
                settings,
            }
        }

        fn clip(&self, name: &str, secs: f64) {
            write_clip(&self.request.audio_dir.join(name), secs);
        }

        fn scratch_root(&self) -> PathBuf {
            self.dir.path().join("tmp")
        }

        fn runner(&self) -> SyncRunner {
            self.runner_with(Arc::new(FakeEngine::new()))
        }

        fn runner_with(&self, engine: Arc<FakeEngine>) -> SyncRunner {
            SyncRunner::new(self.settings.clone(), self.dir.path().join("logs"), engine)
        }
    }

    fn capture() -> (LogCallback, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        (Box::new(move |line: &str| sink.lock().push(line.to_string())), lines)
    }

    #[test]
    fn syncs_matched_clips_onto_cue_timeline() {
        let fx = Fixture::new(THREE_CUES);
        fx.clip("0001.wav", 1.5);
        fx.clip("003_line.mp3", 2.0);
        let (callback, lines) = capture();

        let summary = fx.runner().with_log_callback(callback).run(&fx.request).unwrap();

        assert_eq!(summary.output_path, fx.request.audio_dir.join("output_synced.wav"));
        assert_eq!(summary.total_cues, 3);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.failed, 0);
        assert!((summary.expected_duration - 6.0).abs() < 1e-6);
        assert!((summary.output_duration.unwrap() - 6.0).abs() < 1e-6);
        assert!((read_duration(&summary.output_path).unwrap() - 6.0).abs() < 1e-6);

        let lines = lines.lock();
        assert!(lines.iter().any(|l| l.contains("No clip found for cue 2")));
        assert!(lines.iter().any(|l| l.contains("Match: 2/3")));
        assert!(lines.iter().any(|l| l.contains("Total duration: 6.00s")));

        assert!(summary.log_path.is_file());
        assert!(summary.kept_scratch.is_none());
        assert!(leftover_scratch_dirs(&fx.scratch_root()).is_empty());
    }

    #[test]
    fn explicit_output_path_is_used() {
        let fx = Fixture::new(THREE_CUES);
        fx.clip("0001.wav", 1.0);
        let output = fx.dir.path().join("out").join("dub.wav");
        let request = fx.request.clone().with_output(&output);

        let summary = fx.runner().run(&request).unwrap();

        assert_eq!(summary.output_path, output);
        assert!(output.is_file());
        assert!(!fx.request.audio_dir.join("output_synced.wav").exists());
    }

    #[test]
    fn keep_temp_leaves_processed_clips() {
        let mut fx = Fixture::new(THREE_CUES);
        fx.settings.processing.keep_temp = true;
        fx.clip("0001.wav", 1.0);
        fx.clip("0003.wav", 1.0);

        let summary = fx.runner().run(&fx.request).unwrap();

        let kept = summary.kept_scratch.expect("scratch kept");
        assert!(kept.join("0001_0001_processed.wav").is_file());
        assert!(kept.join("0003_0003_processed.wav").is_file());
        assert!(kept.join("concat_list.txt").is_file());
        assert_eq!(leftover_scratch_dirs(&fx.scratch_root()), vec![kept]);
    }

    #[test]
    fn empty_track_fails_at_parse() {
        let fx = Fixture::new("\n\n");

        let err = fx.runner().run(&fx.request).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StepFailed { ref step_name, source: StepError::EmptyTrack { .. }, .. }
                if step_name == "Parse"
        ));
        assert!(leftover_scratch_dirs(&fx.scratch_root()).is_empty());
    }

    #[test]
    fn no_clips_fails_without_output() {
        let fx = Fixture::new(THREE_CUES);

        let err = fx.runner().run(&fx.request).unwrap_err();

        assert!(matches!(
            err.step_error(),
            Some(StepError::NoUsableClips { total: 3 })
        ));
        assert!(!fx.request.output_path().exists());
        assert!(leftover_scratch_dirs(&fx.scratch_root()).is_empty());
    }

    #[test]
    fn cancelled_run_cleans_up() {
        let fx = Fixture::new(THREE_CUES);
        fx.clip("0001.wav", 1.0);
        let runner = fx.runner();
        runner.cancel_handle().cancel();

        let err = runner.run(&fx.request).unwrap_err();

        assert!(err.is_cancelled());
        assert!(!fx.request.output_path().exists());
        assert!(leftover_scratch_dirs(&fx.scratch_root()).is_empty());
    }

    #[test]
    fn cancel_during_processing_stops_remaining_clips() {
        let mut fx = Fixture::new(THREE_CUES);
        fx.settings.processing.workers = 1;
        fx.clip("0001.wav", 1.0);
        fx.clip("0002.wav", 1.0);
        fx.clip("0003.wav", 1.0);
        let engine = Arc::new(FakeEngine::new());
        let cancel = CancelHandle::new();
        engine.cancel_after(1, cancel.clone());
        let (callback, lines) = capture();

        let err = fx
            .runner_with(engine.clone())
            .with_cancel_handle(cancel)
            .with_log_callback(callback)
            .run(&fx.request)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled { .. }));
        let jobs = engine.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].label(), "transcode");
        assert!(!fx.request.output_path().exists());
        assert!(leftover_scratch_dirs(&fx.scratch_root()).is_empty());
        assert!(lines.lock().iter().any(|l| l.contains("Stopped during 'Process'")));
    }

    #[test]
    fn progress_ends_at_one() {
        let fx = Fixture::new(THREE_CUES);
        fx.clip("0001.wav", 1.0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        fx.runner()
            .with_progress_callback(Box::new(move |_: &str, fraction: f64, _: &str| sink.lock().push(fraction)))
            .run(&fx.request)
            .unwrap();

        let seen = seen.lock();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.first().copied(), Some(0.1));
        assert_eq!(seen.last().copied(), Some(1.0));
    }

    #[test]
    fn invalid_settings_are_rejected_before_setup() {
        let mut fx = Fixture::new(THREE_CUES);
        fx.settings.processing.sample_rate = 0;

        let err = fx.runner().run(&fx.request).unwrap_err();

        assert!(matches!(err, PipelineError::ValidationFailed { .. }));
        assert!(!fx.dir.path().join("logs").exists());
    }
}
