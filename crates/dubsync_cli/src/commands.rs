//! Command implementations.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use dubsync_core::config::{default_config_path, ConfigManager, ConfigSection, EngineSettings};
use dubsync_core::logging::{init_tracing, init_tracing_with_file, LogLevel};
use dubsync_core::models::SyncRequest;
use dubsync_core::orchestrator::{
    check_engine, engine_from_settings, CancelHandle, PipelineError, SyncRunner,
};

use crate::exit_codes::ExitCode;
use crate::SyncArgs;

/// Flags shared by every subcommand.
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}

impl GlobalOpts {
    fn level(&self, configured: LogLevel) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else {
            configured
        }
    }
}

/// Point the engine at another FFmpeg binary. FFprobe is then looked up
/// next to it rather than at the configured path.
fn override_ffmpeg(engine: &mut EngineSettings, ffmpeg: String) {
    engine.ffmpeg_path = ffmpeg;
    engine.ffprobe_path.clear();
}

fn load_config(opts: &GlobalOpts) -> Result<ConfigManager> {
    let path = opts.config.clone().unwrap_or_else(default_config_path);
    let mut manager = ConfigManager::new(&path);
    manager
        .load_or_create()
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    manager
        .ensure_dirs_exist()
        .context("Failed to create working directories")?;
    Ok(manager)
}

pub fn sync(opts: &GlobalOpts, args: SyncArgs) -> ExitCode {
    let mut manager = match load_config(opts) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::GeneralError;
        }
    };

    let _guard = init_tracing_with_file(
        opts.level(manager.settings().logging.level),
        &manager.logs_folder(),
    );

    if !args.srt.is_file() {
        eprintln!("error: subtitle file not found: {}", args.srt.display());
        return ExitCode::InvalidArguments;
    }
    if !args.audio_dir.is_dir() {
        eprintln!("error: clip directory not found: {}", args.audio_dir.display());
        return ExitCode::InvalidArguments;
    }

    let settings = manager.settings_mut();
    if let Some(ffmpeg) = args.ffmpeg {
        override_ffmpeg(&mut settings.engine, ffmpeg);
    }
    if let Some(rate) = args.sample_rate {
        settings.processing.sample_rate = rate;
    }
    if let Some(workers) = args.workers {
        settings.processing.workers = workers;
    }
    if args.keep_temp {
        settings.processing.keep_temp = true;
    }
    if opts.verbose {
        settings.logging.level = LogLevel::Debug;
    }
    settings.paths.last_srt_path = args.srt.to_string_lossy().into_owned();
    settings.paths.last_audio_dir = args.audio_dir.to_string_lossy().into_owned();

    if let Err(e) = manager.update_section(ConfigSection::Paths) {
        tracing::warn!("Could not remember last inputs: {}", e);
    }

    let engine = engine_from_settings(&manager.settings().engine);
    match engine.version() {
        Ok(version) => tracing::debug!("Engine: {}", version),
        Err(e) => {
            eprintln!("error: FFmpeg is not usable: {}", e);
            return ExitCode::EngineUnavailable;
        }
    }

    let cancel = CancelHandle::new();
    let handle = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Stopping...");
        handle.cancel();
    }) {
        tracing::warn!("Ctrl+C handler not installed: {}", e);
    }

    let mut request = SyncRequest::new(&args.srt, &args.audio_dir);
    if let Some(output) = args.output {
        request = request.with_output(output);
    }

    let mut runner = SyncRunner::new(
        manager.settings().clone(),
        manager.logs_folder(),
        Arc::new(engine),
    )
    .with_cancel_handle(cancel)
    .with_progress_callback(Box::new(|step: &str, fraction: f64, message: &str| {
        tracing::debug!(step, percent = (fraction * 100.0).round(), "{}", message);
    }));
    if !opts.quiet && !args.json {
        runner = runner.with_log_callback(Box::new(|line: &str| println!("{}", line)));
    }

    match runner.run(&request) {
        Ok(summary) => {
            if args.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("error: {}", e),
                }
            } else if opts.quiet {
                println!("{}", summary.output_path.display());
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("error: {}", e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(err: &PipelineError) -> ExitCode {
    match err {
        PipelineError::Cancelled { .. } => ExitCode::Cancelled,
        PipelineError::ValidationFailed { .. } => ExitCode::InvalidArguments,
        PipelineError::SetupFailed { .. } => ExitCode::GeneralError,
        PipelineError::StepFailed { .. } => ExitCode::SyncFailed,
    }
}

pub fn check(opts: &GlobalOpts, ffmpeg: Option<String>) -> ExitCode {
    let mut manager = match load_config(opts) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::GeneralError;
        }
    };
    init_tracing(opts.level(manager.settings().logging.level));

    if let Some(ffmpeg) = ffmpeg {
        override_ffmpeg(&mut manager.settings_mut().engine, ffmpeg);
    }

    match check_engine(&manager.settings().engine) {
        Ok((paths, version)) => {
            if !opts.quiet {
                println!("ffmpeg:  {}", paths.ffmpeg.display());
                println!("ffprobe: {}", paths.ffprobe.display());
            }
            println!("{}", version);
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::EngineUnavailable
        }
    }
}

pub fn show_config(opts: &GlobalOpts) -> ExitCode {
    let result = load_config(opts).and_then(|manager| {
        let content = fs::read_to_string(manager.path())
            .with_context(|| format!("Failed to read {}", manager.path().display()))?;
        Ok((manager, content))
    });

    match result {
        Ok((manager, content)) => {
            println!("# {}", manager.path().display());
            print!("{}", content);
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_exit_codes() {
        assert_eq!(
            exit_code_for(&PipelineError::cancelled("ep1")),
            ExitCode::Cancelled
        );
        assert_eq!(
            exit_code_for(&PipelineError::validation_failed("ep1", "bad rate")),
            ExitCode::InvalidArguments
        );
        assert_eq!(
            exit_code_for(&PipelineError::setup_failed("ep1", "disk full")),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn ffmpeg_override_drops_configured_ffprobe() {
        let mut engine = EngineSettings {
            ffmpeg_path: "/usr/bin/ffmpeg".to_string(),
            ffprobe_path: "/usr/bin/ffprobe".to_string(),
            ..Default::default()
        };

        override_ffmpeg(&mut engine, "/opt/ffmpeg/bin/ffmpeg".to_string());

        assert_eq!(engine.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
        assert!(engine.ffprobe_path.is_empty());
    }

    #[test]
    fn verbose_forces_debug() {
        let opts = GlobalOpts {
            config: None,
            quiet: false,
            verbose: true,
        };
        assert_eq!(opts.level(LogLevel::Warn), LogLevel::Debug);
    }
}
