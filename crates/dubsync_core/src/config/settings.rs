//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::engine::{AudioFormat, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_SAMPLE_RATE};
use crate::logging::{LogConfig, LogLevel};
use crate::timeline::DEFAULT_GAP_EPSILON;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    /// External engine location and limits.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Clip processing and timeline options.
    #[serde(default)]
    pub processing: ProcessingSettings,
}

impl Settings {
    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), String> {
        if self.processing.sample_rate == 0 {
            return Err("processing.sample_rate must be positive".to_string());
        }
        if !self.processing.gap_epsilon.is_finite() || self.processing.gap_epsilon < 0.0 {
            return Err(format!(
                "processing.gap_epsilon must be a non-negative number, got {}",
                self.processing.gap_epsilon
            ));
        }
        Ok(())
    }
}

/// Working directories and last-used inputs.
///
/// Empty strings mean "not set".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Parent for per-run scratch directories. Empty uses the system temp dir.
    #[serde(default)]
    pub temp_root: String,

    /// Folder for run logs. Relative paths resolve against the config file.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Last subtitle file synced.
    #[serde(default)]
    pub last_srt_path: String,

    /// Last clip directory synced.
    #[serde(default)]
    pub last_audio_dir: String,
}

fn default_logs_folder() -> String {
    "logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            temp_root: String::new(),
            logs_folder: default_logs_folder(),
            last_srt_path: String::new(),
            last_audio_dir: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of engine stderr lines to show on failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Minimum level for run logs and the default tracing filter.
    #[serde(default)]
    pub level: LogLevel,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            level: LogLevel::Info,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            progress_step: self.progress_step,
            error_tail: self.error_tail as usize,
            show_timestamps: true,
        }
    }
}

/// FFmpeg/FFprobe location and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Explicit FFmpeg binary. Empty searches next to the executable, then PATH.
    #[serde(default)]
    pub ffmpeg_path: String,

    /// Explicit FFprobe binary. Empty derives it from the FFmpeg location.
    #[serde(default)]
    pub ffprobe_path: String,

    /// Limit for one duration probe, in seconds (0 = unbounded).
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Limit for one transcode/silence/concat job, in seconds (0 = unbounded).
    #[serde(default)]
    pub job_timeout_secs: u64,
}

fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: String::new(),
            ffprobe_path: String::new(),
            probe_timeout_secs: default_probe_timeout(),
            job_timeout_secs: 0,
        }
    }
}

impl EngineSettings {
    pub fn ffmpeg_override(&self) -> Option<&str> {
        non_empty(&self.ffmpeg_path)
    }

    pub fn ffprobe_override(&self) -> Option<&str> {
        non_empty(&self.ffprobe_path)
    }
}

/// Clip processing and timeline options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSettings {
    /// Output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Worker threads for per-cue jobs (0 = one per core).
    #[serde(default)]
    pub workers: usize,

    /// Keep the scratch directory after the run.
    #[serde(default)]
    pub keep_temp: bool,

    /// Gaps at or below this many seconds get no silence.
    #[serde(default = "default_gap_epsilon")]
    pub gap_epsilon: f64,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_gap_epsilon() -> f64 {
    DEFAULT_GAP_EPSILON
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            workers: 0,
            keep_temp: false,
            gap_epsilon: default_gap_epsilon(),
        }
    }
}

impl ProcessingSettings {
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::new(self.sample_rate)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Engine,
    Processing,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Engine,
        ConfigSection::Processing,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Engine => "engine",
            ConfigSection::Processing => "processing",
        }
    }

    /// Comment written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Working directories and last-used inputs",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Engine => "FFmpeg/FFprobe location and timeouts",
            ConfigSection::Processing => "Clip processing and timeline options",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("sample_rate = 24000"));
        assert!(toml.contains("level = \"info\""));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[processing]\nsample_rate = 48000";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.processing.sample_rate, 48000);
        assert_eq!(parsed.processing.workers, 0);
        assert_eq!(parsed.engine.probe_timeout_secs, 10);
        assert_eq!(parsed.engine.job_timeout_secs, 0);
        assert!(parsed.logging.compact);
    }

    #[test]
    fn empty_engine_paths_are_unset() {
        let mut engine = EngineSettings::default();
        assert!(engine.ffmpeg_override().is_none());
        engine.ffmpeg_path = " /opt/ffmpeg/bin/ffmpeg ".to_string();
        assert_eq!(engine.ffmpeg_override(), Some("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn validate_rejects_zero_rate_and_negative_epsilon() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.processing.sample_rate = 0;
        assert!(settings.validate().is_err());

        settings.processing.sample_rate = 44100;
        settings.processing.gap_epsilon = -0.5;
        assert!(settings.validate().is_err());
    }
}
