//! Configuration management for dubsync.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use dubsync_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::with_default_path();
//! config.load_or_create().unwrap();
//!
//! println!("Sample rate: {}", config.settings().processing.sample_rate);
//!
//! config.settings_mut().paths.last_audio_dir = "/clips/ep01".to_string();
//! config.update_section(ConfigSection::Paths).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{default_config_path, ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EngineSettings, LoggingSettings, PathSettings, ProcessingSettings, Settings,
};
