//! dubsync core - places per-subtitle voice clips on one audio timeline.
//!
//! This crate contains all sync logic with zero UI dependencies. Audio work
//! is delegated to an external engine (FFmpeg) behind the
//! [`engine::AudioEngine`] trait.

pub mod config;
pub mod engine;
pub mod logging;
pub mod matching;
pub mod models;
pub mod orchestrator;
pub mod processing;
pub mod stretch;
pub mod subtitles;
pub mod timeline;

#[cfg(test)]
pub(crate) mod test_support;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
