//! What a sync run works on.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name used when no output path is given.
pub const DEFAULT_OUTPUT_NAME: &str = "output_synced.wav";

/// Inputs and output of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Subtitle file whose cues drive the timeline.
    pub srt_path: PathBuf,
    /// Directory holding one clip per cue.
    pub audio_dir: PathBuf,
    /// Explicit output file. `None` writes into `audio_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl SyncRequest {
    pub fn new(srt_path: impl Into<PathBuf>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            srt_path: srt_path.into(),
            audio_dir: audio_dir.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Output file, defaulting to `<audio_dir>/output_synced.wav`.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.audio_dir.join(DEFAULT_OUTPUT_NAME))
    }

    /// Run name for log files, taken from the subtitle file stem.
    pub fn job_name(&self) -> String {
        stem_or(&self.srt_path, "dubsync")
    }
}

fn stem_or(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
