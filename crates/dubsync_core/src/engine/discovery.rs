//! Locating the FFmpeg/FFprobe binaries.
//!
//! Resolution order for FFmpeg:
//! 1. An explicitly configured path
//! 2. An `ffmpeg` binary next to the running executable
//! 3. `ffmpeg` on `PATH`
//!
//! FFprobe follows FFmpeg unless configured separately: a sibling of a
//! located FFmpeg binary, or `ffprobe` on `PATH` when FFmpeg came from
//! `PATH`.

use std::path::{Path, PathBuf};

#[cfg(windows)]
const FFMPEG_BIN: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_BIN: &str = "ffmpeg";

#[cfg(windows)]
const FFPROBE_BIN: &str = "ffprobe.exe";
#[cfg(not(windows))]
const FFPROBE_BIN: &str = "ffprobe";

/// Resolved engine binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl EnginePaths {
    /// Use the given binaries as-is.
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Resolve binaries from optional overrides (empty strings count as unset).
    pub fn resolve(ffmpeg_override: Option<&str>, ffprobe_override: Option<&str>) -> Self {
        let app_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self::resolve_with_app_dir(ffmpeg_override, ffprobe_override, app_dir.as_deref())
    }

    fn resolve_with_app_dir(
        ffmpeg_override: Option<&str>,
        ffprobe_override: Option<&str>,
        app_dir: Option<&Path>,
    ) -> Self {
        let ffmpeg = match non_empty(ffmpeg_override) {
            Some(path) => PathBuf::from(path),
            None => default_ffmpeg(app_dir),
        };

        let ffprobe = match non_empty(ffprobe_override) {
            Some(path) => PathBuf::from(path),
            None => ffprobe_for(&ffmpeg),
        };

        tracing::debug!(
            "Engine binaries: ffmpeg={}, ffprobe={}",
            ffmpeg.display(),
            ffprobe.display()
        );

        Self { ffmpeg, ffprobe }
    }
}

impl Default for EnginePaths {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn default_ffmpeg(app_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = app_dir {
        let local = dir.join(FFMPEG_BIN);
        if local.is_file() {
            return local;
        }
    }

    which::which("ffmpeg").unwrap_or_else(|_| PathBuf::from("ffmpeg"))
}

/// FFprobe path matching a given FFmpeg path.
pub fn ffprobe_for(ffmpeg: &Path) -> PathBuf {
    if ffmpeg == Path::new("ffmpeg") {
        return which::which("ffprobe").unwrap_or_else(|_| PathBuf::from("ffprobe"));
    }

    match ffmpeg.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(FFPROBE_BIN),
        _ => PathBuf::from("ffprobe"),
    }
}
