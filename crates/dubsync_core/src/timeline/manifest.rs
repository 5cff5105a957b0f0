//! Concat manifest in the FFmpeg concat demuxer's format.

use std::fs;
use std::io;
use std::path::Path;

/// Quote `path` for a `file '...'` line.
///
/// A single quote cannot appear inside the quoted string, so it closes the
/// quote, emits an escaped quote and reopens: `'` becomes `'\''`.
pub fn quote_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Manifest text, one `file '<path>'` line per entry.
pub fn render_manifest<P: AsRef<Path>>(paths: &[P]) -> String {
    let mut out = String::new();
    for path in paths {
        out.push_str("file '");
        out.push_str(&quote_path(path.as_ref()));
        out.push_str("'\n");
    }
    out
}

/// Write the manifest for `paths` to `manifest_path`.
pub fn write_manifest<P: AsRef<Path>>(manifest_path: &Path, paths: &[P]) -> io::Result<()> {
    fs::write(manifest_path, render_manifest(paths))
}
