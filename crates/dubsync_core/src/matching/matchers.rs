//! File name predicates used by the directory scan.

use std::path::Path;

/// Audio extensions a clip may carry (lowercase, compared case-insensitively).
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "wav", "mp3", "m4a", "aac", "flac", "ogg", "wma", "opus", "webm", "amr", "3gp", "ape",
    "alac", "aiff", "aif", "au", "ra", "mid", "midi",
];

/// Extensions probed by name during the fallback lookup.
pub const FALLBACK_EXTENSIONS: &[&str] = &[
    "wav", "mp3", "m4a", "aac", "flac", "ogg", "wma", "opus", "webm", "amr", "3gp",
];

/// Index spellings tried in order: `0007`, `007`, `7`.
pub fn index_representations(index: u32) -> [String; 3] {
    [
        format!("{:04}", index),
        format!("{:03}", index),
        index.to_string(),
    ]
}

/// True when `path` has a whitelisted audio extension.
pub fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// One way a file stem can name a cue index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemMatcher {
    /// `0007` for `0007.wav`.
    ExactStem,
    /// `0007_` prefix for `0007_hello.wav`.
    UnderscorePrefix,
}

impl StemMatcher {
    /// Matchers in the order they are tried for each representation.
    pub const ORDERED: [StemMatcher; 2] = [StemMatcher::ExactStem, StemMatcher::UnderscorePrefix];

    pub fn matches(self, stem: &str, rep: &str) -> bool {
        match self {
            StemMatcher::ExactStem => stem == rep,
            StemMatcher::UnderscorePrefix => stem
                .strip_prefix(rep)
                .is_some_and(|rest| rest.starts_with('_')),
        }
    }
}
