//! Clip-to-cue matching by index embedded in file names.
//!
//! Clips are expected to be named after their cue index, padded to four or
//! three digits or unpadded, optionally followed by `_anything`:
//! `0007.wav`, `007_hello.mp3`, `7.flac`.

mod locator;
mod matchers;

pub use locator::ClipLocator;
pub use matchers::{
    has_audio_extension, index_representations, StemMatcher, AUDIO_EXTENSIONS,
    FALLBACK_EXTENSIONS,
};
