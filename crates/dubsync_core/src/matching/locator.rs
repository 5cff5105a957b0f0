//! Clip lookup by cue index.

use std::fs;
use std::path::{Path, PathBuf};

use crate::subtitles::Cue;

use super::matchers::{
    has_audio_extension, index_representations, StemMatcher, FALLBACK_EXTENSIONS,
};

/// A candidate clip from the directory scan.
#[derive(Debug, Clone)]
struct Candidate {
    stem: String,
    path: PathBuf,
}

/// Finds the clip file for each cue in one directory.
///
/// The directory is listed once on construction; the listing is sorted by
/// file name so the first hit is deterministic. When the listing cannot be
/// read or has no hit, name-based probing and globbing are tried instead.
#[derive(Debug, Clone)]
pub struct ClipLocator {
    dir: PathBuf,
    candidates: Option<Vec<Candidate>>,
}

impl ClipLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let candidates = match scan_directory(&dir) {
            Ok(candidates) => Some(candidates),
            Err(e) => {
                tracing::debug!("Cannot list {}: {}", dir.display(), e);
                None
            }
        };
        Self { dir, candidates }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of audio files seen by the scan.
    pub fn candidate_count(&self) -> usize {
        self.candidates.as_ref().map_or(0, Vec::len)
    }

    /// Clip for `cue`, or `None` when no file carries its index.
    pub fn locate(&self, cue: &Cue) -> Option<PathBuf> {
        let reps = index_representations(cue.index);

        if let Some(found) = self.scan_lookup(&reps) {
            return Some(found);
        }

        let found = self.fallback_lookup(&reps);
        if let Some(path) = &found {
            tracing::debug!(
                "Cue {} resolved by fallback lookup: {}",
                cue.index,
                path.display()
            );
        }
        found
    }

    fn scan_lookup(&self, reps: &[String]) -> Option<PathBuf> {
        let candidates = self.candidates.as_ref()?;

        reps.iter().find_map(|rep| {
            candidates.iter().find_map(|c| {
                StemMatcher::ORDERED
                    .iter()
                    .any(|m| m.matches(&c.stem, rep))
                    .then(|| c.path.clone())
            })
        })
    }

    fn fallback_lookup(&self, reps: &[String]) -> Option<PathBuf> {
        let escaped_dir = glob::Pattern::escape(&self.dir.to_string_lossy());

        for rep in reps {
            for ext in FALLBACK_EXTENSIONS {
                let exact = self.dir.join(format!("{}.{}", rep, ext));
                if exact.is_file() {
                    return Some(exact);
                }

                let exact_upper = self.dir.join(format!("{}.{}", rep, ext.to_ascii_uppercase()));
                if exact_upper.is_file() {
                    return Some(exact_upper);
                }

                let pattern = format!("{}/{}_*.{}", escaped_dir, glob::Pattern::escape(rep), ext);
                if let Some(hit) = first_glob_hit(&pattern, |_| true) {
                    return Some(hit);
                }
            }

            let pattern = format!("{}/{}.*", escaped_dir, glob::Pattern::escape(rep));
            if let Some(hit) = first_glob_hit(&pattern, has_audio_extension) {
                return Some(hit);
            }
        }

        None
    }
}

/// Regular audio files in `dir`, sorted by file name.
fn scan_directory(dir: &Path) -> std::io::Result<Vec<Candidate>> {
    let mut candidates = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() || !has_audio_extension(&path) {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        candidates.push(Candidate {
            stem: stem.to_string(),
            path: path.clone(),
        });
    }

    candidates.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(candidates)
}

fn first_glob_hit(pattern: &str, accept: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    let mut hits: Vec<PathBuf> = glob::glob(pattern)
        .ok()?
        .filter_map(Result::ok)
        .filter(|p| p.is_file() && accept(p))
        .collect();
    hits.sort();
    hits.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    fn cue(index: u32) -> Cue {
        Cue::new(index, 0.0, 1.0, "")
    }

    fn located_name(locator: &ClipLocator, index: u32) -> Option<String> {
        locator
            .locate(&cue(index))
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
    }

    #[test]
    fn four_digit_representation_wins() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "007_extra.wav");
        touch(dir.path(), "0007.wav");

        let locator = ClipLocator::new(dir.path());
        assert_eq!(located_name(&locator, 7).as_deref(), Some("0007.wav"));
    }

    #[test]
    fn finds_prefixed_and_unpadded_names() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "0012_hello world.mp3");
        touch(dir.path(), "3.flac");

        let locator = ClipLocator::new(dir.path());
        assert_eq!(
            located_name(&locator, 12).as_deref(),
            Some("0012_hello world.mp3")
        );
        assert_eq!(located_name(&locator, 3).as_deref(), Some("3.flac"));
    }

    #[test]
    fn ties_break_by_file_name() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "0004_b.wav");
        touch(dir.path(), "0004_a.ogg");

        let locator = ClipLocator::new(dir.path());
        assert_eq!(located_name(&locator, 4).as_deref(), Some("0004_a.ogg"));
    }

    #[test]
    fn ignores_non_audio_and_directories() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "0005.txt");
        fs::create_dir(dir.path().join("0005.wav")).unwrap();

        let locator = ClipLocator::new(dir.path());
        assert_eq!(locator.candidate_count(), 0);
        assert!(locator.locate(&cue(5)).is_none());
    }

    #[test]
    fn extension_case_is_ignored() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "0009.WAV");

        let locator = ClipLocator::new(dir.path());
        assert_eq!(located_name(&locator, 9).as_deref(), Some("0009.WAV"));
    }

    #[test]
    fn prefix_does_not_match_longer_index() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "10_line.wav");

        let locator = ClipLocator::new(dir.path());
        assert!(locator.locate(&cue(1)).is_none());
        assert_eq!(located_name(&locator, 10).as_deref(), Some("10_line.wav"));
    }

    #[test]
    fn fallback_finds_files_added_after_scan() {
        let dir = tempdir().unwrap();
        let locator = ClipLocator::new(dir.path());
        touch(dir.path(), "0002_late.m4a");

        assert_eq!(located_name(&locator, 2).as_deref(), Some("0002_late.m4a"));
    }

    #[test]
    fn missing_directory_yields_none() {
        let locator = ClipLocator::new("/nonexistent/dubsync/clips");
        assert!(locator.locate(&cue(1)).is_none());
    }
}
