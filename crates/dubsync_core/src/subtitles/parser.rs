//! Cue track parser.
//!
//! Parses SubRip-style cue tracks:
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! Hello, world!
//!
//! 2
//! 00:00:05,000 --> 00:00:08,000
//! This is a test.
//! ```
//!
//! The parser is lenient. Blocks that do not carry an index line followed by
//! a timing line are simply absent from the result, as are blocks with an
//! unparsable timestamp or a non-positive window. Nothing here fails on
//! trailing garbage or extra blank lines; an empty result is reported by
//! the caller.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::CueTrackError;
use super::timecode::parse_timestamp;
use super::types::Cue;

static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

static CUE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(\d+)[ \t]*\n[ \t]*(\d{1,2}:\d{2}:\d{2}[,.]\d{3})[ \t]*-->[ \t]*(\d{1,2}:\d{2}:\d{2}[,.]\d{3})[ \t]*$",
    )
    .unwrap()
});

/// Parse cue track text into cues sorted by index.
///
/// The sort is stable, so cues sharing an index keep their file order.
pub fn parse_cue_track(content: &str) -> Vec<Cue> {
    let content = content
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let mut cues: Vec<Cue> = BLOCK_SEPARATOR
        .split(&content)
        .filter_map(parse_block)
        .collect();

    cues.sort_by_key(|cue| cue.index);
    cues
}

/// Read and parse a cue track file.
///
/// Returns an empty vector for a readable file without cues; emptiness is
/// a caller decision.
pub fn load_cue_track(path: &Path) -> Result<Vec<Cue>, CueTrackError> {
    let content = std::fs::read_to_string(path).map_err(|e| CueTrackError::read(path, e))?;
    let cues = parse_cue_track(&content);
    tracing::debug!("Parsed {} cues from {}", cues.len(), path.display());
    Ok(cues)
}

fn parse_block(block: &str) -> Option<Cue> {
    let caps = CUE_HEADER.captures(block)?;

    let index: u32 = match caps[1].parse() {
        Ok(0) | Err(_) => {
            tracing::debug!("Skipping cue block with invalid index '{}'", &caps[1]);
            return None;
        }
        Ok(index) => index,
    };

    let (start, end) = match (parse_timestamp(&caps[2]), parse_timestamp(&caps[3])) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(e), _) | (_, Err(e)) => {
            tracing::debug!("Skipping cue {}: {}", index, e);
            return None;
        }
    };

    if end <= start {
        tracing::debug!(
            "Skipping cue {}: end {:.3}s is not after start {:.3}s",
            index,
            end,
            start
        );
        return None;
    }

    let header_end = caps.get(0).map(|m| m.end()).unwrap_or(block.len());
    let text = block[header_end..].trim();

    Some(Cue::new(index, start, end, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = "1
00:00:01,000 --> 00:00:04,000
Hello, world!

2
00:00:05,000 --> 00:00:08,000
This is a test.
With multiple lines.

3
00:00:09,000 --> 00:00:12,000
Final subtitle.
";

    #[test]
    fn parses_basic_track() {
        let cues = parse_cue_track(BASIC);
        assert_eq!(cues.len(), 3);

        assert_eq!(cues[0].index, 1);
        assert!((cues[0].start - 1.0).abs() < 1e-9);
        assert!((cues[0].end - 4.0).abs() < 1e-9);
        assert_eq!(cues[0].text, "Hello, world!");

        assert_eq!(cues[1].text, "This is a test.\nWith multiple lines.");
        assert_eq!(cues[2].text, "Final subtitle.");
    }

    #[test]
    fn duration_matches_window() {
        for cue in parse_cue_track(BASIC) {
            assert!((cue.duration() - (cue.end - cue.start)).abs() < 1e-12);
        }
    }

    #[test]
    fn sorts_by_index_not_start_time() {
        let content = "5
00:00:01,000 --> 00:00:02,000
first on screen

2
00:00:10,000 --> 00:00:11,000
later on screen
";
        let cues = parse_cue_track(content);
        assert_eq!(cues.iter().map(|c| c.index).collect::<Vec<_>>(), vec![2, 5]);
        // Start order is the opposite; it is left untouched.
        assert!(cues[0].start > cues[1].start);
    }

    #[test]
    fn tolerates_crlf_bom_and_extra_blank_lines() {
        let content = "\u{feff}1\r\n00:00:01.000 --> 00:00:02.000\r\nA\r\n\r\n\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nB\r\n\r\n";
        let cues = parse_cue_track(content);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1].text, "B");
    }

    #[test]
    fn skips_malformed_blocks() {
        let content = "1
00:00:01,000 --> 00:00:02,000
ok

not a cue at all

2
00:00:xx,000 --> 00:00:04,000
bad time

3
00:00:06,000 --> 00:00:05,000
backwards

4
00:00:07,000 --> 00:00:08,000
also ok
trailing garbage follows
###";
        let cues = parse_cue_track(content);
        assert_eq!(cues.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn keeps_cue_with_empty_text() {
        let cues = parse_cue_track("7\n00:00:01,000 --> 00:00:02,000\n");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "");
    }

    #[test]
    fn empty_input_yields_no_cues() {
        assert!(parse_cue_track("").is_empty());
        assert!(parse_cue_track("\n\n\n").is_empty());
    }

    #[test]
    fn load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(BASIC.as_bytes()).unwrap();
        let cues = load_cue_track(file.path()).unwrap();
        assert_eq!(cues.len(), 3);
    }

    #[test]
    fn load_reports_missing_file() {
        let result = load_cue_track(Path::new("/nonexistent/track.srt"));
        assert!(matches!(result, Err(CueTrackError::Read { .. })));
    }
}
