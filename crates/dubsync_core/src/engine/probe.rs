//! FFprobe duration queries.

use std::ffi::OsString;
use std::path::Path;

use super::types::{EngineError, EngineResult};

/// FFprobe arguments that print only the container duration in seconds.
pub fn duration_args(path: &Path) -> Vec<OsString> {
    vec![
        "-v".into(),
        "error".into(),
        "-show_entries".into(),
        "format=duration".into(),
        "-of".into(),
        "default=noprint_wrappers=1:nokey=1".into(),
        path.into(),
    ]
}

/// Parse FFprobe's duration output.
///
/// Rejects anything that is not a finite, positive number of seconds
/// (FFprobe prints `N/A` for streams without a known duration).
pub fn parse_duration(stdout: &str) -> EngineResult<f64> {
    let value = stdout.trim();
    let duration: f64 = value.parse().map_err(|_| {
        EngineError::invalid_output("ffprobe", format!("not a duration: '{}'", value))
    })?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(EngineError::invalid_output(
            "ffprobe",
            format!("unusable duration: {}", duration),
        ));
    }

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        assert!((parse_duration("2.345000\n").unwrap() - 2.345).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(matches!(
            parse_duration("N/A"),
            Err(EngineError::InvalidOutput { .. })
        ));
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert!(parse_duration("0.0").is_err());
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("inf").is_err());
    }

    #[test]
    fn args_end_with_path() {
        let args = duration_args(Path::new("clip.wav"));
        assert_eq!(args.last().unwrap(), "clip.wav");
        assert!(args.contains(&OsString::from("format=duration")));
    }
}
