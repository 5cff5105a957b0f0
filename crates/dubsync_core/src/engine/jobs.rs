//! Engine jobs and their FFmpeg argument lists.
//!
//! Every job writes exactly one file in the normalized [`AudioFormat`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::types::AudioFormat;

/// A single transcode/stretch, silence-synthesis, or concat job.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineJob {
    /// Decode `input`, optionally run `filter` (an `-af` chain), normalize.
    Transcode {
        input: PathBuf,
        output: PathBuf,
        filter: Option<String>,
        format: AudioFormat,
    },
    /// Synthesize `duration_secs` of digital silence.
    Silence {
        duration_secs: f64,
        output: PathBuf,
        format: AudioFormat,
    },
    /// Concatenate the segment files listed in `manifest`.
    Concat {
        manifest: PathBuf,
        output: PathBuf,
        format: AudioFormat,
    },
}

impl EngineJob {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            EngineJob::Transcode { filter: None, .. } => "transcode",
            EngineJob::Transcode { filter: Some(_), .. } => "stretch",
            EngineJob::Silence { .. } => "silence",
            EngineJob::Concat { .. } => "concat",
        }
    }

    /// File the job writes.
    pub fn output(&self) -> &Path {
        match self {
            EngineJob::Transcode { output, .. }
            | EngineJob::Silence { output, .. }
            | EngineJob::Concat { output, .. } => output,
        }
    }

    /// Input file that must exist before the job runs, if any.
    pub fn input(&self) -> Option<&Path> {
        match self {
            EngineJob::Transcode { input, .. } => Some(input),
            EngineJob::Concat { manifest, .. } => Some(manifest),
            EngineJob::Silence { .. } => None,
        }
    }

    /// FFmpeg command-line arguments (without the program itself).
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into()];

        match self {
            EngineJob::Transcode {
                input,
                output,
                filter,
                format,
            } => {
                args.push("-i".into());
                args.push(input.into());
                if let Some(chain) = filter {
                    args.push("-af".into());
                    args.push(chain.into());
                }
                push_pcm_format(&mut args, format);
                args.push(output.into());
            }
            EngineJob::Silence {
                duration_secs,
                output,
                format,
            } => {
                args.push("-f".into());
                args.push("lavfi".into());
                args.push("-i".into());
                args.push(format!("anullsrc=r={}:cl=mono", format.sample_rate).into());
                args.push("-t".into());
                args.push(format!("{:.6}", duration_secs).into());
                push_pcm_format(&mut args, format);
                args.push(output.into());
            }
            EngineJob::Concat {
                manifest,
                output,
                format,
            } => {
                args.push("-f".into());
                args.push("concat".into());
                args.push("-safe".into());
                args.push("0".into());
                args.push("-i".into());
                args.push(manifest.into());
                push_pcm_format(&mut args, format);
                args.push(output.into());
            }
        }

        args
    }
}

fn push_pcm_format(args: &mut Vec<OsString>, format: &AudioFormat) {
    args.push("-acodec".into());
    args.push(AudioFormat::CODEC.into());
    args.push("-ar".into());
    args.push(format.sample_rate.to_string().into());
    args.push("-ac".into());
    args.push(AudioFormat::CHANNELS.to_string().into());
}
