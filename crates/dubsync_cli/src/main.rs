//! dubsync command-line interface
//!
//! Places one voice clip per subtitle cue on a single timeline, using
//! FFmpeg for all audio work.

mod commands;
mod exit_codes;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dubsync_core::engine::COMMON_SAMPLE_RATES;
use exit_codes::ExitCode;

/// dubsync - subtitle-timed voice clip assembly
#[derive(Parser, Debug)]
#[command(name = "dubsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (default: user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print only the final result
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble clips onto the subtitle timeline
    Sync(SyncArgs),
    /// Check that FFmpeg and FFprobe are usable
    Check {
        /// FFmpeg binary to check instead of the configured one
        #[arg(long, value_name = "PATH")]
        ffmpeg: Option<String>,
    },
    /// Show the settings file location and contents
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Subtitle file (SRT)
    #[arg(long, value_name = "FILE")]
    srt: PathBuf,

    /// Directory holding one clip per cue
    #[arg(long, value_name = "DIR")]
    audio_dir: PathBuf,

    /// Output WAV (default: <audio-dir>/output_synced.wav)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// FFmpeg binary (overrides settings)
    #[arg(long, value_name = "PATH")]
    ffmpeg: Option<String>,

    /// Output sample rate in Hz
    #[arg(long, value_parser = parse_sample_rate)]
    sample_rate: Option<u32>,

    /// Worker threads (0 = one per core)
    #[arg(long)]
    workers: Option<usize>,

    /// Keep the scratch directory
    #[arg(long)]
    keep_temp: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn parse_sample_rate(value: &str) -> Result<u32, String> {
    let rate: u32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a sample rate", value))?;
    if COMMON_SAMPLE_RATES.contains(&rate) {
        Ok(rate)
    } else {
        let allowed: Vec<String> = COMMON_SAMPLE_RATES.iter().map(u32::to_string).collect();
        Err(format!("must be one of {}", allowed.join(", ")))
    }
}

fn main() {
    let cli = Cli::parse();
    let opts = commands::GlobalOpts {
        config: cli.config,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let exit_code = match cli.command {
        Commands::Sync(args) => commands::sync(&opts, args),
        Commands::Check { ffmpeg } => commands::check(&opts, ffmpeg),
        Commands::Config => commands::show_config(&opts),
    };
    std::process::exit(exit_code.as_i32());
}
