//! Pipeline step implementations.

mod assemble;
mod match_clips;
mod parse;
mod process;

pub use assemble::AssembleStep;
pub use match_clips::{match_cue, MatchStep};
pub use parse::ParseStep;
pub use process::ProcessStep;
