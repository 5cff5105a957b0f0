//! Timeline planning and assembly.
//!
//! Matched clips are laid out by cue start; every gap longer than the gap
//! epsilon becomes a silence segment, so each clip starts exactly at its
//! cue's start. The segment list is then rendered and concatenated.

mod assembler;
mod manifest;
mod plan;

pub use assembler::{AssemblyError, AssemblyOutput, TimelineAssembler, MANIFEST_NAME};
pub use manifest::{quote_path, render_manifest, write_manifest};
pub use plan::{plan_timeline, Segment, TimelinePlan, DEFAULT_GAP_EPSILON};
