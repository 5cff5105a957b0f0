//! Shared data types passed between pipeline steps.

mod matches;
mod report;
mod request;

pub use matches::{ClipMatch, CueFailure, CueOutcome};
pub use report::MatchReport;
pub use request::{SyncRequest, DEFAULT_OUTPUT_NAME};
