//! Per-run match report.

use serde::{Deserialize, Serialize};

use super::matches::{ClipMatch, CueOutcome};

/// Outcomes for every parsed cue, in cue-index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub outcomes: Vec<CueOutcome>,
}

impl MatchReport {
    pub fn new(outcomes: Vec<CueOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn matched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_matched()).count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CueOutcome::Unmatched { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CueOutcome::Failed { .. }))
            .count()
    }

    /// Borrow the matched clips.
    pub fn matches(&self) -> impl Iterator<Item = &ClipMatch> {
        self.outcomes.iter().filter_map(CueOutcome::as_match)
    }

    /// Take the matched clips out of the report, leaving failures behind.
    pub fn take_matches(&mut self) -> Vec<ClipMatch> {
        let mut taken = Vec::new();
        let mut rest = Vec::with_capacity(self.outcomes.len());
        for outcome in self.outcomes.drain(..) {
            match outcome {
                CueOutcome::Matched(m) => taken.push(m),
                other => rest.push(other),
            }
        }
        self.outcomes = rest;
        taken
    }

    /// `Match: n/m` line for the run log.
    pub fn summary_line(&self) -> String {
        format!("Match: {}/{}", self.matched_count(), self.total())
    }
}
