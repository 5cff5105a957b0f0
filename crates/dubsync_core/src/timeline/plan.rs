//! Segment planning: clips in start order with silence filling the gaps.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::ClipMatch;

/// Gaps at or below this many seconds are not filled with silence.
pub const DEFAULT_GAP_EPSILON: f64 = 0.01;

/// One piece of the output, in playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Silence { duration_secs: f64 },
    Clip { cue_index: u32, path: PathBuf },
}

/// Ordered segments that fully describe the output file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelinePlan {
    pub segments: Vec<Segment>,
    /// End of the last placed cue, i.e. the expected output length.
    pub expected_duration: f64,
}

impl TimelinePlan {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clip_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Clip { .. }))
            .count()
    }

    pub fn silence_count(&self) -> usize {
        self.segments.len() - self.clip_count()
    }

    /// Total silence inserted, in seconds.
    pub fn total_silence(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Silence { duration_secs } => *duration_secs,
                Segment::Clip { .. } => 0.0,
            })
            .sum()
    }
}

/// Lay out `matches` on the timeline.
///
/// Clips are ordered by cue start. Before each clip, a silence of
/// `start - current` is inserted when it exceeds `epsilon`; the cursor then
/// moves to the cue's end. Clips use their processed file when present.
pub fn plan_timeline(matches: &[ClipMatch], epsilon: f64) -> TimelinePlan {
    let mut ordered: Vec<&ClipMatch> = matches.iter().collect();
    ordered.sort_by(|a, b| a.cue.start.total_cmp(&b.cue.start));

    let mut segments = Vec::with_capacity(ordered.len() * 2);
    let mut current = 0.0;

    for clip in ordered {
        let gap = clip.cue.start - current;
        if gap > epsilon {
            segments.push(Segment::Silence { duration_secs: gap });
        }

        segments.push(Segment::Clip {
            cue_index: clip.cue.index,
            path: clip
                .processed_path
                .clone()
                .unwrap_or_else(|| clip.clip_path.clone()),
        });
        current = clip.cue.end;
    }

    TimelinePlan {
        segments,
        expected_duration: current,
    }
}
