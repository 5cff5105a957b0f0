//! Duration fitting for clips that overrun their cue.
//!
//! A clip longer than its cue is sped up by `clip / cue`. Clips that fit
//! are left at natural speed; they are never slowed down.
//!
//! The `atempo` filter only behaves within `[0.5, 2.0]` per instance, so
//! an arbitrary ratio is decomposed into a chain of bounded stages whose
//! product is the requested ratio:
//!
//! ```
//! use dubsync_core::stretch::decompose_ratio;
//!
//! let stages = decompose_ratio(5.3).unwrap();
//! assert_eq!(stages.len(), 3); // 2.0 * 2.0 * 1.325
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest ratio a single stage may apply.
pub const MAX_STAGE_RATIO: f64 = 2.0;

/// Smallest ratio a single stage may apply.
pub const MIN_STAGE_RATIO: f64 = 0.5;

/// Errors from stretch planning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StretchError {
    /// Ratio is zero, negative, or not finite.
    #[error("Invalid stretch ratio: {0}")]
    InvalidRatio(f64),

    /// A duration is zero, negative, or not finite.
    #[error("Invalid {what} duration: {value}")]
    InvalidDuration { what: &'static str, value: f64 },
}

/// Decision for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StretchPlan {
    /// Clip is longer than its cue.
    pub needs_compression: bool,
    /// `clip / cue` when compressing, exactly `1.0` otherwise.
    pub speed_factor: f64,
    /// Stage ratios to apply in order. Empty when no compression is needed.
    pub stages: Vec<f64>,
}

impl StretchPlan {
    /// Plan the fit of a clip of `clip_secs` into a cue of `cue_secs`.
    pub fn for_durations(clip_secs: f64, cue_secs: f64) -> Result<Self, StretchError> {
        check_duration("clip", clip_secs)?;
        check_duration("cue", cue_secs)?;

        if clip_secs <= cue_secs {
            return Ok(Self {
                needs_compression: false,
                speed_factor: 1.0,
                stages: Vec::new(),
            });
        }

        let speed_factor = clip_secs / cue_secs;
        Ok(Self {
            needs_compression: true,
            speed_factor,
            stages: decompose_ratio(speed_factor)?,
        })
    }

    /// Combined `-af` filter for this plan, `None` when nothing to do.
    pub fn filter(&self) -> Option<String> {
        if self.needs_compression {
            Some(filter_chain(&self.stages))
        } else {
            None
        }
    }
}

fn check_duration(what: &'static str, value: f64) -> Result<(), StretchError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(StretchError::InvalidDuration { what, value })
    }
}

/// Split `ratio` into stages within `[0.5, 2.0]`.
///
/// Full `2.0` (or `0.5`) stages are emitted while the remainder lies
/// outside the range, then one final stage carries the remainder.
pub fn decompose_ratio(ratio: f64) -> Result<Vec<f64>, StretchError> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(StretchError::InvalidRatio(ratio));
    }

    let mut remaining = ratio;
    let mut stages = Vec::new();

    while remaining > MAX_STAGE_RATIO {
        stages.push(MAX_STAGE_RATIO);
        remaining /= MAX_STAGE_RATIO;
    }

    while remaining < MIN_STAGE_RATIO {
        stages.push(MIN_STAGE_RATIO);
        remaining /= MIN_STAGE_RATIO;
    }

    stages.push(remaining);
    Ok(stages)
}

/// Render stages as one comma-joined `atempo` chain.
///
/// Full-range stages are written as `2.0`/`0.5`; the remainder with six
/// decimals.
pub fn filter_chain(stages: &[f64]) -> String {
    let last = stages.len().saturating_sub(1);
    stages
        .iter()
        .enumerate()
        .map(|(i, &stage)| {
            if i < last && stage == MAX_STAGE_RATIO {
                "atempo=2.0".to_string()
            } else if i < last && stage == MIN_STAGE_RATIO {
                "atempo=0.5".to_string()
            } else {
                format!("atempo={:.6}", stage)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stages: &[f64]) -> f64 {
        stages.iter().product()
    }

    #[test]
    fn large_ratio_chains_full_stages() {
        let stages = decompose_ratio(5.3).unwrap();
        assert_eq!(stages.len(), 3);
        assert!((product(&stages) - 5.3).abs() < 1e-6);

        let (last, rest) = stages.split_last().unwrap();
        assert!(rest.iter().all(|&s| s == MAX_STAGE_RATIO));
        assert!(*last <= MAX_STAGE_RATIO && *last >= MIN_STAGE_RATIO);
    }

    #[test]
    fn small_ratio_chains_half_stages() {
        let stages = decompose_ratio(0.1).unwrap();
        assert!((product(&stages) - 0.1).abs() < 1e-6);
        let (last, rest) = stages.split_last().unwrap();
        assert!(rest.iter().all(|&s| s == MIN_STAGE_RATIO));
        assert!(*last >= MIN_STAGE_RATIO && *last <= MAX_STAGE_RATIO);
    }

    #[test]
    fn in_range_ratio_is_single_stage() {
        assert_eq!(decompose_ratio(1.5).unwrap(), vec![1.5]);
        assert_eq!(decompose_ratio(2.0).unwrap(), vec![2.0]);
    }

    #[test]
    fn stage_product_is_exact_over_many_ratios() {
        for i in 1..400 {
            let ratio = 0.05 * i as f64;
            let stages = decompose_ratio(ratio).unwrap();
            assert!(
                (product(&stages) - ratio).abs() < 1e-6,
                "ratio {} -> {:?}",
                ratio,
                stages
            );
        }
    }

    #[test]
    fn rejects_degenerate_ratios() {
        assert!(decompose_ratio(0.0).is_err());
        assert!(decompose_ratio(-1.0).is_err());
        assert!(decompose_ratio(f64::NAN).is_err());
        assert!(decompose_ratio(f64::INFINITY).is_err());
    }

    #[test]
    fn fitting_clip_keeps_natural_speed() {
        let plan = StretchPlan::for_durations(1.2, 2.0).unwrap();
        assert!(!plan.needs_compression);
        assert_eq!(plan.speed_factor, 1.0);
        assert!(plan.stages.is_empty());
        assert!(plan.filter().is_none());
    }

    #[test]
    fn equal_length_clip_is_not_compressed() {
        let plan = StretchPlan::for_durations(2.0, 2.0).unwrap();
        assert!(!plan.needs_compression);
    }

    #[test]
    fn overrunning_clip_is_compressed() {
        let plan = StretchPlan::for_durations(5.3, 1.0).unwrap();
        assert!(plan.needs_compression);
        assert!((plan.speed_factor - 5.3).abs() < 1e-12);
        assert_eq!(
            plan.filter().unwrap(),
            "atempo=2.0,atempo=2.0,atempo=1.325000"
        );
    }

    #[test]
    fn rejects_zero_cue_duration() {
        assert!(matches!(
            StretchPlan::for_durations(1.0, 0.0),
            Err(StretchError::InvalidDuration { what: "cue", .. })
        ));
    }

    #[test]
    fn filter_chain_formats_remainder() {
        assert_eq!(filter_chain(&[1.25]), "atempo=1.250000");
        assert_eq!(filter_chain(&[0.5, 0.8]), "atempo=0.5,atempo=0.800000");
    }
}
