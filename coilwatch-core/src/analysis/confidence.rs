//! Composite confidence score (0-100).
//!
//! Three additive sub-scores, each linear up to its saturation point:
//! - streak length, capped at 40
//! - volume ratio above 1.0, capped at 30
//! - range tightness below ATR, capped at 30
//!
//! Each component is non-decreasing in its input, so the total is too.

use serde::{Deserialize, Serialize};

use crate::config::ConfidenceCurve;

pub const STREAK_CAP: f64 = 40.0;
pub const VOLUME_CAP: f64 = 30.0;
pub const TIGHTNESS_CAP: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub streak: f64,
    pub volume: f64,
    pub tightness: f64,
}

impl ConfidenceBreakdown {
    pub fn compute(
        tight_days: u32,
        volume_ratio: Option<f64>,
        range_tightness_pct: Option<f64>,
        curve: &ConfidenceCurve,
    ) -> Self {
        let streak_frac = tight_days as f64 / curve.full_streak_days.max(1) as f64;

        let volume_frac = volume_ratio
            .map(|r| (r - 1.0) / (curve.full_volume_ratio - 1.0))
            .unwrap_or(0.0);

        let tightness_frac = range_tightness_pct
            .map(|pct| pct / curve.full_tightness_pct)
            .unwrap_or(0.0);

        Self {
            streak: STREAK_CAP * clamp_unit(streak_frac),
            volume: VOLUME_CAP * clamp_unit(volume_frac),
            tightness: TIGHTNESS_CAP * clamp_unit(tightness_frac),
        }
    }

    /// Sum of the components, rounded and clamped to [0, 100].
    pub fn score(&self) -> u8 {
        let total = self.streak + self.volume + self.tightness;
        total.round().clamp(0.0, 100.0) as u8
    }
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

pub fn confidence_score(
    tight_days: u32,
    volume_ratio: Option<f64>,
    range_tightness_pct: Option<f64>,
    curve: &ConfidenceCurve,
) -> u8 {
    ConfidenceBreakdown::compute(tight_days, volume_ratio, range_tightness_pct, curve).score()
}
