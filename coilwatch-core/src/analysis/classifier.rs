//! Consolidation classifier: streak + volume -> probability tier + confidence.
//!
//! Stateless. Every call re-derives the tier from its inputs; there is no
//! memory of the previous day's classification.

use serde::{Deserialize, Serialize};

use super::confidence::confidence_score;
use crate::config::AnalysisConfig;
use crate::domain::BreakoutProbability;

/// Inputs for one (symbol, date) classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierInputs {
    pub consecutive_tight_days: u32,
    pub volume_ratio: Option<f64>,
    pub atr: f64,
    pub daily_range: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub is_consolidating: bool,
    pub volume_spike: bool,
    pub breakout_probability: BreakoutProbability,
    pub confidence_score: u8,
    pub range_tightness_pct: Option<f64>,
}

/// `(atr - daily_range) / atr * 100`, rounded to 2 decimals. Undefined for a zero ATR.
pub fn range_tightness_pct(atr: f64, daily_range: f64) -> Option<f64> {
    if atr > 0.0 {
        Some(round_to(((atr - daily_range) / atr) * 100.0, 2))
    } else {
        None
    }
}

pub fn classify(inputs: &ClassifierInputs, config: &AnalysisConfig) -> Classification {
    let is_consolidating = inputs.consecutive_tight_days >= config.consolidation_threshold_days;
    let volume_spike = is_consolidating
        && inputs
            .volume_ratio
            .is_some_and(|ratio| ratio >= config.volume_spike_multiplier);

    let breakout_probability = match (is_consolidating, volume_spike) {
        (false, _) => BreakoutProbability::Low,
        (true, false) => BreakoutProbability::Medium,
        (true, true) => BreakoutProbability::High,
    };

    let range_tightness_pct = range_tightness_pct(inputs.atr, inputs.daily_range);
    let confidence_score = confidence_score(
        inputs.consecutive_tight_days,
        inputs.volume_ratio,
        range_tightness_pct,
        &config.confidence,
    );

    Classification {
        is_consolidating,
        volume_spike,
        breakout_probability,
        confidence_score,
        range_tightness_pct,
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
