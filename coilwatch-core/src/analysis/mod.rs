//! Per-symbol consolidation analysis.
//!
//! Pipeline for one symbol, strictly in this order:
//! bars -> range series (TR/ATR) -> {tight streak, volume signal} -> classifier
//! -> `AnalysisRecord`.
//!
//! `analyze` answers "what did the system see on `as_of`" from the bar prefix
//! ending there. `analyze_series` produces the same records for every date of
//! a series in one pass; Wilder ATR depends only on the prefix, so both agree.

pub mod classifier;
pub mod confidence;
pub mod streak;

pub use classifier::{classify, range_tightness_pct, Classification, ClassifierInputs};
pub use confidence::{confidence_score, ConfidenceBreakdown};
pub use streak::{consecutive_tight_days, streak_series};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::domain::{AnalysisRecord, Bar, DerivedBar};
use crate::indicators::{derive_range_series, volume_signal, RangeError};

/// Result of analysing one symbol on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisOutcome {
    Analyzed(AnalysisRecord),
    /// Not enough bars for the ATR warm-up. Expected for new listings.
    InsufficientHistory { required: usize, provided: usize },
}

impl AnalysisOutcome {
    pub fn record(&self) -> Option<&AnalysisRecord> {
        match self {
            Self::Analyzed(record) => Some(record),
            Self::InsufficientHistory { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<AnalysisRecord> {
        match self {
            Self::Analyzed(record) => Some(record),
            Self::InsufficientHistory { .. } => None,
        }
    }
}

/// Analyse `symbol` as of `as_of`, using only bars dated on or before it.
///
/// `bars` must be ascending by date and belong to one symbol.
pub fn analyze(
    symbol: &str,
    bars: &[Bar],
    as_of: NaiveDate,
    config: &AnalysisConfig,
) -> AnalysisOutcome {
    let end = bars.partition_point(|b| b.date <= as_of);
    let prefix = &bars[..end];

    let series = match derive_range_series(prefix, config.atr_period) {
        Ok(series) => series,
        Err(RangeError::InsufficientData { required, provided }) => {
            debug!(symbol, required, provided, "insufficient history for ATR");
            return AnalysisOutcome::InsufficientHistory { required, provided };
        }
    };

    let last = series.len() - 1;
    let tight_days = consecutive_tight_days(series.iter().rev());
    match build_record(symbol, prefix, &series, last, tight_days, config) {
        Some(record) => {
            debug!(
                symbol,
                date = %record.date,
                tight_days = record.consecutive_tight_days,
                probability = %record.breakout_probability,
                confidence = record.confidence_score,
                "analysis complete"
            );
            AnalysisOutcome::Analyzed(record)
        }
        None => AnalysisOutcome::InsufficientHistory {
            required: config.atr_period,
            provided: prefix.len(),
        },
    }
}

/// Analyse every date of an ascending series that has a defined ATR.
///
/// Returns one record per bar from the warm-up point on; empty when the
/// series is shorter than the ATR period.
pub fn analyze_series(symbol: &str, bars: &[Bar], config: &AnalysisConfig) -> Vec<AnalysisRecord> {
    let Ok(series) = derive_range_series(bars, config.atr_period) else {
        return Vec::new();
    };
    streak_series(&series)
        .into_iter()
        .enumerate()
        .filter_map(|(i, tight_days)| build_record(symbol, bars, &series, i, tight_days, config))
        .collect()
}

fn build_record(
    symbol: &str,
    bars: &[Bar],
    series: &[DerivedBar],
    index: usize,
    tight_days: u32,
    config: &AnalysisConfig,
) -> Option<AnalysisRecord> {
    let latest = &series[index];
    let atr = latest.atr?;

    let volume = volume_signal(&bars[..=index], config.volume_avg_period);

    let inputs = ClassifierInputs {
        consecutive_tight_days: tight_days,
        volume_ratio: volume.volume_ratio,
        atr,
        daily_range: latest.daily_range(),
    };
    let c = classify(&inputs, config);

    Some(AnalysisRecord {
        symbol: symbol.to_string(),
        date: latest.date(),
        atr,
        daily_range: latest.daily_range(),
        consecutive_tight_days: tight_days,
        avg_volume_trailing: volume.avg_volume,
        current_volume: volume.current_volume,
        volume_ratio: volume.volume_ratio,
        is_consolidating: c.is_consolidating,
        volume_spike: c.volume_spike,
        breakout_probability: c.breakout_probability,
        confidence_score: c.confidence_score,
        range_tightness_pct: c.range_tightness_pct,
        price_at_analysis: latest.bar.close,
    })
}
