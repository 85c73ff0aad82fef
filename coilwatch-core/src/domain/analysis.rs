//! Analysis records produced by the consolidation classifier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AnalysisKey;

/// Breakout probability tier. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakoutProbability {
    Low,
    Medium,
    High,
}

impl BreakoutProbability {
    pub const ALL: [BreakoutProbability; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for BreakoutProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One consolidation analysis for a symbol on a trading day.
///
/// At most one live record exists per `(symbol, date)`; re-analysis
/// overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub atr: f64,
    pub daily_range: f64,
    pub consecutive_tight_days: u32,
    /// Truncated mean volume of the bars preceding `date`.
    pub avg_volume_trailing: Option<u64>,
    pub current_volume: u64,
    /// `None` when the trailing average is zero or undefined.
    pub volume_ratio: Option<f64>,
    pub is_consolidating: bool,
    pub volume_spike: bool,
    pub breakout_probability: BreakoutProbability,
    pub confidence_score: u8,
    /// How far the day's range sits below ATR, in percent of ATR.
    pub range_tightness_pct: Option<f64>,
    pub price_at_analysis: f64,
}

impl AnalysisRecord {
    pub fn key(&self) -> AnalysisKey {
        AnalysisKey::new(self.symbol.clone(), self.date)
    }
}
