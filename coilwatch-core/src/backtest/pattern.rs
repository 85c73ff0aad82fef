//! Consolidation patterns: runs of consolidating analyses per symbol.
//!
//! Consolidating records are scanned in `(symbol, date)` order. A pattern
//! starts on the first record of a symbol and whenever the streak fails to
//! grow past the previous record's streak. While the streak grows, the
//! pattern keeps its start date and price but takes the peak streak,
//! probability and confidence. An equal streak starts a new pattern; it
//! never rewrites the previous one.
//!
//! Records may be sparse (days without a stored analysis). A grown streak
//! only continues the pattern when the growth can cover the calendar gap
//! between the two records; otherwise the streak must have reset in between
//! and a new pattern starts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::window::{BacktestOutcome, ForwardWindow};
use crate::config::BacktestConfig;
use crate::data::BarSource;
use crate::domain::{AnalysisRecord, BreakoutProbability};

/// Calendar days one trading bar may span, allowing for holidays.
const CALENDAR_DAYS_PER_BAR: i64 = 2;
/// Extra calendar days for weekends around the gap.
const WEEKEND_SLACK_DAYS: i64 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationPattern {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub start_price: f64,
    /// Peak streak seen while the pattern grew.
    pub tight_days: u32,
    pub probability: BreakoutProbability,
    pub confidence_score: u8,
    /// Date of the record the peak values came from.
    pub peak_date: NaiveDate,
}

impl ConsolidationPattern {
    fn start(record: &AnalysisRecord) -> Self {
        Self {
            symbol: record.symbol.clone(),
            start_date: record.date,
            start_price: record.price_at_analysis,
            tight_days: record.consecutive_tight_days,
            probability: record.breakout_probability,
            confidence_score: record.confidence_score,
            peak_date: record.date,
        }
    }

    fn grow(&mut self, record: &AnalysisRecord) {
        self.tight_days = record.consecutive_tight_days;
        self.probability = record.breakout_probability;
        self.confidence_score = record.confidence_score;
        self.peak_date = record.date;
    }
}

enum Step {
    Start,
    Grow,
}

/// True when `record` can extend the tight run `prev` belongs to. The streak
/// must have grown by enough days to span the calendar gap between them.
fn continues_run(prev: &AnalysisRecord, record: &AnalysisRecord) -> bool {
    if prev.symbol != record.symbol
        || record.consecutive_tight_days <= prev.consecutive_tight_days
    {
        return false;
    }
    let growth = i64::from(record.consecutive_tight_days - prev.consecutive_tight_days);
    let gap_days = (record.date - prev.date).num_days();
    gap_days <= growth * CALENDAR_DAYS_PER_BAR + WEEKEND_SLACK_DAYS
}

pub fn group_patterns<'a>(
    records: impl IntoIterator<Item = &'a AnalysisRecord>,
) -> Vec<ConsolidationPattern> {
    let mut consolidating: Vec<&AnalysisRecord> =
        records.into_iter().filter(|r| r.is_consolidating).collect();
    consolidating.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));

    let mut patterns: Vec<ConsolidationPattern> = Vec::new();
    let mut previous: Option<&AnalysisRecord> = None;

    for record in consolidating {
        let step = match previous {
            Some(prev) if continues_run(prev, record) => Step::Grow,
            _ => Step::Start,
        };
        match step {
            Step::Grow => {
                if let Some(current) = patterns.last_mut() {
                    current.grow(record);
                }
            }
            Step::Start => patterns.push(ConsolidationPattern::start(record)),
        }
        previous = Some(record);
    }
    patterns
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternOutcome {
    pub pattern: ConsolidationPattern,
    pub outcome: BacktestOutcome,
}

impl PatternOutcome {
    pub fn had_breakout(&self) -> bool {
        self.outcome.is_breakout()
    }
}

/// Evaluate a pattern over `pattern_window_days` after its start date, using
/// the start record's price as reference.
pub fn evaluate_pattern(
    pattern: &ConsolidationPattern,
    source: &dyn BarSource,
    config: &BacktestConfig,
    now: NaiveDate,
) -> PatternOutcome {
    let window = ForwardWindow {
        trigger_date: pattern.start_date,
        window_days: config.pattern_window_days,
        threshold_pct: config.breakout_threshold_pct,
    };
    let forward = window.forward_bars(source, &pattern.symbol);

    PatternOutcome {
        pattern: pattern.clone(),
        outcome: window.evaluate(Some(pattern.start_price), &forward, now),
    }
}
