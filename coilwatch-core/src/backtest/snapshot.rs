//! What the system showed on a past date, and what happened next.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::classifier::round_to;
use crate::data::BarSource;
use crate::domain::{AnalysisRecord, BreakoutProbability};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardClose {
    pub date: NaiveDate,
    pub close: f64,
    /// Change from the snapshot day's close, percent, 2 decimals.
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    pub symbol: String,
    /// Close on the snapshot date, if a bar exists for it.
    pub price: Option<f64>,
    pub atr: f64,
    pub daily_range: f64,
    pub consecutive_tight_days: u32,
    pub is_consolidating: bool,
    pub volume_spike: bool,
    pub breakout_probability: BreakoutProbability,
    pub confidence_score: u8,
    pub future_prices: Vec<ForwardClose>,
    pub max_future_gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub total_symbols: usize,
    pub consolidating: usize,
    pub high_probability: usize,
    /// Highest tier first, then most confident.
    pub symbols: Vec<SymbolSnapshot>,
}

/// Build the snapshot for `date` from that day's analyses. Returns `None`
/// when nothing was analysed on `date`.
pub fn day_snapshot(
    date: NaiveDate,
    analyses: &[AnalysisRecord],
    source: &dyn BarSource,
    forward_bars: usize,
) -> Option<DaySnapshot> {
    let mut on_date: Vec<&AnalysisRecord> = analyses.iter().filter(|r| r.date == date).collect();
    if on_date.is_empty() {
        return None;
    }
    on_date.sort_by(|a, b| {
        b.breakout_probability
            .cmp(&a.breakout_probability)
            .then(b.confidence_score.cmp(&a.confidence_score))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let symbols: Vec<SymbolSnapshot> = on_date
        .into_iter()
        .map(|r| symbol_snapshot(r, source, forward_bars))
        .collect();

    Some(DaySnapshot {
        date,
        total_symbols: symbols.len(),
        consolidating: symbols.iter().filter(|s| s.is_consolidating).count(),
        high_probability: symbols
            .iter()
            .filter(|s| s.breakout_probability == BreakoutProbability::High)
            .count(),
        symbols,
    })
}

fn symbol_snapshot(record: &AnalysisRecord, source: &dyn BarSource, forward_bars: usize) -> SymbolSnapshot {
    let price = source
        .bars_until(&record.symbol, record.date)
        .ok()
        .and_then(|bars| bars.last().filter(|b| b.date == record.date).map(|b| b.close));

    let future_prices: Vec<ForwardClose> = source
        .bars_between(&record.symbol, record.date, NaiveDate::MAX)
        .unwrap_or_default()
        .into_iter()
        .take(forward_bars)
        .map(|bar| ForwardClose {
            date: bar.date,
            close: bar.close,
            change_pct: price
                .filter(|p| *p > 0.0)
                .map_or(0.0, |p| round_to((bar.close - p) / p * 100.0, 2)),
        })
        .collect();

    let max_future_gain = future_prices
        .iter()
        .map(|f| f.change_pct)
        .reduce(f64::max)
        .unwrap_or(0.0);

    SymbolSnapshot {
        symbol: record.symbol.clone(),
        price,
        atr: record.atr,
        daily_range: record.daily_range,
        consecutive_tight_days: record.consecutive_tight_days,
        is_consolidating: record.is_consolidating,
        volume_spike: record.volume_spike,
        breakout_probability: record.breakout_probability,
        confidence_score: record.confidence_score,
        future_prices,
        max_future_gain,
    }
}
