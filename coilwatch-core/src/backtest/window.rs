//! Forward-window evaluation shared by alert and pattern backtests.
//!
//! A trigger (alert or pattern start) has a reference price and a date. The
//! window covers bars dated strictly after the trigger and on or before
//! `trigger + window_days`. The outcome is PENDING until that end date is no
//! later than `now`.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use tracing::warn;

use crate::analysis::classifier::round_to;
use crate::data::BarSource;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Breakout,
    NoBreakout,
    Pending,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakout => "BREAKOUT",
            Self::NoBreakout => "NO_BREAKOUT",
            Self::Pending => "PENDING",
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an outcome has the status it has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeDetail {
    /// The window end date is still after `now`.
    AwaitingWindow { window_days: u32 },
    NoTriggerPrice,
    NoForwardBars,
    Breakout { gain_pct: f64, days: i64 },
    /// Gain below threshold and the low fell more than the threshold.
    Breakdown { loss_pct: f64 },
    BelowThreshold { gain_pct: f64, threshold_pct: f64 },
}

impl fmt::Display for OutcomeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingWindow { window_days } => {
                write!(f, "Waiting for {window_days} days of data")
            }
            Self::NoTriggerPrice => f.write_str("No price data at trigger time"),
            Self::NoForwardBars => f.write_str("No future price data available"),
            Self::Breakout { gain_pct, days } => {
                write!(f, "Price moved +{gain_pct}% within {days} days")
            }
            Self::Breakdown { loss_pct } => {
                write!(f, "Price dropped {loss_pct}% (breakdown instead)")
            }
            Self::BelowThreshold {
                gain_pct,
                threshold_pct,
            } => write!(f, "Price moved +{gain_pct}% (below {threshold_pct}% threshold)"),
        }
    }
}

/// Result of replaying one trigger against its forward window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutcome {
    pub status: OutcomeStatus,
    pub price_at_trigger: Option<f64>,
    pub max_price_after: Option<f64>,
    pub min_price_after: Option<f64>,
    /// Highest high vs trigger price, percent, 2 decimals.
    pub max_gain_pct: Option<f64>,
    /// Lowest low vs trigger price, percent, 2 decimals. Negative for a drop.
    pub max_loss_pct: Option<f64>,
    /// Calendar days from the trigger to the first bar with the highest high.
    pub days_to_max: Option<i64>,
    pub detail: OutcomeDetail,
}

impl BacktestOutcome {
    fn pending(price_at_trigger: Option<f64>, detail: OutcomeDetail) -> Self {
        Self {
            status: OutcomeStatus::Pending,
            price_at_trigger,
            max_price_after: None,
            min_price_after: None,
            max_gain_pct: None,
            max_loss_pct: None,
            days_to_max: None,
            detail,
        }
    }

    pub fn is_breakout(&self) -> bool {
        self.status == OutcomeStatus::Breakout
    }
}

/// Trigger and window parameters for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardWindow {
    pub trigger_date: NaiveDate,
    pub window_days: u32,
    pub threshold_pct: f64,
}

impl ForwardWindow {
    /// Last calendar day inside the window.
    pub fn end_date(&self) -> NaiveDate {
        self.trigger_date
            .checked_add_signed(Duration::days(i64::from(self.window_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Bars of `symbol` inside the window. A source error is logged and
    /// treated as no bars, which leaves the outcome PENDING.
    pub fn forward_bars(&self, source: &dyn BarSource, symbol: &str) -> Vec<Bar> {
        match source.bars_between(symbol, self.trigger_date, self.end_date()) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol, trigger = %self.trigger_date, error = %e, "no forward bars");
                Vec::new()
            }
        }
    }

    pub fn has_elapsed(&self, now: NaiveDate) -> bool {
        self.end_date() <= now
    }

    /// Classify the move over `forward`, the bars inside the window.
    ///
    /// Bars outside `(trigger_date, end_date]` are ignored, so callers may
    /// pass a wider slice.
    pub fn evaluate(
        &self,
        price_at_trigger: Option<f64>,
        forward: &[Bar],
        now: NaiveDate,
    ) -> BacktestOutcome {
        let Some(base) = price_at_trigger.filter(|p| *p > 0.0) else {
            return BacktestOutcome::pending(None, OutcomeDetail::NoTriggerPrice);
        };
        if !self.has_elapsed(now) {
            return BacktestOutcome::pending(
                Some(base),
                OutcomeDetail::AwaitingWindow {
                    window_days: self.window_days,
                },
            );
        }

        let end = self.end_date();
        let mut in_window = forward
            .iter()
            .filter(|b| b.date > self.trigger_date && b.date <= end);
        let Some(first) = in_window.next() else {
            return BacktestOutcome::pending(Some(base), OutcomeDetail::NoForwardBars);
        };

        let (mut max_bar, mut min_bar) = (first, first);
        for bar in in_window {
            if bar.high > max_bar.high {
                max_bar = bar;
            }
            if bar.low < min_bar.low {
                min_bar = bar;
            }
        }

        let gain = round_to((max_bar.high - base) / base * 100.0, 2);
        let loss = round_to((min_bar.low - base) / base * 100.0, 2);
        let days = (max_bar.date - self.trigger_date).num_days();

        let (status, detail) = if gain >= self.threshold_pct {
            (
                OutcomeStatus::Breakout,
                OutcomeDetail::Breakout {
                    gain_pct: gain,
                    days,
                },
            )
        } else if loss < -self.threshold_pct {
            (
                OutcomeStatus::NoBreakout,
                OutcomeDetail::Breakdown { loss_pct: loss },
            )
        } else {
            (
                OutcomeStatus::NoBreakout,
                OutcomeDetail::BelowThreshold {
                    gain_pct: gain,
                    threshold_pct: self.threshold_pct,
                },
            )
        };

        BacktestOutcome {
            status,
            price_at_trigger: Some(base),
            max_price_after: Some(max_bar.high),
            min_price_after: Some(min_bar.low),
            max_gain_pct: Some(gain),
            max_loss_pct: Some(loss),
            days_to_max: Some(days),
            detail,
        }
    }
}
