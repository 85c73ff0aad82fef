//! Group statistics over backtest outcomes.

use serde::{Deserialize, Serialize};

use super::window::{BacktestOutcome, OutcomeStatus};
use crate::analysis::classifier::round_to;

/// Counts and averages for one group (alert type, symbol, tier, streak length).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub total: usize,
    pub breakouts: usize,
    pub non_breakouts: usize,
    pub pending: usize,
    /// `breakouts / total * 100`, 1 decimal. Pending outcomes count in `total`.
    pub accuracy_pct: f64,
    /// Mean max gain of the breakouts, 2 decimals.
    pub avg_gain_pct: f64,
    /// Mean of breakout gains and non-breakout losses, 2 decimals.
    pub avg_move_pct: f64,
}

/// Running accumulator behind `GroupStats`.
#[derive(Debug, Clone, Default)]
pub struct GroupAccumulator {
    total: usize,
    breakouts: usize,
    non_breakouts: usize,
    pending: usize,
    gains: Vec<f64>,
    moves: Vec<f64>,
}

impl GroupAccumulator {
    pub fn add(&mut self, outcome: &BacktestOutcome) {
        self.total += 1;
        match outcome.status {
            OutcomeStatus::Breakout => {
                self.breakouts += 1;
                if let Some(gain) = outcome.max_gain_pct {
                    self.gains.push(gain);
                    self.moves.push(gain);
                }
            }
            OutcomeStatus::NoBreakout => {
                self.non_breakouts += 1;
                if let Some(loss) = outcome.max_loss_pct {
                    self.moves.push(loss);
                }
            }
            OutcomeStatus::Pending => self.pending += 1,
        }
    }

    pub fn finish(&self) -> GroupStats {
        GroupStats {
            total: self.total,
            breakouts: self.breakouts,
            non_breakouts: self.non_breakouts,
            pending: self.pending,
            accuracy_pct: percent(self.breakouts, self.total, 1),
            avg_gain_pct: mean(&self.gains, 2),
            avg_move_pct: mean(&self.moves, 2),
        }
    }
}

impl<'a> FromIterator<&'a BacktestOutcome> for GroupAccumulator {
    fn from_iter<I: IntoIterator<Item = &'a BacktestOutcome>>(iter: I) -> Self {
        let mut acc = Self::default();
        for outcome in iter {
            acc.add(outcome);
        }
        acc
    }
}

/// `part / whole * 100` rounded; 0 for an empty whole.
pub fn percent(part: usize, whole: usize, decimals: i32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_to(part as f64 / whole as f64 * 100.0, decimals)
    }
}

/// Rounded arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64], decimals: i32) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        round_to(values.iter().sum::<f64>() / values.len() as f64, decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::window::OutcomeDetail;

    fn outcome(status: OutcomeStatus, gain: f64, loss: f64) -> BacktestOutcome {
        BacktestOutcome {
            status,
            price_at_trigger: Some(100.0),
            max_price_after: None,
            min_price_after: None,
            max_gain_pct: Some(gain),
            max_loss_pct: Some(loss),
            days_to_max: Some(1),
            detail: OutcomeDetail::NoForwardBars,
        }
    }

    #[test]
    fn empty_group_is_all_zero() {
        assert_eq!(GroupAccumulator::default().finish(), GroupStats::default());
    }

    #[test]
    fn accuracy_counts_pending_in_total() {
        let outcomes = [
            outcome(OutcomeStatus::Breakout, 4.0, -1.0),
            outcome(OutcomeStatus::Breakout, 3.0, -0.5),
            outcome(OutcomeStatus::NoBreakout, 1.0, -2.5),
            outcome(OutcomeStatus::Pending, 0.0, 0.0),
        ];
        let stats = outcomes.iter().collect::<GroupAccumulator>().finish();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.breakouts, 2);
        assert_eq!(stats.non_breakouts, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.accuracy_pct, 50.0);
        assert_eq!(stats.avg_gain_pct, 3.5);
        // (4.0 + 3.0 - 2.5) / 3
        assert_eq!(stats.avg_move_pct, 1.5);
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        assert_eq!(percent(1, 3, 1), 33.3);
        assert_eq!(percent(2, 3, 1), 66.7);
        assert_eq!(percent(5, 0, 1), 0.0);
    }
}
