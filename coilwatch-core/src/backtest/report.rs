//! Backtest reports: per-record outcomes plus grouped and top-line figures.
//!
//! Every summary number is derived from the same per-record outcomes as the
//! grouped breakdowns, so the two never disagree.
//!
//! Records are evaluated in parallel; the report builders fix outcome order,
//! so results do not depend on thread scheduling.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::aggregate::{mean, percent, GroupAccumulator, GroupStats};
use super::alert_eval::{evaluate_alert, AlertOutcome};
use super::pattern::{evaluate_pattern, group_patterns, PatternOutcome};
use super::window::OutcomeStatus;
use crate::config::{AnalysisConfig, BacktestConfig};
use crate::data::BarSource;
use crate::domain::{AlertRecord, AlertType, AnalysisRecord, BreakoutProbability, ConfigHash};
use crate::fingerprint::ConfigFingerprint;
use crate::store::RecordStore;

/// First trigger date inside the evaluation period. Saturates at the
/// earliest representable date.
pub fn period_start(now: NaiveDate, days_back: u32) -> NaiveDate {
    now.checked_sub_signed(Duration::days(i64::from(days_back)))
        .unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertSummaryStats {
    pub total_breakouts: usize,
    pub total_non_breakouts: usize,
    pub pending_evaluation: usize,
    /// Breakouts over resolved outcomes, percent, 1 decimal.
    pub win_rate: f64,
    pub avg_gain_pct: f64,
    pub avg_loss_pct: f64,
    pub best_gain_pct: f64,
    pub worst_loss_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertBacktestReport {
    pub period_days: u32,
    pub total_alerts: usize,
    /// Newest trigger first.
    pub outcomes: Vec<AlertOutcome>,
    pub by_type: BTreeMap<AlertType, GroupStats>,
    pub by_symbol: BTreeMap<String, GroupStats>,
    pub summary: AlertSummaryStats,
}

impl AlertBacktestReport {
    pub fn from_outcomes(period_days: u32, mut outcomes: Vec<AlertOutcome>) -> Self {
        outcomes.sort_by(|a, b| {
            b.trigger_date
                .cmp(&a.trigger_date)
                .then_with(|| a.symbol.cmp(&b.symbol))
                .then_with(|| a.alert_type.cmp(&b.alert_type))
        });

        let mut by_type: BTreeMap<AlertType, GroupAccumulator> = BTreeMap::new();
        let mut by_symbol: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
        let mut gains = Vec::new();
        let mut losses = Vec::new();
        let mut summary = AlertSummaryStats::default();

        for o in &outcomes {
            by_type.entry(o.alert_type).or_default().add(&o.outcome);
            by_symbol.entry(o.symbol.clone()).or_default().add(&o.outcome);
            match o.outcome.status {
                OutcomeStatus::Breakout => {
                    summary.total_breakouts += 1;
                    gains.extend(o.outcome.max_gain_pct);
                }
                OutcomeStatus::NoBreakout => {
                    summary.total_non_breakouts += 1;
                    losses.extend(o.outcome.max_loss_pct);
                }
                OutcomeStatus::Pending => summary.pending_evaluation += 1,
            }
        }

        summary.win_rate = percent(
            summary.total_breakouts,
            summary.total_breakouts + summary.total_non_breakouts,
            1,
        );
        summary.avg_gain_pct = mean(&gains, 2);
        summary.avg_loss_pct = mean(&losses, 2);
        summary.best_gain_pct = gains.iter().copied().reduce(f64::max).unwrap_or(0.0);
        summary.worst_loss_pct = losses.iter().copied().reduce(f64::min).unwrap_or(0.0);

        Self {
            period_days,
            total_alerts: outcomes.len(),
            by_type: by_type.into_iter().map(|(k, v)| (k, v.finish())).collect(),
            by_symbol: by_symbol.into_iter().map(|(k, v)| (k, v.finish())).collect(),
            outcomes,
            summary,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub overall_accuracy: f64,
    pub high_prob_accuracy: f64,
    pub avg_days_to_breakout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternBacktestReport {
    pub period_days: u32,
    pub total_patterns: usize,
    pub patterns: Vec<PatternOutcome>,
    /// Always holds all three tiers.
    pub by_probability: BTreeMap<BreakoutProbability, GroupStats>,
    pub by_tight_days: BTreeMap<u32, GroupStats>,
    pub summary: PatternSummary,
}

impl PatternBacktestReport {
    pub fn from_outcomes(period_days: u32, patterns: Vec<PatternOutcome>) -> Self {
        let mut by_probability: BTreeMap<BreakoutProbability, GroupAccumulator> =
            BreakoutProbability::ALL
                .into_iter()
                .map(|p| (p, GroupAccumulator::default()))
                .collect();
        let mut by_tight_days: BTreeMap<u32, GroupAccumulator> = BTreeMap::new();
        let mut days_to_breakout = Vec::new();
        let mut breakouts = 0;

        for p in &patterns {
            by_probability
                .entry(p.pattern.probability)
                .or_default()
                .add(&p.outcome);
            by_tight_days
                .entry(p.pattern.tight_days)
                .or_default()
                .add(&p.outcome);
            if p.had_breakout() {
                breakouts += 1;
                days_to_breakout.extend(p.outcome.days_to_max.map(|d| d as f64));
            }
        }

        let by_probability: BTreeMap<_, _> = by_probability
            .into_iter()
            .map(|(k, v)| (k, v.finish()))
            .collect();
        let high_prob_accuracy = by_probability
            .get(&BreakoutProbability::High)
            .map_or(0.0, |s| s.accuracy_pct);

        Self {
            period_days,
            total_patterns: patterns.len(),
            summary: PatternSummary {
                overall_accuracy: percent(breakouts, patterns.len(), 1),
                high_prob_accuracy,
                avg_days_to_breakout: mean(&days_to_breakout, 1),
            },
            by_probability,
            by_tight_days: by_tight_days
                .into_iter()
                .map(|(k, v)| (k, v.finish()))
                .collect(),
            patterns,
        }
    }
}

/// Both backtests under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub config_hash: ConfigHash,
    pub generated_on: NaiveDate,
    pub alerts: AlertBacktestReport,
    pub patterns: PatternBacktestReport,
}

impl BacktestReport {
    /// Headline line for logs and the CLI.
    pub fn headline(&self) -> String {
        format!(
            "{} alerts, win rate {}%; {} patterns, accuracy {}% (HIGH {}%)",
            self.alerts.total_alerts,
            self.alerts.summary.win_rate,
            self.patterns.total_patterns,
            self.patterns.summary.overall_accuracy,
            self.patterns.summary.high_prob_accuracy,
        )
    }
}

/// Evaluate alerts triggered within `days_back` of `now`.
pub fn alert_backtest(
    alerts: &[AlertRecord],
    source: &dyn BarSource,
    config: &BacktestConfig,
    now: NaiveDate,
) -> AlertBacktestReport {
    let start = period_start(now, config.days_back);
    let outcomes = alerts
        .par_iter()
        .filter(|a| a.trigger_date() >= start)
        .map(|a| evaluate_alert(a, source, config, now))
        .collect();
    AlertBacktestReport::from_outcomes(config.days_back, outcomes)
}

/// Group analyses dated within `days_back` of `now` into patterns and
/// evaluate each one.
pub fn pattern_backtest(
    analyses: &[AnalysisRecord],
    source: &dyn BarSource,
    config: &BacktestConfig,
    now: NaiveDate,
) -> PatternBacktestReport {
    let start = period_start(now, config.days_back);
    let patterns = group_patterns(analyses.iter().filter(|r| r.date >= start));
    let outcomes = patterns
        .par_iter()
        .map(|p| evaluate_pattern(p, source, config, now))
        .collect();
    PatternBacktestReport::from_outcomes(config.days_back, outcomes)
}

pub fn run_backtest(
    store: &dyn RecordStore,
    source: &dyn BarSource,
    analysis: &AnalysisConfig,
    config: &BacktestConfig,
    now: NaiveDate,
) -> BacktestReport {
    let report = BacktestReport {
        config_hash: ConfigFingerprint::new(analysis, config).config_hash(),
        generated_on: now,
        alerts: alert_backtest(&store.alerts(), source, config, now),
        patterns: pattern_backtest(&store.analyses(), source, config, now),
    };
    info!(
        days_back = config.days_back,
        alerts = report.alerts.total_alerts,
        patterns = report.patterns.total_patterns,
        summary = %report.headline(),
        "backtest complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::pattern::ConsolidationPattern;
    use crate::backtest::window::{BacktestOutcome, OutcomeDetail};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn outcome(status: OutcomeStatus, gain: f64, loss: f64, days: i64) -> BacktestOutcome {
        BacktestOutcome {
            status,
            price_at_trigger: Some(50.0),
            max_price_after: None,
            min_price_after: None,
            max_gain_pct: Some(gain),
            max_loss_pct: Some(loss),
            days_to_max: Some(days),
            detail: OutcomeDetail::NoForwardBars,
        }
    }

    fn alert_outcome(symbol: &str, t: AlertType, d: u32, o: BacktestOutcome) -> AlertOutcome {
        AlertOutcome {
            symbol: symbol.into(),
            alert_type: t,
            message: String::new(),
            trigger_date: day(d),
            created_date: day(d),
            outcome: o,
        }
    }

    fn pattern_outcome(tier: BreakoutProbability, tight: u32, o: BacktestOutcome) -> PatternOutcome {
        PatternOutcome {
            pattern: ConsolidationPattern {
                symbol: "QQQ".into(),
                start_date: day(1),
                start_price: 50.0,
                tight_days: tight,
                probability: tier,
                confidence_score: 50,
                peak_date: day(1),
            },
            outcome: o,
        }
    }

    #[test]
    fn alert_summary_uses_resolved_outcomes_for_win_rate() {
        let report = AlertBacktestReport::from_outcomes(
            90,
            vec![
                alert_outcome("A", AlertType::BreakoutReady, 1, outcome(OutcomeStatus::Breakout, 5.0, -1.0, 2)),
                alert_outcome("A", AlertType::VolumeSpike, 3, outcome(OutcomeStatus::NoBreakout, 1.0, -3.0, 1)),
                alert_outcome("B", AlertType::BreakoutReady, 2, outcome(OutcomeStatus::Breakout, 3.0, -0.5, 4)),
                alert_outcome("B", AlertType::ConsolidationStart, 9, outcome(OutcomeStatus::Pending, 0.0, 0.0, 0)),
            ],
        );
        assert_eq!(report.total_alerts, 4);
        assert_eq!(report.outcomes[0].trigger_date, day(9));
        assert_eq!(report.summary.win_rate, 66.7);
        assert_eq!(report.summary.pending_evaluation, 1);
        assert_eq!(report.summary.avg_gain_pct, 4.0);
        assert_eq!(report.summary.best_gain_pct, 5.0);
        assert_eq!(report.summary.worst_loss_pct, -3.0);

        let ready = &report.by_type[&AlertType::BreakoutReady];
        assert_eq!((ready.total, ready.breakouts), (2, 2));
        assert_eq!(report.by_symbol["B"].pending, 1);
        assert!(!report.by_type.contains_key(&AlertType::BreakoutOccurred));
    }

    #[test]
    fn empty_alert_report_is_zeroed() {
        let report = AlertBacktestReport::from_outcomes(30, Vec::new());
        assert_eq!(report.total_alerts, 0);
        assert_eq!(report.summary, AlertSummaryStats::default());
    }

    #[test]
    fn pattern_report_keeps_all_tiers_and_consistent_summary() {
        let report = PatternBacktestReport::from_outcomes(
            90,
            vec![
                pattern_outcome(BreakoutProbability::High, 5, outcome(OutcomeStatus::Breakout, 4.0, -1.0, 3)),
                pattern_outcome(BreakoutProbability::High, 5, outcome(OutcomeStatus::NoBreakout, 1.0, -1.0, 6)),
                pattern_outcome(BreakoutProbability::Medium, 3, outcome(OutcomeStatus::Breakout, 2.5, 0.0, 6)),
                pattern_outcome(BreakoutProbability::Medium, 3, outcome(OutcomeStatus::Pending, 0.0, 0.0, 0)),
            ],
        );
        assert_eq!(report.by_probability.len(), 3);
        assert_eq!(report.by_probability[&BreakoutProbability::Low].total, 0);
        assert_eq!(report.summary.overall_accuracy, 50.0);
        assert_eq!(report.summary.high_prob_accuracy, 50.0);
        assert_eq!(
            report.summary.high_prob_accuracy,
            report.by_probability[&BreakoutProbability::High].accuracy_pct
        );
        assert_eq!(report.summary.avg_days_to_breakout, 4.5);
        assert_eq!(report.by_tight_days[&3].breakouts, 1);
        assert_eq!(report.by_tight_days[&5].total, 2);
    }

    #[test]
    fn period_start_counts_back_calendar_days() {
        assert_eq!(period_start(day(30), 10), day(20));
    }

    #[test]
    fn period_start_saturates_instead_of_overflowing() {
        assert_eq!(period_start(day(1), u32::MAX), NaiveDate::MIN);
    }
}
