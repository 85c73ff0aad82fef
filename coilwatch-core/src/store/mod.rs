//! Record store: the upsert boundary for analyses and alerts.
//!
//! The analytics never write anywhere themselves. Callers hand their output
//! to a `RecordStore`, which serialises writes per key.

pub mod memory;

pub use memory::MemoryStore;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::alerts::AlertLedger;
use crate::domain::{AlertRecord, AlertType, AnalysisKey, AnalysisRecord, BreakoutProbability};

/// Upper bound on the dates returned by `available_dates`.
pub const MAX_AVAILABLE_DATES: usize = 90;

/// Whether an upsert created a new analysis or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertResult {
    Inserted,
    Replaced,
}

/// Count of stored alerts, in total and by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub by_type: BTreeMap<AlertType, usize>,
}

impl AlertSummary {
    pub fn from_alerts<'a>(alerts: impl IntoIterator<Item = &'a AlertRecord>) -> Self {
        let mut summary = Self::default();
        for alert in alerts {
            summary.total += 1;
            *summary.by_type.entry(alert.alert_type).or_default() += 1;
        }
        summary
    }

    pub fn count(&self, alert_type: AlertType) -> usize {
        self.by_type.get(&alert_type).copied().unwrap_or(0)
    }
}

/// Storage for analysis and alert records.
///
/// Implementations must keep at most one analysis per `AnalysisKey` and at
/// most one alert per `AlertKey`. Query methods have default implementations
/// on top of `analyses` and `alerts`.
pub trait RecordStore: AlertLedger + Send + Sync {
    /// Insert or overwrite the analysis for `(symbol, date)`.
    fn upsert_analysis(&self, record: AnalysisRecord) -> UpsertResult;

    /// Insert the alert unless one with the same key exists. Returns `true`
    /// when the alert was stored.
    fn insert_alert(&self, alert: AlertRecord) -> bool;

    fn analysis(&self, key: &AnalysisKey) -> Option<AnalysisRecord>;

    /// All analyses in `(symbol, date)` order.
    fn analyses(&self) -> Vec<AnalysisRecord>;

    /// All alerts in `(symbol, type, trigger date)` order.
    fn alerts(&self) -> Vec<AlertRecord>;

    /// The most recent analysis of each symbol, by symbol.
    fn latest_per_symbol(&self) -> Vec<AnalysisRecord> {
        let mut latest: BTreeMap<String, AnalysisRecord> = BTreeMap::new();
        for record in self.analyses() {
            match latest.get(&record.symbol) {
                Some(existing) if existing.date >= record.date => {}
                _ => {
                    latest.insert(record.symbol.clone(), record);
                }
            }
        }
        latest.into_values().collect()
    }

    /// Symbols whose latest analysis is consolidating, longest streak first.
    fn consolidating(&self) -> Vec<AnalysisRecord> {
        let mut records: Vec<_> = self
            .latest_per_symbol()
            .into_iter()
            .filter(|r| r.is_consolidating)
            .collect();
        records.sort_by(|a, b| {
            b.consecutive_tight_days
                .cmp(&a.consecutive_tight_days)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        records
    }

    /// Symbols whose latest analysis is HIGH probability, most confident first.
    fn high_probability(&self) -> Vec<AnalysisRecord> {
        let mut records: Vec<_> = self
            .latest_per_symbol()
            .into_iter()
            .filter(|r| r.breakout_probability == BreakoutProbability::High)
            .collect();
        records.sort_by(|a, b| {
            b.confidence_score
                .cmp(&a.confidence_score)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        records
    }

    fn analyses_on(&self, date: NaiveDate) -> Vec<AnalysisRecord> {
        self.analyses()
            .into_iter()
            .filter(|r| r.date == date)
            .collect()
    }

    /// Distinct analysis dates, newest first, at most `MAX_AVAILABLE_DATES`.
    fn available_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<_> = self.analyses().into_iter().map(|r| r.date).collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        dates.truncate(MAX_AVAILABLE_DATES);
        dates
    }

    /// Alerts whose trigger date is on or after `since`, newest first.
    fn alerts_since(&self, since: NaiveDate) -> Vec<AlertRecord> {
        let mut alerts: Vec<_> = self
            .alerts()
            .into_iter()
            .filter(|a| a.trigger_date() >= since)
            .collect();
        alerts.sort_by(|a, b| {
            b.trigger_date()
                .cmp(&a.trigger_date())
                .then_with(|| a.key().cmp(&b.key()))
        });
        alerts
    }

    fn alert_summary(&self) -> AlertSummary {
        AlertSummary::from_alerts(&self.alerts())
    }
}
