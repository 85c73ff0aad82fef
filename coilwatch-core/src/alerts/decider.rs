//! Alert decision: at most one alert per analysis, first match wins.
//!
//! Priority:
//! 1. HIGH probability                 -> BREAKOUT_READY
//! 2. volume spike while consolidating -> VOLUME_SPIKE
//! 3. streak exactly at the threshold  -> CONSOLIDATION_START
//!
//! Before emitting, the ledger is consulted with the key
//! (symbol, type, triggering analysis date); an existing alert suppresses
//! the new one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::message::alert_message;
use crate::config::AnalysisConfig;
use crate::domain::{AlertKey, AlertRecord, AlertType, AnalysisRecord, BreakoutProbability};

/// Read access to alerts already emitted.
pub trait AlertLedger {
    fn contains_alert(&self, key: &AlertKey) -> bool;
}

/// What the decider concluded for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlertDecision {
    Emit(AlertRecord),
    /// An alert of this type already exists for the symbol and date.
    Suppressed(AlertKey),
    NoAlert,
}

impl AlertDecision {
    pub fn into_alert(self) -> Option<AlertRecord> {
        match self {
            Self::Emit(alert) => Some(alert),
            Self::Suppressed(_) | Self::NoAlert => None,
        }
    }
}

/// Pure classification of an analysis into an alert type.
pub fn alert_type_for(record: &AnalysisRecord, config: &AnalysisConfig) -> Option<AlertType> {
    let spike_while_consolidating = record.volume_spike && record.is_consolidating;
    let at_threshold = record.consecutive_tight_days == config.consolidation_threshold_days;

    match (record.breakout_probability, spike_while_consolidating, at_threshold) {
        (BreakoutProbability::High, _, _) => Some(AlertType::BreakoutReady),
        (_, true, _) => Some(AlertType::VolumeSpike),
        (_, false, true) => Some(AlertType::ConsolidationStart),
        (_, false, false) => None,
    }
}

/// Decide and build the alert for `record`, honouring deduplication.
pub fn decide_alert<L: AlertLedger + ?Sized>(
    record: &AnalysisRecord,
    config: &AnalysisConfig,
    ledger: &L,
    created_date: NaiveDate,
) -> AlertDecision {
    let Some(alert_type) = alert_type_for(record, config) else {
        return AlertDecision::NoAlert;
    };

    let key = AlertKey {
        symbol: record.symbol.clone(),
        alert_type,
        trigger_date: record.date,
    };
    if ledger.contains_alert(&key) {
        debug!(alert = %key, "alert already exists, suppressing");
        return AlertDecision::Suppressed(key);
    }

    AlertDecision::Emit(AlertRecord {
        symbol: record.symbol.clone(),
        alert_type,
        message: alert_message(alert_type, record, config.volume_avg_period),
        linked_analysis: record.key(),
        created_date,
    })
}
