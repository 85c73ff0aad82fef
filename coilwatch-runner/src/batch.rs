//! Batch analysis across symbols.
//!
//! Symbols are independent: each is analysed on the rayon pool and the
//! per-symbol outcomes are gathered into one `BatchReport`. A failing symbol
//! is recorded and never aborts the batch. The only shared state is the
//! `RecordStore`, which serialises its own writes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use coilwatch_core::alerts::{decide_alert, AlertDecision};
use coilwatch_core::analysis::{analyze, AnalysisOutcome};
use coilwatch_core::config::AnalysisConfig;
use coilwatch_core::data::BarSource;
use coilwatch_core::domain::{AlertRecord, AlertType, AnalysisRecord, BreakoutProbability};
use coilwatch_core::store::{RecordStore, UpsertResult};

/// What happened to one symbol in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Analyzed {
        date: NaiveDate,
        consecutive_tight_days: u32,
        is_consolidating: bool,
        breakout_probability: BreakoutProbability,
        confidence_score: u8,
        upsert: UpsertResult,
        alert: Option<AlertType>,
    },
    InsufficientData {
        required: usize,
        provided: usize,
    },
    Failed {
        reason: String,
    },
}

/// Records a run wrote to the store, in write order, for the record log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrittenRecords {
    pub analyses: Vec<AnalysisRecord>,
    pub alerts: Vec<AlertRecord>,
}

impl WrittenRecords {
    pub fn append(&mut self, mut other: WrittenRecords) {
        self.analyses.append(&mut other.analyses);
        self.alerts.append(&mut other.alerts);
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty() && self.alerts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub as_of: NaiveDate,
    pub outcomes: BTreeMap<String, SymbolOutcome>,
    pub analyzed: usize,
    pub insufficient: usize,
    pub failed: usize,
    pub alerts_created: usize,
    #[serde(skip)]
    pub written: WrittenRecords,
}

impl BatchReport {
    fn from_outcomes(
        as_of: NaiveDate,
        outcomes: BTreeMap<String, SymbolOutcome>,
        written: WrittenRecords,
    ) -> Self {
        let mut report = Self {
            as_of,
            outcomes: BTreeMap::new(),
            analyzed: 0,
            insufficient: 0,
            failed: 0,
            alerts_created: 0,
            written,
        };
        for outcome in outcomes.values() {
            match outcome {
                SymbolOutcome::Analyzed { alert, .. } => {
                    report.analyzed += 1;
                    report.alerts_created += usize::from(alert.is_some());
                }
                SymbolOutcome::InsufficientData { .. } => report.insufficient += 1,
                SymbolOutcome::Failed { .. } => report.failed += 1,
            }
        }
        report.outcomes = outcomes;
        report
    }

    /// Symbols whose analysis is HIGH probability.
    pub fn high_probability(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| {
                matches!(
                    o,
                    SymbolOutcome::Analyzed {
                        breakout_probability: BreakoutProbability::High,
                        ..
                    }
                )
            })
            .map(|(s, _)| s.as_str())
            .collect()
    }

    /// Symbols consolidating below the HIGH tier.
    pub fn consolidating(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| {
                matches!(
                    o,
                    SymbolOutcome::Analyzed {
                        is_consolidating: true,
                        breakout_probability: BreakoutProbability::Medium,
                        ..
                    }
                )
            })
            .map(|(s, _)| s.as_str())
            .collect()
    }
}

/// Analyse one symbol as of `as_of`, store the record and any new alert.
///
/// `created_date` stamps emitted alerts; live runs pass today's date.
pub fn analyze_symbol(
    symbol: &str,
    source: &dyn BarSource,
    store: &dyn RecordStore,
    as_of: NaiveDate,
    created_date: NaiveDate,
    config: &AnalysisConfig,
) -> (SymbolOutcome, WrittenRecords) {
    let mut written = WrittenRecords::default();
    let bars = match source.bars_until(symbol, as_of) {
        Ok(bars) => bars,
        Err(e) => {
            warn!(symbol, error = %e, "failed to load bars");
            let reason = e.to_string();
            return (SymbolOutcome::Failed { reason }, written);
        }
    };

    let record = match analyze(symbol, &bars, as_of, config) {
        AnalysisOutcome::Analyzed(record) => record,
        AnalysisOutcome::InsufficientHistory { required, provided } => {
            return (SymbolOutcome::InsufficientData { required, provided }, written);
        }
    };

    let decision = decide_alert(&record, config, store, created_date);
    let upsert = store.upsert_analysis(record.clone());

    let alert = match decision {
        AlertDecision::Emit(alert) => {
            let alert_type = alert.alert_type;
            if store.insert_alert(alert.clone()) {
                written.alerts.push(alert);
                Some(alert_type)
            } else {
                None
            }
        }
        AlertDecision::Suppressed(key) => {
            debug!(alert = %key, "duplicate alert suppressed");
            None
        }
        AlertDecision::NoAlert => None,
    };

    let outcome = SymbolOutcome::Analyzed {
        date: record.date,
        consecutive_tight_days: record.consecutive_tight_days,
        is_consolidating: record.is_consolidating,
        breakout_probability: record.breakout_probability,
        confidence_score: record.confidence_score,
        upsert,
        alert,
    };
    written.analyses.push(record);
    (outcome, written)
}

/// Analyse `symbols` as of `as_of` in parallel.
pub fn analyze_all(
    symbols: &[String],
    source: &dyn BarSource,
    store: &dyn RecordStore,
    as_of: NaiveDate,
    created_date: NaiveDate,
    config: &AnalysisConfig,
) -> BatchReport {
    let runs: Vec<(String, SymbolOutcome, WrittenRecords)> = symbols
        .par_iter()
        .map(|symbol| {
            let (outcome, written) =
                analyze_symbol(symbol, source, store, as_of, created_date, config);
            (symbol.clone(), outcome, written)
        })
        .collect();

    let mut outcomes = BTreeMap::new();
    let mut written = WrittenRecords::default();
    for (symbol, outcome, w) in runs {
        outcomes.insert(symbol, outcome);
        written.append(w);
    }

    let report = BatchReport::from_outcomes(as_of, outcomes, written);
    info!(
        %as_of,
        analyzed = report.analyzed,
        insufficient = report.insufficient,
        failed = report.failed,
        alerts = report.alerts_created,
        "batch analysis complete"
    );
    report
}
