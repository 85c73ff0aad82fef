//! Historical backfill: re-analyse the most recent N bar dates of every
//! symbol so the backtest has history to replay.
//!
//! Each date is analysed from the prefix ending on it, so backfilled records
//! equal what a live run would have produced that day. With alerts enabled,
//! consolidating records go through the same alert decision, stamped with
//! the analysis date as their creation date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use coilwatch_core::alerts::decide_alert;
use coilwatch_core::analysis::analyze_series;
use coilwatch_core::config::AnalysisConfig;
use coilwatch_core::data::BarSource;
use coilwatch_core::store::RecordStore;

use crate::batch::WrittenRecords;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillOptions {
    /// Number of most recent bar dates per symbol.
    pub days: usize,
    pub with_alerts: bool,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            days: 60,
            with_alerts: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolBackfill {
    pub analyses: usize,
    pub consolidations: usize,
    pub alerts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillReport {
    pub options: BackfillOptions,
    pub per_symbol: BTreeMap<String, SymbolBackfill>,
    /// Symbols whose bars could not be read, with the reason.
    pub failed: BTreeMap<String, String>,
    pub total_analyses: usize,
    pub total_consolidations: usize,
    pub total_alerts: usize,
    #[serde(skip)]
    pub written: WrittenRecords,
}

fn backfill_symbol(
    symbol: &str,
    source: &dyn BarSource,
    store: &dyn RecordStore,
    options: BackfillOptions,
    config: &AnalysisConfig,
) -> Result<(SymbolBackfill, WrittenRecords), String> {
    let bars = source
        .bars_until(symbol, NaiveDate::MAX)
        .map_err(|e| e.to_string())?;
    let first = bars.len().saturating_sub(options.days);
    let Some(window_start) = bars.get(first).map(|b| b.date) else {
        return Ok(Default::default());
    };

    let mut stats = SymbolBackfill::default();
    let mut written = WrittenRecords::default();
    for record in analyze_series(symbol, &bars, config)
        .into_iter()
        .filter(|r| r.date >= window_start)
    {
        stats.analyses += 1;
        if record.is_consolidating {
            stats.consolidations += 1;
            if options.with_alerts {
                if let Some(alert) = decide_alert(&record, config, store, record.date).into_alert()
                {
                    if store.insert_alert(alert.clone()) {
                        stats.alerts += 1;
                        written.alerts.push(alert);
                    }
                }
            }
        }
        store.upsert_analysis(record.clone());
        written.analyses.push(record);
    }
    Ok((stats, written))
}

pub fn backfill(
    source: &dyn BarSource,
    store: &dyn RecordStore,
    options: BackfillOptions,
    config: &AnalysisConfig,
) -> BackfillReport {
    let runs: Vec<_> = source
        .symbols()
        .into_par_iter()
        .map(|symbol| {
            let run = backfill_symbol(&symbol, source, store, options, config);
            (symbol, run)
        })
        .collect();

    let mut report = BackfillReport {
        options,
        per_symbol: BTreeMap::new(),
        failed: BTreeMap::new(),
        total_analyses: 0,
        total_consolidations: 0,
        total_alerts: 0,
        written: WrittenRecords::default(),
    };
    for (symbol, run) in runs {
        match run {
            Ok((stats, written)) => {
                report.total_analyses += stats.analyses;
                report.total_consolidations += stats.consolidations;
                report.total_alerts += stats.alerts;
                report.written.append(written);
                report.per_symbol.insert(symbol, stats);
            }
            Err(reason) => {
                warn!(%symbol, %reason, "backfill failed");
                report.failed.insert(symbol, reason);
            }
        }
    }

    info!(
        days = options.days,
        analyses = report.total_analyses,
        consolidations = report.total_consolidations,
        alerts = report.total_alerts,
        "backfill complete"
    );
    report
}
