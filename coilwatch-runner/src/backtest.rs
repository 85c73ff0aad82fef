//! Backtest orchestration over stored records.
//!
//! Evaluation and aggregation live in core; this module wires the record log
//! and settings into them.

use chrono::NaiveDate;

use coilwatch_core::backtest::{day_snapshot, run_backtest, BacktestReport, DaySnapshot};
use coilwatch_core::data::BarSource;
use coilwatch_core::store::RecordStore;

use crate::config::Settings;
use crate::record_log::RecordLog;
use crate::RunError;

/// Run both backtests against `store` under `settings`.
pub fn backtest_store(
    store: &dyn RecordStore,
    source: &dyn BarSource,
    settings: &Settings,
    now: NaiveDate,
) -> BacktestReport {
    run_backtest(store, source, &settings.analysis, &settings.backtest, now)
}

/// Replay the record log and backtest it.
pub fn backtest_from_log(
    log: &RecordLog,
    source: &dyn BarSource,
    settings: &Settings,
    now: NaiveDate,
) -> Result<BacktestReport, RunError> {
    let store = log.load_store()?;
    Ok(backtest_store(&store, source, settings, now))
}

/// Snapshot of every stored analysis on `date`.
pub fn snapshot_from_log(
    log: &RecordLog,
    source: &dyn BarSource,
    settings: &Settings,
    date: NaiveDate,
) -> Result<Option<DaySnapshot>, RunError> {
    let store = log.load_store()?;
    Ok(day_snapshot(
        date,
        &store.analyses_on(date),
        source,
        settings.backtest.snapshot_forward_bars,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use coilwatch_core::analysis::analyze_series;
    use coilwatch_core::data::MemoryBarSource;
    use coilwatch_core::domain::Bar;
    use coilwatch_core::store::MemoryStore;

    use crate::backfill::{backfill, BackfillOptions};

    fn bars(symbol: &str, n: i64, jump_every: i64) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut close = 50.0;
        (0..n)
            .map(|i| {
                if i % jump_every == jump_every - 1 {
                    close *= 1.04;
                }
                Bar {
                    symbol: symbol.into(),
                    date: base + chrono::Duration::days(i),
                    open: close,
                    high: close + 0.4,
                    low: close - 0.4,
                    close,
                    volume: 1_000 + (i as u64 % 4) * 300,
                }
            })
            .collect()
    }

    fn fixture() -> (MemoryBarSource, MemoryStore, Settings) {
        let source = MemoryBarSource::new(BTreeMap::from([
            ("AAA".to_string(), bars("AAA", 70, 9)),
            ("BBB".to_string(), bars("BBB", 70, 13)),
        ]));
        let store = MemoryStore::new();
        let settings = Settings::default();
        let options = BackfillOptions {
            days: 50,
            with_alerts: true,
        };
        backfill(&source, &store, options, &settings.analysis);
        (source, store, settings)
    }

    #[test]
    fn repeated_runs_give_identical_reports() {
        let (source, store, settings) = fixture();
        let now = source.last_date().unwrap();
        let first = backtest_store(&store, &source, &settings, now);
        for _ in 0..4 {
            assert_eq!(backtest_store(&store, &source, &settings, now), first);
        }
        assert!(first.alerts.total_alerts > 0);
        assert!(first.patterns.total_patterns > 0);
    }

    #[test]
    fn report_is_stamped_with_settings_hash() {
        let (source, store, settings) = fixture();
        let now = source.last_date().unwrap();
        let report = backtest_store(&store, &source, &settings, now);
        assert_eq!(report.config_hash, settings.config_hash());
        assert_eq!(report.generated_on, now);
        assert_eq!(report.alerts.total_alerts, report.alerts.outcomes.len());
    }

    #[test]
    fn snapshot_reads_back_from_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = RecordLog::new(dir.path());
        let all = bars("AAA", 40, 9);
        let records = analyze_series("AAA", &all, &Settings::default().analysis);
        log.append_analyses(&records).unwrap();

        let source = MemoryBarSource::new(BTreeMap::from([("AAA".to_string(), all.clone())]));
        let date = all[30].date;
        let snap = snapshot_from_log(&log, &source, &Settings::default(), date)
            .unwrap()
            .expect("analyses exist on date");
        assert_eq!(snap.total_symbols, 1);
        assert_eq!(snap.symbols[0].future_prices.len(), 5);

        let empty = snapshot_from_log(&log, &source, &Settings::default(), all[0].date).unwrap();
        assert!(empty.is_none());
    }
}
