//! End-to-end runner pipeline on files in a temp dir:
//! CSV -> batch analysis -> record log -> replay -> backfill -> backtest -> artifacts.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{Duration, NaiveDate};

use coilwatch_core::data::BarSource;
use coilwatch_core::domain::{AlertType, BreakoutProbability};
use coilwatch_core::store::RecordStore;
use coilwatch_runner::export::load_artifacts;
use coilwatch_runner::{
    analyze_all, backfill, backtest_from_log, load_csv, save_artifacts, snapshot_from_log,
    BackfillOptions, BadBarPolicy, RecordLog, Settings, SymbolOutcome,
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
}

/// COIL: 30 quiet days, volume surge on day 30, then a 5% rally.
/// DRIFT: wide alternating ranges, never tight for long.
fn write_bars(path: &Path) {
    let mut csv = String::from("symbol,date,open,high,low,close,volume\n");
    for i in 0..36i64 {
        let date = start() + Duration::days(i);
        let (high, low, close, volume) = match i {
            0..=28 => (40.25, 39.75, 40.0, 1_000),
            29 => (40.25, 39.75, 40.0, 2_500),
            _ => {
                let c = 40.0 + (i - 29) as f64 * 0.4;
                (c + 0.1, c - 0.1, c, 1_200)
            }
        };
        let _ = writeln!(csv, "COIL,{date},{close},{high},{low},{close},{volume}");

        let half = if i % 2 == 0 { 0.25 } else { 1.5 };
        let _ = writeln!(
            csv,
            "DRIFT,{date},25.0,{},{},25.0,800",
            25.0 + half,
            25.0 - half
        );
    }
    // A broken row that the skip policy drops.
    csv.push_str("BAD,2024-04-01,10.0,9.0,11.0,10.0,100\n");
    std::fs::write(path, csv).unwrap();
}

#[test]
fn full_pipeline_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let bars_path = dir.path().join("bars.csv");
    write_bars(&bars_path);

    let settings = Settings::default();
    let loaded = load_csv(&bars_path, BadBarPolicy::Skip).unwrap();
    assert_eq!(loaded.rejected.len(), 1);
    assert_eq!(loaded.source.symbols(), vec!["COIL", "DRIFT"]);

    // Live analysis on the surge day.
    let surge = start() + Duration::days(29);
    let log = RecordLog::new(dir.path().join("state"));
    let store = log.load_store().unwrap();
    let batch = analyze_all(
        &loaded.source.symbols(),
        &loaded.source,
        &store,
        surge,
        surge,
        &settings.analysis,
    );
    log.append_written(&batch.written).unwrap();

    match &batch.outcomes["COIL"] {
        SymbolOutcome::Analyzed {
            breakout_probability,
            alert,
            ..
        } => {
            assert_eq!(*breakout_probability, BreakoutProbability::High);
            assert_eq!(*alert, Some(AlertType::BreakoutReady));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(batch.high_probability(), vec!["COIL"]);

    // Replay equals the live store.
    let replayed = log.load_store().unwrap();
    assert_eq!(replayed.analyses(), store.analyses());
    assert_eq!(replayed.alerts(), store.alerts());

    // Backfill history, persisting it to the same log.
    let filled = backfill(
        &loaded.source,
        &replayed,
        BackfillOptions {
            days: 30,
            with_alerts: true,
        },
        &settings.analysis,
    );
    assert!(filled.failed.is_empty());
    log.append_written(&filled.written).unwrap();
    let alerts_after_backfill = replayed.alert_count();
    assert_eq!(log.load_store().unwrap().alert_count(), alerts_after_backfill);

    // Backtest at the end of the data: the surge alert has a full window.
    let now = start() + Duration::days(35);
    let report = backtest_from_log(&log, &loaded.source, &settings, now).unwrap();
    let surge_alert = report
        .alerts
        .outcomes
        .iter()
        .find(|o| o.symbol == "COIL" && o.alert_type == AlertType::BreakoutReady)
        .expect("surge alert evaluated");
    assert!(surge_alert.outcome.is_breakout());
    assert_eq!(report.config_hash, settings.config_hash());

    // Artifacts load back to the same report.
    let out = save_artifacts(&report, &dir.path().join("reports")).unwrap();
    assert_eq!(load_artifacts(&out).unwrap(), report);

    // Snapshot of the surge day ranks COIL first.
    let snap = snapshot_from_log(&log, &loaded.source, &settings, surge)
        .unwrap()
        .unwrap();
    assert_eq!(snap.symbols[0].symbol, "COIL");
    assert!(snap.symbols[0].max_future_gain > 2.0);
}

#[test]
fn fail_policy_rejects_bad_rows() {
    let dir = tempfile::tempdir().unwrap();
    let bars_path = dir.path().join("bars.csv");
    write_bars(&bars_path);
    let err = load_csv(&bars_path, BadBarPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("1 bar(s) rejected"));
}

#[test]
fn settings_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coilwatch.toml");
    std::fs::write(
        &path,
        "[analysis]\nconsolidation_threshold_days = 5\n\n[data]\nstate_dir = \"elsewhere\"\n",
    )
    .unwrap();
    let settings = Settings::from_file(&path).unwrap();
    assert_eq!(settings.analysis.consolidation_threshold_days, 5);
    assert_eq!(settings.analysis.atr_period, 14);
    assert_ne!(settings.config_hash(), Settings::default().config_hash());
}
