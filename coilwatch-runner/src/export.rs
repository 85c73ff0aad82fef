//! Reporting and export: JSON, CSV, and Markdown artifacts for backtests.
//!
//! - **JSON**: the full `BacktestReport`, wrapped with a schema version
//! - **CSV**: one row per alert outcome and per pattern outcome
//! - **Markdown**: a readable summary of both backtests, and day snapshots
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use coilwatch_core::backtest::{
    AlertOutcome, BacktestOutcome, BacktestReport, DaySnapshot, GroupStats, PatternOutcome,
};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportManifest {
    pub schema_version: u32,
    pub report: BacktestReport,
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String> {
    let manifest = ReportManifest {
        schema_version: SCHEMA_VERSION,
        report: report.clone(),
    };
    serde_json::to_string_pretty(&manifest).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let manifest: ReportManifest =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest.report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt2(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_default()
}

fn outcome_columns(o: &BacktestOutcome) -> [String; 7] {
    [
        o.status.to_string(),
        opt2(o.price_at_trigger),
        opt2(o.max_price_after),
        opt2(o.min_price_after),
        opt2(o.max_gain_pct),
        opt2(o.max_loss_pct),
        o.days_to_max.map(|d| d.to_string()).unwrap_or_default(),
    ]
}

const OUTCOME_HEADER: [&str; 8] = [
    "status",
    "price_at_trigger",
    "max_price_after",
    "min_price_after",
    "max_gain_pct",
    "max_loss_pct",
    "days_to_max",
    "detail",
];

/// Columns: symbol, alert_type, trigger_date, created_date, then the outcome.
pub fn export_alert_outcomes_csv(outcomes: &[AlertOutcome]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["symbol", "alert_type", "trigger_date", "created_date"];
    header.extend(OUTCOME_HEADER);
    wtr.write_record(&header)?;

    for a in outcomes {
        let mut row = vec![
            a.symbol.clone(),
            a.alert_type.to_string(),
            a.trigger_date.to_string(),
            a.created_date.to_string(),
        ];
        row.extend(outcome_columns(&a.outcome));
        row.push(a.outcome.detail.to_string());
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: symbol, start_date, peak_date, tight_days, probability,
/// confidence_score, then the outcome.
pub fn export_pattern_outcomes_csv(patterns: &[PatternOutcome]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec![
        "symbol",
        "start_date",
        "peak_date",
        "tight_days",
        "probability",
        "confidence_score",
    ];
    header.extend(OUTCOME_HEADER);
    wtr.write_record(&header)?;

    for p in patterns {
        let pat = &p.pattern;
        let mut row = vec![
            pat.symbol.clone(),
            pat.start_date.to_string(),
            pat.peak_date.to_string(),
            pat.tight_days.to_string(),
            pat.probability.to_string(),
            pat.confidence_score.to_string(),
        ];
        row.extend(outcome_columns(&p.outcome));
        row.push(p.outcome.detail.to_string());
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one backtest.
///
/// Creates `backtest_{generated_on}/` under `output_dir` containing
/// `report.json`, `alert_outcomes.csv`, `pattern_outcomes.csv` and
/// `report.md`. Returns the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(format!("backtest_{}", report.generated_on));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let files = [
        ("report.json", export_json(report)?),
        ("alert_outcomes.csv", export_alert_outcomes_csv(&report.alerts.outcomes)?),
        ("pattern_outcomes.csv", export_pattern_outcomes_csv(&report.patterns.patterns)?),
        ("report.md", generate_report(report)),
    ];
    for (name, contents) in files {
        let path = run_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(run_dir)
}

pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

fn group_table<K: std::fmt::Display>(
    md: &mut String,
    label: &str,
    groups: impl IntoIterator<Item = (K, GroupStats)>,
) {
    md.push_str(&format!(
        "| {label} | Total | Breakouts | No Breakout | Pending | Accuracy | Avg Gain | Avg Move |\n"
    ));
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for (key, s) in groups {
        md.push_str(&format!(
            "| {key} | {} | {} | {} | {} | {:.1}% | {:.2}% | {:.2}% |\n",
            s.total, s.breakouts, s.non_breakouts, s.pending, s.accuracy_pct, s.avg_gain_pct, s.avg_move_pct
        ));
    }
    md.push('\n');
}

pub fn generate_report(report: &BacktestReport) -> String {
    let mut md = String::with_capacity(4096);
    let alerts = &report.alerts;
    let patterns = &report.patterns;

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Generated On | {} |\n", report.generated_on));
    md.push_str(&format!("| Period | last {} days |\n", alerts.period_days));
    md.push_str(&format!("| Config Hash | {} |\n", report.config_hash));
    md.push('\n');

    md.push_str("## Alerts\n\n");
    let s = &alerts.summary;
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!("| Alerts | {} |\n", alerts.total_alerts));
    md.push_str(&format!("| Breakouts | {} |\n", s.total_breakouts));
    md.push_str(&format!("| No Breakout | {} |\n", s.total_non_breakouts));
    md.push_str(&format!("| Pending | {} |\n", s.pending_evaluation));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", s.win_rate));
    md.push_str(&format!("| Avg Gain | {:.2}% |\n", s.avg_gain_pct));
    md.push_str(&format!("| Avg Loss | {:.2}% |\n", s.avg_loss_pct));
    md.push_str(&format!("| Best Gain | {:.2}% |\n", s.best_gain_pct));
    md.push_str(&format!("| Worst Loss | {:.2}% |\n", s.worst_loss_pct));
    md.push('\n');

    if !alerts.by_type.is_empty() {
        md.push_str("### By Alert Type\n\n");
        group_table(
            &mut md,
            "Type",
            alerts.by_type.iter().map(|(k, v)| (k.display_name(), v.clone())),
        );
    }
    if !alerts.by_symbol.is_empty() {
        md.push_str("### By Symbol\n\n");
        group_table(&mut md, "Symbol", alerts.by_symbol.clone());
    }

    md.push_str("## Consolidation Patterns\n\n");
    let p = &patterns.summary;
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!("| Patterns | {} |\n", patterns.total_patterns));
    md.push_str(&format!("| Overall Accuracy | {:.1}% |\n", p.overall_accuracy));
    md.push_str(&format!("| HIGH Accuracy | {:.1}% |\n", p.high_prob_accuracy));
    md.push_str(&format!("| Avg Days to Breakout | {:.1} |\n", p.avg_days_to_breakout));
    md.push('\n');

    md.push_str("### By Probability\n\n");
    group_table(
        &mut md,
        "Probability",
        patterns.by_probability.iter().rev().map(|(k, v)| (*k, v.clone())),
    );
    if !patterns.by_tight_days.is_empty() {
        md.push_str("### By Tight Days\n\n");
        group_table(&mut md, "Tight Days", patterns.by_tight_days.clone());
    }

    md
}

/// Markdown table of one day snapshot.
pub fn generate_snapshot_report(snapshot: &DaySnapshot) -> String {
    let mut md = String::with_capacity(2048);
    md.push_str(&format!("# Snapshot {}\n\n", snapshot.date));
    md.push_str(&format!(
        "{} symbols analysed, {} consolidating, {} HIGH probability.\n\n",
        snapshot.total_symbols, snapshot.consolidating, snapshot.high_probability
    ));
    md.push_str("| Symbol | Price | ATR | Range | Tight Days | Probability | Confidence | Next Closes | Max Gain |\n");
    md.push_str("| --- | ---: | ---: | ---: | ---: | --- | ---: | --- | ---: |\n");
    for s in &snapshot.symbols {
        let closes = s
            .future_prices
            .iter()
            .map(|f| format!("{:+.2}%", f.change_pct))
            .collect::<Vec<_>>()
            .join(" ");
        md.push_str(&format!(
            "| {} | {} | {:.2} | {:.2} | {} | {} | {} | {} | {:.2}% |\n",
            s.symbol,
            s.price.map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".into()),
            s.atr,
            s.daily_range,
            s.consecutive_tight_days,
            s.breakout_probability,
            s.confidence_score,
            closes,
            s.max_future_gain,
        ));
    }
    md
}
