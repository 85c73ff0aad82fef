//! Coilwatch CLI: consolidation scanning, backfill and backtests.
//!
//! Commands:
//! - `analyze`: analyse every symbol in a bars CSV as of a date, emit alerts
//! - `backfill`: re-analyse the last N bar dates of every symbol
//! - `backtest`: evaluate stored alerts and patterns against later prices
//! - `snapshot`: what the scanner showed on a past date and what followed
//! - `status`: currently consolidating / HIGH symbols and alert counts
//!
//! Records are kept in a JSONL log under the state directory, so successive
//! runs build on each other.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use coilwatch_core::backtest::period_start;
use coilwatch_core::data::BarSource;
use coilwatch_core::store::RecordStore;
use coilwatch_runner::{
    analyze_all, backfill, backtest_from_log, generate_snapshot_report, load_csv, save_artifacts,
    snapshot_from_log, BackfillOptions, LoadedData, RecordLog, Settings, SymbolOutcome,
};

#[derive(Parser)]
#[command(
    name = "coilwatch",
    about = "Coilwatch: price consolidation scanner and breakout backtester",
    version
)]
struct Cli {
    /// Settings TOML file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State directory holding the record log. Overrides the settings file.
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse symbols as of a date and record any alerts.
    Analyze {
        /// Bars CSV (symbol,date,open,high,low,close,volume).
        #[arg(long)]
        bars: PathBuf,

        /// Analysis date (YYYY-MM-DD). Defaults to the last date in the data.
        #[arg(long, value_parser = parse_date)]
        as_of: Option<NaiveDate>,

        /// Restrict to these symbols (repeatable). Defaults to all.
        #[arg(long)]
        symbol: Vec<String>,
    },
    /// Re-analyse the most recent bar dates of every symbol.
    Backfill {
        #[arg(long)]
        bars: PathBuf,

        /// Number of most recent bar dates per symbol.
        #[arg(long, default_value_t = 60)]
        days: usize,

        /// Also create historical alerts for consolidating days.
        #[arg(long, default_value_t = false)]
        with_alerts: bool,
    },
    /// Backtest stored alerts and consolidation patterns.
    Backtest {
        #[arg(long)]
        bars: PathBuf,

        /// Only evaluate records this many days before `--now`.
        #[arg(long)]
        days_back: Option<u32>,

        /// Evaluation date (YYYY-MM-DD). Defaults to today.
        #[arg(long, value_parser = parse_date)]
        now: Option<NaiveDate>,

        /// Write report.json, CSVs and report.md under this directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the stored analyses of one date with the closes that followed.
    Snapshot {
        #[arg(long)]
        bars: PathBuf,

        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Print JSON instead of Markdown.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Currently consolidating and HIGH probability symbols, alert counts.
    Status {
        /// Recent alert window in days.
        #[arg(long, default_value_t = 7)]
        recent_days: u32,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;
    let state_dir = cli
        .state
        .clone()
        .unwrap_or_else(|| settings.data.state_dir.clone());
    let log = RecordLog::new(state_dir);

    match cli.command {
        Commands::Analyze {
            bars,
            as_of,
            symbol,
        } => run_analyze(&settings, &log, &bars, as_of, symbol),
        Commands::Backfill {
            bars,
            days,
            with_alerts,
        } => run_backfill(&settings, &log, &bars, BackfillOptions { days, with_alerts }),
        Commands::Backtest {
            bars,
            days_back,
            now,
            output,
        } => {
            let mut settings = settings;
            if let Some(days_back) = days_back {
                settings.backtest.days_back = days_back;
                settings.validate()?;
            }
            run_backtest(&settings, &log, &bars, now.unwrap_or_else(today), output.as_deref())
        }
        Commands::Snapshot { bars, date, json } => run_snapshot(&settings, &log, &bars, date, json),
        Commands::Status { recent_days } => run_status(&log, recent_days),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn load_bars(settings: &Settings, path: &Path) -> Result<LoadedData> {
    let loaded = load_csv(path, settings.data.on_bad_bar)
        .with_context(|| format!("failed to load bars from {}", path.display()))?;
    if !loaded.rejected.is_empty() {
        eprintln!("{} bar(s) rejected (see log)", loaded.rejected.len());
    }
    Ok(loaded)
}

fn run_analyze(
    settings: &Settings,
    log: &RecordLog,
    bars: &Path,
    as_of: Option<NaiveDate>,
    symbols: Vec<String>,
) -> Result<()> {
    let loaded = load_bars(settings, bars)?;
    let Some(as_of) = as_of.or_else(|| loaded.source.last_date()) else {
        bail!("no bars loaded, cannot pick an analysis date");
    };
    let symbols = if symbols.is_empty() {
        loaded.source.symbols()
    } else {
        symbols
    };

    let store = log.load_store()?;
    let report = analyze_all(
        &symbols,
        &loaded.source,
        &store,
        as_of,
        today(),
        &settings.analysis,
    );
    log.append_written(&report.written)?;

    println!("Analysis as of {as_of}");
    println!(
        "{:<8} {:>10} {:>5} {:>8} {:>5}  {}",
        "Symbol", "Status", "Tight", "Prob", "Conf", "Alert"
    );
    println!("{}", "-".repeat(56));
    for (symbol, outcome) in &report.outcomes {
        match outcome {
            SymbolOutcome::Analyzed {
                consecutive_tight_days,
                breakout_probability,
                confidence_score,
                alert,
                ..
            } => println!(
                "{:<8} {:>10} {:>5} {:>8} {:>5}  {}",
                symbol,
                "analyzed",
                consecutive_tight_days,
                breakout_probability.as_str(),
                confidence_score,
                alert.map(|a| a.display_name()).unwrap_or("-"),
            ),
            SymbolOutcome::InsufficientData { required, provided } => println!(
                "{:<8} {:>10}  needs {required} bars, has {provided}",
                symbol, "short"
            ),
            SymbolOutcome::Failed { reason } => {
                println!("{:<8} {:>10}  {reason}", symbol, "failed")
            }
        }
    }
    println!();
    println!(
        "{} analyzed, {} insufficient, {} failed, {} alert(s) created",
        report.analyzed, report.insufficient, report.failed, report.alerts_created
    );
    Ok(())
}

fn run_backfill(
    settings: &Settings,
    log: &RecordLog,
    bars: &Path,
    options: BackfillOptions,
) -> Result<()> {
    let loaded = load_bars(settings, bars)?;
    let store = log.load_store()?;
    let report = backfill(&loaded.source, &store, options, &settings.analysis);
    log.append_written(&report.written)?;

    println!(
        "Backfilled {} analyses ({} consolidating) across {} symbols, {} alert(s)",
        report.total_analyses,
        report.total_consolidations,
        report.per_symbol.len(),
        report.total_alerts
    );
    for (symbol, reason) in &report.failed {
        eprintln!("Error for {symbol}: {reason}");
    }
    if !report.failed.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_backtest(
    settings: &Settings,
    log: &RecordLog,
    bars: &Path,
    now: NaiveDate,
    output: Option<&Path>,
) -> Result<()> {
    let loaded = load_bars(settings, bars)?;
    let report = backtest_from_log(log, &loaded.source, settings, now)?;
    let alerts = &report.alerts.summary;
    let patterns = &report.patterns.summary;

    println!("Backtest as of {now} (last {} days)", report.alerts.period_days);
    println!("Config hash:      {}", report.config_hash);
    println!("Dataset hash:     {}", loaded.dataset_hash);
    println!();
    println!("Alerts:           {}", report.alerts.total_alerts);
    println!("  Breakouts:      {}", alerts.total_breakouts);
    println!("  No breakout:    {}", alerts.total_non_breakouts);
    println!("  Pending:        {}", alerts.pending_evaluation);
    println!("  Win rate:       {:.1}%", alerts.win_rate);
    println!("  Avg gain:       {:.2}%", alerts.avg_gain_pct);
    println!("  Avg loss:       {:.2}%", alerts.avg_loss_pct);
    println!();
    println!("Patterns:         {}", report.patterns.total_patterns);
    println!("  Accuracy:       {:.1}%", patterns.overall_accuracy);
    println!("  HIGH accuracy:  {:.1}%", patterns.high_prob_accuracy);
    println!("  Days to break:  {:.1}", patterns.avg_days_to_breakout);

    if let Some(dir) = output {
        let run_dir = save_artifacts(&report, dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
        println!();
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_snapshot(
    settings: &Settings,
    log: &RecordLog,
    bars: &Path,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let loaded = load_bars(settings, bars)?;
    let Some(snapshot) = snapshot_from_log(log, &loaded.source, settings, date)? else {
        let store = log.load_store()?;
        let dates = store.available_dates();
        if dates.is_empty() {
            bail!("no analyses stored; run `coilwatch analyze` or `coilwatch backfill` first");
        }
        let listed: Vec<String> = dates.iter().take(10).map(|d| d.to_string()).collect();
        bail!("no analyses on {date}; recent dates: {}", listed.join(", "));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", generate_snapshot_report(&snapshot));
    }
    Ok(())
}

fn run_status(log: &RecordLog, recent_days: u32) -> Result<()> {
    let store = log.load_store()?;
    let Some(latest) = store.available_dates().first().copied() else {
        println!("No analyses stored in {}", log.dir().display());
        return Ok(());
    };

    println!("State: {}", log.dir().display());
    println!("Latest analysis date: {latest}");
    println!();

    let high = store.high_probability();
    println!("HIGH probability ({}):", high.len());
    for r in &high {
        println!(
            "  {:<8} {}  conf {:>3}  {} tight days  ${:.2}",
            r.symbol, r.date, r.confidence_score, r.consecutive_tight_days, r.price_at_analysis
        );
    }

    let consolidating = store.consolidating();
    println!("Consolidating ({}):", consolidating.len());
    for r in &consolidating {
        println!(
            "  {:<8} {}  {:>6}  {} tight days",
            r.symbol,
            r.date,
            r.breakout_probability.as_str(),
            r.consecutive_tight_days
        );
    }

    let summary = store.alert_summary();
    println!();
    println!("Alerts: {}", summary.total);
    for (alert_type, count) in &summary.by_type {
        println!("  {:<24} {count}", alert_type.display_name());
    }

    let recent = store.alerts_since(period_start(latest, recent_days));
    if !recent.is_empty() {
        println!();
        println!("Recent alerts:");
        for a in &recent {
            println!("  {}  {}", a.trigger_date(), a.alert_type.title(&a.symbol));
        }
    }
    Ok(())
}
