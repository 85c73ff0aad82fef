//! Coilwatch Runner: orchestration around `coilwatch-core`.
//!
//! This crate provides:
//! - TOML settings and CSV bar loading
//! - Parallel batch analysis with alert generation
//! - Historical backfill
//! - Backtest runs over the stored records
//! - JSONL record log persistence
//! - Report export (JSON, CSV, Markdown)

pub mod backfill;
pub mod backtest;
pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod record_log;

use thiserror::Error;

pub use backfill::{backfill, BackfillOptions, BackfillReport, SymbolBackfill};
pub use backtest::{backtest_from_log, backtest_store, snapshot_from_log};
pub use batch::{analyze_all, analyze_symbol, BatchReport, SymbolOutcome, WrittenRecords};
pub use config::{BadBarPolicy, ConfigError, DataSettings, Settings};
pub use data_loader::{compute_dataset_hash, load_csv, load_csv_reader, LoadError, LoadedData};
pub use export::{generate_report, generate_snapshot_report, save_artifacts};
pub use record_log::{LogError, RecordLog};

/// Errors surfaced by runner entry points that touch config, data and state.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("record log error: {0}")]
    Log(#[from] LogError),
}
