//! Coilwatch Core: consolidation detection and breakout backtesting.
//!
//! This crate contains the analytics pipeline:
//! - Domain types (bars, analysis records, alerts, keys and hashes)
//! - True range and Wilder ATR over ascending bar series
//! - Tight-day streaks, trailing volume ratio, probability tier and confidence
//! - Alert decision with deduplication against an alert ledger
//! - Backtest evaluator for alerts and consolidation patterns
//! - Record store trait with an in-memory implementation
//!
//! Nothing here performs I/O. Bars come in through `data::BarSource`; records
//! go out through `store::RecordStore`.

pub mod alerts;
pub mod analysis;
pub mod backtest;
pub mod config;
pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod indicators;
pub mod store;
