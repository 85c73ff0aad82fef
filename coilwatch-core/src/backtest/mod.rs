//! Backtest evaluator: replays past alerts and consolidation patterns
//! against the price action that followed them.

pub mod aggregate;
pub mod alert_eval;
pub mod pattern;
pub mod report;
pub mod snapshot;
pub mod window;

pub use aggregate::{GroupAccumulator, GroupStats};
pub use alert_eval::{evaluate_alert, AlertOutcome};
pub use pattern::{evaluate_pattern, group_patterns, ConsolidationPattern, PatternOutcome};
pub use report::{
    alert_backtest, pattern_backtest, period_start, run_backtest, AlertBacktestReport,
    AlertSummaryStats, BacktestReport, PatternBacktestReport, PatternSummary,
};
pub use snapshot::{day_snapshot, DaySnapshot, ForwardClose, SymbolSnapshot};
pub use window::{BacktestOutcome, ForwardWindow, OutcomeDetail, OutcomeStatus};
