//! Alert decisions over analysis records.

pub mod decider;
pub mod message;

pub use decider::{alert_type_for, decide_alert, AlertDecision, AlertLedger};
pub use message::alert_message;
