//! Replaying stored alerts against the bars that followed them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::window::{BacktestOutcome, ForwardWindow};
use crate::config::BacktestConfig;
use crate::data::BarSource;
use crate::domain::{AlertRecord, AlertType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertOutcome {
    pub symbol: String,
    pub alert_type: AlertType,
    pub message: String,
    pub trigger_date: NaiveDate,
    pub created_date: NaiveDate,
    pub outcome: BacktestOutcome,
}

/// Evaluate one alert over `lookforward_days` calendar days after its
/// trigger date. The reference price is the close of the latest bar dated
/// on or before the trigger date.
pub fn evaluate_alert(
    alert: &AlertRecord,
    source: &dyn BarSource,
    config: &BacktestConfig,
    now: NaiveDate,
) -> AlertOutcome {
    let window = ForwardWindow {
        trigger_date: alert.trigger_date(),
        window_days: config.lookforward_days,
        threshold_pct: config.breakout_threshold_pct,
    };

    let price_at_trigger = match source.bars_until(&alert.symbol, window.trigger_date) {
        Ok(bars) => bars.last().map(|b| b.close),
        Err(e) => {
            warn!(symbol = %alert.symbol, error = %e, "no bars for alert");
            None
        }
    };
    let forward = window.forward_bars(source, &alert.symbol);

    AlertOutcome {
        symbol: alert.symbol.clone(),
        alert_type: alert.alert_type,
        message: alert.message.clone(),
        trigger_date: window.trigger_date,
        created_date: alert.created_date,
        outcome: window.evaluate(price_at_trigger, &forward, now),
    }
}
