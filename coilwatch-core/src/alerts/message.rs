//! Human-readable alert text.

use crate::domain::{AlertType, AnalysisRecord};

fn ratio_text(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{r:.1}x"),
        None => "n/a".to_string(),
    }
}

pub fn alert_message(alert_type: AlertType, record: &AnalysisRecord, volume_avg_period: usize) -> String {
    let symbol = &record.symbol;
    let price = record.price_at_analysis;
    let atr = record.atr;
    let ratio = ratio_text(record.volume_ratio);

    match alert_type {
        AlertType::ConsolidationStart => format!(
            "{symbol} has entered consolidation. The stock has {} consecutive days \
             with daily range below ATR (${atr:.2}). Current price: ${price:.2}. \
             Watch for volume increase.",
            record.consecutive_tight_days
        ),
        AlertType::VolumeSpike => format!(
            "VOLUME SPIKE: {symbol} showing increased volume while in consolidation! \
             Volume is {ratio} the {volume_avg_period}-day average. This could indicate \
             an imminent breakout. Current price: ${price:.2}. ATR: ${atr:.2}."
        ),
        AlertType::BreakoutReady => format!(
            "BREAKOUT ALERT: {symbol} is showing HIGH breakout probability! {} tight days \
             with volume spike detected. Volume is {ratio} average. Current price: ${price:.2}. \
             ATR: ${atr:.2}. Consider setting alerts for a move above recent highs.",
            record.consecutive_tight_days
        ),
        AlertType::BreakoutOccurred => format!(
            "BREAKOUT: {symbol} has broken out of consolidation! Current price: ${price:.2}."
        ),
    }
}
