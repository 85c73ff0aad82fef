//! Explicit configuration value objects.
//!
//! Every analytics entry point takes its configuration by reference; nothing
//! in the core reads process-wide settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be >= {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: f64,
        value: f64,
    },

    #[error("{field} must be <= {max}, got {value}")]
    TooLarge {
        field: &'static str,
        max: u32,
        value: u32,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

/// Upper bound for any day-count setting (about a century).
pub const MAX_DAY_COUNT: u32 = 36_500;

fn require_at_least(field: &'static str, value: f64, min: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field });
    }
    if value < min {
        return Err(ConfigError::TooSmall { field, min, value });
    }
    Ok(())
}

fn require_day_count(field: &'static str, value: u32, min: u32) -> Result<(), ConfigError> {
    require_at_least(field, f64::from(value), f64::from(min))?;
    if value > MAX_DAY_COUNT {
        return Err(ConfigError::TooLarge {
            field,
            max: MAX_DAY_COUNT,
            value,
        });
    }
    Ok(())
}

/// Saturation points of the three confidence sub-scores.
///
/// Each component rises linearly from zero and saturates at its cap once the
/// input reaches the configured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceCurve {
    /// Streak length that earns the full 40 points.
    pub full_streak_days: u32,
    /// Volume ratio that earns the full 30 points. Ratios at or below 1.0 earn nothing.
    pub full_volume_ratio: f64,
    /// Range-below-ATR percentage that earns the full 30 points.
    pub full_tightness_pct: f64,
}

impl Default for ConfidenceCurve {
    fn default() -> Self {
        Self {
            full_streak_days: 10,
            full_volume_ratio: 3.0,
            full_tightness_pct: 50.0,
        }
    }
}

/// Parameters of the per-symbol analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub atr_period: usize,
    pub consolidation_threshold_days: u32,
    pub volume_spike_multiplier: f64,
    pub volume_avg_period: usize,
    pub confidence: ConfidenceCurve,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            consolidation_threshold_days: 3,
            volume_spike_multiplier: 1.5,
            volume_avg_period: 20,
            confidence: ConfidenceCurve::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_at_least("atr_period", self.atr_period as f64, 1.0)?;
        require_at_least(
            "consolidation_threshold_days",
            self.consolidation_threshold_days as f64,
            1.0,
        )?;
        require_at_least("volume_spike_multiplier", self.volume_spike_multiplier, 0.0)?;
        require_at_least("volume_avg_period", self.volume_avg_period as f64, 1.0)?;
        require_at_least(
            "confidence.full_streak_days",
            self.confidence.full_streak_days as f64,
            1.0,
        )?;
        require_at_least(
            "confidence.full_volume_ratio",
            self.confidence.full_volume_ratio,
            1.0 + f64::EPSILON,
        )?;
        require_at_least(
            "confidence.full_tightness_pct",
            self.confidence.full_tightness_pct,
            f64::EPSILON,
        )?;
        Ok(())
    }
}

/// Parameters of the backtest evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Minimum max-gain percentage that counts as a breakout.
    pub breakout_threshold_pct: f64,
    /// Calendar days after an alert that make up its forward window.
    pub lookforward_days: u32,
    /// Calendar days after a pattern start that make up its forward window.
    pub pattern_window_days: u32,
    /// Only records triggered within this many days before `now` are evaluated.
    pub days_back: u32,
    /// Number of subsequent bars shown in a historical day snapshot.
    pub snapshot_forward_bars: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            breakout_threshold_pct: 2.0,
            lookforward_days: 5,
            pattern_window_days: 14,
            days_back: 90,
            snapshot_forward_bars: 5,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_at_least("breakout_threshold_pct", self.breakout_threshold_pct, 0.0)?;
        require_day_count("lookforward_days", self.lookforward_days, 1)?;
        require_day_count("pattern_window_days", self.pattern_window_days, 1)?;
        require_day_count("days_back", self.days_back, 0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let a = AnalysisConfig::default();
        assert_eq!(a.atr_period, 14);
        assert_eq!(a.consolidation_threshold_days, 3);
        assert_eq!(a.volume_spike_multiplier, 1.5);
        assert_eq!(a.volume_avg_period, 20);

        let b = BacktestConfig::default();
        assert_eq!(b.breakout_threshold_pct, 2.0);
        assert_eq!(b.lookforward_days, 5);
        assert_eq!(b.pattern_window_days, 14);
    }

    #[test]
    fn defaults_validate() {
        assert!(AnalysisConfig::default().validate().is_ok());
        assert!(BacktestConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_atr_period_rejected() {
        let cfg = AnalysisConfig {
            atr_period: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TooSmall {
                field: "atr_period",
                ..
            })
        ));
    }

    #[test]
    fn oversized_day_counts_rejected() {
        for (field, cfg) in [
            (
                "days_back",
                BacktestConfig {
                    days_back: u32::MAX,
                    ..BacktestConfig::default()
                },
            ),
            (
                "lookforward_days",
                BacktestConfig {
                    lookforward_days: MAX_DAY_COUNT + 1,
                    ..BacktestConfig::default()
                },
            ),
            (
                "pattern_window_days",
                BacktestConfig {
                    pattern_window_days: u32::MAX,
                    ..BacktestConfig::default()
                },
            ),
        ] {
            assert!(
                matches!(cfg.validate(), Err(ConfigError::TooLarge { field: f, .. }) if f == field),
                "{field} should be rejected"
            );
        }

        let at_limit = BacktestConfig {
            days_back: MAX_DAY_COUNT,
            ..BacktestConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn nan_multiplier_rejected() {
        let cfg = AnalysisConfig {
            volume_spike_multiplier: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NotFinite {
                field: "volume_spike_multiplier"
            })
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str(r#"{"atr_period": 10}"#).unwrap();
        assert_eq!(cfg.atr_period, 10);
        assert_eq!(cfg.volume_avg_period, 20);
        assert_eq!(cfg.confidence, ConfidenceCurve::default());
    }
}
