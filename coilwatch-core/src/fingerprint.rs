//! Run fingerprinting: deterministic identification of analysis settings.
//!
//! A `ConfigFingerprint` pairs the analysis and backtest configuration. Its
//! hash is stamped on every backtest report so two reports can be compared
//! only when they were produced under identical parameters.

use crate::config::{AnalysisConfig, BacktestConfig};
use crate::domain::ConfigHash;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFingerprint {
    pub analysis: AnalysisConfig,
    pub backtest: BacktestConfig,
}

impl ConfigFingerprint {
    pub fn new(analysis: &AnalysisConfig, backtest: &BacktestConfig) -> Self {
        Self {
            analysis: analysis.clone(),
            backtest: backtest.clone(),
        }
    }

    /// BLAKE3 over the canonical JSON. Struct fields serialize in declaration
    /// order, so the JSON is stable across runs.
    pub fn config_hash(&self) -> ConfigHash {
        let json = serde_json::to_string(self).expect("ConfigFingerprint must serialize");
        ConfigHash::from_bytes(json.as_bytes())
    }
}
