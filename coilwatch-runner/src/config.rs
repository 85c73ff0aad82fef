//! Runner settings loaded from TOML.
//!
//! ```toml
//! [analysis]
//! atr_period = 14
//! consolidation_threshold_days = 3
//!
//! [backtest]
//! breakout_threshold_pct = 2.0
//!
//! [data]
//! state_dir = "coilwatch-state"
//! on_bad_bar = "skip"
//! ```
//!
//! Every section and field is optional; missing values take the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use coilwatch_core::config::{AnalysisConfig, BacktestConfig};
use coilwatch_core::domain::ConfigHash;
use coilwatch_core::fingerprint::ConfigFingerprint;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    Invalid(#[from] coilwatch_core::config::ConfigError),
}

/// What to do with bars that fail validation while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadBarPolicy {
    /// Drop the bar, log it, keep the rest of the symbol.
    #[default]
    Skip,
    /// Fail the whole load.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding the JSONL record log.
    pub state_dir: PathBuf,
    pub on_bad_bar: BadBarPolicy,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("coilwatch-state"),
            on_bad_bar: BadBarPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analysis: AnalysisConfig,
    pub backtest: BacktestConfig,
    pub data: DataSettings,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.backtest.validate()?;
        Ok(())
    }

    pub fn config_hash(&self) -> ConfigHash {
        ConfigFingerprint::new(&self.analysis, &self.backtest).config_hash()
    }
}
