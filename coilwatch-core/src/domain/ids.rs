use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::alert::AlertType;

/// Identity of an analysis record: one per symbol per trading day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnalysisKey {
    pub symbol: String,
    pub date: NaiveDate,
}

impl AnalysisKey {
    pub fn new(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
        }
    }
}

impl fmt::Display for AnalysisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.date)
    }
}

/// Deduplication key for alerts: symbol, type, and the triggering analysis date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    pub symbol: String,
    pub alert_type: AlertType,
    pub trigger_date: NaiveDate,
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}@{}",
            self.symbol,
            self.alert_type.as_str(),
            self.trigger_date
        )
    }
}

/// Deterministic configuration hash (BLAKE3 of canonical config JSON).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic dataset hash (content hash of loaded bars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
