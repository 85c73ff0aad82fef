//! Alert records and their closed set of types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AlertKey, AnalysisKey};

/// Alert categories, in descending decision priority for the first three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    ConsolidationStart,
    VolumeSpike,
    BreakoutReady,
    BreakoutOccurred,
}

/// Severity used by in-app notification consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Alert,
    Success,
}

impl AlertType {
    pub const ALL: [AlertType; 4] = [
        Self::ConsolidationStart,
        Self::VolumeSpike,
        Self::BreakoutReady,
        Self::BreakoutOccurred,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsolidationStart => "CONSOLIDATION_START",
            Self::VolumeSpike => "VOLUME_SPIKE",
            Self::BreakoutReady => "BREAKOUT_READY",
            Self::BreakoutOccurred => "BREAKOUT_OCCURRED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ConsolidationStart => "Consolidation Started",
            Self::VolumeSpike => "Volume Spike Detected",
            Self::BreakoutReady => "Breakout Ready",
            Self::BreakoutOccurred => "Breakout Occurred",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::ConsolidationStart => Severity::Info,
            Self::VolumeSpike => Severity::Warning,
            Self::BreakoutReady => Severity::Alert,
            Self::BreakoutOccurred => Severity::Success,
        }
    }

    /// Short notification title, e.g. "NVDA Breakout Ready!".
    pub fn title(&self, symbol: &str) -> String {
        match self {
            Self::ConsolidationStart => format!("{symbol} Consolidating"),
            Self::VolumeSpike => format!("{symbol} Volume Spike"),
            Self::BreakoutReady => format!("{symbol} Breakout Ready!"),
            Self::BreakoutOccurred => format!("{symbol} Breakout!"),
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An emitted alert, linked to the analysis that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub symbol: String,
    pub alert_type: AlertType,
    pub message: String,
    pub linked_analysis: AnalysisKey,
    /// Day the alert was created. Backfilled alerts use the analysis date.
    pub created_date: NaiveDate,
}

impl AlertRecord {
    /// Date of the analysis that triggered this alert.
    pub fn trigger_date(&self) -> NaiveDate {
        self.linked_analysis.date
    }

    pub fn key(&self) -> AlertKey {
        AlertKey {
            symbol: self.symbol.clone(),
            alert_type: self.alert_type,
            trigger_date: self.trigger_date(),
        }
    }
}
