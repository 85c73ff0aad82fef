//! Bar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar for a single symbol.
///
/// Construct from untrusted input through `Bar::try_from(RawBar)` so the
/// price/volume invariants hold for every `Bar` the analytics see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Bar as delivered by a provider, before validation.
///
/// Volume is signed here so that a negative value can be reported instead of
/// silently failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Why a single bar was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must be positive, got {value}")]
    NonPositivePrice { field: &'static str, value: f64 },

    #[error("high {high} is below low {low}")]
    HighBelowLow { high: f64, low: f64 },

    #[error("volume must be non-negative, got {0}")]
    NegativeVolume(i64),

    #[error("duplicate bar for {date}")]
    DuplicateDate { date: NaiveDate },
}

impl Bar {
    /// High minus low for the day.
    pub fn daily_range(&self) -> f64 {
        self.high - self.low
    }
}

impl TryFrom<RawBar> for Bar {
    type Error = BarError;

    fn try_from(raw: RawBar) -> Result<Self, Self::Error> {
        for (field, value) in [
            ("open", raw.open),
            ("high", raw.high),
            ("low", raw.low),
            ("close", raw.close),
        ] {
            if !value.is_finite() {
                return Err(BarError::NonFinite { field });
            }
            if value <= 0.0 {
                return Err(BarError::NonPositivePrice { field, value });
            }
        }
        if raw.high < raw.low {
            return Err(BarError::HighBelowLow {
                high: raw.high,
                low: raw.low,
            });
        }
        let volume = u64::try_from(raw.volume).map_err(|_| BarError::NegativeVolume(raw.volume))?;

        Ok(Bar {
            symbol: raw.symbol,
            date: raw.date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume,
        })
    }
}

/// A bar annotated with its true range and Wilder ATR.
///
/// `atr` stays `None` until the warm-up period has elapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedBar {
    pub bar: Bar,
    pub true_range: f64,
    pub atr: Option<f64>,
}

impl DerivedBar {
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn daily_range(&self) -> f64 {
        self.bar.daily_range()
    }

    /// A day is tight when its range is at or below the ATR in force that day.
    pub fn is_tight(&self) -> bool {
        match self.atr {
            Some(atr) => self.daily_range() <= atr,
            None => false,
        }
    }
}
