//! Bar source trait and structured error types.
//!
//! The analytics never fetch data themselves; orchestration code hands them
//! slices obtained through a `BarSource`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Bar;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },
}

/// Ordered daily bars per symbol with "as of" slicing.
///
/// Implementations guarantee ascending dates and no duplicate dates.
pub trait BarSource: Send + Sync {
    /// Symbols this source has bars for, sorted.
    fn symbols(&self) -> Vec<String>;

    /// Bars dated on or before `until`.
    fn bars_until(&self, symbol: &str, until: NaiveDate) -> Result<Vec<Bar>, DataError>;

    /// Bars dated strictly after `after` and on or before `until`.
    fn bars_between(
        &self,
        symbol: &str,
        after: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Bar>, DataError>;
}

/// In-memory bar source over already canonicalized series.
#[derive(Debug, Clone, Default)]
pub struct MemoryBarSource {
    bars: BTreeMap<String, Vec<Bar>>,
}

impl MemoryBarSource {
    /// Series must already be ascending with unique dates (see `canonicalize`).
    pub fn new(bars: BTreeMap<String, Vec<Bar>>) -> Self {
        Self { bars }
    }

    pub fn series(&self, symbol: &str) -> Result<&[Bar], DataError> {
        self.bars
            .get(symbol)
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }

    /// Latest bar date across all symbols.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars
            .values()
            .filter_map(|bars| bars.last().map(|b| b.date))
            .max()
    }
}

impl BarSource for MemoryBarSource {
    fn symbols(&self) -> Vec<String> {
        self.bars.keys().cloned().collect()
    }

    fn bars_until(&self, symbol: &str, until: NaiveDate) -> Result<Vec<Bar>, DataError> {
        let series = self.series(symbol)?;
        let end = series.partition_point(|b| b.date <= until);
        Ok(series[..end].to_vec())
    }

    fn bars_between(
        &self,
        symbol: &str,
        after: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let series = self.series(symbol)?;
        let start = series.partition_point(|b| b.date <= after);
        let end = series.partition_point(|b| b.date <= until);
        Ok(series[start..end.max(start)].to_vec())
    }
}
