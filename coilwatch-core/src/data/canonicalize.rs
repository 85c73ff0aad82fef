//! Canonicalize provider bars: validate, sort, dedupe, group by symbol.
//!
//! A malformed bar is rejected on its own; the rest of the symbol's history
//! is kept. Callers decide whether rejections fail the batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, BarError, RawBar};

/// A provider row that did not survive validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedBar {
    pub raw: RawBar,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalBars {
    /// Ascending, one bar per date, keyed by symbol.
    pub by_symbol: BTreeMap<String, Vec<Bar>>,
    pub rejected: Vec<RejectedBar>,
}

impl CanonicalBars {
    pub fn bar_count(&self) -> usize {
        self.by_symbol.values().map(Vec::len).sum()
    }
}

pub fn canonicalize(raw: Vec<RawBar>) -> CanonicalBars {
    let mut sorted = raw;
    // Stable sort keeps provider order among same-day rows, so the first one wins.
    sorted.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));

    let mut out = CanonicalBars::default();
    for raw in sorted {
        let series = out.by_symbol.entry(raw.symbol.clone()).or_default();
        if series.last().is_some_and(|prev| prev.date == raw.date) {
            let reason = BarError::DuplicateDate { date: raw.date }.to_string();
            out.rejected.push(RejectedBar { raw, reason });
            continue;
        }
        match Bar::try_from(raw.clone()) {
            Ok(bar) => series.push(bar),
            Err(e) => out.rejected.push(RejectedBar {
                raw,
                reason: e.to_string(),
            }),
        }
    }
    out.by_symbol.retain(|_, bars| !bars.is_empty());
    out
}
