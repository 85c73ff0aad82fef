//! True range and Wilder-smoothed Average True Range.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), with
//! TR[0] = high-low since the first bar has no previous close.
//! ATR seed: mean of the first `period` true ranges (TR[0] included), placed at
//! index `period - 1`. Afterwards ATR[t] = (ATR[t-1] * (period-1) + TR[t]) / period.

use thiserror::Error;

use crate::domain::{Bar, DerivedBar};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("insufficient data: need {required} bars, have {provided}")]
    InsufficientData { required: usize, provided: usize },
}

/// Compute the True Range series from ascending bars.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let range = bar.high - bar.low;
        if i == 0 {
            tr.push(range);
            continue;
        }
        let pc = bars[i - 1].close;
        tr.push(range.max((bar.high - pc).abs()).max((bar.low - pc).abs()));
    }
    tr
}

/// Apply Wilder smoothing. Values before the seed index are `None`.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);

    let weight = (period - 1) as f64;
    let mut prev = seed;
    for i in period..n {
        let smoothed = (prev * weight + values[i]) / period as f64;
        result[i] = Some(smoothed);
        prev = smoothed;
    }

    result
}

/// Annotate ascending bars with true range and ATR.
///
/// Pure transform: the input is untouched and a new sequence is returned.
/// Fewer than `period` bars is the normal "not enough history yet" case.
pub fn derive_range_series(bars: &[Bar], period: usize) -> Result<Vec<DerivedBar>, RangeError> {
    let required = period.max(1);
    if bars.len() < required {
        return Err(RangeError::InsufficientData {
            required,
            provided: bars.len(),
        });
    }

    let tr = true_range(bars);
    let atr = wilder_smooth(&tr, period);

    Ok(bars
        .iter()
        .zip(tr)
        .zip(atr)
        .map(|((bar, true_range), atr)| DerivedBar {
            bar: bar.clone(),
            true_range,
            atr,
        })
        .collect())
}
