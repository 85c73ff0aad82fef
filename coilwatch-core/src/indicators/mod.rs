//! Range and volume indicators feeding the consolidation classifier.
//!
//! Both operate on ascending bar slices for one symbol and are pure: they
//! return new values and never mutate their input.

pub mod atr;
pub mod volume;

pub use atr::{derive_range_series, true_range, wilder_smooth, RangeError};
pub use volume::{volume_signal, VolumeSignal};

/// Create bars from explicit (open, high, low, close) tuples for testing.
///
/// Dates advance one calendar day per bar from 2024-01-02; volume = 1000.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            symbol: "TEST".to_string(),
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Create flat-priced bars with the given volumes for testing.
#[cfg(test)]
pub fn make_volume_bars(volumes: &[u64]) -> Vec<crate::domain::Bar> {
    let mut bars = make_ohlc_bars(&vec![(100.0, 101.0, 99.0, 100.0); volumes.len()]);
    for (bar, &v) in bars.iter_mut().zip(volumes) {
        bar.volume = v;
    }
    bars
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
