//! Property tests for analytics invariants.
//!
//! Uses proptest to verify:
//! 1. Wilder recursion: seed is the mean of the first `period` true ranges,
//!    every later ATR follows the recursion exactly
//! 2. Streak reset: the streak is 0 on any wide day and at most 1 the day after
//! 3. Confidence bounds: always in [0, 100], non-decreasing in each input
//! 4. Idempotence: analysing the same prefix twice gives identical records
//! 5. Alert dedup: repeated decisions for one date store one alert per type

use chrono::NaiveDate;
use proptest::prelude::*;

use coilwatch_core::alerts::decide_alert;
use coilwatch_core::analysis::{analyze, confidence_score, streak_series};
use coilwatch_core::config::{AnalysisConfig, ConfidenceCurve};
use coilwatch_core::domain::Bar;
use coilwatch_core::indicators::{derive_range_series, true_range};
use coilwatch_core::store::{MemoryStore, RecordStore};

// ── Strategies (proptest) ────────────────────────────────────────────

/// (close, half_range, volume) triples turned into a valid ascending series.
fn arb_bars(min: usize, max: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((20.0..200.0_f64, 0.0..5.0_f64, 0u64..5_000_000), min..max).prop_map(
        |rows| {
            let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
            rows.into_iter()
                .enumerate()
                .map(|(i, (close, half, volume))| Bar {
                    symbol: "PROP".into(),
                    date: base + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + half,
                    low: close - half,
                    close,
                    volume,
                })
                .collect()
        },
    )
}

fn arb_period() -> impl Strategy<Value = usize> {
    2usize..30
}

// ── 1. Wilder recursion ──────────────────────────────────────────────

proptest! {
    #[test]
    fn atr_follows_wilder_recursion(bars in arb_bars(30, 120), period in arb_period()) {
        let series = derive_range_series(&bars, period).unwrap();
        let tr = true_range(&bars);

        for bar in &series[..period - 1] {
            prop_assert!(bar.atr.is_none());
        }

        let seed = tr[..period].iter().sum::<f64>() / period as f64;
        let first = series[period - 1].atr.unwrap();
        prop_assert!((first - seed).abs() < 1e-9);

        for i in period..series.len() {
            let prev = series[i - 1].atr.unwrap();
            let expected = (prev * (period - 1) as f64 + tr[i]) / period as f64;
            prop_assert!((series[i].atr.unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn short_series_is_insufficient(bars in arb_bars(0, 13)) {
        prop_assert!(derive_range_series(&bars, 14).is_err());
    }
}

// ── 2. Streak reset ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn streak_resets_after_wide_day(bars in arb_bars(20, 100), period in arb_period()) {
        let series = derive_range_series(&bars, period).unwrap();
        let streaks = streak_series(&series);

        for i in 0..series.len() {
            let wide = series[i].atr.is_some_and(|atr| series[i].daily_range() > atr);
            if wide {
                prop_assert_eq!(streaks[i], 0);
                if i + 1 < series.len() {
                    prop_assert!(streaks[i + 1] <= 1);
                }
            }
            if i > 0 && streaks[i] > 0 {
                prop_assert_eq!(streaks[i], streaks[i - 1] + 1);
            }
        }
    }
}

// ── 3. Confidence bounds ─────────────────────────────────────────────

proptest! {
    #[test]
    fn confidence_within_bounds(
        days in 0u32..500,
        ratio in prop::option::of(0.0..50.0_f64),
        pct in prop::option::of(-500.0..100.0_f64),
    ) {
        let score = confidence_score(days, ratio, pct, &ConfidenceCurve::default());
        prop_assert!(score <= 100);
    }

    #[test]
    fn confidence_monotone_in_each_input(
        days in 0u32..60,
        ratio in 0.0..10.0_f64,
        pct in -100.0..100.0_f64,
        bump in 0.0..5.0_f64,
    ) {
        let c = ConfidenceCurve::default();
        let base = confidence_score(days, Some(ratio), Some(pct), &c);
        prop_assert!(confidence_score(days + 1, Some(ratio), Some(pct), &c) >= base);
        prop_assert!(confidence_score(days, Some(ratio + bump), Some(pct), &c) >= base);
        prop_assert!(confidence_score(days, Some(ratio), Some(pct + bump), &c) >= base);
    }
}

// ── 4. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn analysis_is_idempotent(bars in arb_bars(1, 80), cut in 0usize..80) {
        let cfg = AnalysisConfig::default();
        let as_of = bars[cut.min(bars.len() - 1)].date;
        let a = analyze("PROP", &bars, as_of, &cfg);
        let b = analyze("PROP", &bars, as_of, &cfg);
        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}

// ── 5. Alert dedup ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn repeated_decisions_store_one_alert(bars in arb_bars(20, 60), repeats in 1usize..6) {
        let cfg = AnalysisConfig::default();
        let store = MemoryStore::new();
        let as_of = bars.last().unwrap().date;
        let Some(record) = analyze("PROP", &bars, as_of, &cfg).into_record() else {
            return Ok(());
        };

        let mut emitted = 0;
        for _ in 0..repeats {
            if let Some(alert) = decide_alert(&record, &cfg, &store, as_of).into_alert() {
                prop_assert!(store.insert_alert(alert));
                emitted += 1;
            }
        }
        prop_assert!(emitted <= 1);
        prop_assert_eq!(store.alerts().len(), emitted);
    }
}
