//! Run length of tight days ending at the most recent bar.

use crate::domain::DerivedBar;

/// Count consecutive tight days from the head of a most-recent-first scan.
///
/// Stops at the first non-tight day or the first day without an ATR; nothing
/// after the break is considered.
pub fn consecutive_tight_days<'a, I>(recent_first: I) -> u32
where
    I: IntoIterator<Item = &'a DerivedBar>,
{
    recent_first
        .into_iter()
        .take_while(|bar| bar.is_tight())
        .count() as u32
}

/// Tight-day streak as of each bar of an ascending series.
///
/// `streaks[i]` equals `consecutive_tight_days` scanned back from bar `i`.
pub fn streak_series(series: &[DerivedBar]) -> Vec<u32> {
    let mut streaks = Vec::with_capacity(series.len());
    let mut run = 0u32;
    for bar in series {
        run = if bar.is_tight() { run + 1 } else { 0 };
        streaks.push(run);
    }
    streaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn derived(range: f64, atr: Option<f64>, day: i64) -> DerivedBar {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Duration::days(day);
        DerivedBar {
            bar: Bar {
                symbol: "TEST".into(),
                date,
                open: 100.0,
                high: 100.0 + range,
                low: 100.0,
                close: 100.0,
                volume: 1000,
            },
            true_range: range,
            atr,
        }
    }

    #[test]
    fn counts_head_run_only() {
        // ascending: tight, wide, tight, tight, tight
        let series = vec![
            derived(1.0, Some(2.0), 0),
            derived(3.0, Some(2.0), 1),
            derived(1.0, Some(2.0), 2),
            derived(2.0, Some(2.0), 3),
            derived(0.5, Some(2.0), 4),
        ];
        assert_eq!(consecutive_tight_days(series.iter().rev()), 3);
    }

    #[test]
    fn most_recent_wide_day_means_zero() {
        let series = vec![derived(1.0, Some(2.0), 0), derived(3.0, Some(2.0), 1)];
        assert_eq!(consecutive_tight_days(series.iter().rev()), 0);
    }

    #[test]
    fn stops_at_undefined_atr() {
        let series = vec![
            derived(1.0, None, 0),
            derived(1.0, Some(2.0), 1),
            derived(1.0, Some(2.0), 2),
        ];
        assert_eq!(consecutive_tight_days(series.iter().rev()), 2);
    }

    #[test]
    fn empty_scan_is_zero() {
        assert_eq!(consecutive_tight_days(std::iter::empty()), 0);
    }

    #[test]
    fn series_resets_after_wide_day() {
        let series = vec![
            derived(1.0, Some(2.0), 0),
            derived(1.0, Some(2.0), 1),
            derived(5.0, Some(2.0), 2),
            derived(1.0, Some(2.0), 3),
        ];
        assert_eq!(streak_series(&series), vec![1, 2, 0, 1]);
    }

    #[test]
    fn series_agrees_with_backward_scan() {
        let series = vec![
            derived(1.0, None, 0),
            derived(1.0, Some(2.0), 1),
            derived(3.0, Some(2.0), 2),
            derived(1.0, Some(2.0), 3),
            derived(1.5, Some(2.0), 4),
        ];
        let streaks = streak_series(&series);
        for i in 0..series.len() {
            assert_eq!(streaks[i], consecutive_tight_days(series[..=i].iter().rev()));
        }
    }
}
