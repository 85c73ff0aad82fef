//! Criterion benchmarks for the runner's parallel paths.
//!
//! Benchmarks:
//! - Batch analysis across a growing symbol universe
//! - Backfill with alert generation
//! - Full backtest over a backfilled store

use std::collections::BTreeMap;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use coilwatch_core::data::{BarSource, MemoryBarSource};
use coilwatch_core::domain::Bar;
use coilwatch_core::store::MemoryStore;
use coilwatch_runner::{analyze_all, backfill, backtest_store, BackfillOptions, Settings};

fn make_universe(symbols: usize, bars: usize) -> MemoryBarSource {
    let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let series = (0..symbols)
        .map(|s| {
            let symbol = format!("S{s:04}");
            let bars = (0..bars)
                .map(|i| {
                    let phase = (i + s * 7) as f64;
                    let close = 50.0 + (phase * 0.05).sin() * 5.0;
                    let half = 0.2 + (phase * 0.31).cos().abs();
                    Bar {
                        symbol: symbol.clone(),
                        date: base + chrono::Duration::days(i as i64),
                        open: close,
                        high: close + half,
                        low: close - half,
                        close,
                        volume: 500_000 + ((i * 37 + s) % 400_000) as u64,
                    }
                })
                .collect();
            (symbol, bars)
        })
        .collect::<BTreeMap<_, _>>();
    MemoryBarSource::new(series)
}

fn bench_analyze_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_all");
    let settings = Settings::default();
    for n in [10usize, 100, 500] {
        let source = make_universe(n, 260);
        let symbols = source.symbols();
        let as_of = source.last_date().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &source, |b, source| {
            b.iter(|| {
                let store = MemoryStore::new();
                analyze_all(
                    black_box(&symbols),
                    source,
                    &store,
                    as_of,
                    as_of,
                    &settings.analysis,
                )
            })
        });
    }
    group.finish();
}

fn bench_backfill(c: &mut Criterion) {
    let settings = Settings::default();
    let source = make_universe(100, 260);
    let options = BackfillOptions {
        days: 60,
        with_alerts: true,
    };
    c.bench_function("backfill_100x60", |b| {
        b.iter(|| {
            let store = MemoryStore::new();
            backfill(black_box(&source), &store, options, &settings.analysis)
        })
    });
}

fn bench_backtest(c: &mut Criterion) {
    let settings = Settings::default();
    let source = make_universe(100, 260);
    let store = MemoryStore::new();
    let options = BackfillOptions {
        days: 90,
        with_alerts: true,
    };
    backfill(&source, &store, options, &settings.analysis);
    let now = source.last_date().unwrap();

    c.bench_function("backtest_store_100", |b| {
        b.iter(|| backtest_store(black_box(&store), &source, &settings, now))
    });
}

criterion_group!(benches, bench_analyze_all, bench_backfill, bench_backtest);
criterion_main!(benches);
