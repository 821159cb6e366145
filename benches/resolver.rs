//! Benchmarks for time key resolution.
//!
//! Measures batch resolution against a store preloaded with a season of
//! minute keys, for batches that hit existing rows and batches that
//! allocate.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use flight_facts::config::SnapshotConflictPolicy;
use flight_facts::models::TimeDimensionRow;
use flight_facts::{DimensionResolver, TimeDimensionStore, TimeKey};

fn minute_keys(days: u8) -> Vec<TimeKey> {
    let mut keys = Vec::new();
    for day in 1..=days {
        for hour in 0..24u8 {
            for minute in 0..60u8 {
                if let Ok(key) = TimeKey::new(2006, 1, day, hour, minute) {
                    keys.push(key);
                }
            }
        }
    }
    keys
}

fn preloaded_store(keys: &[TimeKey]) -> TimeDimensionStore {
    let rows = keys.iter().enumerate().map(|(index, key)| TimeDimensionRow {
        id: index as u64 + 1,
        key: *key,
    });
    let (store, _) = TimeDimensionStore::load(rows, SnapshotConflictPolicy::KeepFirst)
        .expect("failed to load store");
    store
}

fn bench_resolve_existing(c: &mut Criterion) {
    let snapshot = minute_keys(28);
    let store = preloaded_store(&snapshot);
    let mut group = c.benchmark_group("resolve_existing");

    for batch_size in [1_000usize, 10_000, 100_000] {
        let batch: Vec<TimeKey> = snapshot.iter().cycle().step_by(7).take(batch_size).copied().collect();
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch, |b, batch| {
            b.iter(|| {
                let mut store = store.clone();
                let mut resolver = DimensionResolver::new();
                black_box(resolver.resolve(batch, &mut store).expect("resolve failed"))
            })
        });
    }
    group.finish();
}

fn bench_resolve_allocating(c: &mut Criterion) {
    let snapshot = minute_keys(14);
    let store = preloaded_store(&snapshot);
    let unseen: Vec<TimeKey> = minute_keys(28).split_off(snapshot.len());
    let mut group = c.benchmark_group("resolve_allocating");

    for batch_size in [1_000usize, 10_000] {
        // Every key twice, so half the positions reuse a batch allocation
        let batch: Vec<TimeKey> = unseen
            .iter()
            .take(batch_size / 2)
            .flat_map(|key| [*key, *key])
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch, |b, batch| {
            b.iter(|| {
                let mut store = store.clone();
                let mut resolver = DimensionResolver::new();
                black_box(resolver.resolve(batch, &mut store).expect("resolve failed"))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve_existing, bench_resolve_allocating);
criterion_main!(benches);
