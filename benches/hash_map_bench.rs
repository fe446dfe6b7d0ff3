//! Benchmark for HashMap vs standard HashMap.
//!
//! Compares arbortable's chained-bucket HashMap against Rust's standard
//! HashMap, including growth from the placeholder table and presized bulk
//! insertion.

use arbortable::hash::HashMap;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::HashMap as StdHashMap;
use std::hint::black_box;

// =============================================================================
// insert Benchmark
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("insert");

    for size in [100, 1000, 10000] {
        // Grows by doubling from the placeholder table
        group.bench_with_input(BenchmarkId::new("HashMap", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut map = HashMap::new();
                for index in 0..size {
                    map.insert(black_box(index), black_box(index * 2));
                }
                black_box(map)
            });
        });

        group.bench_with_input(
            BenchmarkId::new("HashMap_put_all", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = HashMap::new();
                    map.put_all((0..size).map(|index| (black_box(index), black_box(index * 2))));
                    black_box(map)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("StdHashMap", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut map = StdHashMap::new();
                for index in 0..size {
                    map.insert(black_box(index), black_box(index * 2));
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

// =============================================================================
// get Benchmark
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("get");

    for size in [100, 1000, 10000] {
        let hash_map: HashMap<i32, i32> = (0..size).map(|index| (index, index * 2)).collect();
        let standard_map: StdHashMap<i32, i32> =
            (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(BenchmarkId::new("HashMap", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut sum = 0;
                for key in 0..size {
                    if let Some(&value) = hash_map.get(&black_box(key)) {
                        sum += value;
                    }
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("StdHashMap", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut sum = 0;
                for key in 0..size {
                    if let Some(&value) = standard_map.get(&black_box(key)) {
                        sum += value;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// remove Benchmark
// =============================================================================

fn benchmark_remove(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("remove");

    for size in [100, 1000, 10000] {
        let hash_map: HashMap<i32, i32> = (0..size).map(|index| (index, index * 2)).collect();
        let standard_map: StdHashMap<i32, i32> =
            (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(BenchmarkId::new("HashMap", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut map = hash_map.clone();
                for key in 0..size {
                    map.remove(&black_box(key));
                }
                black_box(map)
            });
        });

        group.bench_with_input(BenchmarkId::new("StdHashMap", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut map = standard_map.clone();
                for key in 0..size {
                    map.remove(&black_box(key));
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

// =============================================================================
// iteration Benchmark
// =============================================================================

fn benchmark_iteration(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("iteration");

    for size in [100, 1000, 10000] {
        let hash_map: HashMap<i32, i32> = (0..size).map(|index| (index, index * 2)).collect();
        let standard_map: StdHashMap<i32, i32> =
            (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(BenchmarkId::new("HashMap", size), &size, |bencher, _| {
            bencher.iter(|| {
                let sum: i32 = hash_map.values().sum();
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("StdHashMap", size), &size, |bencher, _| {
            bencher.iter(|| {
                let sum: i32 = standard_map.values().sum();
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Group
// =============================================================================

criterion_group!(
    benches,
    benchmark_insert,
    benchmark_get,
    benchmark_remove,
    benchmark_iteration
);

criterion_main!(benches);
