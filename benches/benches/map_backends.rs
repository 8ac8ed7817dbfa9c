// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::thread;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_ndt::{AdaptiveMap, BoundedMap, Point, Pose, pose2};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// A room-like scan: points along the walls of a `side`-sized square with a little noise.
fn gen_scan(count: usize, side: f64, seed: u64) -> Vec<Point<2>> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|i| {
            let t = rng.next_f64() * side;
            let noise = (rng.next_f64() - 0.5) * 0.05;
            match i % 4 {
                0 => Point::from([t, noise]),
                1 => Point::from([side + noise, t]),
                2 => Point::from([t, side + noise]),
                _ => Point::from([noise, t]),
            }
        })
        .collect()
}

fn gen_queries(count: usize, side: f64, seed: u64) -> Vec<Point<2>> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| Point::from([rng.next_f64() * side, rng.next_f64() * side]))
        .collect()
}

// Scans live in [0, 20]; the origin shift keeps every point inside bounded maps.
fn origin() -> Pose<2> {
    pose2(-2.0, -2.0, 0.0)
}

fn bounded() -> BoundedMap<2> {
    BoundedMap::new(origin(), 0.5, [48, 48]).unwrap()
}

fn adaptive() -> AdaptiveMap<2> {
    AdaptiveMap::new(origin(), 0.5).unwrap()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_scan");
    for &n in &[1_000usize, 10_000] {
        let scan = gen_scan(n, 20.0, 0x9E37_79B9);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("bounded_n{}", n), |b| {
            b.iter_batched(
                bounded,
                |map| black_box(map.insert(&Pose::identity(), &scan)),
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("adaptive_n{}", n), |b| {
            b.iter_batched(
                adaptive,
                |map| black_box(map.insert(&Pose::identity(), &scan)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_points");
    let scan = gen_scan(2_000, 20.0, 7);
    group.throughput(Throughput::Elements(scan.len() as u64));
    group.bench_function("bounded", |b| {
        b.iter_batched(
            bounded,
            |map| scan.iter().for_each(|p| map.add(p)),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("adaptive", |b| {
        b.iter_batched(
            adaptive,
            |map| scan.iter().for_each(|p| map.add(p)),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    let scan = gen_scan(20_000, 20.0, 42);
    let queries = gen_queries(4_096, 20.0, 1234);
    let b_map = bounded();
    let a_map = adaptive();
    b_map.insert(&Pose::identity(), &scan);
    a_map.insert(&Pose::identity(), &scan);
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("bounded_normalized", |b| {
        b.iter(|| black_box(queries.iter().map(|q| b_map.sample(q)).sum::<f64>()))
    });
    group.bench_function("adaptive_normalized", |b| {
        b.iter(|| black_box(queries.iter().map(|q| a_map.sample(q)).sum::<f64>()))
    });
    group.bench_function("bounded_non_normalized", |b| {
        b.iter(|| {
            black_box(
                queries
                    .iter()
                    .map(|q| b_map.sample_non_normalized(q))
                    .sum::<f64>(),
            )
        })
    });
    group.bench_function("adaptive_non_normalized", |b| {
        b.iter(|| {
            black_box(
                queries
                    .iter()
                    .map(|q| a_map.sample_non_normalized(q))
                    .sum::<f64>(),
            )
        })
    });
    group.finish();
}

fn bench_parallel_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_insert");
    let scans: Vec<_> = (0..4).map(|s| gen_scan(5_000, 20.0, 100 + s)).collect();
    group.throughput(Throughput::Elements(20_000));
    group.bench_function("adaptive_4_threads", |b| {
        b.iter_batched(
            adaptive,
            |map| {
                thread::scope(|s| {
                    for scan in &scans {
                        let map = &map;
                        s.spawn(move || map.insert(&Pose::identity(), scan));
                    }
                });
                black_box(map.cell_count())
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_add,
    bench_sample,
    bench_parallel_insert,
);
criterion_main!(benches);
