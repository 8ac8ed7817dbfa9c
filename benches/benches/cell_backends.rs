// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_cells::{AdaptiveTree, Backend, CellIndex, DenseArray};

fn gen_grid_indices(n: i32) -> Vec<CellIndex<2>> {
    let mut out = Vec::with_capacity((n * n) as usize);
    for y in 0..n {
        for x in 0..n {
            out.push([x, y]);
        }
    }
    out
}

fn fill<B: Backend<2, u64>>(backend: &mut B, indices: &[CellIndex<2>]) {
    for index in indices {
        let id = backend.get_or_insert(*index);
        *backend.value_mut(id) += 1;
    }
}

fn bench_get_or_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_or_insert");
    for &n in &[64i32, 256] {
        let indices = gen_grid_indices(n);
        group.throughput(Throughput::Elements(indices.len() as u64));
        group.bench_function(format!("dense_n{}", n), |b| {
            b.iter_batched(
                || DenseArray::<2, u64>::new([n as usize, n as usize]),
                |mut cells| {
                    fill(&mut cells, &indices);
                    black_box(cells.len())
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("tree_n{}", n), |b| {
            b.iter_batched(
                AdaptiveTree::<2, u64>::new,
                |mut cells| {
                    fill(&mut cells, &indices);
                    black_box(cells.len())
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    let indices = gen_grid_indices(256);
    let mut dense = DenseArray::<2, u64>::new([256, 256]);
    let mut tree = AdaptiveTree::<2, u64>::new();
    fill(&mut dense, &indices);
    fill(&mut tree, &indices);
    group.throughput(Throughput::Elements(indices.len() as u64));
    group.bench_function("dense", |b| {
        b.iter(|| black_box(indices.iter().filter_map(|i| dense.get(i)).count()))
    });
    group.bench_function("tree", |b| {
        b.iter(|| black_box(indices.iter().filter_map(|i| tree.get(i)).count()))
    });
    group.finish();
}

criterion_group!(benches, bench_get_or_insert, bench_lookup);
criterion_main!(benches);
