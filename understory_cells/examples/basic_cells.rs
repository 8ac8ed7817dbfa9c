// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Understory Cells: create cells lazily, update them through handles, traverse.

use understory_cells::{AdaptiveTree, Backend, DenseArray};

fn main() {
    let mut counts: AdaptiveTree<2, u32> = AdaptiveTree::new();
    for index in [[0, 0], [1, 0], [0, 0], [-250, 90], [0, 0]] {
        let id = counts.get_or_insert(index);
        *counts.value_mut(id) += 1;
    }
    println!(
        "tree: cells={}, nodes={}, depth={}, bytes={}",
        counts.len(),
        counts.node_count(),
        counts.depth(),
        counts.byte_size()
    );
    counts.traverse(&mut |index, n| println!("  {index:?} -> {n}"));

    let mut dense: DenseArray<2, u32> = DenseArray::new([32, 32]);
    let id = dense.get_or_insert([4, 5]);
    *dense.value_mut(id) = 9;
    println!(
        "dense: cells={}, bytes={}, covers (32, 0)? {}",
        dense.len(),
        dense.byte_size(),
        dense.covers(&[32, 0])
    );
}
