// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different storage strategies.
//!
//! - `array`: bounded dense array; fixed extent, O(1) flat-offset lookups, no tree overhead.
//! - `tree`: adaptive `2^D`-way tree; unbounded, grows only where written.
//!
//! Both keep values in an insertion-ordered arena and hand out [`CellId`](crate::CellId)
//! handles that never move, so callers can cache handles across later insertions.

pub mod array;
pub mod tree;

pub use array::DenseArray;
pub use tree::AdaptiveTree;
