// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_cells --heading-base-level=0

//! Understory Cells: integer-indexed cell storage with stable handles.
//!
//! Understory Cells maps a `D`-dimensional integer index to a lazily created value slot.
//!
//! - Look up a cell with [`Backend::get`] without allocating.
//! - Create-or-fetch a cell with [`Backend::get_or_insert`]; at most one cell exists per index.
//! - Address values through [`CellId`] handles that stay valid while the storage grows.
//! - Visit every stored cell with [`Backend::traverse`].
//!
//! Backends are pluggable via the [`Backend`] trait so higher layers can pick a storage
//! strategy without API churn. Synchronization is left to the owner: every mutating call
//! takes `&mut self`.
//!
//! # Example
//!
//! ```rust
//! use understory_cells::{AdaptiveTree, Backend};
//!
//! let mut cells: AdaptiveTree<2, u32> = AdaptiveTree::new();
//! let id = cells.get_or_insert([3, -4]);
//! *cells.value_mut(id) += 1;
//!
//! // Far away writes grow the tree without touching existing handles.
//! cells.get_or_insert([-1000, 1000]);
//! assert_eq!(cells.get(&[3, -4]), Some(id));
//! assert_eq!(*cells.value(id), 1);
//! ```
//!
//! Use the dense array when the extent is known upfront:
//!
//! ```rust
//! use understory_cells::{Backend, DenseArray};
//!
//! let mut cells: DenseArray<2, f64> = DenseArray::new([64, 64]);
//! let id = cells.get_or_insert_with([10, 20], || 0.5);
//! assert_eq!(*cells.value(id), 0.5);
//! assert!(!cells.covers(&[64, 0]));
//! ```
//!
//! ## Choosing a backend
//!
//! - `DenseArray`: flat lookup table over a declared extent. Constant-time access and no
//!   per-node overhead, but memory scales with the extent and writes outside it panic.
//! - `AdaptiveTree`: quadtree/octree over the full `i32` index space. Lookups cost one
//!   step per level; memory scales with the touched region only.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;

pub use backend::{Backend, CellId, CellIndex};
pub use backends::array::DenseArray;
pub use backends::tree::AdaptiveTree;
