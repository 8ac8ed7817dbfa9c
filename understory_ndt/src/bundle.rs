// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Staggered storages and the bundles that tie them together.
//!
//! A map keeps `2^D` storages at the cell resolution `r`. Storage `k` is shifted by `r/2`
//! along every axis whose bit is set in `k`. Bundle indices live at resolution `r/2`, so
//! each bundle index falls into exactly one cell of every storage.

use smallvec::SmallVec;
use understory_cells::{CellId, CellIndex};

bitflags::bitflags! {
    /// Axes along which a storage is shifted by half a cell.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Shift: u8 {
        /// Shifted along x.
        const X = 0b0000_0001;
        /// Shifted along y.
        const Y = 0b0000_0010;
        /// Shifted along z.
        const Z = 0b0000_0100;
    }
}

impl Shift {
    /// Shift of the storage at position `k` in a map's storage list.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Storage positions are below 2^3."
    )]
    pub fn of_storage(k: usize) -> Self {
        Self::from_bits_truncate(k as u8)
    }

    /// Whether the storage is shifted along `axis`.
    pub fn along(self, axis: usize) -> bool {
        self.bits() & (1 << axis) != 0
    }
}

/// Index of the cell in a storage with `shift` that contains bundle index `bundle`.
pub fn member_index<const D: usize>(bundle: &CellIndex<D>, shift: Shift) -> CellIndex<D> {
    let mut index = [0; D];
    for (axis, (slot, &b)) in index.iter_mut().zip(bundle).enumerate() {
        let half = b.div_euclid(2);
        *slot = if shift.along(axis) {
            half + b.rem_euclid(2)
        } else {
            half
        };
    }
    index
}

/// One cell handle per staggered storage, all covering the same bundle index.
///
/// Member `k` belongs to storage `k`. Handles stay valid for the lifetime of the map
/// that produced the bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bundle<const D: usize> {
    members: SmallVec<[(CellIndex<D>, CellId); 8]>,
}

impl<const D: usize> Bundle<D> {
    pub(crate) fn new(members: SmallVec<[(CellIndex<D>, CellId); 8]>) -> Self {
        debug_assert_eq!(members.len(), 1 << D, "a bundle has one member per storage");
        Self { members }
    }

    /// Number of members, always `2^D`.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Handle of the member cell in storage `k`.
    pub fn cell(&self, k: usize) -> CellId {
        self.members[k].1
    }

    /// Storage-local index of the member cell in storage `k`.
    pub fn index(&self, k: usize) -> CellIndex<D> {
        self.members[k].0
    }

    /// Iterate `(storage-local index, handle)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (CellIndex<D>, CellId)> + '_ {
        self.members.iter().copied()
    }
}
