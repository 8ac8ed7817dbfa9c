// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded dense array backend. Fixed extent, O(1) index arithmetic.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::{Backend, CellId, CellIndex};

const VACANT: u32 = u32::MAX;

/// Dense array backend over a fixed extent `[0, extent[a])` per axis.
///
/// A flat lookup table maps every in-extent index to a [`CellId`]; values live in an
/// insertion-ordered arena. Writing outside the extent is a contract violation and panics.
pub struct DenseArray<const D: usize, V> {
    extent: [usize; D],
    lookup: Vec<u32>,
    values: Vec<V>,
}

impl<const D: usize, V> DenseArray<D, V> {
    /// Create an empty array covering `extent` cells per axis.
    ///
    /// Panics if any axis is empty or the total cell count does not fit in 32 bits.
    pub fn new(extent: [usize; D]) -> Self {
        assert!(extent.iter().all(|&e| e > 0), "extent must be non-zero");
        let total = extent
            .iter()
            .try_fold(1_usize, |acc, &e| acc.checked_mul(e))
            .filter(|&t| t < VACANT as usize);
        let Some(total) = total else {
            panic!("extent {extent:?} exceeds the addressable cell count");
        };
        Self {
            extent,
            lookup: vec![VACANT; total],
            values: Vec::new(),
        }
    }

    /// The declared extent.
    pub fn extent(&self) -> [usize; D] {
        self.extent
    }

    #[allow(
        clippy::cast_sign_loss,
        reason = "Negative components are rejected before the cast."
    )]
    fn offset(&self, index: &CellIndex<D>) -> Option<usize> {
        let mut offset = 0;
        let mut stride = 1;
        for (&i, &e) in index.iter().zip(&self.extent) {
            if i < 0 || i as usize >= e {
                return None;
            }
            offset += i as usize * stride;
            stride *= e;
        }
        Some(offset)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "Extents are bounded by the 32-bit cell count checked in `new`."
    )]
    fn index_of(&self, mut offset: usize) -> CellIndex<D> {
        let mut index = [0; D];
        for (slot, &e) in index.iter_mut().zip(&self.extent) {
            *slot = (offset % e) as i32;
            offset /= e;
        }
        index
    }
}

impl<const D: usize, V> Backend<D, V> for DenseArray<D, V> {
    fn get(&self, index: &CellIndex<D>) -> Option<CellId> {
        let offset = self.offset(index)?;
        match self.lookup[offset] {
            VACANT => None,
            id => Some(CellId::new(id as usize)),
        }
    }

    fn get_or_insert_with<F: FnOnce() -> V>(&mut self, index: CellIndex<D>, init: F) -> CellId {
        let Some(offset) = self.offset(&index) else {
            panic!(
                "index {index:?} outside declared extent {:?}",
                self.extent
            );
        };
        if self.lookup[offset] == VACANT {
            let id = CellId::new(self.values.len());
            self.values.push(init());
            self.lookup[offset] = id.raw();
            id
        } else {
            CellId::new(self.lookup[offset] as usize)
        }
    }

    fn covers(&self, index: &CellIndex<D>) -> bool {
        self.offset(index).is_some()
    }

    fn value(&self, id: CellId) -> &V {
        &self.values[id.get()]
    }

    fn value_mut(&mut self, id: CellId) -> &mut V {
        &mut self.values[id.get()]
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&CellIndex<D>, &V)) {
        for (offset, &id) in self.lookup.iter().enumerate() {
            if id != VACANT {
                visitor(&self.index_of(offset), &self.values[id as usize]);
            }
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
            + self.lookup.len() * size_of::<u32>()
            + self.values.len() * size_of::<V>()
    }
}

impl<const D: usize, V> Debug for DenseArray<D, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DenseArray")
            .field("extent", &self.extent)
            .field("slots", &self.lookup.len())
            .field("cells", &self.values.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_insert_is_idempotent() {
        let mut a: DenseArray<2, u32> = DenseArray::new([4, 3]);
        assert!(a.get(&[1, 2]).is_none());
        let id = a.get_or_insert_with([1, 2], || 7);
        let again = a.get_or_insert_with([1, 2], || unreachable!("cell already exists"));
        assert_eq!(id, again);
        assert_eq!(a.get(&[1, 2]), Some(id));
        assert_eq!(*a.value(id), 7);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn out_of_extent_reads_are_empty() {
        let a: DenseArray<2, u32> = DenseArray::new([4, 4]);
        assert!(a.get(&[-1, 0]).is_none());
        assert!(a.get(&[4, 0]).is_none());
        assert!(!a.covers(&[0, 4]));
        assert!(a.covers(&[3, 3]));
    }

    #[test]
    #[should_panic(expected = "outside declared extent")]
    fn out_of_extent_write_panics() {
        let mut a: DenseArray<2, u32> = DenseArray::new([4, 4]);
        a.get_or_insert([4, 1]);
    }

    #[test]
    fn traverse_reconstructs_indices() {
        let mut a: DenseArray<3, i32> = DenseArray::new([2, 3, 4]);
        for index in [[0, 0, 0], [1, 2, 3], [1, 0, 2]] {
            let id = a.get_or_insert(index);
            *a.value_mut(id) = index[0] + 10 * index[1] + 100 * index[2];
        }
        let mut seen = Vec::new();
        a.traverse(&mut |index, v| seen.push((*index, *v)));
        seen.sort_unstable();
        assert_eq!(
            seen,
            vec![([0, 0, 0], 0), ([1, 0, 2], 201), ([1, 2, 3], 321)]
        );
    }

    #[test]
    fn byte_size_grows_with_cells() {
        let mut a: DenseArray<2, u64> = DenseArray::new([8, 8]);
        let empty = a.byte_size();
        a.get_or_insert([0, 0]);
        assert!(a.byte_size() > empty);
    }

    #[test]
    fn handles_follow_insertion_order() {
        let mut a: DenseArray<2, u8> = DenseArray::new([3, 3]);
        let ids: Vec<_> = [[2, 2], [0, 1], [1, 0]]
            .into_iter()
            .map(|index| a.get_or_insert(index))
            .collect();
        assert_eq!(ids.iter().map(|id| id.get()).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(a.get(&[0, 1]), Some(ids[1]));
        assert_eq!(a.get_or_insert([2, 2]), ids[0]);
    }
}
