// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for indexed cell storage.

/// Integer multi-index addressing one cell.
pub type CellIndex<const D: usize> = [i32; D];

/// Stable handle to a cell inside one backend.
///
/// A handle is only meaningful for the backend that returned it. Backends never
/// relocate or drop cells, so a handle stays valid for the backend's lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u32);

impl CellId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Backends assert that cell counts fit in 32 bits before minting ids."
    )]
    pub(crate) const fn new(idx: usize) -> Self {
        Self(idx as u32)
    }

    /// Position of the cell in its backend's value arena.
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn raw(self) -> u32 {
        self.0
    }
}

/// Indexed storage abstraction shared by the dense and adaptive backends.
///
/// Cells are created lazily on the first write to an index and are never removed.
pub trait Backend<const D: usize, V> {
    /// Look up the cell stored at `index`. Never allocates.
    fn get(&self, index: &CellIndex<D>) -> Option<CellId>;

    /// Return the cell at `index`, creating it with `init` if it does not exist yet.
    ///
    /// At most one cell is ever created per index; `init` is not called when the
    /// cell already exists.
    fn get_or_insert_with<F: FnOnce() -> V>(&mut self, index: CellIndex<D>, init: F) -> CellId;

    /// Return the cell at `index`, creating a default value if needed.
    fn get_or_insert(&mut self, index: CellIndex<D>) -> CellId
    where
        V: Default,
    {
        self.get_or_insert_with(index, V::default)
    }

    /// Whether `index` can be stored by this backend at all.
    fn covers(&self, index: &CellIndex<D>) -> bool;

    /// Borrow the value of a cell.
    fn value(&self, id: CellId) -> &V;

    /// Mutably borrow the value of a cell.
    fn value_mut(&mut self, id: CellId) -> &mut V;

    /// Visit every stored `(index, value)` pair. Order is backend-defined.
    fn traverse(&self, visitor: &mut dyn FnMut(&CellIndex<D>, &V));

    /// Number of stored cells.
    fn len(&self) -> usize;

    /// Whether no cell has been created yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate heap and inline footprint in bytes, for telemetry.
    fn byte_size(&self) -> usize;
}
