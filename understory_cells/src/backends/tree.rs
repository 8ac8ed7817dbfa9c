// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive tree backend (quadtree in 2D, octree in 3D) over an unbounded index space.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::{Backend, CellId, CellIndex};

const VACANT: u32 = u32::MAX;

/// Unbounded sparse backend built from a recursive `2^D`-way subdivision.
///
/// Every node covers a hyper-cube of `2^level` indices per axis and owns `2^D` child
/// links. Level-1 nodes link directly to cells. Nodes are only materialized along write
/// paths, and the root doubles its coverage toward any index it does not yet cover.
///
/// Nodes live in an arena of child-link blocks, so growth never moves a cell.
pub struct AdaptiveTree<const D: usize, V> {
    root: Option<Root<D>>,
    links: Vec<u32>,
    values: Vec<V>,
    indices: Vec<CellIndex<D>>,
}

#[derive(Copy, Clone, Debug)]
struct Root<const D: usize> {
    node: NodeIdx,
    origin: [i64; D],
    level: u32,
}

impl<const D: usize> Root<D> {
    fn covers(&self, index: &CellIndex<D>) -> bool {
        let span = 1_i64 << self.level;
        index
            .iter()
            .zip(&self.origin)
            .all(|(&i, &o)| (o..o + span).contains(&i64::from(i)))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

impl<const D: usize, V> Default for AdaptiveTree<D, V> {
    fn default() -> Self {
        Self {
            root: None,
            links: Vec::new(),
            values: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl<const D: usize, V> AdaptiveTree<D, V> {
    const FANOUT: usize = 1 << D;

    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized tree nodes.
    pub fn node_count(&self) -> usize {
        self.links.len() / Self::FANOUT
    }

    /// Levels below the root, or 0 for an empty tree.
    pub fn depth(&self) -> u32 {
        self.root.map_or(0, |r| r.level)
    }

    fn alloc_node(&mut self) -> NodeIdx {
        let idx = self.node_count();
        assert!(idx < VACANT as usize, "tree node count exceeds 32 bits");
        self.links.resize(self.links.len() + Self::FANOUT, VACANT);
        NodeIdx::new(idx)
    }

    /// Child slot of `index` below a node at `level` whose minimum corner is `origin`.
    /// Advances `origin` to the child's minimum corner.
    #[allow(
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation,
        reason = "The shifted offset is masked to a single bit."
    )]
    fn descend(index: &CellIndex<D>, origin: &mut [i64; D], level: u32) -> usize {
        let half = level - 1;
        let mut slot = 0;
        for (axis, (&i, o)) in index.iter().zip(origin.iter_mut()).enumerate() {
            let bit = ((i64::from(i) - *o) >> half) & 1;
            *o += bit << half;
            slot |= (bit as usize) << axis;
        }
        slot
    }

    /// Grow the root until it covers `index`.
    fn cover(&mut self, index: &CellIndex<D>) -> Root<D> {
        let mut root = match self.root {
            Some(root) => root,
            None => Root {
                node: self.alloc_node(),
                origin: index.map(i64::from),
                level: 1,
            },
        };
        while !root.covers(index) {
            let span = 1_i64 << root.level;
            let mut origin = root.origin;
            let mut slot = 0;
            for (axis, (o, &i)) in origin.iter_mut().zip(index).enumerate() {
                if i64::from(i) < *o {
                    *o -= span;
                    slot |= 1 << axis;
                }
            }
            let parent = self.alloc_node();
            self.links[parent.get() * Self::FANOUT + slot] = to_link(root.node.get());
            root = Root {
                node: parent,
                origin,
                level: root.level + 1,
            };
        }
        self.root = Some(root);
        root
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Arena sizes are asserted to stay below `VACANT`."
)]
fn to_link(i: usize) -> u32 {
    i as u32
}

impl<const D: usize, V> Backend<D, V> for AdaptiveTree<D, V> {
    fn get(&self, index: &CellIndex<D>) -> Option<CellId> {
        let root = self.root.as_ref().filter(|r| r.covers(index))?;
        let mut node = root.node;
        let mut origin = root.origin;
        let mut level = root.level;
        loop {
            let slot = Self::descend(index, &mut origin, level);
            let link = self.links[node.get() * Self::FANOUT + slot];
            if link == VACANT {
                return None;
            }
            if level == 1 {
                return Some(CellId::new(link as usize));
            }
            node = NodeIdx::new(link as usize);
            level -= 1;
        }
    }

    fn get_or_insert_with<F: FnOnce() -> V>(&mut self, index: CellIndex<D>, init: F) -> CellId {
        let root = self.cover(&index);
        let mut node = root.node;
        let mut origin = root.origin;
        let mut level = root.level;
        loop {
            let slot = Self::descend(&index, &mut origin, level);
            let at = node.get() * Self::FANOUT + slot;
            if level == 1 {
                if self.links[at] == VACANT {
                    assert!(self.values.len() < VACANT as usize, "cell count exceeds 32 bits");
                    self.links[at] = to_link(self.values.len());
                    self.values.push(init());
                    self.indices.push(index);
                }
                return CellId::new(self.links[at] as usize);
            }
            if self.links[at] == VACANT {
                let child = self.alloc_node();
                self.links[at] = to_link(child.get());
            }
            node = NodeIdx::new(self.links[at] as usize);
            level -= 1;
        }
    }

    fn covers(&self, _index: &CellIndex<D>) -> bool {
        true
    }

    fn value(&self, id: CellId) -> &V {
        &self.values[id.get()]
    }

    fn value_mut(&mut self, id: CellId) -> &mut V {
        &mut self.values[id.get()]
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&CellIndex<D>, &V)) {
        for (index, value) in self.indices.iter().zip(&self.values) {
            visitor(index, value);
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn byte_size(&self) -> usize {
        size_of::<Self>()
            + self.links.len() * size_of::<u32>()
            + self.values.len() * size_of::<V>()
            + self.indices.len() * size_of::<CellIndex<D>>()
    }
}

impl<const D: usize, V> Debug for AdaptiveTree<D, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdaptiveTree")
            .field("root", &self.root)
            .field("nodes", &self.node_count())
            .field("cells", &self.values.len())
            .finish_non_exhaustive()
    }
}
