// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Map` API and the generic implementation over pluggable cell storage.

use core::array;

use log::{debug, trace};
use parking_lot::Mutex;
use smallvec::SmallVec;
use understory_cells::{AdaptiveTree, Backend, CellIndex, DenseArray};

use crate::bundle::{Bundle, Shift, member_index};
use crate::distribution::Distribution;
use crate::error::{MapError, Result};
use crate::pose::{Point, Pose, is_finite};

/// A thread-safe NDT map parameterized by the cell backend `C` and the bundle backend `B`.
///
/// The map keeps `2^D` staggered storages of [`Distribution`]s and a bundle storage at
/// half the cell resolution. Every operation takes `&self`; storages and the bundle
/// storage each sit behind their own mutex, and no two locks are ever held at once.
#[derive(Debug)]
pub struct MapGeneric<const D: usize, C, B> {
    resolution: f64,
    bundle_resolution: f64,
    bundle_resolution_inv: f64,
    w_t_m: Pose<D>,
    m_t_w: Pose<D>,
    size: Option<[usize; D]>,
    storages: Vec<Mutex<C>>,
    bundles: Mutex<B>,
}

/// Map over fixed-extent dense arrays, for areas known upfront.
pub type BoundedMap<const D: usize> =
    MapGeneric<D, DenseArray<D, Distribution<D>>, DenseArray<D, Bundle<D>>>;

/// Map over adaptive trees, growing wherever points are written.
pub type AdaptiveMap<const D: usize> =
    MapGeneric<D, AdaptiveTree<D, Distribution<D>>, AdaptiveTree<D, Bundle<D>>>;

impl<const D: usize> BoundedMap<D> {
    /// Create a bounded map with `size` cells per axis, placed at `origin` in the world.
    ///
    /// Bundle indices are valid in `[0, 2 * size)` per axis, which covers map-frame
    /// coordinates in `[0, size * resolution)`.
    pub fn new(origin: Pose<D>, resolution: f64, size: [usize; D]) -> Result<Self> {
        if size.contains(&0) {
            return Err(MapError::EmptyExtent(size.to_vec()));
        }
        let shifted = size.map(|s| s + 1);
        Self::from_parts(
            origin,
            resolution,
            Some(size),
            |shift| DenseArray::new(if shift.is_empty() { size } else { shifted }),
            DenseArray::new(size.map(|s| 2 * s)),
        )
    }
}

impl<const D: usize> AdaptiveMap<D> {
    /// Create an unbounded map placed at `origin` in the world.
    pub fn new(origin: Pose<D>, resolution: f64) -> Result<Self> {
        Self::from_parts(origin, resolution, None, |_| AdaptiveTree::new(), AdaptiveTree::new())
    }
}

impl<const D: usize, C, B> MapGeneric<D, C, B>
where
    C: Backend<D, Distribution<D>>,
    B: Backend<D, Bundle<D>>,
{
    fn from_parts(
        origin: Pose<D>,
        resolution: f64,
        size: Option<[usize; D]>,
        mut storage: impl FnMut(Shift) -> C,
        bundles: B,
    ) -> Result<Self> {
        const { assert!(D == 2 || D == 3, "maps are 2D or 3D") };
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(MapError::InvalidResolution(resolution));
        }
        let bundle_resolution = 0.5 * resolution;
        let storages = (0..1 << D)
            .map(|k| Mutex::new(storage(Shift::of_storage(k))))
            .collect();
        debug!("created {}D map: resolution {resolution}, size {size:?}", D);
        Ok(Self {
            resolution,
            bundle_resolution,
            bundle_resolution_inv: 1.0 / bundle_resolution,
            w_t_m: origin,
            m_t_w: origin.inverse(),
            size,
            storages,
            bundles: Mutex::new(bundles),
        })
    }

    /// Edge length of a cell.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Edge length of a bundle, half the cell resolution.
    pub fn bundle_resolution(&self) -> f64 {
        self.bundle_resolution
    }

    /// Pose of the map frame in the world.
    pub fn origin(&self) -> &Pose<D> {
        &self.w_t_m
    }

    /// Declared cell count per axis, or `None` for an unbounded map.
    pub fn size(&self) -> Option<[usize; D]> {
        self.size
    }

    /// Bundle count per axis, twice the cell count, or `None` for an unbounded map.
    pub fn bundle_size(&self) -> Option<[usize; D]> {
        self.size.map(|s| s.map(|s| 2 * s))
    }

    /// Metric extent of a bounded map.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Extents are far below 2^52 cells."
    )]
    pub fn dimensions(&self) -> Option<[f64; D]> {
        self.size.map(|s| s.map(|s| s as f64 * self.resolution))
    }

    /// Number of staggered storages, `2^D`.
    pub fn storage_count(&self) -> usize {
        self.storages.len()
    }

    /// Total number of cells allocated across all storages.
    pub fn cell_count(&self) -> usize {
        self.storages.iter().map(|s| s.lock().len()).sum()
    }

    /// Transform a world point into the map frame.
    pub fn to_map_frame(&self, p: &Point<D>) -> Point<D> {
        self.m_t_w.transform_point(p)
    }

    /// Bundle index of a world point.
    ///
    /// Coordinates beyond the `i32` index range saturate to `i32::MIN` or `i32::MAX`, so
    /// far-apart points there share a bundle. [`MapGeneric::insert`] drops such points.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Coordinates beyond the i32 index range saturate."
    )]
    pub fn bundle_index(&self, p: &Point<D>) -> CellIndex<D> {
        let m = self.to_map_frame(p);
        array::from_fn(|axis| (m[axis] * self.bundle_resolution_inv).floor() as i32)
    }

    /// Bundle index of a world point, or `None` if any axis leaves the `i32` range.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "The range is checked before the cast."
    )]
    fn checked_bundle_index(&self, p: &Point<D>) -> Option<CellIndex<D>> {
        let m = self.to_map_frame(p);
        let range = f64::from(i32::MIN)..=f64::from(i32::MAX);
        let mut bi = [0; D];
        for (slot, &c) in bi.iter_mut().zip(m.iter()) {
            let scaled = (c * self.bundle_resolution_inv).floor();
            if !range.contains(&scaled) {
                return None;
            }
            *slot = scaled as i32;
        }
        Some(bi)
    }

    /// Add a world point to every distribution of its bundle.
    ///
    /// The point is not checked for finiteness, and coordinates beyond the `i32` bundle
    /// index range saturate as in [`MapGeneric::bundle_index`]. Panics if the point falls
    /// outside a bounded map; see [`MapGeneric::try_add`].
    pub fn add(&self, p: &Point<D>) {
        self.try_add(p).unwrap_or_else(|err| panic!("{err}"));
    }

    /// Checked form of [`MapGeneric::add`]: rejects points outside a bounded map.
    pub fn try_add(&self, p: &Point<D>) -> Result<()> {
        let bundle = self.try_resolve(&self.bundle_index(p))?;
        for (storage, (_, id)) in self.storages.iter().zip(bundle.iter()) {
            storage.lock().value_mut(id).add(p);
        }
        Ok(())
    }

    /// Insert a scan taken at `origin` (sensor pose in the world).
    ///
    /// Points are transformed into the world. Non-finite results and points whose bundle
    /// index would leave the `i32` range are dropped; the rest is accumulated per bundle before being merged into the map. Returns the
    /// number of accepted points. Panics if any point falls outside a bounded map.
    pub fn insert(&self, origin: &Pose<D>, points: &[Point<D>]) -> usize {
        self.try_insert(origin, points)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Checked form of [`MapGeneric::insert`]. The map is left untouched on error.
    pub fn try_insert(&self, origin: &Pose<D>, points: &[Point<D>]) -> Result<usize> {
        let mut local: AdaptiveTree<D, Distribution<D>> = AdaptiveTree::new();
        let mut accepted = 0;
        for p in points {
            let pw = origin.transform_point(p);
            if !is_finite(&pw) {
                continue;
            }
            let Some(bi) = self.checked_bundle_index(&pw) else {
                continue;
            };
            let id = local.get_or_insert(bi);
            local.value_mut(id).add(&pw);
            accepted += 1;
        }

        {
            let bundles = self.bundles.lock();
            let mut outside = None;
            local.traverse(&mut |bi, _| {
                if outside.is_none() && !bundles.covers(bi) {
                    outside = Some(*bi);
                }
            });
            if let Some(bi) = outside {
                return Err(self.out_of_bounds(&bi));
            }
        }

        local.traverse(&mut |bi, d| {
            let bundle = self.resolve(bi);
            for (storage, (_, id)) in self.storages.iter().zip(bundle.iter()) {
                storage.lock().value_mut(id).merge(d);
            }
        });
        debug!(
            "inserted {accepted} of {} points into {} bundles",
            points.len(),
            local.len()
        );
        Ok(accepted)
    }

    /// Normalized density at a world point, averaged over its bundle.
    ///
    /// Allocates the bundle if it does not exist yet. Points outside a bounded map sample
    /// as zero and allocate nothing.
    pub fn sample(&self, p: &Point<D>) -> f64 {
        self.sample_at(p, &self.bundle_index(p))
    }

    /// Like [`MapGeneric::sample`] with a precomputed bundle index.
    pub fn sample_at(&self, p: &Point<D>, bi: &CellIndex<D>) -> f64 {
        self.evaluate(p, bi, Distribution::sample)
    }

    /// Density without normalizing constants, averaged over the point's bundle.
    ///
    /// Always in `[0, 1]`; zero means no usable distribution near `p`.
    pub fn sample_non_normalized(&self, p: &Point<D>) -> f64 {
        self.sample_non_normalized_at(p, &self.bundle_index(p))
    }

    /// Like [`MapGeneric::sample_non_normalized`] with a precomputed bundle index.
    pub fn sample_non_normalized_at(&self, p: &Point<D>, bi: &CellIndex<D>) -> f64 {
        self.evaluate(p, bi, Distribution::sample_non_normalized)
    }

    /// The bundle at `bi`, allocating it and its member cells on first access.
    pub fn distribution_bundle(&self, bi: &CellIndex<D>) -> Bundle<D> {
        self.resolve(bi)
    }

    /// Snapshot of the member distributions of `bundle`, in storage order.
    pub fn bundle_distributions(&self, bundle: &Bundle<D>) -> SmallVec<[Distribution<D>; 8]> {
        self.storages
            .iter()
            .zip(bundle.iter())
            .map(|(storage, (_, id))| storage.lock().value(id).clone())
            .collect()
    }

    /// Snapshot of every allocated bundle index, in no particular order.
    pub fn bundle_indices(&self) -> Vec<CellIndex<D>> {
        let bundles = self.bundles.lock();
        let mut indices = Vec::with_capacity(bundles.len());
        bundles.traverse(&mut |bi, _| indices.push(*bi));
        indices
    }

    /// Visit every cell of storage `k` while holding its lock.
    ///
    /// The visitor must not call back into the map.
    ///
    /// # Panics
    ///
    /// Panics if `k` is not below [`MapGeneric::storage_count`], i.e. `2^D`.
    pub fn traverse_distributions(
        &self,
        k: usize,
        visitor: &mut dyn FnMut(&CellIndex<D>, &Distribution<D>),
    ) {
        assert!(
            k < self.storages.len(),
            "storage {k} out of range for {} storages",
            self.storages.len()
        );
        self.storages[k].lock().traverse(visitor);
    }

    /// Approximate memory footprint of the map and all of its storages.
    pub fn byte_size(&self) -> usize {
        let storages: usize = self.storages.iter().map(|s| s.lock().byte_size()).sum();
        let bundles = self.bundles.lock().byte_size();
        size_of::<Self>() + storages + bundles
    }

    fn evaluate(
        &self,
        p: &Point<D>,
        bi: &CellIndex<D>,
        f: impl Fn(&Distribution<D>, &Point<D>) -> f64,
    ) -> f64 {
        let Ok(bundle) = self.try_resolve(bi) else {
            return 0.0;
        };
        let sum: f64 = self
            .storages
            .iter()
            .zip(bundle.iter())
            .map(|(storage, (_, id))| f(storage.lock().value(id), p))
            .sum();
        sum / f64::from(1_u32 << D)
    }

    fn resolve(&self, bi: &CellIndex<D>) -> Bundle<D> {
        self.try_resolve(bi).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Look up the bundle at `bi`, assembling and publishing it on a miss.
    fn try_resolve(&self, bi: &CellIndex<D>) -> Result<Bundle<D>> {
        {
            let bundles = self.bundles.lock();
            if let Some(id) = bundles.get(bi) {
                return Ok(bundles.value(id).clone());
            }
            if !bundles.covers(bi) {
                return Err(self.out_of_bounds(bi));
            }
        }

        let members: SmallVec<[_; 8]> = self
            .storages
            .iter()
            .enumerate()
            .map(|(k, storage)| {
                let index = member_index(bi, Shift::of_storage(k));
                let mut storage = storage.lock();
                (index, storage.get_or_insert(index))
            })
            .collect();

        // A concurrent caller may have published first; its bundle wins.
        let mut bundles = self.bundles.lock();
        let id = bundles.get_or_insert_with(*bi, || {
            trace!("allocated bundle {bi:?}");
            Bundle::new(members)
        });
        Ok(bundles.value(id).clone())
    }

    fn out_of_bounds(&self, bi: &CellIndex<D>) -> MapError {
        MapError::OutOfBounds {
            index: bi.to_vec(),
            extent: self.bundle_size().map(|s| s.to_vec()).unwrap_or_default(),
        }
    }
}
