// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_ndt --heading-base-level=0

//! Understory NDT: a thread-safe, multi-resolution normal distributions transform map.
//!
//! Understory NDT stores a Gaussian accumulator per spatial cell and answers continuous
//! density queries, the representation consumed by NDT scan matching.
//!
//! - Stream points with [`MapGeneric::add`] or whole scans with [`MapGeneric::insert`].
//! - Query [`MapGeneric::sample`] (normalized) or [`MapGeneric::sample_non_normalized`].
//! - Read per-cell means and inverse covariances through [`MapGeneric::distribution_bundle`]
//!   and [`MapGeneric::bundle_distributions`].
//!
//! Every map keeps `2^D` grids at the cell resolution, each shifted by half a cell along a
//! different set of axes. A point falls into one *bundle* at half the cell resolution, and
//! the bundle references one cell of every grid. Queries average the `2^D` contributions,
//! which smooths the response across cell borders without interpolating.
//!
//! Cells live in [`understory_cells`] backends:
//!
//! - [`BoundedMap`]: dense arrays over a declared extent. Points outside it are rejected.
//! - [`AdaptiveMap`]: quad/octrees that grow wherever points land.
//!
//! Maps are `Sync`; any number of threads may insert and sample concurrently.
//!
//! # Example
//!
//! ```rust
//! use understory_ndt::{BoundedMap, Point, Pose};
//!
//! let map = BoundedMap::<2>::new(Pose::identity(), 1.0, [2, 2]).unwrap();
//! let scan = [[0.50, 0.50], [0.60, 0.52], [0.55, 0.60], [0.52, 0.57], [0.58, 0.55]]
//!     .map(Point::from);
//! assert_eq!(map.insert(&Pose::identity(), &scan), 5);
//!
//! let score = map.sample_non_normalized(&Point::from([0.55, 0.55]));
//! assert!(score > 0.0 && score <= 1.0);
//! assert_eq!(map.sample(&Point::from([1.9, 1.9])), 0.0);
//! ```
//!
//! Adaptive maps need no extent and grow in every direction:
//!
//! ```rust
//! use understory_ndt::{AdaptiveMap, Point, pose3};
//!
//! let map = AdaptiveMap::<3>::new(pose3([0.0, 0.0, 1.5], 0.0, 0.0, 0.0), 0.5).unwrap();
//! map.add(&Point::from([1000.0, -1000.0, 0.0]));
//! map.add(&Point::from([-1000.0, 1000.0, 3.0]));
//! assert_eq!(map.bundle_indices().len(), 2);
//! ```
//!
//! ## Configuration
//!
//! [`MapConfig`] deserializes construction parameters with `serde` and builds either map
//! kind. Diagnostics go through the `log` facade.

pub mod adapters;
pub mod bundle;
pub mod config;
pub mod distribution;
pub mod error;
pub mod map;
pub mod pose;

pub use bundle::{Bundle, Shift};
pub use config::{MapConfig, OriginConfig};
pub use distribution::{Distribution, Gaussian, MIN_SAMPLES};
pub use error::{MapError, Result};
pub use map::{AdaptiveMap, BoundedMap, MapGeneric};
pub use pose::{Point, Pose, pose2, pose3};
pub use understory_cells::{CellId, CellIndex};
