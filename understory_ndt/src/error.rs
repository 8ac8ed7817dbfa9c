// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for map construction and checked insertion.

use thiserror::Error;

/// Errors reported by map constructors, configuration and the checked insertion paths.
///
/// Data-quality issues (too few points, singular covariances, non-finite inputs in batch
/// insertion) are never errors; they show up as zero densities or dropped points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    /// The cell resolution is not a finite positive number.
    #[error("resolution must be finite and positive, got {0}")]
    InvalidResolution(f64),

    /// A bounded map was declared with a zero-length axis.
    #[error("bounded map extent {0:?} has an empty axis")]
    EmptyExtent(Vec<usize>),

    /// A configuration vector does not match the map dimension.
    #[error("`{field}` has {found} components, expected {expected}")]
    DimensionMismatch {
        /// Name of the offending configuration field.
        field: &'static str,
        /// Number of components the map dimension requires.
        expected: usize,
        /// Number of components found.
        found: usize,
    },

    /// A bounded map was requested without a `size`.
    #[error("bounded map requires a `size`")]
    MissingSize,

    /// A bundle index falls outside a bounded map's extent.
    #[error("bundle index {index:?} outside bundle extent {extent:?}")]
    OutOfBounds {
        /// The offending bundle index.
        index: Vec<i32>,
        /// The map's bundle extent.
        extent: Vec<usize>,
    },
}

/// Result alias for map operations.
pub type Result<T> = core::result::Result<T, MapError>;
