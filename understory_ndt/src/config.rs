// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serializable construction parameters for maps.
//!
//! Fields are plain vectors so one configuration type serves 2D and 3D maps; lengths are
//! checked against the map dimension when a map is built.

use log::warn;
use nalgebra::{Isometry, Translation};
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::map::{AdaptiveMap, BoundedMap};
use crate::pose::{Pose, rotation_from_angles};

/// Map construction parameters.
///
/// ```toml
/// resolution = 0.5
/// size = [200, 200]
///
/// [origin]
/// translation = [-50.0, -50.0]
/// rotation = [0.0]
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Cell edge length. Bundles use half of it.
    #[serde(default = "default_resolution")]
    pub resolution: f64,

    /// Pose of the map frame in the world.
    #[serde(default)]
    pub origin: OriginConfig,

    /// Cells per axis. Required for bounded maps, ignored by adaptive ones.
    #[serde(default)]
    pub size: Option<Vec<usize>>,
}

/// World pose of the map frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Translation; empty means the world origin.
    #[serde(default)]
    pub translation: Vec<f64>,

    /// Rotation angles in radians: `[yaw]` in 2D, `[roll, pitch, yaw]` in 3D.
    /// Empty means no rotation.
    #[serde(default)]
    pub rotation: Vec<f64>,
}

fn default_resolution() -> f64 {
    1.0
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            origin: OriginConfig::default(),
            size: None,
        }
    }
}

impl MapConfig {
    /// The configured origin as a `D`-dimensional pose.
    pub fn origin_pose<const D: usize>(&self) -> Result<Pose<D>> {
        let mut translation = [0.0; D];
        match self.origin.translation.len() {
            0 => {}
            n if n == D => translation.copy_from_slice(&self.origin.translation),
            found => {
                return Err(MapError::DimensionMismatch {
                    field: "origin.translation",
                    expected: D,
                    found,
                });
            }
        }
        let rotation = rotation_from_angles::<D>(&self.origin.rotation).ok_or(
            MapError::DimensionMismatch {
                field: "origin.rotation",
                expected: if D == 2 { 1 } else { 3 },
                found: self.origin.rotation.len(),
            },
        )?;
        Ok(Isometry::from_parts(Translation::from(translation), rotation))
    }

    /// Build a bounded map; `size` must be present with `D` entries.
    pub fn build_bounded<const D: usize>(&self) -> Result<BoundedMap<D>> {
        let size = self.size.as_deref().ok_or(MapError::MissingSize)?;
        let size =
            <[usize; D]>::try_from(size).map_err(|_| MapError::DimensionMismatch {
                field: "size",
                expected: D,
                found: size.len(),
            })?;
        BoundedMap::new(self.origin_pose()?, self.resolution, size)
    }

    /// Build an adaptive map. A configured `size` is ignored.
    pub fn build_adaptive<const D: usize>(&self) -> Result<AdaptiveMap<D>> {
        if let Some(size) = &self.size {
            warn!("adaptive map ignores configured size {size:?}");
        }
        AdaptiveMap::new(self.origin_pose()?, self.resolution)
    }
}
