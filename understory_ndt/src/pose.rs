// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point and rigid-transform aliases shared by 2D and 3D maps.

use nalgebra::{Isometry, Rotation, Rotation2, Rotation3, SMatrix, Translation};

/// A point in `D` dimensions.
pub type Point<const D: usize> = nalgebra::Point<f64, D>;

/// A rigid transform in `D` dimensions (rotation matrix plus translation).
pub type Pose<const D: usize> = Isometry<f64, Rotation<f64, D>, D>;

/// 2D pose from a translation and a heading angle in radians.
pub fn pose2(x: f64, y: f64, yaw: f64) -> Pose<2> {
    Isometry::from_parts(Translation::from([x, y]), Rotation2::new(yaw))
}

/// 3D pose from a translation and roll, pitch, yaw angles in radians.
pub fn pose3(translation: [f64; 3], roll: f64, pitch: f64, yaw: f64) -> Pose<3> {
    Isometry::from_parts(
        Translation::from(translation),
        Rotation3::from_euler_angles(roll, pitch, yaw),
    )
}

/// Build a rotation from the angles accepted by [`pose2`] (yaw) or [`pose3`]
/// (roll, pitch, yaw). Returns `None` if the angle count does not fit `D`.
pub(crate) fn rotation_from_angles<const D: usize>(angles: &[f64]) -> Option<Rotation<f64, D>> {
    let mut m = SMatrix::<f64, D, D>::identity();
    match (D, angles) {
        (2, []) | (3, []) => {}
        (2, &[yaw]) => copy_into(&mut m, Rotation2::new(yaw).matrix().as_slice(), 2),
        (3, &[roll, pitch, yaw]) => copy_into(
            &mut m,
            Rotation3::from_euler_angles(roll, pitch, yaw)
                .matrix()
                .as_slice(),
            3,
        ),
        _ => return None,
    }
    Some(Rotation::from_matrix_unchecked(m))
}

/// Copy a column-major `n × n` slice into `m`.
fn copy_into<const D: usize>(m: &mut SMatrix<f64, D, D>, src: &[f64], n: usize) {
    for c in 0..n {
        for r in 0..n {
            m[(r, c)] = src[c * n + r];
        }
    }
}

/// Whether every coordinate of `p` is finite.
pub fn is_finite<const D: usize>(p: &Point<D>) -> bool {
    p.coords.iter().all(|c| c.is_finite())
}
