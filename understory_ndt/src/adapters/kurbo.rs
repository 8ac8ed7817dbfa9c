// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions from Kurbo 2D geometry.
//!
//! ## Feature
//!
//! Enable with `kurbo`.

use kurbo::{Affine, Vec2};

use crate::pose::{Point, Pose, pose2};

/// Tolerance used when checking that an affine transform is rigid.
const RIGID_EPSILON: f64 = 1e-9;

/// Convert a Kurbo point into a 2D map point.
pub fn point_from_kurbo(p: kurbo::Point) -> Point<2> {
    Point::from([p.x, p.y])
}

/// Convert a sequence of Kurbo points, e.g. a laser scan, into map points.
pub fn points_from_kurbo(points: impl IntoIterator<Item = kurbo::Point>) -> Vec<Point<2>> {
    points.into_iter().map(point_from_kurbo).collect()
}

/// 2D pose from a Kurbo translation and a heading angle in radians.
pub fn pose_from_kurbo(translation: Vec2, angle: f64) -> Pose<2> {
    pose2(translation.x, translation.y, angle)
}

/// 2D pose from a Kurbo affine transform.
///
/// Returns `None` if the transform scales, shears or mirrors.
pub fn pose_from_affine(affine: Affine) -> Option<Pose<2>> {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let rigid = (a - d).abs() < RIGID_EPSILON
        && (b + c).abs() < RIGID_EPSILON
        && (a * d - b * c - 1.0).abs() < RIGID_EPSILON;
    rigid.then(|| pose2(e, f, b.atan2(a)))
}
