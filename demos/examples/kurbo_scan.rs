// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feed Kurbo geometry into an adaptive map and score a shifted copy of the scan.
//!
//! This mirrors what a scan matcher does: the better the candidate pose, the higher the
//! summed non-normalized score.
//!
//! Run:
//! - `cargo run -p understory_demos --example kurbo_scan`

use kurbo::{Affine, Circle, Shape, Vec2};
use understory_ndt::{AdaptiveMap, Pose};
use understory_ndt::adapters::kurbo::{point_from_kurbo, points_from_kurbo, pose_from_affine};

fn main() {
    let map = AdaptiveMap::<2>::new(Pose::identity(), 0.25).expect("valid resolution");

    // Sample the outline of a circular pillar as a scan.
    let pillar = Circle::new((3.0, 1.0), 0.8);
    let outline: Vec<_> = pillar
        .path_elements(0.01)
        .filter_map(|el| el.end_point())
        .collect();
    let mut scan = Vec::new();
    for turn in 0..16 {
        let spin = Affine::rotate_about(f64::from(turn) * 0.39, pillar.center);
        scan.extend(outline.iter().map(|&p| spin * p));
    }
    let sensor = pose_from_affine(Affine::IDENTITY).expect("rigid");
    println!("accepted {} points", map.insert(&sensor, &points_from_kurbo(scan.iter().copied())));

    for dx in [0.0, 0.1, 0.3, 0.6] {
        let candidate = Affine::translate(Vec2::new(dx, 0.0));
        let pose = pose_from_affine(candidate).expect("rigid");
        let score: f64 = scan
            .iter()
            .map(|&p| map.sample_non_normalized(&pose.transform_point(&point_from_kurbo(p))))
            .sum();
        println!("offset {dx:.1}: score {score:.2}");
    }
}
