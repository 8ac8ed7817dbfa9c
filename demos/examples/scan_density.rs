// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build a bounded 2D map from a synthetic range scan and print a density profile.
//!
//! The scan sees two walls of a corridor. Sampling across the corridor shows the
//! density peaking at the walls and vanishing in free space.
//!
//! Run:
//! - `cargo run -p understory_demos --example scan_density`

use understory_ndt::{BoundedMap, MapConfig, Point, pose2};

const CONFIG: &str = r#"
resolution = 0.5
size = [40, 16]

[origin]
translation = [-10.0, -4.0]
"#;

fn main() {
    let config: MapConfig = toml::from_str(CONFIG).expect("valid config");
    let map: BoundedMap<2> = config.build_bounded().expect("valid map");

    // Sensor at the world origin, facing +x; walls at y = ±1.5.
    let mut scan = Vec::new();
    for i in 0..400 {
        let x = -8.0 + f64::from(i) * 0.04;
        let jitter = 0.03 * (f64::from(i) * 1.7).sin();
        scan.push(Point::from([x, 1.5 + jitter]));
        scan.push(Point::from([x, -1.5 - jitter]));
    }
    scan.push(Point::from([f64::NAN, 0.0]));
    let accepted = map.insert(&pose2(0.0, 0.0, 0.0), &scan);
    println!(
        "accepted {accepted} of {} points, {} bundles, {} cells, {} bytes",
        scan.len(),
        map.bundle_indices().len(),
        map.cell_count(),
        map.byte_size()
    );

    println!("density across the corridor at x = 2.1:");
    for step in -8..=8 {
        let y = f64::from(step) * 0.25;
        let p = Point::from([2.1, y]);
        println!(
            "  y = {y:+.2}: density {:>10.4}, score {:.4}",
            map.sample(&p),
            map.sample_non_normalized(&p)
        );
    }

    let bi = map.bundle_index(&Point::from([2.1, 1.5]));
    let bundle = map.distribution_bundle(&bi);
    for (k, d) in map.bundle_distributions(&bundle).iter().enumerate() {
        match d.gaussian() {
            Some(g) => println!(
                "  storage {k} cell {:?}: n = {}, mean = ({:.3}, {:.3})",
                bundle.index(k),
                d.count(),
                g.mean.x,
                g.mean.y
            ),
            None => println!("  storage {k} cell {:?}: n = {}, no estimate", bundle.index(k), d.count()),
        }
    }
}
