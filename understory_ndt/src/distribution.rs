// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental Gaussian accumulator stored per cell.

use core::cell::OnceCell;
use core::f64::consts::TAU;

use nalgebra::{Cholesky, SMatrix, SVector};

use crate::pose::Point;

/// Fewer samples than this never yield a covariance.
pub const MIN_SAMPLES: usize = 3;

/// Covariances whose squared Cholesky pivots span more than this ratio count as singular.
const PIVOT_RATIO: f64 = 1e-12;

/// Sufficient statistics of the points observed in one cell.
///
/// Mean, covariance and inverse covariance are derived lazily from the raw sums and
/// cached until the next mutation. Queries on a distribution with fewer than
/// [`MIN_SAMPLES`] points, or with a covariance that is not positive definite, report
/// zero density.
#[derive(Clone, Debug)]
pub struct Distribution<const D: usize> {
    count: usize,
    sum: SVector<f64, D>,
    sum_outer: SMatrix<f64, D, D>,
    cache: OnceCell<Option<Gaussian<D>>>,
}

/// Gaussian estimate derived from a [`Distribution`].
#[derive(Clone, Debug, PartialEq)]
pub struct Gaussian<const D: usize> {
    /// Sample mean.
    pub mean: SVector<f64, D>,
    /// Unbiased sample covariance.
    pub covariance: SMatrix<f64, D, D>,
    /// Inverse of `covariance`.
    pub inverse_covariance: SMatrix<f64, D, D>,
    /// `1 / sqrt((2π)^D · det(covariance))`.
    pub normalizer: f64,
}

impl<const D: usize> Gaussian<D> {
    /// Mahalanobis-weighted exponent `exp(-0.5 · qᵗ Σ⁻¹ q)` with `q = p - mean`.
    pub fn score(&self, p: &SVector<f64, D>) -> f64 {
        let q = p - self.mean;
        let e = (-0.5 * q.dot(&(self.inverse_covariance * q))).exp();
        if e.is_finite() { e.max(0.0) } else { 0.0 }
    }

    /// Normalized density at `p`.
    pub fn density(&self, p: &SVector<f64, D>) -> f64 {
        self.normalizer * self.score(p)
    }
}

impl<const D: usize> Default for Distribution<D> {
    fn default() -> Self {
        Self {
            count: 0,
            sum: SVector::zeros(),
            sum_outer: SMatrix::zeros(),
            cache: OnceCell::new(),
        }
    }
}

impl<const D: usize> Distribution<D> {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one observation.
    pub fn add(&mut self, p: &Point<D>) {
        self.count += 1;
        self.sum += p.coords;
        self.sum_outer += p.coords * p.coords.transpose();
        self.cache = OnceCell::new();
    }

    /// Fold another accumulator's statistics into this one.
    pub fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_outer += other.sum_outer;
        self.cache = OnceCell::new();
    }

    /// Number of accumulated points.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Sum of accumulated points.
    pub fn sum(&self) -> &SVector<f64, D> {
        &self.sum
    }

    /// Sum of outer products `p pᵗ` of accumulated points.
    pub fn sum_outer_product(&self) -> &SMatrix<f64, D, D> {
        &self.sum_outer
    }

    /// Sample mean, if at least one point was accumulated.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Counts beyond 2^52 points per cell are not expected."
    )]
    pub fn mean(&self) -> Option<SVector<f64, D>> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Full Gaussian estimate, or `None` for insufficient data or a singular covariance.
    pub fn gaussian(&self) -> Option<&Gaussian<D>> {
        self.cache.get_or_init(|| self.estimate()).as_ref()
    }

    /// Unbiased covariance estimate.
    pub fn covariance(&self) -> Option<&SMatrix<f64, D, D>> {
        self.gaussian().map(|g| &g.covariance)
    }

    /// Inverse of the covariance estimate.
    pub fn inverse_covariance(&self) -> Option<&SMatrix<f64, D, D>> {
        self.gaussian().map(|g| &g.inverse_covariance)
    }

    /// Normalized Gaussian density at `p`; zero without a usable estimate.
    pub fn sample(&self, p: &Point<D>) -> f64 {
        self.gaussian().map_or(0.0, |g| g.density(&p.coords))
    }

    /// Density at `p` without the normalizing constant; zero without a usable estimate.
    pub fn sample_non_normalized(&self, p: &Point<D>) -> f64 {
        self.gaussian().map_or(0.0, |g| g.score(&p.coords))
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "Counts beyond 2^52 points per cell are not expected; D is 2 or 3."
    )]
    fn estimate(&self) -> Option<Gaussian<D>> {
        if self.count < MIN_SAMPLES {
            return None;
        }
        let n = self.count as f64;
        let mean = self.sum / n;
        let covariance = (self.sum_outer - mean * mean.transpose() * n) / (n - 1.0);
        if !covariance.iter().all(|v| v.is_finite()) {
            return None;
        }
        let cholesky = Cholesky::new(covariance)?;
        let pivots = cholesky.l_dirty().diagonal();
        let (lo, hi) = pivots
            .iter()
            .fold((f64::INFINITY, 0.0_f64), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if lo * lo <= hi * hi * PIVOT_RATIO {
            return None;
        }
        let sqrt_det: f64 = pivots.iter().product();
        let inverse_covariance = cholesky.inverse();
        let normalizer = 1.0 / ((TAU.powi(D as i32)).sqrt() * sqrt_det);
        if !normalizer.is_finite() || !inverse_covariance.iter().all(|v| v.is_finite()) {
            return None;
        }
        Some(Gaussian {
            mean,
            covariance,
            inverse_covariance,
            normalizer,
        })
    }
}

impl<const D: usize> PartialEq for Distribution<D> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.sum == other.sum && self.sum_outer == other.sum_outer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn build(points: &[[f64; 2]]) -> Distribution<2> {
        let mut d = Distribution::new();
        for p in points {
            d.add(&Point::from(*p));
        }
        d
    }

    const CLUSTER: [[f64; 2]; 6] = [
        [0.1, 0.2],
        [0.4, 0.1],
        [0.3, 0.5],
        [0.2, 0.35],
        [0.45, 0.4],
        [0.15, 0.05],
    ];

    #[test]
    fn fewer_than_three_points_is_zero() {
        let d = build(&CLUSTER[..2]);
        assert_eq!(d.count(), 2);
        assert!(d.mean().is_some());
        assert!(d.covariance().is_none());
        assert_eq!(d.sample(&Point::from([0.25, 0.15])), 0.0);
        assert_eq!(d.sample_non_normalized(&Point::from([0.25, 0.15])), 0.0);
    }

    #[test]
    fn empty_distribution_is_zero() {
        let d = Distribution::<3>::new();
        assert!(d.mean().is_none());
        assert_eq!(d.sample(&Point::origin()), 0.0);
        assert_eq!(d.sample_non_normalized(&Point::origin()), 0.0);
    }

    #[test]
    fn collinear_points_are_singular() {
        let d = build(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]);
        assert!(d.gaussian().is_none());
        assert_eq!(d.sample(&Point::from([1.0, 1.0])), 0.0);
    }

    #[test]
    fn moments_match_direct_computation() {
        let d = build(&CLUSTER);
        let n = CLUSTER.len() as f64;
        let mx = CLUSTER.iter().map(|p| p[0]).sum::<f64>() / n;
        let my = CLUSTER.iter().map(|p| p[1]).sum::<f64>() / n;
        let cxy = CLUSTER
            .iter()
            .map(|p| (p[0] - mx) * (p[1] - my))
            .sum::<f64>()
            / (n - 1.0);
        let mean = d.mean().unwrap();
        assert!((mean.x - mx).abs() < 1e-12 && (mean.y - my).abs() < 1e-12);
        let cov = d.covariance().unwrap();
        assert!((cov[(0, 1)] - cxy).abs() < 1e-12);
        let identity = cov * d.inverse_covariance().unwrap();
        assert!((identity - SMatrix::<f64, 2, 2>::identity()).norm() < 1e-9);
    }

    #[test]
    fn peak_density_matches_normalizer() {
        let d = build(&CLUSTER);
        let g = d.gaussian().unwrap();
        let peak = Point::from(g.mean);
        assert!((d.sample_non_normalized(&peak) - 1.0).abs() < 1e-12);
        let det = g.covariance.determinant();
        let expected = 1.0 / (TAU * det.sqrt());
        assert!((d.sample(&peak) - expected).abs() < 1e-9 * expected);
        assert!(d.sample(&Point::from([10.0, 10.0])) < d.sample(&peak));
    }

    #[test]
    fn mutation_invalidates_cache() {
        let mut d = build(&CLUSTER);
        let before = d.mean().unwrap();
        let g_before = d.gaussian().cloned().unwrap();
        d.add(&Point::from([5.0, 5.0]));
        assert_ne!(d.mean().unwrap(), before);
        assert_ne!(d.gaussian().cloned().unwrap(), g_before);
    }

    fn points() -> impl Strategy<Value = Vec<[f64; 3]>> {
        prop::collection::vec(prop::array::uniform3(-50.0..50.0_f64), 0..40)
    }

    proptest! {
        #[test]
        fn merge_is_order_independent(all in points(), split in 0usize..40) {
            let split = split.min(all.len());
            let (a, b) = all.split_at(split);

            let mut sequential = Distribution::<3>::new();
            for p in a.iter().chain(b) {
                sequential.add(&Point::from(*p));
            }

            let mut left = Distribution::<3>::new();
            let mut right = Distribution::<3>::new();
            a.iter().for_each(|p| left.add(&Point::from(*p)));
            b.iter().for_each(|p| right.add(&Point::from(*p)));
            let mut ab = left.clone();
            ab.merge(&right);
            let mut ba = right;
            ba.merge(&left);

            for merged in [&ab, &ba] {
                prop_assert_eq!(merged.count(), sequential.count());
                prop_assert!((merged.sum() - sequential.sum()).norm() < 1e-9);
                prop_assert!((merged.sum_outer_product() - sequential.sum_outer_product()).norm() < 1e-6);
                // Fewer points leave the 3D covariance rank deficient, where rounding decides
                // whether a factorization exists.
                if sequential.count() >= 5 {
                    let m = merged.covariance();
                    let s = sequential.covariance();
                    prop_assert!(m.is_some() && s.is_some());
                    if let (Some(m), Some(s)) = (m, s) {
                        prop_assert!((m - s).norm() < 1e-6 * (1.0 + s.norm()));
                    }
                }
            }
        }

        #[test]
        fn densities_are_never_negative(all in points(), q in prop::array::uniform3(-1e6..1e6_f64)) {
            let mut d = Distribution::<3>::new();
            all.iter().for_each(|p| d.add(&Point::from(*p)));
            let q = Point::from(q);
            prop_assert!(d.sample(&q) >= 0.0);
            prop_assert!(d.sample_non_normalized(&q) >= 0.0);
        }
    }
}
