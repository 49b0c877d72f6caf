//! Distance metrics consumed by the spanning-tree kernels.
//!
//! A metric maps a pair of original point indices and their Euclidean
//! distance to an edge weight. The traversal shrinks its pruning radius with
//! metric values while testing Euclidean box distances against it, which is
//! only admissible when the metric never undercuts the Euclidean distance;
//! every implementation must uphold that domination contract.

use rayon::prelude::*;

use crate::bvh::{kth_nearest_distance, Bvh};
use crate::point::Point;

/// An edge-weight metric dominating the Euclidean distance.
///
/// `euclidean` is a lower bound on (for point pairs: exactly) the Euclidean
/// distance between the two points; the returned weight must be `>=
/// euclidean`.
pub trait Metric: Sync {
    /// Weight of the edge between original point indices `a` and `b`.
    fn distance(&self, a: usize, b: usize, euclidean: f32) -> f32;
}

/// The identity metric: edge weight is the Euclidean distance.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    #[inline]
    fn distance(&self, _a: usize, _b: usize, euclidean: f32) -> f32 {
        euclidean
    }
}

/// The mutual-reachability metric underlying HDBSCAN*:
/// `max(core(a), core(b), euclidean)`.
///
/// # Examples
/// ```
/// use treeline_core::{Metric, MutualReachability};
///
/// let core = [2.0, 0.5];
/// let metric = MutualReachability::new(&core);
/// assert_eq!(metric.distance(0, 1, 1.0), 2.0);
/// assert_eq!(metric.distance(1, 1, 1.0), 1.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MutualReachability<'a> {
    core_distances: &'a [f32],
}

impl<'a> MutualReachability<'a> {
    /// Wraps precomputed per-point core distances.
    #[must_use]
    pub const fn new(core_distances: &'a [f32]) -> Self {
        Self { core_distances }
    }
}

impl Metric for MutualReachability<'_> {
    #[inline]
    fn distance(&self, a: usize, b: usize, euclidean: f32) -> f32 {
        euclidean
            .max(self.core_distances[a])
            .max(self.core_distances[b])
    }
}

/// Computes every point's core distance: the Euclidean distance to its
/// `k`-th nearest neighbour in the cloud, the point itself included, so
/// `k = 1` yields all zeroes.
#[must_use]
pub fn core_distances<const D: usize>(bvh: &Bvh<D>, points: &[Point<D>], k: usize) -> Vec<f32> {
    points
        .par_iter()
        .map(|point| kth_nearest_distance(bvh, point, k))
        .collect()
}
