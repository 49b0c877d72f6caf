//! Euclidean minimum spanning trees via parallel Borůvka over a BVH.
//!
//! Components repeatedly find their shortest outgoing edge and merge across
//! it. The search is a BVH traversal pruned by a shared per-component radius,
//! so each round costs roughly one tree walk per point, and the component
//! count at least halves per round.

mod edge;
mod labels;
mod merge;
mod nearest;

#[cfg(test)]
mod property;

use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64};

use rayon::prelude::*;

use crate::bvh::Bvh;
use crate::metric::{core_distances, Euclidean, Metric, MutualReachability};
use crate::point::Point;

pub use edge::WeightedEdge;

use labels::UNLABELLED;

/// Errors returned while computing a minimum spanning tree.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum MstError {
    /// A spanning tree needs at least two points.
    #[error("a minimum spanning tree needs at least 2 points (got {got})")]
    InsufficientPoints {
        /// Number of points supplied.
        got: usize,
    },
    /// The neighbour count for the mutual-reachability metric must be
    /// positive.
    #[error("the neighbour count k must be at least 1 (got {got})")]
    InvalidNeighbourCount {
        /// Value supplied by the caller.
        got: usize,
    },
    /// A point contained a NaN or infinite coordinate.
    #[error("point {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Index of the offending point.
        index: usize,
    },
    /// An internal invariant was violated, indicating a logic error or a
    /// metric that undercuts the Euclidean distance.
    #[error("MST invariant violated: {invariant} ({components} components remain)")]
    InvariantViolation {
        /// Name of the violated invariant to assist debugging.
        invariant: &'static str,
        /// Components still unmerged when the violation was detected.
        components: usize,
    },
}

impl MstError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> MstErrorCode {
        match self {
            Self::InsufficientPoints { .. } => MstErrorCode::InsufficientPoints,
            Self::InvalidNeighbourCount { .. } => MstErrorCode::InvalidNeighbourCount,
            Self::NonFiniteCoordinate { .. } => MstErrorCode::NonFiniteCoordinate,
            Self::InvariantViolation { .. } => MstErrorCode::InvariantViolation,
        }
    }
}

/// Machine-readable error codes for [`MstError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MstErrorCode {
    /// A spanning tree needs at least two points.
    InsufficientPoints,
    /// The neighbour count must be positive.
    InvalidNeighbourCount,
    /// A point contained a NaN or infinite coordinate.
    NonFiniteCoordinate,
    /// An internal invariant was violated.
    InvariantViolation,
}

impl MstErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientPoints => "MST_INSUFFICIENT_POINTS",
            Self::InvalidNeighbourCount => "MST_INVALID_NEIGHBOUR_COUNT",
            Self::NonFiniteCoordinate => "MST_NON_FINITE_COORDINATE",
            Self::InvariantViolation => "MST_INVARIANT_VIOLATION",
        }
    }
}

/// Computes the Euclidean minimum spanning tree of `points`.
///
/// With `k == 1` edge weights are Euclidean distances; with `k > 1` they are
/// mutual-reachability distances built from `k`-nearest-neighbour core
/// distances, as used by HDBSCAN*. The returned `n - 1` edges carry original
/// point indices; ties between equidistant candidates are broken by the
/// lexicographically smaller endpoint pair, so the edge set is deterministic.
///
/// # Errors
///
/// Returns an error when fewer than two points are supplied, `k` is zero, or
/// any coordinate is non-finite.
///
/// # Examples
/// ```
/// use treeline_core::{minimum_spanning_tree, Point};
///
/// let points = [
///     Point::new([0.0, 0.0]),
///     Point::new([1.0, 0.0]),
///     Point::new([2.0, 0.0]),
/// ];
/// let edges = minimum_spanning_tree(&points, 1)?;
/// assert_eq!(edges.len(), 2);
/// let total: f32 = edges.iter().map(|edge| edge.weight()).sum();
/// assert_eq!(total, 2.0);
/// # Ok::<(), treeline_core::MstError>(())
/// ```
pub fn minimum_spanning_tree<const D: usize>(
    points: &[Point<D>],
    k: usize,
) -> Result<Vec<WeightedEdge>, MstError> {
    let n = points.len();
    if n < 2 {
        return Err(MstError::InsufficientPoints { got: n });
    }
    if k < 1 {
        return Err(MstError::InvalidNeighbourCount { got: k });
    }
    if let Some(index) = (0..n)
        .into_par_iter()
        .find_first(|&index| !points[index].is_finite())
    {
        return Err(MstError::NonFiniteCoordinate { index });
    }

    let bvh = Bvh::build(points);
    let mut edges = if k > 1 {
        let core = core_distances(&bvh, points, k);
        boruvka(&bvh, &MutualReachability::new(&core))?
    } else {
        boruvka(&bvh, &Euclidean)?
    };

    // Edge endpoints are BVH leaf indices until here; map them back to the
    // points the leaves carry.
    edges.par_iter_mut().for_each(|edge| {
        edge.source = bvh.leaf_point_index(edge.source) as i32;
        edge.target = bvh.leaf_point_index(edge.target) as i32;
    });
    Ok(edges)
}

/// Runs Borůvka rounds until a single component remains. Edge endpoints in
/// the result are BVH leaf indices.
fn boruvka<const D: usize, M: Metric>(
    bvh: &Bvh<D>,
    metric: &M,
) -> Result<Vec<WeightedEdge>, MstError> {
    let n = bvh.len();
    let parents = labels::find_parents(bvh);

    // Leaves start as their own singleton components; internal labels are
    // recomputed every round.
    let node_labels: Vec<AtomicI32> = (0..2 * n - 1)
        .map(|node| {
            AtomicI32::new(if node >= n - 1 {
                node as i32
            } else {
                UNLABELLED
            })
        })
        .collect();
    let visits: Vec<AtomicU32> = (0..n - 1).map(|_| AtomicU32::new(0)).collect();
    let radii: Vec<AtomicU32> = (0..n).map(|_| AtomicU32::new(0)).collect();
    let best: Vec<AtomicU64> = (0..n).map(|_| AtomicU64::new(0)).collect();
    let proposals: Vec<AtomicU64> = (0..n).map(|_| AtomicU64::new(0)).collect();

    let mut edges: Vec<WeightedEdge> = Vec::with_capacity(n - 1);
    let mut num_components = n;
    let mut round = 0u32;

    while num_components > 1 {
        round += 1;
        let span = tracing::debug_span!("boruvka_round", round, components = num_components);
        let _guard = span.enter();

        labels::reduce_labels(bvh, &parents, &node_labels, &visits);
        nearest::reset_component_state(&radii, &best);
        nearest::reset_shared_radii(bvh, metric, &node_labels, &radii);
        nearest::find_component_nearest_neighbors(
            bvh,
            metric,
            &node_labels,
            &radii,
            &best,
            &proposals,
        );
        let out_edges = nearest::collect_component_edges(n, &best, &proposals);
        let merged = merge::update_components_and_edges(n, &node_labels, &out_edges);

        if merged.is_empty() || merged.len() >= num_components {
            return Err(MstError::InvariantViolation {
                invariant: "each round must emit one edge per merged component",
                components: num_components,
            });
        }
        num_components -= merged.len();
        edges.extend(merged);
        tracing::debug!(round, components = num_components, "round complete");
    }

    debug_assert_eq!(edges.len(), n - 1);
    Ok(edges)
}
