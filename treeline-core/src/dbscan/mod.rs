//! DBSCAN-style density clustering on the BVH.
//!
//! Every point issues a fixed-radius range query; the reported pairs drive a
//! lock-free union-find. With `core_min_size == 1` all pairs union directly.
//! Otherwise a first sweep counts each point's `eps`-neighbourhood (itself
//! included), then core points union with core neighbours and non-core
//! points attach once to an adjacent core component. Clusters smaller than
//! `cluster_min_size` are filtered from the output.

mod union_find;

#[cfg(test)]
mod verify;

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::bvh::{for_each_in_sphere, Bvh};
use crate::point::Point;

use self::union_find::AtomicUnionFind;

/// Errors returned while running density clustering.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum DbscanError {
    /// Clustering needs at least two points.
    #[error("density clustering needs at least 2 points (got {got})")]
    InsufficientPoints {
        /// Number of points supplied.
        got: usize,
    },
    /// The neighbourhood radius must be positive and finite.
    #[error("the neighbourhood radius eps must be positive and finite (got {got})")]
    InvalidRadius {
        /// Value supplied by the caller.
        got: f32,
    },
    /// The core-point threshold must be positive.
    #[error("core_min_size must be at least 1 (got {got})")]
    InvalidCoreMinSize {
        /// Value supplied by the caller.
        got: usize,
    },
    /// Reported clusters must hold at least two points.
    #[error("cluster_min_size must be at least 2 (got {got})")]
    InvalidClusterMinSize {
        /// Value supplied by the caller.
        got: usize,
    },
    /// A point contained a NaN or infinite coordinate.
    #[error("point {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Index of the offending point.
        index: usize,
    },
}

impl DbscanError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> DbscanErrorCode {
        match self {
            Self::InsufficientPoints { .. } => DbscanErrorCode::InsufficientPoints,
            Self::InvalidRadius { .. } => DbscanErrorCode::InvalidRadius,
            Self::InvalidCoreMinSize { .. } => DbscanErrorCode::InvalidCoreMinSize,
            Self::InvalidClusterMinSize { .. } => DbscanErrorCode::InvalidClusterMinSize,
            Self::NonFiniteCoordinate { .. } => DbscanErrorCode::NonFiniteCoordinate,
        }
    }
}

/// Machine-readable error codes for [`DbscanError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DbscanErrorCode {
    /// Clustering needs at least two points.
    InsufficientPoints,
    /// The neighbourhood radius must be positive and finite.
    InvalidRadius,
    /// The core-point threshold must be positive.
    InvalidCoreMinSize,
    /// Reported clusters must hold at least two points.
    InvalidClusterMinSize,
    /// A point contained a NaN or infinite coordinate.
    NonFiniteCoordinate,
}

impl DbscanErrorCode {
    /// Returns the symbolic identifier for logging and metrics surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientPoints => "DBSCAN_INSUFFICIENT_POINTS",
            Self::InvalidRadius => "DBSCAN_INVALID_RADIUS",
            Self::InvalidCoreMinSize => "DBSCAN_INVALID_CORE_MIN_SIZE",
            Self::InvalidClusterMinSize => "DBSCAN_INVALID_CLUSTER_MIN_SIZE",
            Self::NonFiniteCoordinate => "DBSCAN_NON_FINITE_COORDINATE",
        }
    }
}

/// Validated DBSCAN parameters.
///
/// # Examples
/// ```
/// use treeline_core::DbscanParams;
///
/// let params = DbscanParams::new(0.5, 5, 2)?;
/// assert_eq!(params.eps(), 0.5);
/// assert_eq!(params.core_min_size(), 5);
/// assert_eq!(params.cluster_min_size(), 2);
/// # Ok::<(), treeline_core::DbscanError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DbscanParams {
    eps: f32,
    core_min_size: usize,
    cluster_min_size: usize,
}

impl DbscanParams {
    /// Validates and bundles the clustering parameters.
    ///
    /// # Errors
    ///
    /// Returns an error when `eps` is not a positive finite number,
    /// `core_min_size` is zero, or `cluster_min_size` is below two.
    pub fn new(
        eps: f32,
        core_min_size: usize,
        cluster_min_size: usize,
    ) -> Result<Self, DbscanError> {
        if !(eps > 0.0 && eps.is_finite()) {
            return Err(DbscanError::InvalidRadius { got: eps });
        }
        if core_min_size < 1 {
            return Err(DbscanError::InvalidCoreMinSize { got: core_min_size });
        }
        if cluster_min_size < 2 {
            return Err(DbscanError::InvalidClusterMinSize {
                got: cluster_min_size,
            });
        }
        Ok(Self {
            eps,
            core_min_size,
            cluster_min_size,
        })
    }

    /// Returns the neighbourhood radius.
    #[must_use]
    #[rustfmt::skip]
    pub const fn eps(&self) -> f32 { self.eps }

    /// Returns the neighbour count (itself included) that makes a point a
    /// core point.
    #[must_use]
    #[rustfmt::skip]
    pub const fn core_min_size(&self) -> usize { self.core_min_size }

    /// Returns the smallest cluster size worth reporting.
    #[must_use]
    #[rustfmt::skip]
    pub const fn cluster_min_size(&self) -> usize { self.cluster_min_size }
}

/// Clusters in compressed sparse row form: cluster `c` holds the point
/// indices `indices()[offsets()[c]..offsets()[c + 1]]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clustering {
    offsets: Vec<usize>,
    indices: Vec<u32>,
}

impl Clustering {
    /// Number of reported clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Cluster boundaries into [`Self::indices`].
    #[must_use]
    #[rustfmt::skip]
    pub fn offsets(&self) -> &[usize] { &self.offsets }

    /// Point indices, grouped by cluster.
    #[must_use]
    #[rustfmt::skip]
    pub fn indices(&self) -> &[u32] { &self.indices }

    /// Member indices of cluster `cluster`.
    #[must_use]
    pub fn cluster(&self, cluster: usize) -> &[u32] {
        &self.indices[self.offsets[cluster]..self.offsets[cluster + 1]]
    }

    /// Iterates over clusters as index slices.
    pub fn iter(&self) -> impl Iterator<Item = &[u32]> {
        (0..self.cluster_count()).map(|cluster| self.cluster(cluster))
    }
}

/// Runs DBSCAN over `points`.
///
/// Core components are deterministic; which adjacent core cluster claims a
/// non-core boundary point depends on scheduling, as usual for parallel
/// DBSCAN. Points in no reported cluster are noise.
///
/// # Errors
///
/// Returns an error for fewer than two points, invalid parameters, or
/// non-finite coordinates.
///
/// # Examples
/// ```
/// use treeline_core::{dbscan, DbscanParams, Point};
///
/// let points = [
///     Point::new([0.0, 0.0]),
///     Point::new([0.1, 0.0]),
///     Point::new([9.0, 9.0]),
/// ];
/// let clustering = dbscan(&points, &DbscanParams::new(0.5, 1, 2)?)?;
/// assert_eq!(clustering.cluster_count(), 1);
/// assert_eq!(clustering.cluster(0), &[0, 1]);
/// # Ok::<(), treeline_core::DbscanError>(())
/// ```
pub fn dbscan<const D: usize>(
    points: &[Point<D>],
    params: &DbscanParams,
) -> Result<Clustering, DbscanError> {
    let n = points.len();
    if n < 2 {
        return Err(DbscanError::InsufficientPoints { got: n });
    }
    if let Some(index) = (0..n)
        .into_par_iter()
        .find_first(|&index| !points[index].is_finite())
    {
        return Err(DbscanError::NonFiniteCoordinate { index });
    }

    let representatives = cluster_representatives(points, params);
    let clustering = extract_clusters(&representatives, params.cluster_min_size);
    tracing::debug!(
        points = n,
        clusters = clustering.cluster_count(),
        "density clustering complete"
    );
    Ok(clustering)
}

/// Assigns every point a component representative; unclustered points remain
/// their own representative.
fn cluster_representatives<const D: usize>(
    points: &[Point<D>],
    params: &DbscanParams,
) -> Vec<u32> {
    let bvh = Bvh::build(points);
    let union_find = AtomicUnionFind::new(points.len());

    if params.core_min_size == 1 {
        points.par_iter().enumerate().for_each(|(query, center)| {
            for_each_in_sphere(&bvh, center, params.eps, &mut |neighbour| {
                union_find.union(query as u32, neighbour as u32);
            });
        });
        return union_find.into_representatives();
    }

    let neighbour_counts: Vec<AtomicU32> =
        (0..points.len()).map(|_| AtomicU32::new(0)).collect();
    points.par_iter().enumerate().for_each(|(query, center)| {
        for_each_in_sphere(&bvh, center, params.eps, &mut |_| {
            neighbour_counts[query].fetch_add(1, Ordering::Relaxed);
        });
    });

    let is_core = |index: usize| {
        neighbour_counts[index].load(Ordering::Relaxed) as usize >= params.core_min_size
    };
    points.par_iter().enumerate().for_each(|(query, center)| {
        let query_is_core = is_core(query);
        for_each_in_sphere(&bvh, center, params.eps, &mut |neighbour| {
            if neighbour == query || !is_core(neighbour) {
                return;
            }
            if query_is_core {
                union_find.union(query as u32, neighbour as u32);
            } else {
                union_find.attach_once(query as u32, neighbour as u32);
            }
        });
    });

    union_find.into_representatives()
}

/// Groups points by representative and keeps clusters of at least
/// `cluster_min_size` members.
fn extract_clusters(representatives: &[u32], cluster_min_size: usize) -> Clustering {
    let mut order: Vec<u32> = (0..representatives.len() as u32).collect();
    order.par_sort_unstable_by_key(|&index| (representatives[index as usize], index));

    let mut offsets = vec![0usize];
    let mut indices = Vec::with_capacity(order.len());
    let mut start = 0usize;
    while start < order.len() {
        let representative = representatives[order[start] as usize];
        let mut end = start + 1;
        while end < order.len() && representatives[order[end] as usize] == representative {
            end += 1;
        }
        if end - start >= cluster_min_size {
            indices.extend_from_slice(&order[start..end]);
            offsets.push(indices.len());
        }
        start = end;
    }

    Clustering { offsets, indices }
}
