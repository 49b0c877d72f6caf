//! Treeline core library.
//!
//! Spatial analytics over low-dimensional point clouds: Euclidean minimum
//! spanning trees built by a parallel Borůvka loop over a bounding-volume
//! hierarchy, optionally in the mutual-reachability metric of HDBSCAN*, and
//! a DBSCAN-style clustering primitive sharing the same tree.
//!
//! # Examples
//! ```
//! use treeline_core::{dbscan, minimum_spanning_tree, DbscanParams, Point};
//!
//! let points = [
//!     Point::new([0.0, 0.0]),
//!     Point::new([0.2, 0.0]),
//!     Point::new([0.1, 0.2]),
//!     Point::new([8.0, 8.0]),
//! ];
//!
//! let edges = minimum_spanning_tree(&points, 1)?;
//! assert_eq!(edges.len(), 3);
//!
//! let clustering = dbscan(&points, &DbscanParams::new(0.5, 1, 2)?)?;
//! assert_eq!(clustering.cluster_count(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bvh;
mod dbscan;
mod metric;
mod mst;
mod point;

pub use crate::{
    bvh::Bvh,
    dbscan::{dbscan, Clustering, DbscanError, DbscanErrorCode, DbscanParams},
    metric::{core_distances, Euclidean, Metric, MutualReachability},
    mst::{minimum_spanning_tree, MstError, MstErrorCode, WeightedEdge},
    point::{Aabb, Point},
};
