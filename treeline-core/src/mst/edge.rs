//! Weighted edges and their total order.
//!
//! The order below is load-bearing: the per-component candidate selection and
//! the 2-cycle break between mutually-choosing components both assume a
//! strict total order that depends only on the weight and the unordered
//! endpoint pair. Because of that, cycles in the per-round component-edge
//! digraph can only be 2-cycles.

use std::cmp::Ordering;

/// An undirected weighted edge between two point indices.
///
/// # Examples
/// ```
/// use treeline_core::WeightedEdge;
///
/// let shorter = WeightedEdge::new(0, 3, 1.0);
/// let longer = WeightedEdge::new(0, 1, 2.0);
/// assert!(shorter < longer);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedEdge {
    pub(crate) source: i32,
    pub(crate) target: i32,
    pub(crate) weight: f32,
}

impl WeightedEdge {
    /// Creates an edge; endpoint order does not affect comparisons.
    #[must_use]
    pub const fn new(source: i32, target: i32, weight: f32) -> Self {
        Self {
            source,
            target,
            weight,
        }
    }

    /// Returns one endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source(&self) -> i32 { self.source }

    /// Returns the other endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target(&self) -> i32 { self.target }

    /// Returns the edge weight.
    #[must_use]
    #[rustfmt::skip]
    pub const fn weight(&self) -> f32 { self.weight }
}

impl Eq for WeightedEdge {}

impl Ord for WeightedEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| {
                self.source
                    .min(self.target)
                    .cmp(&other.source.min(other.target))
            })
            .then_with(|| {
                self.source
                    .max(self.target)
                    .cmp(&other.source.max(other.target))
            })
    }
}

impl PartialOrd for WeightedEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
