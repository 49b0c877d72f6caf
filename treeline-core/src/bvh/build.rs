//! Top-down BVH construction over Morton-sorted leaves.
//!
//! The builder sorts points by Morton code, assigns each to a leaf slot in
//! sorted order, and splits leaf ranges at their midpoint, so the tree is
//! balanced and its depth is bounded by `ceil(log2 n) + 1`.

use rayon::prelude::*;

use crate::point::{Aabb, Point};

use super::{morton::morton_code, Bvh};

/// Sentinel child index while internal nodes are being wired up.
const UNSET: i32 = -1;

pub(super) fn build<const D: usize>(points: &[Point<D>]) -> Bvh<D> {
    let n = points.len();
    debug_assert!(n >= 2, "a BVH needs at least two primitives");

    let cloud = points
        .par_iter()
        .map(Aabb::from_point)
        .reduce_with(|a, b| a.union(&b))
        .expect("point count checked above");

    let mut order: Vec<u32> = (0..n as u32).collect();
    let codes: Vec<u64> = points
        .par_iter()
        .map(|point| morton_code(point, &cloud))
        .collect();
    order.par_sort_unstable_by_key(|&index| (codes[index as usize], index));

    let mut bounds = vec![Aabb::from_point(&points[0]); 2 * n - 1];
    let mut leaf_points = vec![0u32; n];
    for (slot, &point_index) in order.iter().enumerate() {
        bounds[n - 1 + slot] = Aabb::from_point(&points[point_index as usize]);
        leaf_points[slot] = point_index;
    }

    let mut builder = Builder {
        leaf_base: n - 1,
        bounds,
        left: vec![UNSET; n - 1],
        right: vec![UNSET; n - 1],
        next_internal: 0,
    };
    builder.subdivide(0, n);

    Bvh {
        bounds: builder.bounds,
        left: builder.left,
        right: builder.right,
        leaf_points,
    }
}

struct Builder<const D: usize> {
    leaf_base: usize,
    bounds: Vec<Aabb<D>>,
    left: Vec<i32>,
    right: Vec<i32>,
    next_internal: i32,
}

impl<const D: usize> Builder<D> {
    /// Builds the subtree over leaf slots `[lo, hi)` and returns its node
    /// index. Internal indices are assigned in preorder, so the root is 0.
    fn subdivide(&mut self, lo: usize, hi: usize) -> i32 {
        if hi - lo == 1 {
            return (self.leaf_base + lo) as i32;
        }

        let node = self.next_internal;
        self.next_internal += 1;

        let mid = lo + (hi - lo) / 2;
        let left = self.subdivide(lo, mid);
        let right = self.subdivide(mid, hi);

        self.left[node as usize] = left;
        self.right[node as usize] = right;
        self.bounds[node as usize] =
            self.bounds[left as usize].union(&self.bounds[right as usize]);
        node
    }
}
