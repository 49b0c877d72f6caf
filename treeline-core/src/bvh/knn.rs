//! k-nearest-neighbour distance queries.
//!
//! Used to compute core distances for the mutual-reachability metric: the
//! query point belongs to the indexed cloud, so its own zero distance counts
//! towards `k`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::point::Point;

use super::{Bvh, TRAVERSAL_STACK};

/// Max-heap entry ordered by distance.
struct Candidate(f32);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Euclidean distance from `query` to its `k`-th nearest point in the tree,
/// counting the query point itself when it is part of the indexed cloud.
///
/// When `k` exceeds the point count, the distance to the farthest available
/// point is returned instead.
pub(crate) fn kth_nearest_distance<const D: usize>(
    bvh: &Bvh<D>,
    query: &Point<D>,
    k: usize,
) -> f32 {
    debug_assert!(k >= 1);

    fn offer(heap: &mut BinaryHeap<Candidate>, k: usize, distance: f32) {
        if heap.len() < k {
            heap.push(Candidate(distance));
        } else if distance < heap.peek().map_or(f32::INFINITY, |c| c.0) {
            heap.pop();
            heap.push(Candidate(distance));
        }
    }

    let mut nearest: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);

    let mut stack = [(0i32, 0.0f32); TRAVERSAL_STACK];
    let mut depth = 0usize;
    stack[depth] = (bvh.root(), 0.0);
    depth += 1;

    while depth > 0 {
        depth -= 1;
        let (node, node_distance) = stack[depth];
        let bound = if nearest.len() < k {
            f32::INFINITY
        } else {
            nearest.peek().map_or(f32::INFINITY, |c| c.0)
        };
        if node_distance > bound {
            continue;
        }

        let left = bvh.left_child(node);
        let right = bvh.right_child(node);
        let mut near = (left, bvh.bounds(left).distance_to_point(query));
        let mut far = (right, bvh.bounds(right).distance_to_point(query));
        if far.1 < near.1 {
            std::mem::swap(&mut near, &mut far);
        }

        // Push the farther child first so the nearer one is expanded next;
        // tighter bounds earlier mean more pruning later.
        for &(child, child_distance) in &[far, near] {
            if child_distance > bound {
                continue;
            }
            if bvh.is_leaf(child) {
                offer(&mut nearest, k, child_distance);
            } else {
                assert!(depth < TRAVERSAL_STACK, "BVH deeper than traversal stack");
                stack[depth] = (child, child_distance);
                depth += 1;
            }
        }
    }

    nearest
        .peek()
        .map_or(f32::INFINITY, |candidate| candidate.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_kth<const D: usize>(points: &[Point<D>], query: &Point<D>, k: usize) -> f32 {
        let mut distances: Vec<f32> = points.iter().map(|p| query.distance(p)).collect();
        distances.sort_by(f32::total_cmp);
        distances[(k - 1).min(distances.len() - 1)]
    }

    fn lattice() -> Vec<Point<3>> {
        (0..64)
            .map(|i| {
                Point::new([
                    (i % 4) as f32,
                    ((i / 4) % 4) as f32 * 1.3,
                    (i / 16) as f32 * 0.7,
                ])
            })
            .collect()
    }

    #[test]
    fn matches_brute_force_for_every_point_and_k() {
        let points = lattice();
        let bvh = Bvh::build(&points);

        for k in [1, 2, 5, 16] {
            for point in &points {
                assert_eq!(
                    kth_nearest_distance(&bvh, point, k),
                    brute_force_kth(&points, point, k),
                    "k={k}"
                );
            }
        }
    }

    #[test]
    fn first_neighbour_of_an_indexed_point_is_itself() {
        let points = lattice();
        let bvh = Bvh::build(&points);

        for point in &points {
            assert_eq!(kth_nearest_distance(&bvh, point, 1), 0.0);
        }
    }

    #[test]
    fn oversized_k_falls_back_to_the_farthest_point() {
        let points = [Point::new([0.0]), Point::new([1.0]), Point::new([5.0])];
        let bvh = Bvh::build(&points);

        assert_eq!(kth_nearest_distance(&bvh, &points[0], 10), 5.0);
    }
}
