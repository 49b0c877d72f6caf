//! Fixed-radius range queries.

use crate::point::Point;

use super::{Bvh, TRAVERSAL_STACK};

/// Invokes `visit` with the original index of every point within `radius` of
/// `center` (closed ball, so coincident points are always reported).
pub(crate) fn for_each_in_sphere<const D: usize>(
    bvh: &Bvh<D>,
    center: &Point<D>,
    radius: f32,
    visit: &mut impl FnMut(usize),
) {
    let mut stack = [0i32; TRAVERSAL_STACK];
    let mut depth = 0usize;
    stack[depth] = bvh.root();
    depth += 1;

    while depth > 0 {
        depth -= 1;
        let node = stack[depth];
        if bvh.bounds(node).distance_to_point(center) > radius {
            continue;
        }
        if bvh.is_leaf(node) {
            // A leaf box is the point itself, so the box test was exact.
            visit(bvh.leaf_point_index(node));
            continue;
        }
        assert!(
            depth + 1 < TRAVERSAL_STACK,
            "BVH deeper than traversal stack"
        );
        stack[depth] = bvh.left_child(node);
        stack[depth + 1] = bvh.right_child(node);
        depth += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Vec<Point<2>> {
        (0..24)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 24.0;
                Point::new([angle.cos() * (1.0 + (i % 3) as f32), angle.sin()])
            })
            .collect()
    }

    #[test]
    fn matches_brute_force_membership() {
        let points = ring();
        let bvh = Bvh::build(&points);

        for (query, center) in points.iter().enumerate() {
            let mut reported = Vec::new();
            for_each_in_sphere(&bvh, center, 0.9, &mut |index| reported.push(index));
            reported.sort_unstable();

            let expected: Vec<usize> = (0..points.len())
                .filter(|&j| center.distance(&points[j]) <= 0.9)
                .collect();
            assert_eq!(reported, expected, "query point {query}");
        }
    }

    #[test]
    fn every_point_reports_itself() {
        let points = ring();
        let bvh = Bvh::build(&points);

        for (index, center) in points.iter().enumerate() {
            let mut found_self = false;
            for_each_in_sphere(&bvh, center, 1e-6, &mut |j| found_self |= j == index);
            assert!(found_self);
        }
    }
}
