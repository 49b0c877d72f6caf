//! Property tests for the Borůvka MST builder against a sequential Prim
//! oracle.
//!
//! The oracle runs on the complete Euclidean graph using the same distance
//! arithmetic as the traversal, so total weights of any two minimum spanning
//! trees agree exactly up to summation order; comparisons still allow a tiny
//! relative tolerance for the `f64` accumulation.

use proptest::prelude::*;

use crate::bvh::Bvh;
use crate::metric::{core_distances, Metric, MutualReachability};
use crate::point::Point;

use super::{minimum_spanning_tree, WeightedEdge};

/// Sequential Prim over the complete graph; trusted reference for totals.
fn prim_total_weight<const D: usize>(points: &[Point<D>]) -> f64 {
    let n = points.len();
    let mut in_tree = vec![false; n];
    let mut best: Vec<f32> = (0..n).map(|i| points[0].distance(&points[i])).collect();
    in_tree[0] = true;

    let mut total = 0.0_f64;
    for _ in 1..n {
        let next = (0..n)
            .filter(|&i| !in_tree[i])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]))
            .expect("a vertex remains outside the tree");
        total += f64::from(best[next]);
        in_tree[next] = true;
        for i in 0..n {
            if !in_tree[i] {
                best[i] = best[i].min(points[next].distance(&points[i]));
            }
        }
    }
    total
}

fn assert_is_spanning_tree(n: usize, edges: &[WeightedEdge]) {
    assert_eq!(edges.len(), n - 1);
    let mut parent: Vec<usize> = (0..n).collect();
    fn find(parent: &mut [usize], node: usize) -> usize {
        let mut current = node;
        while parent[current] != current {
            parent[current] = parent[parent[current]];
            current = parent[current];
        }
        current
    }
    for edge in edges {
        let a = find(&mut parent, edge.source() as usize);
        let b = find(&mut parent, edge.target() as usize);
        assert_ne!(a, b, "cycle through ({}, {})", edge.source(), edge.target());
        parent[b] = a;
    }
}

fn total_weight(edges: &[WeightedEdge]) -> f64 {
    edges.iter().map(|edge| f64::from(edge.weight())).sum()
}

/// Clouds with coordinates on a coarse lattice, so duplicate points and
/// equal-distance ties occur often.
fn tied_cloud(max_len: usize) -> impl Strategy<Value = Vec<Point<2>>> {
    prop::collection::vec((0i32..6, 0i32..6), 2..max_len)
        .prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(x, y)| Point::new([x as f32, y as f32]))
                .collect()
        })
}

fn smooth_cloud(max_len: usize) -> impl Strategy<Value = Vec<Point<3>>> {
    prop::collection::vec(
        (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0),
        2..max_len,
    )
    .prop_map(|triples| {
        triples
            .into_iter()
            .map(|(x, y, z)| Point::new([x, y, z]))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn spans_and_matches_prim_on_smooth_clouds(points in smooth_cloud(48)) {
        let edges = minimum_spanning_tree(&points, 1).expect("valid input must succeed");
        assert_is_spanning_tree(points.len(), &edges);

        let reference = prim_total_weight(&points);
        let total = total_weight(&edges);
        prop_assert!(
            (total - reference).abs() <= reference.abs() * 1e-6 + 1e-9,
            "boruvka={total}, prim={reference}"
        );
    }

    #[test]
    fn spans_and_matches_prim_on_tie_heavy_clouds(points in tied_cloud(40)) {
        let edges = minimum_spanning_tree(&points, 1).expect("valid input must succeed");
        assert_is_spanning_tree(points.len(), &edges);

        let reference = prim_total_weight(&points);
        let total = total_weight(&edges);
        prop_assert!(
            (total - reference).abs() <= reference.abs() * 1e-6 + 1e-9,
            "boruvka={total}, prim={reference}"
        );
    }

    #[test]
    fn runs_are_deterministic(points in tied_cloud(32)) {
        let first = minimum_spanning_tree(&points, 1).expect("valid input must succeed");
        let second = minimum_spanning_tree(&points, 1).expect("valid input must succeed");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn mutual_reachability_dominates_euclidean(
        points in smooth_cloud(32),
        k in 1usize..6,
    ) {
        let edges = minimum_spanning_tree(&points, k).expect("valid input must succeed");
        assert_is_spanning_tree(points.len(), &edges);

        let bvh = Bvh::build(&points);
        let core = core_distances(&bvh, &points, k);
        let metric = MutualReachability::new(&core);
        for edge in &edges {
            let a = edge.source() as usize;
            let b = edge.target() as usize;
            let euclid = points[a].distance(&points[b]);
            prop_assert!(edge.weight() >= euclid);
            prop_assert!(edge.weight() >= core[a]);
            prop_assert!(edge.weight() >= core[b]);
            prop_assert_eq!(edge.weight(), metric.distance(a, b, euclid));
        }
    }
}
