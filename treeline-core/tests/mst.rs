//! End-to-end minimum spanning tree scenarios.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use treeline_core::{core_distances, minimum_spanning_tree, Bvh, Point, WeightedEdge};

fn uniform_cube(count: usize, seed: u64) -> Vec<Point<3>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Point::new([
                rng.gen_range(0.0f32..1.0),
                rng.gen_range(0.0f32..1.0),
                rng.gen_range(0.0f32..1.0),
            ])
        })
        .collect()
}

/// Sequential Prim over the complete Euclidean graph.
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

fn assert_spanning_tree(n: usize, edges: &[WeightedEdge]) {
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
        assert_ne!(a, b, "edge set contains a cycle");
        parent[b] = a;
    }
}

fn total_weight(edges: &[WeightedEdge]) -> f64 {
    edges.iter().map(|edge| f64::from(edge.weight())).sum()
}

#[test]
fn thousand_point_cube_matches_the_prim_reference() {
    let points = uniform_cube(1000, 0x5eed);
    let edges = minimum_spanning_tree(&points, 1).expect("valid input must succeed");

    assert_spanning_tree(points.len(), &edges);

    let total = total_weight(&edges);
    let reference = prim_total_weight(&points);
    assert!(
        (total - reference).abs() <= reference * 1e-5,
        "boruvka={total}, prim={reference}"
    );
}

#[test]
fn planar_cloud_matches_the_prim_reference() {
    let mut rng = StdRng::seed_from_u64(7);
    let points: Vec<Point<2>> = (0..400)
        .map(|_| Point::new([rng.gen_range(-50.0f32..50.0), rng.gen_range(-50.0f32..50.0)]))
        .collect();

    let edges = minimum_spanning_tree(&points, 1).expect("valid input must succeed");
    assert_spanning_tree(points.len(), &edges);

    let total = total_weight(&edges);
    let reference = prim_total_weight(&points);
    assert!(
        (total - reference).abs() <= reference * 1e-5,
        "boruvka={total}, prim={reference}"
    );
}

#[test]
fn repeated_runs_agree_edge_for_edge() {
    let points = uniform_cube(500, 42);
    let first = minimum_spanning_tree(&points, 1).expect("valid input must succeed");
    let second = minimum_spanning_tree(&points, 1).expect("valid input must succeed");
    assert_eq!(first, second);
}

#[test]
fn mutual_reachability_tree_respects_core_distances() {
    // A dense cluster plus sparse uniform noise; every MST edge weight must
    // dominate both endpoints' core distances and their Euclidean distance.
    let mut rng = StdRng::seed_from_u64(99);
    let mut points: Vec<Point<2>> = (0..200)
        .map(|_| {
            Point::new([
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(-1.0f32..1.0),
            ])
        })
        .collect();
    points.extend((0..50).map(|_| {
        Point::new([
            rng.gen_range(-40.0f32..40.0),
            rng.gen_range(-40.0f32..40.0),
        ])
    }));

    let k = 5;
    let edges = minimum_spanning_tree(&points, k).expect("valid input must succeed");
    assert_spanning_tree(points.len(), &edges);

    let bvh = Bvh::build(&points);
    let core = core_distances(&bvh, &points, k);
    for edge in &edges {
        let a = edge.source() as usize;
        let b = edge.target() as usize;
        assert!(edge.weight() >= points[a].distance(&points[b]));
        assert!(edge.weight() >= core[a]);
        assert!(edge.weight() >= core[b]);
    }
}

#[test]
fn mutual_reachability_with_k_one_reduces_to_euclidean() {
    let points = uniform_cube(100, 3);
    let euclidean = minimum_spanning_tree(&points, 1).expect("valid input must succeed");

    let bvh = Bvh::build(&points);
    let core = core_distances(&bvh, &points, 1);
    assert!(core.iter().all(|&value| value == 0.0));

    let total = total_weight(&euclidean);
    let reference = prim_total_weight(&points);
    assert!((total - reference).abs() <= reference * 1e-5);
}
