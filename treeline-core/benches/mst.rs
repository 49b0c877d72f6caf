//! Borůvka minimum spanning tree benchmarks.
//!
//! Measures the full MST entry point, BVH construction included, on
//! synthetic uniform clouds of increasing size.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use treeline_core::{minimum_spanning_tree, Point};

/// Seed used for all synthetic data generation in this benchmark.
const SEED: u64 = 42;

/// Dataset sizes to benchmark.
const POINT_COUNTS: &[usize] = &[1_000, 10_000, 50_000];

/// Neighbour counts: Euclidean and a typical mutual-reachability setting.
const NEIGHBOUR_COUNTS: &[usize] = &[1, 5];

fn uniform_cloud(count: usize) -> Vec<Point<3>> {
    let mut rng = StdRng::seed_from_u64(SEED);
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

fn mst_boruvka(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimum_spanning_tree");
    group.sample_size(20);

    for &point_count in POINT_COUNTS {
        let points = uniform_cloud(point_count);
        for &k in NEIGHBOUR_COUNTS {
            group.bench_with_input(
                BenchmarkId::new(format!("k{k}"), point_count),
                &points,
                |b, points| {
                    b.iter(|| {
                        minimum_spanning_tree(points, k).expect("benchmark input is valid")
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, mst_boruvka);
criterion_main!(benches);
