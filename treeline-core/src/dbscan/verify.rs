//! Brute-force verification of a clustering against the eps-neighbour graph.
//!
//! Valid for the `core_min_size == 1` configuration, where clusters are
//! exactly the connected components of the neighbour graph.

use crate::point::Point;

/// Checks that (a) every pair of eps-neighbours shares a representative and
/// (b) the number of distinct representatives equals the number of connected
/// components of the neighbour graph.
pub(super) fn verify_connected_components<const D: usize>(
    points: &[Point<D>],
    eps: f32,
    representatives: &[u32],
) -> bool {
    let n = points.len();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if points[i].distance(&points[j]) <= eps {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }

    for (i, neighbours) in adjacency.iter().enumerate() {
        if neighbours
            .iter()
            .any(|&j| representatives[i] != representatives[j])
        {
            return false;
        }
    }

    let mut distinct: Vec<u32> = representatives.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let mut component_count = 0usize;
    let mut seen = vec![false; n];
    let mut stack = Vec::new();
    for start in 0..n {
        if seen[start] {
            continue;
        }
        component_count += 1;
        stack.push(start);
        while let Some(node) = stack.pop() {
            if seen[node] {
                continue;
            }
            seen[node] = true;
            stack.extend(adjacency[node].iter().copied());
        }
    }

    distinct.len() == component_count
}
