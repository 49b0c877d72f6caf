//! Component merging and edge emission.
//!
//! Each round's chosen edges form a functional graph on components: every
//! component points at the component its best edge lands in. The edge order
//! guarantees the only cycles are mutual choices, broken at the lesser
//! endpoint; walking the remaining chains to their fixed point yields every
//! component's post-merge representative.

use std::sync::atomic::{AtomicI32, Ordering};

use rayon::prelude::*;

use super::edge::WeightedEdge;

/// Rewrites every leaf's label to its post-merge component and returns the
/// edges committed this round, one per merged component.
///
/// Only the thread whose leaf *is* its component's representative may emit,
/// and only when that representative dissolves into another component, so
/// each merge produces exactly one edge even on mutual choices.
pub(super) fn update_components_and_edges(
    n: usize,
    labels: &[AtomicI32],
    out_edges: &[WeightedEdge],
) -> Vec<WeightedEdge> {
    ((n - 1) as i32..(2 * n - 1) as i32)
        .into_par_iter()
        .filter_map(|leaf| {
            let component = labels[leaf as usize].load(Ordering::Relaxed);
            let final_component = compute_final_component(n, labels, out_edges, component);
            labels[leaf as usize].store(final_component, Ordering::Relaxed);

            if leaf != component || component == final_component {
                return None;
            }
            Some(out_edges[(component as usize) - (n - 1)])
        })
        .collect()
}

/// One step of the component walk.
///
/// Concurrent label rewrites may already have replaced a target's label with
/// its final component; that only shortens the walk, since final components
/// are fixed points of this function.
fn compute_next_component(
    n: usize,
    labels: &[AtomicI32],
    out_edges: &[WeightedEdge],
    component: i32,
) -> i32 {
    let slot = |c: i32| (c as usize) - (n - 1);
    let next = labels[out_edges[slot(component)].target as usize].load(Ordering::Relaxed);
    let next_next = labels[out_edges[slot(next)].target as usize].load(Ordering::Relaxed);
    if next_next != component {
        // Unidirectional edge: follow it.
        next
    } else {
        // Mutual choice: both components picked the same edge, so break the
        // 2-cycle at the lesser endpoint.
        component.min(next)
    }
}

fn compute_final_component(
    n: usize,
    labels: &[AtomicI32],
    out_edges: &[WeightedEdge],
    component: i32,
) -> i32 {
    let mut current = component;
    loop {
        let next = compute_next_component(n, labels, out_edges, current);
        if next == current {
            return next;
        }
        current = next;
    }
}
