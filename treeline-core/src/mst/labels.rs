//! Component labels over the BVH node array.
//!
//! Leaves always hold their component id (the leaf index of the component's
//! representative). Internal nodes cache the common label of their subtree
//! when it is monochromatic, or [`UNLABELLED`] otherwise; the traversal uses
//! that cache to skip whole same-component subtrees.

use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use rayon::prelude::*;

use crate::bvh::Bvh;

/// Label of internal nodes whose subtree spans more than one component.
pub(super) const UNLABELLED: i32 = -1;

/// Builds the parent table: `parents[node]` is the internal node whose child
/// `node` is, and the root's parent is `-1`.
pub(super) fn find_parents<const D: usize>(bvh: &Bvh<D>) -> Vec<i32> {
    let n = bvh.len();
    let mut parents = vec![-1i32; 2 * n - 1];
    for node in 0..(n - 1) as i32 {
        parents[bvh.left_child(node) as usize] = node;
        parents[bvh.right_child(node) as usize] = node;
    }
    parents
}

/// Recomputes every internal node's label from the current leaf labels.
///
/// Bottom-up propagation: each leaf climbs towards the root, and at every
/// internal node the first arriving thread retires while the second -- whose
/// counter increment acquires the sibling subtree's label stores -- resolves
/// the node and continues. Each internal node is therefore written exactly
/// once per round, after both children are final.
pub(super) fn reduce_labels<const D: usize>(
    bvh: &Bvh<D>,
    parents: &[i32],
    labels: &[AtomicI32],
    visits: &[AtomicU32],
) {
    visits
        .par_iter()
        .for_each(|counter| counter.store(0, Ordering::Relaxed));

    let n = bvh.len();
    ((n - 1)..(2 * n - 1)).into_par_iter().for_each(|leaf| {
        let mut node = parents[leaf];
        while node >= 0 {
            if visits[node as usize].fetch_add(1, Ordering::AcqRel) == 0 {
                return;
            }
            let left = labels[bvh.left_child(node) as usize].load(Ordering::Acquire);
            let right = labels[bvh.right_child(node) as usize].load(Ordering::Acquire);
            let label = if left == right { left } else { UNLABELLED };
            labels[node as usize].store(label, Ordering::Release);
            node = parents[node as usize];
        }
    });
}
