//! Per-component nearest-neighbour search: the hot kernel of the Borůvka
//! loop.
//!
//! Every leaf traverses the BVH with a manual stack looking for the closest
//! leaf outside its own component, pruned by a per-component radius that all
//! members relax concurrently. The pruning comparisons use `<=` rather than
//! `<`: equidistant candidates must stay in play so the deterministic
//! tie-break (not traversal order) decides between them, which is what keeps
//! the component-edge digraph free of cycles longer than two.
//!
//! Candidate selection is lock-free. Each leaf publishes its best edge to a
//! slot it owns, then folds a `(weight bits, leaf slot)` key into the
//! component's best-candidate word with a CAS loop that compares under the
//! full edge order (dereferencing the published slots on weight ties). The
//! surviving key therefore identifies exactly the minimum of all proposals.

use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering};

use rayon::prelude::*;

use crate::bvh::{Bvh, TRAVERSAL_STACK};
use crate::metric::Metric;

use super::edge::WeightedEdge;
use super::labels::UNLABELLED;

/// Best-candidate key of a component with no proposals yet.
const EMPTY_KEY: u64 = u64::MAX;

#[inline]
fn pack(weight: f32, low: u32) -> u64 {
    (u64::from(weight.to_bits()) << 32) | u64::from(low)
}

#[inline]
fn unpack_weight(key: u64) -> f32 {
    f32::from_bits((key >> 32) as u32)
}

#[inline]
fn unpack_low(key: u64) -> u32 {
    key as u32
}

/// Relaxes `radius` towards `value`.
///
/// Distances are non-negative, so their IEEE bit patterns order like the
/// values themselves and a plain integer `fetch_min` suffices. Racing
/// relaxations are harmless: the radius only shrinks, and any upper bound on
/// the component's shortest outgoing edge keeps the traversal admissible.
#[inline]
fn relax_radius(radius: &AtomicU32, value: f32) {
    radius.fetch_min(value.to_bits(), Ordering::Relaxed);
}

#[inline]
fn load_radius(radius: &AtomicU32) -> f32 {
    f32::from_bits(radius.load(Ordering::Relaxed))
}

/// Resets the per-round component state: radii to infinity, candidate keys
/// to empty.
pub(super) fn reset_component_state(radii: &[AtomicU32], best: &[AtomicU64]) {
    radii
        .par_iter()
        .for_each(|radius| radius.store(f32::INFINITY.to_bits(), Ordering::Relaxed));
    best.par_iter()
        .for_each(|key| key.store(EMPTY_KEY, Ordering::Relaxed));
}

/// Seeds every component's radius from Morton-adjacent leaf pairs.
///
/// Adjacent leaf slots are close in space, so the weight of an edge between
/// differently-labelled neighbours is usually a tight upper bound on both
/// components' shortest outgoing edges. Any metric value is admissible here
/// because the metric dominates the Euclidean box distance the traversal
/// prunes with.
pub(super) fn reset_shared_radii<const D: usize, M: Metric>(
    bvh: &Bvh<D>,
    metric: &M,
    labels: &[AtomicI32],
    radii: &[AtomicU32],
) {
    let n = bvh.len();
    let leaf_base = (n - 1) as i32;
    ((n - 1)..(2 * n - 2)).into_par_iter().for_each(|i| {
        let j = i + 1;
        let label_i = labels[i].load(Ordering::Relaxed);
        let label_j = labels[j].load(Ordering::Relaxed);
        if label_i == label_j {
            return;
        }
        let lower_bound = bvh.bounds(i as i32).distance(bvh.bounds(j as i32));
        let weight = metric.distance(
            bvh.leaf_point_index(i as i32),
            bvh.leaf_point_index(j as i32),
            lower_bound,
        );
        relax_radius(&radii[(label_i - leaf_base) as usize], weight);
        relax_radius(&radii[(label_j - leaf_base) as usize], weight);
    });
}

/// For every component, finds the shortest edge leaving it and records it in
/// `best`/`proposals`; [`collect_component_edges`] decodes the winners.
pub(super) fn find_component_nearest_neighbors<const D: usize, M: Metric>(
    bvh: &Bvh<D>,
    metric: &M,
    labels: &[AtomicI32],
    radii: &[AtomicU32],
    best: &[AtomicU64],
    proposals: &[AtomicU64],
) {
    let search = NearestNeighborSearch {
        bvh,
        metric,
        labels,
        radii,
        best,
        proposals,
    };
    let n = bvh.len();
    ((n - 1) as i32..(2 * n - 1) as i32)
        .into_par_iter()
        .for_each(|leaf| search.find_for_leaf(leaf));
}

/// Shared state of one nearest-neighbour sweep.
struct NearestNeighborSearch<'a, const D: usize, M> {
    bvh: &'a Bvh<D>,
    metric: &'a M,
    labels: &'a [AtomicI32],
    radii: &'a [AtomicU32],
    best: &'a [AtomicU64],
    proposals: &'a [AtomicU64],
}

impl<const D: usize, M: Metric> NearestNeighborSearch<'_, D, M> {
    /// Finds the shortest outgoing edge rooted at `leaf` and folds it into
    /// the leaf's component candidate.
    fn find_for_leaf(&self, leaf: i32) {
        let bvh = self.bvh;
        let leaf_base = bvh.leaf_base();
        let component = self.labels[leaf as usize].load(Ordering::Relaxed);
        let radius = &self.radii[(component - leaf_base) as usize];
        let query_bounds = bvh.bounds(leaf);
        let query_point = bvh.leaf_point_index(leaf);

        let mut current_best = WeightedEdge::new(leaf, UNLABELLED, f32::INFINITY);

        let mut visit = |candidate: i32, lower_bound: f32| {
            let weight =
                self.metric
                    .distance(query_point, bvh.leaf_point_index(candidate), lower_bound);
            debug_assert!(
                weight >= lower_bound,
                "metric must dominate the Euclidean distance"
            );
            let candidate_edge = WeightedEdge::new(leaf, candidate, weight);
            if candidate_edge < current_best {
                current_best = candidate_edge;
                relax_radius(radius, weight);
            }
        };

        let mut stack = [0i32; TRAVERSAL_STACK];
        let mut stack_distance = [0.0f32; TRAVERSAL_STACK];
        let mut depth = 0usize;

        let mut node = bvh.root();
        let mut node_distance = 0.0f32;

        loop {
            let mut traverse_left = false;
            let mut traverse_right = false;
            let mut left = UNLABELLED;
            let mut right = UNLABELLED;
            let mut distance_left = f32::INFINITY;
            let mut distance_right = f32::INFINITY;

            if node_distance <= load_radius(radius) {
                left = bvh.left_child(node);
                right = bvh.right_child(node);
                distance_left = query_bounds.distance(bvh.bounds(left));
                distance_right = query_bounds.distance(bvh.bounds(right));

                if self.labels[left as usize].load(Ordering::Relaxed) != component
                    && distance_left <= load_radius(radius)
                {
                    if bvh.is_leaf(left) {
                        visit(left, distance_left);
                    } else {
                        traverse_left = true;
                    }
                }

                // The left visit may have shrunk the radius already.
                if self.labels[right as usize].load(Ordering::Relaxed) != component
                    && distance_right <= load_radius(radius)
                {
                    if bvh.is_leaf(right) {
                        visit(right, distance_right);
                    } else {
                        traverse_right = true;
                    }
                }
            }

            if !traverse_left && !traverse_right {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                node = stack[depth];
                node_distance = stack_distance[depth];
            } else {
                // Descend into the closer child and defer the other.
                let descend_left =
                    traverse_left && (distance_left <= distance_right || !traverse_right);
                node = if descend_left { left } else { right };
                node_distance = if descend_left {
                    distance_left
                } else {
                    distance_right
                };
                if traverse_left && traverse_right {
                    assert!(depth < TRAVERSAL_STACK, "BVH deeper than traversal stack");
                    stack[depth] = if descend_left { right } else { left };
                    stack_distance[depth] = if descend_left {
                        distance_right
                    } else {
                        distance_left
                    };
                    depth += 1;
                }
            }
        }

        if current_best.target != UNLABELLED {
            propose(
                self.best,
                self.proposals,
                leaf_base,
                component,
                leaf,
                &current_best,
            );
        }
    }
}

/// Folds `edge` into its component's best-candidate word.
fn propose(
    best: &[AtomicU64],
    proposals: &[AtomicU64],
    leaf_base: i32,
    component: i32,
    leaf: i32,
    edge: &WeightedEdge,
) {
    let leaf_slot = (leaf - leaf_base) as u32;
    // Publish before proposing: a reader that acquires our key must be able
    // to decode the full edge behind it.
    proposals[leaf_slot as usize].store(pack(edge.weight, edge.target as u32), Ordering::Release);

    let key = &best[(component - leaf_base) as usize];
    let mine = pack(edge.weight, leaf_slot);
    let mut incumbent = key.load(Ordering::Acquire);
    while improves(incumbent, edge, leaf_base, proposals) {
        match key.compare_exchange_weak(incumbent, mine, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return,
            Err(observed) => incumbent = observed,
        }
    }
}

/// Would replacing the `incumbent` key with `edge` shrink the component's
/// candidate under the edge order?
fn improves(incumbent: u64, edge: &WeightedEdge, leaf_base: i32, proposals: &[AtomicU64]) -> bool {
    if incumbent == EMPTY_KEY {
        return true;
    }
    let incumbent_weight = unpack_weight(incumbent);
    match edge.weight.total_cmp(&incumbent_weight) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => {
            let slot = unpack_low(incumbent);
            let entry = proposals[slot as usize].load(Ordering::Acquire);
            let incumbent_edge = WeightedEdge::new(
                leaf_base + slot as i32,
                unpack_low(entry) as i32,
                incumbent_weight,
            );
            *edge < incumbent_edge
        }
    }
}

/// Decodes every component's winning proposal into an edge array; components
/// without a proposal (only possible when one component remains) decode to
/// the unset edge.
pub(super) fn collect_component_edges(
    n: usize,
    best: &[AtomicU64],
    proposals: &[AtomicU64],
) -> Vec<WeightedEdge> {
    let leaf_base = (n - 1) as i32;
    (0..n)
        .into_par_iter()
        .map(|slot| {
            let key = best[slot].load(Ordering::Acquire);
            if key == EMPTY_KEY {
                return WeightedEdge::new(UNLABELLED, UNLABELLED, f32::INFINITY);
            }
            let winner = unpack_low(key);
            let entry = proposals[winner as usize].load(Ordering::Acquire);
            WeightedEdge::new(
                leaf_base + winner as i32,
                unpack_low(entry) as i32,
                unpack_weight(key),
            )
        })
        .collect()
}
