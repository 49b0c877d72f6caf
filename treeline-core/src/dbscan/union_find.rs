//! Lock-free union-find over point indices.
//!
//! `parents[i]` starts as `i`; unions hook the larger root beneath the
//! smaller via CAS, so parent chains between core points strictly decrease
//! and the representative of a settled component is its minimum member.
//! Non-core points are attached exactly once and never acquire children,
//! which keeps the structure a forest even though their parent link may point
//! upwards in index order.

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

pub(super) struct AtomicUnionFind {
    parents: Vec<AtomicU32>,
}

impl AtomicUnionFind {
    pub(super) fn new(count: usize) -> Self {
        Self {
            parents: (0..count as u32).map(AtomicU32::new).collect(),
        }
    }

    /// Follows parent links to the current root, halving paths on the way.
    ///
    /// The halving store races with concurrent unions, but it only ever
    /// replaces a parent with a current ancestor, which preserves the forest.
    pub(super) fn find(&self, node: u32) -> u32 {
        let mut current = node;
        loop {
            let parent = self.parents[current as usize].load(Ordering::Acquire);
            if parent == current {
                return current;
            }
            let grandparent = self.parents[parent as usize].load(Ordering::Acquire);
            if grandparent != parent {
                self.parents[current as usize].store(grandparent, Ordering::Release);
            }
            current = parent;
        }
    }

    /// Merges the components of `left` and `right`.
    pub(super) fn union(&self, left: u32, right: u32) {
        let mut left = left;
        let mut right = right;
        loop {
            let left_root = self.find(left);
            let right_root = self.find(right);
            if left_root == right_root {
                return;
            }
            let (child, parent) = if left_root > right_root {
                (left_root, right_root)
            } else {
                (right_root, left_root)
            };
            if self.parents[child as usize]
                .compare_exchange(child, parent, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
            // Lost the race for this root; retry from the contended pair.
            left = child;
            right = parent;
        }
    }

    /// Attaches `node` to `into`'s component, but only while `node` is still
    /// its own parent. Later attempts are no-ops, so a point joins at most
    /// one component it is not a core member of.
    pub(super) fn attach_once(&self, node: u32, into: u32) {
        let root = self.find(into);
        let _ = self.parents[node as usize].compare_exchange(
            node,
            root,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Collapses every parent link to its representative and returns the
    /// final assignment.
    pub(super) fn into_representatives(self) -> Vec<u32> {
        (0..self.parents.len() as u32)
            .into_par_iter()
            .map(|node| self.find(node))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rayon::prelude::*;

    use super::*;

    #[test]
    fn singletons_are_their_own_representatives() {
        let union_find = AtomicUnionFind::new(4);
        assert_eq!(union_find.into_representatives(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn unions_resolve_to_the_minimum_member() {
        let union_find = AtomicUnionFind::new(6);
        union_find.union(4, 5);
        union_find.union(3, 4);
        union_find.union(1, 5);

        let reps = union_find.into_representatives();
        assert_eq!(reps, vec![0, 1, 2, 1, 1, 1]);
    }

    #[test]
    fn attach_once_ignores_later_attachments() {
        let union_find = AtomicUnionFind::new(4);
        union_find.attach_once(3, 1);
        union_find.attach_once(3, 2);

        let reps = union_find.into_representatives();
        assert_eq!(reps[3], 1);
        assert_eq!(reps[2], 2);
    }

    #[test]
    fn concurrent_unions_converge_to_one_component() {
        let n = 512u32;
        let union_find = AtomicUnionFind::new(n as usize);
        (1..n).into_par_iter().for_each(|i| {
            union_find.union(i - 1, i);
        });

        let reps = union_find.into_representatives();
        assert!(reps.iter().all(|&root| root == 0));
    }
}
