//! Downstream-to-upstream traversal order ("the stack").
//!
//! The stack lists terminal nodes first and places every receiver before
//! all of its donors. Walking it in reverse therefore visits headwaters
//! first and outlets last, which is the order the accumulation pass needs.
//!
//! # Algorithm
//!
//! Each node starts with a count of pending receivers: its active edges to
//! other nodes. Terminal nodes (count zero) seed a LIFO work list in
//! ascending id order. Popping a node appends it to the stack and
//! decrements the count of each donor in its `D` block; a donor whose count
//! reaches zero is scheduled. Donors readied by the same node pop in
//! ascending id order.
//!
//! On single-receiver graphs this is exactly the recursive depth-first
//! stack of Braun & Willett (2013). On multi-receiver graphs a node is
//! emitted only after every one of its receivers, which keeps the stack
//! valid when flow splits and rejoins.
//!
//! Nodes on a cycle never see their count reach zero, so the build always
//! terminates. The shortfall is reported through
//! [`TraversalOrder::unvisited`].

use crate::donors::DonorTable;
use drainage_core::{Receivers, RoutingError};

/// The stack for one receiver graph, plus how many nodes it missed.
#[derive(Clone, Debug, Default)]
pub struct TraversalOrder {
    stack: Vec<usize>,
    node_count: usize,
    terminal_count: usize,
    // scratch
    pending: Vec<usize>,
    work: Vec<usize>,
}

impl TraversalOrder {
    /// Build the stack for `receivers` from its donor table.
    pub fn build(receivers: &Receivers<'_>, donors: &DonorTable) -> Self {
        let mut order = Self::default();
        order.rebuild(receivers, donors);
        order
    }

    /// Rebuild in place, reusing the existing allocations.
    ///
    /// # Panics
    ///
    /// Panics if `donors` was built from a graph with a different node count.
    pub fn rebuild(&mut self, receivers: &Receivers<'_>, donors: &DonorTable) {
        let n = receivers.node_count();
        assert_eq!(
            donors.node_count(),
            n,
            "donor table does not match receiver graph"
        );

        self.node_count = n;
        self.stack.clear();
        self.stack.reserve(n);
        self.pending.clear();
        self.pending.extend((0..n).map(|node| receivers.out_degree(node)));

        self.work.clear();
        self.work
            .extend((0..n).rev().filter(|&node| self.pending[node] == 0));
        self.terminal_count = self.work.len();

        while let Some(node) = self.work.pop() {
            self.stack.push(node);
            for &donor in donors.donors_of(node).iter().rev() {
                if donor == node {
                    continue;
                }
                self.pending[donor] -= 1;
                if self.pending[donor] == 0 {
                    self.work.push(donor);
                }
            }
        }
    }

    /// Nodes in downstream-to-upstream order.
    pub fn stack(&self) -> &[usize] {
        &self.stack
    }

    /// Nodes in upstream-to-downstream order, the accumulation order.
    pub fn upstream_first(&self) -> impl Iterator<Item = usize> + '_ {
        self.stack.iter().rev().copied()
    }

    /// Number of nodes in the receiver graph.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of terminal (self-receiving) nodes that seeded the stack.
    pub fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    /// Nodes that never made it into the stack. Zero for a valid graph.
    pub fn unvisited(&self) -> usize {
        self.node_count - self.stack.len()
    }

    /// Whether every node was placed.
    pub fn is_complete(&self) -> bool {
        self.unvisited() == 0
    }

    /// Take the stack, failing if any node was left out.
    ///
    /// # Errors
    ///
    /// [`RoutingError::IncompleteTraversal`] when the receiver graph has a
    /// cycle.
    pub fn complete(self) -> Result<Vec<usize>, RoutingError> {
        if self.is_complete() {
            Ok(self.stack)
        } else {
            Err(RoutingError::IncompleteTraversal {
                unvisited: self.unvisited(),
                node_count: self.node_count,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drainage_core::LinkId;

    fn order_for(r: &[usize]) -> TraversalOrder {
        let l = vec![LinkId::NONE; r.len()];
        let g = Receivers::to_one(r, &l).unwrap();
        TraversalOrder::build(&g, &DonorTable::build(&g))
    }

    #[test]
    fn braun_willett_stack() {
        let order = order_for(&[1, 4, 1, 6, 4, 4, 5, 4, 6, 7]);
        assert_eq!(order.stack(), &[4, 1, 0, 2, 5, 6, 3, 8, 7, 9]);
        assert_eq!(order.terminal_count(), 1);
        assert!(order.is_complete());
    }

    #[test]
    fn line_network_stack() {
        let order = order_for(&[1, 2, 3, 4, 4]);
        assert_eq!(order.stack(), &[4, 3, 2, 1, 0]);
        let upstream: Vec<usize> = order.upstream_first().collect();
        assert_eq!(upstream, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn terminals_seed_in_ascending_order() {
        // Two basins: 0 <- 2, 1 <- 3.
        let order = order_for(&[0, 1, 0, 1]);
        assert_eq!(order.stack(), &[0, 2, 1, 3]);
        assert_eq!(order.terminal_count(), 2);
    }

    #[test]
    fn two_cycle_is_reported_not_looped() {
        let order = order_for(&[1, 0]);
        assert_eq!(order.unvisited(), 2);
        assert_eq!(
            order.complete(),
            Err(RoutingError::IncompleteTraversal {
                unvisited: 2,
                node_count: 2
            })
        );
    }

    #[test]
    fn nodes_upstream_of_a_cycle_are_unvisited_too() {
        // 0 <-> 1 cycle, 2 drains into it, 3 is an independent outlet.
        let order = order_for(&[1, 0, 0, 3]);
        assert_eq!(order.stack(), &[3]);
        assert_eq!(order.unvisited(), 3);
    }

    #[test]
    fn to_many_waits_for_every_receiver() {
        // 0 -> {1, 2}, 1 -> 2, 2 terminal. Node 0 must follow both 1 and 2.
        let r = [1, 2, 2, 2, 2, 2];
        let p = [0.5, 0.5, 1.0, 0.0, 1.0, 0.0];
        let l = vec![LinkId::NONE; 6];
        let g = Receivers::to_many(&r, &p, &l, 2).unwrap();
        let order = TraversalOrder::build(&g, &DonorTable::build(&g));
        assert_eq!(order.stack(), &[2, 1, 0]);
    }

    #[test]
    fn to_many_duplicate_receiver_slots() {
        // Node 0 sends two slots to the same receiver.
        let r = [1, 1, 1, 1];
        let p = [0.4, 0.6, 1.0, 0.0];
        let l = vec![LinkId::NONE; 4];
        let g = Receivers::to_many(&r, &p, &l, 2).unwrap();
        let order = TraversalOrder::build(&g, &DonorTable::build(&g));
        assert_eq!(order.stack(), &[1, 0]);
    }

    #[test]
    fn rebuild_reuses_and_resets() {
        let l = vec![LinkId::NONE; 2];
        let cyc = Receivers::to_one(&[1, 0], &l).unwrap();
        let mut order = TraversalOrder::build(&cyc, &DonorTable::build(&cyc));
        assert!(!order.is_complete());

        let ok = Receivers::to_one(&[0, 0], &l).unwrap();
        order.rebuild(&ok, &DonorTable::build(&ok));
        assert_eq!(order.stack(), &[0, 1]);
        assert!(order.is_complete());
    }
}
