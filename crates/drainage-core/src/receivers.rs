//! Borrowed views over a flow-direction collaborator's receiver arrays.
//!
//! A [`Receivers`] value ties together the receiver ids, optional
//! proportions, and link ids for every node, in either single-receiver
//! ([`RoutingMode::ToOne`]) or row-major multi-receiver
//! ([`RoutingMode::ToMany`]) layout. Everything downstream (donor tables,
//! traversal order, the accumulation pass) reads the graph only through
//! [`Receivers::active_edges`], so both layouts share one implementation.
//!
//! # Terminal nodes
//!
//! A node that routes to itself is terminal: an outlet or an unresolved
//! local low. In multi-receiver mode a node is terminal when none of its
//! slots with a positive proportion points at another node.

use crate::error::RoutingError;
use crate::id::LinkId;
use smallvec::SmallVec;

/// Active outgoing edges of one node.
///
/// Inline capacity of 8 covers D8 and hexagonal multi-flow routing without
/// heap allocation.
pub type EdgeList = SmallVec<[Edge; 8]>;

/// Shape of the receiver relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutingMode {
    /// Exactly one receiver per node (D4/D8 steepest descent).
    ToOne,
    /// Up to `max_receivers` receivers per node, each with a proportion.
    ToMany {
        /// Receiver slots per node (the row width of the arrays).
        max_receivers: usize,
    },
}

impl RoutingMode {
    /// Receiver slots per node.
    pub fn row_width(self) -> usize {
        match self {
            Self::ToOne => 1,
            Self::ToMany { max_receivers } => max_receivers,
        }
    }
}

/// One outgoing transfer from a donor node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// Receiving node.
    pub receiver: usize,
    /// Fraction of the donor's flux sent along this edge.
    pub proportion: f64,
    /// Link the transfer travels along.
    pub link: LinkId,
}

impl Edge {
    /// Whether this edge points back at its donor.
    pub fn is_self_loop(&self, donor: usize) -> bool {
        self.receiver == donor
    }
}

/// Borrowed receiver graph in single- or multi-receiver layout.
#[derive(Clone, Copy, Debug)]
pub struct Receivers<'a> {
    receiver: &'a [usize],
    proportion: Option<&'a [f64]>,
    link: &'a [LinkId],
    mode: RoutingMode,
}

impl<'a> Receivers<'a> {
    /// Single-receiver graph: `receiver[i]` is the node `i` drains to,
    /// `link[i]` the link it drains along.
    ///
    /// # Errors
    ///
    /// [`RoutingError::ShapeMismatch`] if `link` is not the same length as
    /// `receiver`.
    pub fn to_one(receiver: &'a [usize], link: &'a [LinkId]) -> Result<Self, RoutingError> {
        if link.len() != receiver.len() {
            return Err(RoutingError::ShapeMismatch {
                array: "link",
                expected: receiver.len(),
                actual: link.len(),
            });
        }
        Ok(Self {
            receiver,
            proportion: None,
            link,
            mode: RoutingMode::ToOne,
        })
    }

    /// Multi-receiver graph stored row-major with `max_receivers` slots per
    /// node. Unused slots carry proportion 0.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::ZeroReceiverCapacity`] if `max_receivers == 0`
    /// - [`RoutingError::RaggedRows`] if `receiver` is not a whole number of rows
    /// - [`RoutingError::ShapeMismatch`] if `proportion` or `link` differ in
    ///   length from `receiver`
    pub fn to_many(
        receiver: &'a [usize],
        proportion: &'a [f64],
        link: &'a [LinkId],
        max_receivers: usize,
    ) -> Result<Self, RoutingError> {
        if max_receivers == 0 {
            return Err(RoutingError::ZeroReceiverCapacity);
        }
        if receiver.len() % max_receivers != 0 {
            return Err(RoutingError::RaggedRows {
                array: "receiver",
                len: receiver.len(),
                row_width: max_receivers,
            });
        }
        if proportion.len() != receiver.len() {
            return Err(RoutingError::ShapeMismatch {
                array: "proportion",
                expected: receiver.len(),
                actual: proportion.len(),
            });
        }
        if link.len() != receiver.len() {
            return Err(RoutingError::ShapeMismatch {
                array: "link",
                expected: receiver.len(),
                actual: link.len(),
            });
        }
        Ok(Self {
            receiver,
            proportion: Some(proportion),
            link,
            mode: RoutingMode::ToMany { max_receivers },
        })
    }

    /// Layout of this graph.
    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    /// Number of nodes `N`.
    pub fn node_count(&self) -> usize {
        self.receiver.len() / self.mode.row_width()
    }

    /// Check receiver ranges and proportions.
    ///
    /// Every slot (padding included) must name a node in `[0, N)`.
    /// Proportions must be finite and non-negative. A row may exceed a sum
    /// of 1 by at most `tolerance`, and a row that sends flux to another
    /// node must sum to 1 within `tolerance`.
    pub fn validate(&self, tolerance: f64) -> Result<(), RoutingError> {
        let n = self.node_count();
        let k = self.mode.row_width();
        for node in 0..n {
            let mut sum = 0.0;
            let mut drains = false;
            for slot in 0..k {
                let idx = node * k + slot;
                let receiver = self.receiver[idx];
                if receiver >= n {
                    return Err(RoutingError::ReceiverOutOfRange {
                        node,
                        slot,
                        receiver,
                        node_count: n,
                    });
                }
                if let Some(p) = self.proportion {
                    let value = p[idx];
                    if !value.is_finite() || value < 0.0 {
                        return Err(RoutingError::InvalidProportion { node, slot, value });
                    }
                    sum += value;
                    drains |= value > 0.0 && receiver != node;
                }
            }
            if sum > 1.0 + tolerance {
                return Err(RoutingError::ProportionSumExceeded { node, sum });
            }
            if drains && sum < 1.0 - tolerance {
                return Err(RoutingError::ProportionSumDeficit { node, sum });
            }
        }
        Ok(())
    }

    /// Slots of `node` that carry flux, self-loops included, in slot order.
    ///
    /// In single-receiver mode this is always exactly one edge with
    /// proportion 1.0.
    pub fn active_edges(&self, node: usize) -> EdgeList {
        let k = self.mode.row_width();
        let mut edges = EdgeList::new();
        for slot in 0..k {
            let idx = node * k + slot;
            let proportion = match self.proportion {
                Some(p) => p[idx],
                None => 1.0,
            };
            if proportion > 0.0 {
                edges.push(Edge {
                    receiver: self.receiver[idx],
                    proportion,
                    link: self.link[idx],
                });
            }
        }
        edges
    }

    /// Number of active edges from `node` to other nodes.
    pub fn out_degree(&self, node: usize) -> usize {
        self.active_edges(node)
            .iter()
            .filter(|e| !e.is_self_loop(node))
            .count()
    }

    /// Whether `node` has nowhere else to send flux.
    pub fn is_terminal(&self, node: usize) -> bool {
        self.out_degree(node) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_links(n: usize) -> Vec<LinkId> {
        vec![LinkId::NONE; n]
    }

    #[test]
    fn to_one_counts_nodes_and_terminals() {
        let r = [1, 2, 3, 4, 4];
        let l = no_links(5);
        let g = Receivers::to_one(&r, &l).unwrap();
        assert_eq!(g.mode(), RoutingMode::ToOne);
        assert_eq!(g.node_count(), 5);
        assert!(g.is_terminal(4));
        assert!(!g.is_terminal(0));
        let e = g.active_edges(2);
        assert_eq!(e.len(), 1);
        assert_eq!(e[0].receiver, 3);
        assert_eq!(e[0].proportion, 1.0);
    }

    #[test]
    fn to_one_rejects_short_link_array() {
        let r = [0, 0, 1];
        let l = no_links(2);
        let err = Receivers::to_one(&r, &l).unwrap_err();
        assert_eq!(
            err,
            RoutingError::ShapeMismatch {
                array: "link",
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn to_many_skips_zero_proportion_slots() {
        // node 0 splits to 1 and 2; nodes 1, 2 route to themselves.
        let r = [1, 2, 1, 1, 2, 2];
        let p = [0.5, 0.5, 1.0, 0.0, 1.0, 0.0];
        let l = [LinkId(0), LinkId(1), LinkId::NONE, LinkId::NONE, LinkId::NONE, LinkId::NONE];
        let g = Receivers::to_many(&r, &p, &l, 2).unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.active_edges(0).len(), 2);
        assert_eq!(g.active_edges(1).len(), 1);
        assert!(g.is_terminal(1));
        assert!(g.is_terminal(2));
        assert_eq!(g.out_degree(0), 2);
        assert_eq!(g.active_edges(0)[1].link, LinkId(1));
    }

    #[test]
    fn to_many_rejects_bad_shapes() {
        let l = no_links(3);
        assert_eq!(
            Receivers::to_many(&[0, 0, 0], &[1.0, 0.0, 0.0], &l, 0).unwrap_err(),
            RoutingError::ZeroReceiverCapacity
        );
        assert!(matches!(
            Receivers::to_many(&[0, 0, 0], &[1.0, 0.0, 0.0], &l, 2),
            Err(RoutingError::RaggedRows { len: 3, row_width: 2, .. })
        ));
        assert!(matches!(
            Receivers::to_many(&[0, 0], &[1.0], &l[..2], 2),
            Err(RoutingError::ShapeMismatch { array: "proportion", .. })
        ));
    }

    #[test]
    fn validate_flags_out_of_range_receiver() {
        let r = [1, 5];
        let l = no_links(2);
        let g = Receivers::to_one(&r, &l).unwrap();
        assert_eq!(
            g.validate(1e-6).unwrap_err(),
            RoutingError::ReceiverOutOfRange {
                node: 1,
                slot: 0,
                receiver: 5,
                node_count: 2
            }
        );
    }

    #[test]
    fn validate_flags_bad_proportions() {
        let r = [1, 1, 1, 1];
        let l = no_links(4);
        let neg = [1.2, -0.2, 1.0, 0.0];
        let g = Receivers::to_many(&r, &neg, &l, 2).unwrap();
        assert!(matches!(
            g.validate(1e-6),
            Err(RoutingError::InvalidProportion { node: 0, slot: 1, .. })
        ));

        let over = [0.7, 0.7, 1.0, 0.0];
        let g = Receivers::to_many(&r, &over, &l, 2).unwrap();
        assert!(matches!(
            g.validate(1e-6),
            Err(RoutingError::ProportionSumExceeded { node: 0, .. })
        ));
    }

    #[test]
    fn validate_flags_rows_that_route_too_little() {
        // Node 0 sends half its flux to 1; the other half has nowhere to go.
        let r = [1, 0, 1, 1];
        let l = no_links(4);
        let short = [0.5, 0.0, 1.0, 0.0];
        let g = Receivers::to_many(&r, &short, &l, 2).unwrap();
        assert_eq!(
            g.validate(1e-6).unwrap_err(),
            RoutingError::ProportionSumDeficit { node: 0, sum: 0.5 }
        );

        // Within tolerance is fine.
        let near = [1.0 - 1e-9, 0.0, 1.0, 0.0];
        let g = Receivers::to_many(&r, &near, &l, 2).unwrap();
        assert!(g.validate(1e-6).is_ok());
    }

    #[test]
    fn terminal_rows_may_sum_to_zero() {
        // Node 1 has no active slot at all; node 0 drains to it.
        let r = [1, 1, 1, 1];
        let p = [1.0, 0.0, 0.0, 0.0];
        let l = no_links(4);
        let g = Receivers::to_many(&r, &p, &l, 2).unwrap();
        assert!(g.is_terminal(1));
        assert!(g.validate(1e-6).is_ok());
    }

    #[test]
    fn partial_self_share_is_not_terminal() {
        let r = [0, 1, 1, 1];
        let p = [0.25, 0.75, 1.0, 0.0];
        let l = no_links(4);
        let g = Receivers::to_many(&r, &p, &l, 2).unwrap();
        assert!(!g.is_terminal(0));
        assert_eq!(g.active_edges(0).len(), 2);
        assert_eq!(g.out_degree(0), 1);
    }

    proptest! {
        #[test]
        fn to_one_always_has_one_edge(raw in proptest::collection::vec(0usize..20, 1..20)) {
            let n = raw.len();
            let r: Vec<usize> = raw.iter().map(|v| v % n).collect();
            let l = no_links(n);
            let g = Receivers::to_one(&r, &l).unwrap();
            prop_assert!(g.validate(0.0).is_ok());
            for node in 0..n {
                prop_assert_eq!(g.active_edges(node).len(), 1);
                prop_assert_eq!(g.is_terminal(node), r[node] == node);
            }
        }
    }
}
