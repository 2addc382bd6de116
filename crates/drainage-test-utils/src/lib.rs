//! Test utilities and network fixtures for drainage development.
//!
//! Stands in for the flow-direction collaborator in tests and benchmarks:
//! [`Network`] owns the receiver, proportion, link, and cell-area arrays
//! that a mesh and flow director would normally supply, and the
//! [`fixtures`] module builds small hand-checked networks, raster
//! steepest-descent and multi-flow networks, and seeded random trees.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use drainage_core::{LinkId, Receivers};

/// Owned receiver graph plus the per-node geometry the engine consumes.
#[derive(Clone, Debug)]
pub struct Network {
    pub receiver: Vec<usize>,
    /// `None` for single-receiver networks.
    pub proportion: Option<Vec<f64>>,
    pub link: Vec<LinkId>,
    /// Receiver slots per node (1 for single-receiver networks).
    pub max_receivers: usize,
    pub cell_area: Vec<f64>,
    /// Length of each link, indexed by `LinkId.0`. Empty when the fixture
    /// has no geometry.
    pub link_length: Vec<f64>,
}

impl Network {
    /// Single-receiver network with unit cell areas and no links.
    pub fn to_one(receiver: Vec<usize>) -> Self {
        let n = receiver.len();
        Self {
            receiver,
            proportion: None,
            link: vec![LinkId::NONE; n],
            max_receivers: 1,
            cell_area: vec![1.0; n],
            link_length: Vec::new(),
        }
    }

    /// Multi-receiver network with unit cell areas and no links.
    pub fn to_many(receiver: Vec<usize>, proportion: Vec<f64>, max_receivers: usize) -> Self {
        let slots = receiver.len();
        let n = slots / max_receivers;
        Self {
            receiver,
            proportion: Some(proportion),
            link: vec![LinkId::NONE; slots],
            max_receivers,
            cell_area: vec![1.0; n],
            link_length: Vec::new(),
        }
    }

    /// Replace the cell areas.
    pub fn with_cell_area(mut self, cell_area: Vec<f64>) -> Self {
        self.cell_area = cell_area;
        self
    }

    /// Borrow as a [`Receivers`] view.
    ///
    /// # Panics
    ///
    /// Panics if the fixture arrays are inconsistent; fixtures are built
    /// consistent, so this indicates a bug in the fixture itself.
    pub fn receivers(&self) -> Receivers<'_> {
        match &self.proportion {
            None => Receivers::to_one(&self.receiver, &self.link).expect("fixture shape"),
            Some(p) => Receivers::to_many(&self.receiver, p, &self.link, self.max_receivers)
                .expect("fixture shape"),
        }
    }

    pub fn node_count(&self) -> usize {
        self.receiver.len() / self.max_receivers
    }
}

/// Assert that `stack` is a permutation of the graph's nodes with every
/// receiver placed before each of its donors.
pub fn assert_valid_stack(stack: &[usize], receivers: &Receivers<'_>) {
    let n = receivers.node_count();
    assert_eq!(stack.len(), n, "stack length");
    let mut position = vec![usize::MAX; n];
    for (i, &node) in stack.iter().enumerate() {
        assert_eq!(position[node], usize::MAX, "node {node} appears twice");
        position[node] = i;
    }
    for donor in 0..n {
        for edge in receivers.active_edges(donor) {
            if edge.is_self_loop(donor) {
                continue;
            }
            assert!(
                position[edge.receiver] < position[donor],
                "receiver {} placed after donor {donor}",
                edge.receiver
            );
        }
    }
}
