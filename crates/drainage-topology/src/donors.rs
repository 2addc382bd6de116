//! The `delta`/`D` donor adjacency.
//!
//! Inverts a receiver relation into a packed adjacency list keyed by
//! receiver, after Braun & Willett (2013):
//!
//! ```text
//! nd[i]       number of active edges arriving at node i
//! delta[0]    0
//! delta[i+1]  delta[i] + nd[i]
//! D[delta[i]..delta[i+1]]  donors of node i, ascending by (donor, slot)
//! ```
//!
//! Self-loops count as edges, so in single-receiver mode every node donates
//! exactly once and `D` has length `N`. In multi-receiver mode only slots
//! with a positive proportion count.

use drainage_core::Receivers;

/// Number of active edges arriving at each node.
pub fn number_of_donors(receivers: &Receivers<'_>) -> Vec<usize> {
    let mut nd = Vec::new();
    count_donors(receivers, &mut nd);
    nd
}

fn count_donors(receivers: &Receivers<'_>, nd: &mut Vec<usize>) {
    let n = receivers.node_count();
    nd.clear();
    nd.resize(n, 0);
    for node in 0..n {
        for edge in receivers.active_edges(node) {
            nd[edge.receiver] += 1;
        }
    }
}

/// Exclusive prefix sum of donor counts, with the total appended.
///
/// The result has `counts.len() + 1` entries and is non-decreasing.
pub fn delta_from_counts(counts: &[usize]) -> Vec<usize> {
    let mut delta = Vec::with_capacity(counts.len() + 1);
    prefix_sum(counts, &mut delta);
    delta
}

fn prefix_sum(counts: &[usize], delta: &mut Vec<usize>) {
    delta.clear();
    let mut total = 0usize;
    delta.push(total);
    for &c in counts {
        total += c;
        delta.push(total);
    }
}

/// Scatter donors into their receivers' blocks.
///
/// Donors are visited in ascending id order and slots in ascending order,
/// so each block is sorted stably.
///
/// # Panics
///
/// Panics if `delta` was not built from the same receiver graph.
pub fn donor_array(receivers: &Receivers<'_>, delta: &[usize]) -> Vec<usize> {
    let mut donors = Vec::new();
    let mut cursor = Vec::new();
    scatter_donors(receivers, delta, &mut cursor, &mut donors);
    donors
}

fn scatter_donors(
    receivers: &Receivers<'_>,
    delta: &[usize],
    cursor: &mut Vec<usize>,
    donors: &mut Vec<usize>,
) {
    let n = receivers.node_count();
    assert_eq!(delta.len(), n + 1, "delta does not match receiver graph");
    cursor.clear();
    cursor.extend_from_slice(&delta[..n]);
    donors.clear();
    donors.resize(delta[n], 0);
    for node in 0..n {
        for edge in receivers.active_edges(node) {
            donors[cursor[edge.receiver]] = node;
            cursor[edge.receiver] += 1;
        }
    }
}

/// Packed donor adjacency for one receiver graph.
#[derive(Clone, Debug, Default)]
pub struct DonorTable {
    delta: Vec<usize>,
    donors: Vec<usize>,
    cursor: Vec<usize>,
}

impl DonorTable {
    /// Build the table for `receivers`. O(N·K) time.
    pub fn build(receivers: &Receivers<'_>) -> Self {
        let mut table = Self::default();
        table.rebuild(receivers);
        table
    }

    /// Rebuild in place, reusing the existing allocations.
    ///
    /// The donor counts are staged in the scatter cursor, so a rebuild for
    /// a graph no larger than the last one allocates nothing.
    pub fn rebuild(&mut self, receivers: &Receivers<'_>) {
        count_donors(receivers, &mut self.cursor);
        prefix_sum(&self.cursor, &mut self.delta);
        scatter_donors(receivers, &self.delta, &mut self.cursor, &mut self.donors);
        log::trace!(
            "donor table: {} nodes, {} edges",
            self.node_count(),
            self.edge_count()
        );
    }

    /// Offsets into [`donors`](Self::donors), length `N + 1`.
    pub fn delta(&self) -> &[usize] {
        &self.delta
    }

    /// Packed donor list `D`, length `E`.
    pub fn donors(&self) -> &[usize] {
        &self.donors
    }

    /// Donors feeding `node`, ascending. Includes `node` itself when it is a
    /// self-loop.
    pub fn donors_of(&self, node: usize) -> &[usize] {
        &self.donors[self.delta[node]..self.delta[node + 1]]
    }

    /// Number of edges arriving at `node`.
    pub fn donor_count(&self, node: usize) -> usize {
        self.delta[node + 1] - self.delta[node]
    }

    /// Number of nodes covered.
    pub fn node_count(&self) -> usize {
        self.delta.len().saturating_sub(1)
    }

    /// Total edge count `E` (`delta[N]`).
    pub fn edge_count(&self) -> usize {
        self.delta.last().copied().unwrap_or(0)
    }
}
