//! Per-run metrics for the accumulator.

/// Timing and size figures for a single accumulation run.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulationMetrics {
    /// Building the donor table.
    pub topology_us: u64,
    /// Building the traversal order.
    pub order_us: u64,
    /// The accumulation pass itself.
    pub pass_us: u64,
    /// Wall-clock time for the whole run, validation included.
    pub total_us: u64,
    /// Nodes in the receiver graph.
    pub node_count: usize,
    /// Active edges, self-loops included (`delta[N]`).
    pub edge_count: usize,
    /// Terminal nodes that seeded the traversal.
    pub terminal_count: usize,
    /// Number of times the loss function was invoked.
    pub loss_calls: usize,
}
