//! Error types for flow accumulation.
//!
//! Split by subsystem: [`RoutingError`] covers malformed receiver graphs and
//! traversal failures, [`AccumulateError`] covers the engine boundary
//! (loss function, configuration) and wraps routing failures.

use std::error::Error;
use std::fmt;

/// Errors arising from receiver-graph validation or traversal.
#[derive(Clone, Debug, PartialEq)]
pub enum RoutingError {
    /// An input array's length disagrees with the node count (or
    /// node count times receiver capacity).
    ShapeMismatch {
        /// Name of the offending array.
        array: &'static str,
        /// Length required by the receiver graph.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
    /// A row-major multi-receiver array is not a whole number of rows.
    RaggedRows {
        /// Name of the offending array.
        array: &'static str,
        /// Length actually supplied.
        len: usize,
        /// Receiver slots per node.
        row_width: usize,
    },
    /// A multi-receiver graph was declared with zero slots per node.
    ZeroReceiverCapacity,
    /// A receiver id lies outside `[0, node_count)`.
    ReceiverOutOfRange {
        /// Donor node.
        node: usize,
        /// Receiver slot (always 0 in single-receiver mode).
        slot: usize,
        /// The out-of-range receiver id.
        receiver: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// A receiver proportion is negative or not finite.
    InvalidProportion {
        /// Donor node.
        node: usize,
        /// Receiver slot.
        slot: usize,
        /// The rejected proportion.
        value: f64,
    },
    /// A node's proportions sum to more than one.
    ProportionSumExceeded {
        /// Donor node.
        node: usize,
        /// Sum of the node's proportions.
        sum: f64,
    },
    /// A node that drains elsewhere has proportions summing to less than
    /// one, so part of its flux would vanish unaccounted.
    ProportionSumDeficit {
        /// Donor node.
        node: usize,
        /// Sum of the node's proportions.
        sum: f64,
    },
    /// A per-node input value is unusable: a cell area that is negative
    /// or not finite, or a runoff rate that is not finite.
    InvalidNodeValue {
        /// Name of the offending array.
        array: &'static str,
        /// First node carrying the value.
        node: usize,
        /// The rejected value.
        value: f64,
    },
    /// The traversal order could not reach every node, which means the
    /// receiver graph contains a cycle.
    IncompleteTraversal {
        /// Nodes never placed in the stack.
        unvisited: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                array,
                expected,
                actual,
            } => {
                write!(f, "{array} has {actual} elements, expected {expected}")
            }
            Self::RaggedRows {
                array,
                len,
                row_width,
            } => {
                write!(
                    f,
                    "{array} has {len} elements, not a multiple of {row_width} receivers per node"
                )
            }
            Self::ZeroReceiverCapacity => {
                write!(f, "multi-receiver routing needs at least one slot per node")
            }
            Self::ReceiverOutOfRange {
                node,
                slot,
                receiver,
                node_count,
            } => {
                write!(
                    f,
                    "node {node} slot {slot}: receiver {receiver} out of range for {node_count} nodes"
                )
            }
            Self::InvalidProportion { node, slot, value } => {
                write!(f, "node {node} slot {slot}: invalid proportion {value}")
            }
            Self::ProportionSumExceeded { node, sum } => {
                write!(f, "node {node}: proportions sum to {sum}, above 1")
            }
            Self::ProportionSumDeficit { node, sum } => {
                write!(f, "node {node}: proportions sum to {sum}, below 1")
            }
            Self::InvalidNodeValue { array, node, value } => {
                write!(f, "{array}[{node}] = {value} is not a valid input")
            }
            Self::IncompleteTraversal {
                unvisited,
                node_count,
            } => {
                write!(
                    f,
                    "incomplete traversal: {unvisited} of {node_count} nodes not in stack"
                )
            }
        }
    }
}

impl Error for RoutingError {}

/// Errors surfaced by the accumulation engine.
#[derive(Clone, Debug, PartialEq)]
pub enum AccumulateError {
    /// The loss function failed its construction-time trial call.
    InvalidLossFunction {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The receiver graph or an input array was rejected.
    Routing(RoutingError),
    /// An accumulator configuration value was rejected.
    InvalidConfig {
        /// Description of which invariant was violated.
        reason: String,
    },
}

impl AccumulateError {
    /// Number of nodes missing from the stack, if this is a traversal
    /// failure.
    pub fn unvisited(&self) -> Option<usize> {
        match self {
            Self::Routing(RoutingError::IncompleteTraversal { unvisited, .. }) => Some(*unvisited),
            _ => None,
        }
    }
}

impl fmt::Display for AccumulateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLossFunction { reason } => write!(f, "invalid loss function: {reason}"),
            Self::Routing(e) => write!(f, "routing: {e}"),
            Self::InvalidConfig { reason } => write!(f, "invalid accumulator config: {reason}"),
        }
    }
}

impl Error for AccumulateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Routing(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RoutingError> for AccumulateError {
    fn from(e: RoutingError) -> Self {
        Self::Routing(e)
    }
}
