//! Drainage: lossy flow accumulation over drainage networks.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the drainage sub-crates. Given the receiver graph produced by a flow
//! director (one receiver per node, or several with proportions), it
//! accumulates drainage area and discharge downstream, letting a loss
//! function remove discharge on every transfer.
//!
//! # Quick start
//!
//! ```rust
//! use drainage::prelude::*;
//!
//! // 0 -> 1 -> 2, with node 2 the outlet.
//! let receiver = [1, 2, 2];
//! let link = [LinkId(0), LinkId(1), LinkId::NONE];
//! let graph = Receivers::to_one(&receiver, &link).unwrap();
//! let cell_area = [1.0, 1.0, 0.0];
//!
//! // Lose a quarter of the discharge on every link.
//! let fa = FlowAccumulator::builder()
//!     .loss(LossFn::discharge(|q| 0.75 * q))
//!     .build()
//!     .unwrap();
//! let out = fa.accumulate(&graph, &NodeInputs::new(&cell_area), &()).unwrap();
//!
//! assert_eq!(out.drainage_area, vec![1.0, 2.0, 2.0]);
//! assert_eq!(out.discharge, vec![1.0, 1.75, 1.3125]);
//! assert_eq!(out.upstream_order, vec![2, 1, 0]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `drainage-core` | `LinkId`, `Receivers`, error types |
//! | [`topology`] | `drainage-topology` | donor tables and traversal order |
//! | [`accum`] | `drainage-accum` | loss functions, `FlowAccumulator`, config, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and receiver-graph views (`drainage-core`).
///
/// [`types::Receivers`] wraps a flow director's receiver, proportion and
/// link arrays in either routing mode.
pub use drainage_core as types;

/// Donor tables and traversal order (`drainage-topology`).
///
/// Use [`topology::DonorTable`] and [`topology::TraversalOrder`] directly
/// when only the graph structure is needed.
pub use drainage_topology as topology;

/// Lossy accumulation (`drainage-accum`).
pub use drainage_accum as accum;

/// Common imports for typical usage.
///
/// ```rust
/// use drainage::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use drainage_core::{Edge, LinkId, Receivers, RoutingMode};

    // Errors
    pub use drainage_core::{AccumulateError, RoutingError};

    // Topology
    pub use drainage_topology::{DonorTable, TraversalOrder};

    // Accumulation
    pub use drainage_accum::{
        Accumulation, AccumulationMetrics, AccumulatorConfig, FlowAccumulator, LossFn, NodeInputs,
        Runoff,
    };
}
