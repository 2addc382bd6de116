//! Core types for the drainage flow-accumulation workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the topology builders and the accumulation engine:
//! link identifiers, the borrowed [`Receivers`] view over a flow-direction
//! collaborator's arrays, and the error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod receivers;

pub use error::{AccumulateError, RoutingError};
pub use id::LinkId;
pub use receivers::{Edge, EdgeList, Receivers, RoutingMode};
