//! Donor tables and traversal order for drainage receiver graphs.
//!
//! Two steps turn a receiver relation into something the accumulation pass
//! can walk in O(N):
//!
//! 1. [`DonorTable::build`] inverts the receiver relation into the packed
//!    `delta`/`D` adjacency (a stable counting sort by receiver id).
//! 2. [`TraversalOrder::build`] walks that adjacency outward from the
//!    terminal nodes, producing the downstream-to-upstream stack.
//!
//! Both steps work on single- and multi-receiver graphs alike.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod donors;
pub mod order;

pub use donors::{delta_from_counts, donor_array, number_of_donors, DonorTable};
pub use order::TraversalOrder;
