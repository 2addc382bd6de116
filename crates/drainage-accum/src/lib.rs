//! Lossy flow accumulation over drainage receiver graphs.
//!
//! Given a receiver graph (one receiver per node, or several with
//! proportions), per-node cell areas and an external input, this crate
//! accumulates drainage area and discharge downstream. Discharge can be
//! reduced on every transfer by a caller-supplied loss function; area is
//! never lost.
//!
//! | Module | Contents |
//! |---|---|
//! | [`loss`] | [`LossFn`] variants and the [`LossAdapter`] |
//! | [`pass`] | the accumulation pass over a traversal order |
//! | [`accumulator`] | [`FlowAccumulator`], its builder and [`Accumulation`] |
//! | [`config`] | [`AccumulatorConfig`] |
//! | [`metrics`] | [`AccumulationMetrics`] |
//! | [`inputs`] | [`NodeInputs`] and [`Runoff`] |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod accumulator;
pub mod config;
pub mod inputs;
pub mod loss;
pub mod metrics;
pub mod pass;

pub use accumulator::{Accumulation, FlowAccumulator, FlowAccumulatorBuilder};
pub use config::AccumulatorConfig;
pub use inputs::{NodeInputs, Runoff};
pub use loss::{LossAdapter, LossFn};
pub use metrics::AccumulationMetrics;
