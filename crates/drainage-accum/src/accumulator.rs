//! The flow accumulator: validate, order, accumulate.
//!
//! [`FlowAccumulator`] owns a validated loss function and a configuration.
//! Each call to [`accumulate`](FlowAccumulator::accumulate) checks the
//! inputs, inverts the receiver graph into a donor table, derives the
//! traversal order, and runs the lossy pass. Nothing is retained between
//! calls, so the same accumulator can be reused after the receiver graph
//! changes (for example once a depression router has rerouted pits).
//!
//! Constructed via the builder pattern: [`FlowAccumulator::builder`].

use std::fmt;
use std::time::Instant;

use crate::config::AccumulatorConfig;
use crate::inputs::NodeInputs;
use crate::loss::{LossAdapter, LossFn};
use crate::metrics::AccumulationMetrics;
use crate::pass::{self, PassBuffers};
use drainage_core::{AccumulateError, Receivers};
use drainage_topology::{DonorTable, TraversalOrder};

/// Everything one accumulation run produces.
#[derive(Clone, Debug, Default)]
pub struct Accumulation {
    /// Upstream area draining through each node, unaffected by loss.
    pub drainage_area: Vec<f64>,
    /// Discharge at each node.
    pub discharge: Vec<f64>,
    /// Discharge lost leaving each node. Zero at terminal nodes.
    pub discharge_loss: Vec<f64>,
    /// Nodes ordered receivers-first; outlets lead.
    pub upstream_order: Vec<usize>,
    /// Donor block offsets, length `N + 1`.
    pub delta: Vec<usize>,
    /// Packed donor ids, length `delta[N]`.
    pub donors: Vec<usize>,
    /// Nodes the traversal could not reach.
    ///
    /// An incomplete traversal is returned as
    /// [`RoutingError::IncompleteTraversal`](drainage_core::RoutingError::IncompleteTraversal),
    /// which carries the real count, so this is 0 on every returned run.
    /// It mirrors `upstream_order.len() == N` for consumers that read the
    /// unvisited count next to the other outputs.
    pub nodes_not_in_stack: usize,
    /// Timings and counts for this run.
    pub metrics: AccumulationMetrics,
}

impl Accumulation {
    /// Sum of discharge over the terminal nodes of `receivers`.
    pub fn outlet_discharge(&self, receivers: &Receivers<'_>) -> f64 {
        (0..receivers.node_count())
            .filter(|&i| receivers.is_terminal(i))
            .map(|i| self.discharge[i])
            .sum()
    }

    /// Total discharge lost across the network.
    pub fn total_loss(&self) -> f64 {
        self.discharge_loss.iter().sum()
    }
}

/// Lossy flow accumulator over single- or multi-receiver graphs.
///
/// `C` is the context type handed to a [`LossFn::Context`] loss function;
/// it defaults to `()` for accumulators that do not need one.
///
/// ```
/// use drainage_accum::{FlowAccumulator, LossFn, NodeInputs};
/// use drainage_core::{LinkId, Receivers};
///
/// let r = [1, 2, 3, 4, 4];
/// let links = [LinkId(0), LinkId(1), LinkId(2), LinkId(3), LinkId::NONE];
/// let graph = Receivers::to_one(&r, &links).unwrap();
/// let area = [1.0, 1.0, 1.0, 1.0, 0.0];
///
/// let fa = FlowAccumulator::builder()
///     .loss(LossFn::discharge(|q| 0.5 * q))
///     .build()
///     .unwrap();
/// let out = fa.accumulate(&graph, &NodeInputs::new(&area), &()).unwrap();
/// assert_eq!(out.discharge, vec![1.0, 1.5, 1.75, 1.875, 0.9375]);
/// assert_eq!(out.drainage_area, vec![1.0, 2.0, 3.0, 4.0, 4.0]);
/// ```
pub struct FlowAccumulator<'f, C: ?Sized = ()> {
    loss: LossAdapter<'f, C>,
    config: AccumulatorConfig,
}

/// Builder for [`FlowAccumulator`].
///
/// Every field is optional: no loss means lossless accumulation.
pub struct FlowAccumulatorBuilder<'f, C: ?Sized = ()> {
    loss: Option<LossFn<'f, C>>,
    config: AccumulatorConfig,
}

impl<'f, C: ?Sized> FlowAccumulator<'f, C> {
    /// Create a new builder.
    pub fn builder() -> FlowAccumulatorBuilder<'f, C> {
        FlowAccumulatorBuilder {
            loss: None,
            config: AccumulatorConfig::default(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// The validated loss function.
    pub fn loss(&self) -> &LossAdapter<'f, C> {
        &self.loss
    }

    /// Accumulate drainage area and lossy discharge over `receivers`.
    ///
    /// # Errors
    ///
    /// - [`AccumulateError::Routing`] with a shape, range or proportion
    ///   error if an input is malformed
    /// - [`AccumulateError::Routing`] with
    ///   [`RoutingError::IncompleteTraversal`](drainage_core::RoutingError::IncompleteTraversal)
    ///   if the receiver graph has a cycle
    pub fn accumulate(
        &self,
        receivers: &Receivers<'_>,
        inputs: &NodeInputs<'_>,
        ctx: &C,
    ) -> Result<Accumulation, AccumulateError> {
        let mut out = Accumulation::default();
        self.accumulate_into(receivers, inputs, ctx, &mut out)?;
        Ok(out)
    }

    /// As [`accumulate`](Self::accumulate), writing into `out` and reusing
    /// its allocations.
    ///
    /// On error `out` is left untouched.
    pub fn accumulate_into(
        &self,
        receivers: &Receivers<'_>,
        inputs: &NodeInputs<'_>,
        ctx: &C,
        out: &mut Accumulation,
    ) -> Result<(), AccumulateError> {
        let start = Instant::now();
        let n = receivers.node_count();
        inputs.check_shape(n)?;
        if self.config.validate_inputs {
            receivers.validate(self.config.proportion_tolerance)?;
            inputs.check_values()?;
        }

        let t = Instant::now();
        let donors = DonorTable::build(receivers);
        let topology_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        let order = TraversalOrder::build(receivers, &donors);
        let order_us = t.elapsed().as_micros() as u64;
        let terminal_count = order.terminal_count();
        if !order.is_complete() {
            log::warn!(
                "traversal reached {} of {} nodes from {} terminals; receiver graph has a cycle",
                order.stack().len(),
                n,
                terminal_count
            );
        }
        let stack = order.complete()?;

        out.drainage_area.resize(n, 0.0);
        out.discharge.resize(n, 0.0);
        out.discharge_loss.resize(n, 0.0);
        let t = Instant::now();
        let mut buffers = PassBuffers {
            drainage_area: &mut out.drainage_area,
            discharge: &mut out.discharge,
            discharge_loss: &mut out.discharge_loss,
        };
        pass::seed(inputs, self.config.default_runoff, &mut buffers);
        let loss_calls = pass::route(
            &stack,
            receivers,
            &self.loss,
            ctx,
            self.config.clamp_outflow,
            &mut buffers,
        );
        let pass_us = t.elapsed().as_micros() as u64;

        out.upstream_order = stack;
        out.delta.clear();
        out.delta.extend_from_slice(donors.delta());
        out.donors.clear();
        out.donors.extend_from_slice(donors.donors());
        out.nodes_not_in_stack = 0;
        out.metrics = AccumulationMetrics {
            topology_us,
            order_us,
            pass_us,
            total_us: start.elapsed().as_micros() as u64,
            node_count: n,
            edge_count: donors.edge_count(),
            terminal_count,
            loss_calls,
        };

        log::debug!(
            "accumulated {} nodes, {} edges, {} terminals in {}us ({} loss calls)",
            n,
            out.metrics.edge_count,
            terminal_count,
            out.metrics.total_us,
            loss_calls
        );
        Ok(())
    }
}

impl<C: ?Sized> fmt::Debug for FlowAccumulator<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowAccumulator")
            .field("loss", &self.loss)
            .field("config", &self.config)
            .finish()
    }
}

impl<'f, C: ?Sized> FlowAccumulatorBuilder<'f, C> {
    /// Set the loss function. Default: none (lossless).
    pub fn loss(mut self, loss: LossFn<'f, C>) -> Self {
        self.loss = Some(loss);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: AccumulatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the uniform runoff used by `Runoff::Default`. Default: 1.0.
    pub fn default_runoff(mut self, rate: f64) -> Self {
        self.config.default_runoff = rate;
        self
    }

    /// Build the accumulator, probing the loss function and validating
    /// the configuration.
    ///
    /// # Errors
    ///
    /// - [`AccumulateError::InvalidConfig`] if a config value is unusable
    /// - [`AccumulateError::InvalidLossFunction`] if the loss trial call fails
    pub fn build(self) -> Result<FlowAccumulator<'f, C>, AccumulateError> {
        self.config.validate()?;
        let loss = LossAdapter::from_option(self.loss)?;
        Ok(FlowAccumulator {
            loss,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::Runoff;
    use drainage_core::{LinkId, RoutingError};

    fn no_links(n: usize) -> Vec<LinkId> {
        vec![LinkId::NONE; n]
    }

    #[test]
    fn builder_defaults_to_identity() {
        let fa = FlowAccumulator::<()>::builder().build().unwrap();
        assert_eq!(fa.loss().arity(), 0);
        assert_eq!(fa.config(), &AccumulatorConfig::default());
    }

    #[test]
    fn builder_rejects_bad_config_before_probing() {
        let err = FlowAccumulator::<()>::builder()
            .loss(LossFn::discharge(|_| f64::NAN))
            .default_runoff(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, AccumulateError::InvalidConfig { .. }));
    }

    #[test]
    fn builder_rejects_nan_loss() {
        let err = FlowAccumulator::<()>::builder()
            .loss(LossFn::node(|_, _| f64::NAN))
            .build()
            .unwrap_err();
        assert!(matches!(err, AccumulateError::InvalidLossFunction { .. }));
    }

    #[test]
    fn two_cycle_fails_with_unvisited_count() {
        let r = [1, 0];
        let l = no_links(2);
        let g = Receivers::to_one(&r, &l).unwrap();
        let fa = FlowAccumulator::builder().build().unwrap();
        let err = fa
            .accumulate(&g, &NodeInputs::new(&[1.0, 1.0]), &())
            .unwrap_err();
        assert_eq!(err.unvisited(), Some(2));
    }

    #[test]
    fn out_of_range_receiver_is_rejected() {
        let r = [3, 1];
        let l = no_links(2);
        let g = Receivers::to_one(&r, &l).unwrap();
        let fa = FlowAccumulator::builder().build().unwrap();
        let err = fa
            .accumulate(&g, &NodeInputs::new(&[1.0, 1.0]), &())
            .unwrap_err();
        assert!(matches!(
            err,
            AccumulateError::Routing(RoutingError::ReceiverOutOfRange { receiver: 3, .. })
        ));
    }

    #[test]
    fn short_proportion_row_is_rejected_before_routing() {
        // Node 0 routes only half its flux; the rest would vanish.
        let r = [1, 0, 1, 1];
        let p = [0.5, 0.0, 1.0, 0.0];
        let l = no_links(4);
        let g = Receivers::to_many(&r, &p, &l, 2).unwrap();
        let fa = FlowAccumulator::builder().build().unwrap();
        let err = fa
            .accumulate(&g, &NodeInputs::new(&[2.0, 0.0]), &())
            .unwrap_err();
        assert_eq!(
            err,
            AccumulateError::Routing(RoutingError::ProportionSumDeficit { node: 0, sum: 0.5 })
        );
    }

    #[test]
    fn negative_or_nan_cell_area_is_rejected() {
        let l = no_links(2);
        let g = Receivers::to_one(&[1, 1], &l).unwrap();
        let fa = FlowAccumulator::builder().build().unwrap();
        let err = fa
            .accumulate(&g, &NodeInputs::new(&[-3.0, f64::NAN]), &())
            .unwrap_err();
        assert!(matches!(
            err,
            AccumulateError::Routing(RoutingError::InvalidNodeValue {
                array: "cell_area",
                node: 0,
                ..
            })
        ));
        let err = fa
            .accumulate(&g, &NodeInputs::new(&[1.0, f64::NAN]), &())
            .unwrap_err();
        assert!(matches!(
            err,
            AccumulateError::Routing(RoutingError::InvalidNodeValue { node: 1, .. })
        ));
    }

    #[test]
    fn nan_runoff_is_rejected() {
        let l = no_links(2);
        let g = Receivers::to_one(&[1, 1], &l).unwrap();
        let fa = FlowAccumulator::builder().build().unwrap();
        let rate = [f64::NAN, 1.0];
        let inputs = NodeInputs::new(&[1.0, 1.0]).with_runoff(Runoff::PerNode(&rate));
        let err = fa.accumulate(&g, &inputs, &()).unwrap_err();
        assert!(matches!(
            err,
            AccumulateError::Routing(RoutingError::InvalidNodeValue { array: "runoff", .. })
        ));
    }

    #[test]
    fn cell_area_length_is_checked() {
        let r = [1, 1];
        let l = no_links(2);
        let g = Receivers::to_one(&r, &l).unwrap();
        let fa = FlowAccumulator::builder().build().unwrap();
        let err = fa.accumulate(&g, &NodeInputs::new(&[1.0]), &()).unwrap_err();
        assert_eq!(
            err,
            AccumulateError::Routing(RoutingError::ShapeMismatch {
                array: "cell_area",
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn error_leaves_output_untouched() {
        let fa = FlowAccumulator::builder().build().unwrap();
        let l = no_links(2);
        let ok = Receivers::to_one(&[1, 1], &l).unwrap();
        let mut out = fa.accumulate(&ok, &NodeInputs::new(&[1.0, 0.0]), &()).unwrap();
        let before = out.discharge.clone();

        let cyc = Receivers::to_one(&[1, 0], &l).unwrap();
        assert!(fa
            .accumulate_into(&cyc, &NodeInputs::new(&[5.0, 5.0]), &(), &mut out)
            .is_err());
        assert_eq!(out.discharge, before);
    }

    #[test]
    fn accumulate_into_reuses_buffers() {
        let fa = FlowAccumulator::builder()
            .loss(LossFn::discharge(|q| 0.5 * q))
            .build()
            .unwrap();
        let l = no_links(3);
        let mut out = Accumulation::default();

        let a = Receivers::to_one(&[1, 2, 2], &l).unwrap();
        fa.accumulate_into(&a, &NodeInputs::new(&[1.0, 1.0, 0.0]), &(), &mut out)
            .unwrap();
        assert_eq!(out.discharge, vec![1.0, 1.5, 0.75]);

        // Reroute node 0 straight to the outlet.
        let b = Receivers::to_one(&[2, 2, 2], &l).unwrap();
        fa.accumulate_into(&b, &NodeInputs::new(&[1.0, 1.0, 0.0]), &(), &mut out)
            .unwrap();
        assert_eq!(out.discharge, vec![1.0, 1.0, 1.0]);
        assert_eq!(out.upstream_order, vec![2, 0, 1]);
        assert_eq!(out.delta, vec![0, 0, 0, 3]);
    }

    #[test]
    fn runoff_overrides_configured_default() {
        let fa = FlowAccumulator::builder()
            .default_runoff(2.0)
            .build()
            .unwrap();
        let l = no_links(2);
        let g = Receivers::to_one(&[1, 1], &l).unwrap();
        let area = [3.0, 0.0];

        let out = fa.accumulate(&g, &NodeInputs::new(&area), &()).unwrap();
        assert_eq!(out.discharge, vec![6.0, 6.0]);

        let inputs = NodeInputs::new(&area).with_runoff(Runoff::Uniform(0.5));
        let out = fa.accumulate(&g, &inputs, &()).unwrap();
        assert_eq!(out.discharge, vec![1.5, 1.5]);
    }

    #[test]
    fn metrics_count_edges_and_loss_calls() {
        let fa = FlowAccumulator::builder()
            .loss(LossFn::discharge(|q| q))
            .build()
            .unwrap();
        let l = no_links(5);
        let g = Receivers::to_one(&[1, 2, 3, 4, 4], &l).unwrap();
        let out = fa.accumulate(&g, &NodeInputs::new(&[1.0; 5]), &()).unwrap();
        assert_eq!(out.metrics.node_count, 5);
        assert_eq!(out.metrics.edge_count, 5);
        assert_eq!(out.metrics.terminal_count, 1);
        assert_eq!(out.metrics.loss_calls, 4);
        assert!(out.metrics.total_us >= out.metrics.pass_us);
        assert_eq!(out.nodes_not_in_stack, 0);
    }

    #[test]
    fn unchecked_mode_skips_range_validation_but_not_shapes() {
        let fa = FlowAccumulator::builder()
            .config(AccumulatorConfig {
                validate_inputs: false,
                ..Default::default()
            })
            .build()
            .unwrap();
        let l = no_links(2);
        let g = Receivers::to_one(&[1, 1], &l).unwrap();
        assert!(fa.accumulate(&g, &NodeInputs::new(&[1.0]), &()).is_err());
        assert!(fa.accumulate(&g, &NodeInputs::new(&[1.0, 1.0]), &()).is_ok());
    }
}
