//! The lossy accumulation pass.
//!
//! One pass serves both routing modes. Walking the stack from headwaters
//! to outlets, each node splits its discharge across its active edges,
//! runs every share through the loss function, and adds what survives to
//! the receiver. Drainage area follows the same split but is never lost.
//! Terminal nodes have no edge to another node, so they never call the
//! loss function and keep a loss of zero.

use crate::inputs::NodeInputs;
use crate::loss::LossAdapter;
use drainage_core::Receivers;

/// Output arrays for one pass, each of length `N`.
#[derive(Debug)]
pub struct PassBuffers<'a> {
    /// Upstream area draining through each node.
    pub drainage_area: &'a mut [f64],
    /// Discharge at each node after upstream losses.
    pub discharge: &'a mut [f64],
    /// Discharge lost on the way out of each node.
    pub discharge_loss: &'a mut [f64],
}

/// Load each node's own area and input into the buffers and clear losses.
///
/// Masked nodes start from zero.
pub fn seed(inputs: &NodeInputs<'_>, default_runoff: f64, out: &mut PassBuffers<'_>) {
    for node in 0..out.discharge.len() {
        let (area, q) = if inputs.is_perimeter(node) {
            (0.0, 0.0)
        } else {
            let area = inputs.cell_area[node];
            (area, inputs.runoff.rate(node, default_runoff) * area)
        };
        out.drainage_area[node] = area;
        out.discharge[node] = q;
        out.discharge_loss[node] = 0.0;
    }
}

/// Route seeded buffers downstream along `stack`, walked in reverse.
///
/// `stack` must list every receiver before its donors. Returns the number
/// of loss-function calls.
pub fn route<C: ?Sized>(
    stack: &[usize],
    receivers: &Receivers<'_>,
    loss: &LossAdapter<'_, C>,
    ctx: &C,
    clamp_outflow: bool,
    out: &mut PassBuffers<'_>,
) -> usize {
    let mut calls = 0;
    for &node in stack.iter().rev() {
        let q = out.discharge[node];
        let a = out.drainage_area[node];
        let mut lost = 0.0;
        for edge in receivers.active_edges(node) {
            if edge.is_self_loop(node) {
                continue;
            }
            let sent = q * edge.proportion;
            let mut arrived = loss.apply(sent, node, edge.link, ctx);
            calls += 1;
            if clamp_outflow && arrived < 0.0 {
                arrived = 0.0;
            }
            lost += sent - arrived;
            out.discharge[edge.receiver] += arrived;
            out.drainage_area[edge.receiver] += a * edge.proportion;
        }
        out.discharge_loss[node] = lost;
    }
    calls
}
