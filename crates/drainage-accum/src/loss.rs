//! Loss functions and the adapter that normalizes them.
//!
//! Callers hand the accumulator a [`LossFn`] that sees as much of the
//! transfer as it needs: just the discharge, the discharge and donor node,
//! those plus the link, or all of that plus a caller-owned context. The
//! [`LossAdapter`] turns every form into one 4-argument call.
//!
//! A loss function maps the discharge leaving a node along one edge to the
//! discharge that arrives at the receiver. It must be a pure function of
//! its arguments; the engine does not check this.

use std::fmt;

use drainage_core::{AccumulateError, LinkId};

type DischargeFn<'f> = dyn Fn(f64) -> f64 + Send + Sync + 'f;
type NodeFn<'f> = dyn Fn(f64, usize) -> f64 + Send + Sync + 'f;
type LinkFn<'f> = dyn Fn(f64, usize, LinkId) -> f64 + Send + Sync + 'f;

/// A caller-supplied loss function, tagged by the arguments it takes.
pub enum LossFn<'f, C: ?Sized = ()> {
    /// `f(discharge)`.
    Discharge(Box<DischargeFn<'f>>),
    /// `f(discharge, node)`.
    Node(Box<NodeFn<'f>>),
    /// `f(discharge, node, link)`.
    Link(Box<LinkFn<'f>>),
    /// `f(discharge, node, link, context)`. Never trial-called.
    Context(Box<dyn Fn(f64, usize, LinkId, &C) -> f64 + Send + Sync + 'f>),
}

impl<'f, C: ?Sized> LossFn<'f, C> {
    /// Loss depending on discharge alone.
    pub fn discharge(f: impl Fn(f64) -> f64 + Send + Sync + 'f) -> Self {
        Self::Discharge(Box::new(f))
    }

    /// Loss depending on discharge and the donor node.
    pub fn node(f: impl Fn(f64, usize) -> f64 + Send + Sync + 'f) -> Self {
        Self::Node(Box::new(f))
    }

    /// Loss depending on discharge, donor node, and the link travelled.
    pub fn link(f: impl Fn(f64, usize, LinkId) -> f64 + Send + Sync + 'f) -> Self {
        Self::Link(Box::new(f))
    }

    /// Loss with access to a caller-owned context (typically the grid and
    /// its fields).
    pub fn context(f: impl Fn(f64, usize, LinkId, &C) -> f64 + Send + Sync + 'f) -> Self {
        Self::Context(Box::new(f))
    }

    /// Number of arguments the wrapped function takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::Discharge(_) => 1,
            Self::Node(_) => 2,
            Self::Link(_) => 3,
            Self::Context(_) => 4,
        }
    }
}

impl<C: ?Sized> fmt::Debug for LossFn<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discharge(_) => "Discharge",
            Self::Node(_) => "Node",
            Self::Link(_) => "Link",
            Self::Context(_) => "Context",
        };
        write!(f, "LossFn::{name}(..)")
    }
}

/// A validated loss function with one canonical call signature.
///
/// Immutable once built and shared by every node of every run.
pub struct LossAdapter<'f, C: ?Sized = ()> {
    inner: Option<LossFn<'f, C>>,
}

impl<'f, C: ?Sized> LossAdapter<'f, C> {
    /// The lossless adapter: `f(q, ..) = q`.
    pub fn identity() -> Self {
        Self { inner: None }
    }

    /// Wrap `loss`, calling it once with placeholder arguments.
    ///
    /// The 1-, 2- and 3-argument forms are called as `f(1.0)`,
    /// `f(1.0, 0)` and `f(1.0, 0, LinkId(0))`. The context form is not
    /// called, since no context value is available yet.
    ///
    /// # Errors
    ///
    /// [`AccumulateError::InvalidLossFunction`] if the trial call returns a
    /// non-finite value.
    pub fn new(loss: LossFn<'f, C>) -> Result<Self, AccumulateError> {
        let trial = match &loss {
            LossFn::Discharge(f) => Some(("f(1.0)", f(1.0))),
            LossFn::Node(f) => Some(("f(1.0, 0)", f(1.0, 0))),
            LossFn::Link(f) => Some(("f(1.0, 0, LinkId(0))", f(1.0, 0, LinkId(0)))),
            LossFn::Context(_) => None,
        };
        if let Some((call, value)) = trial {
            if !value.is_finite() {
                return Err(AccumulateError::InvalidLossFunction {
                    reason: format!("{call} returned {value}, expected a finite discharge"),
                });
            }
        }
        Ok(Self { inner: Some(loss) })
    }

    /// Wrap an optional loss, falling back to [`identity`](Self::identity).
    pub fn from_option(loss: Option<LossFn<'f, C>>) -> Result<Self, AccumulateError> {
        match loss {
            Some(loss) => Self::new(loss),
            None => Ok(Self::identity()),
        }
    }

    /// Arity of the wrapped function, 0 for identity.
    pub fn arity(&self) -> usize {
        self.inner.as_ref().map_or(0, LossFn::arity)
    }

    /// Whether this adapter passes discharge through unchanged.
    pub fn is_identity(&self) -> bool {
        self.inner.is_none()
    }

    /// Discharge arriving downstream when `discharge` leaves `node` along
    /// `link`.
    #[inline]
    pub fn apply(&self, discharge: f64, node: usize, link: LinkId, ctx: &C) -> f64 {
        match &self.inner {
            None => discharge,
            Some(LossFn::Discharge(f)) => f(discharge),
            Some(LossFn::Node(f)) => f(discharge, node),
            Some(LossFn::Link(f)) => f(discharge, node, link),
            Some(LossFn::Context(f)) => f(discharge, node, link, ctx),
        }
    }
}

impl<C: ?Sized> fmt::Debug for LossAdapter<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LossAdapter")
            .field("arity", &self.arity())
            .finish()
    }
}
