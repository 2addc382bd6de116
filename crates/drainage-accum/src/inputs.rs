//! Per-node inputs to an accumulation run.

use drainage_core::RoutingError;

/// External input flux per unit area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Runoff<'a> {
    /// The accumulator's configured `default_runoff`.
    Default,
    /// The same rate at every node.
    Uniform(f64),
    /// One rate per node.
    PerNode(&'a [f64]),
}

impl Runoff<'_> {
    /// Rate at `node`, with `default` standing in for [`Runoff::Default`].
    #[inline]
    pub fn rate(&self, node: usize, default: f64) -> f64 {
        match self {
            Self::Default => default,
            Self::Uniform(r) => *r,
            Self::PerNode(r) => r[node],
        }
    }
}

/// Cell geometry and forcing for every node.
#[derive(Clone, Copy, Debug)]
pub struct NodeInputs<'a> {
    /// Area of the cell around each node; 0 for nodes without a cell.
    pub cell_area: &'a [f64],
    /// External input per unit area.
    pub runoff: Runoff<'a>,
    /// Nodes whose own area and input are excluded.
    pub perimeter: Option<&'a [bool]>,
}

impl<'a> NodeInputs<'a> {
    /// Inputs with default runoff and no perimeter mask.
    pub fn new(cell_area: &'a [f64]) -> Self {
        Self {
            cell_area,
            runoff: Runoff::Default,
            perimeter: None,
        }
    }

    /// Replace the runoff.
    pub fn with_runoff(mut self, runoff: Runoff<'a>) -> Self {
        self.runoff = runoff;
        self
    }

    /// Exclude the masked nodes' own contributions.
    pub fn with_perimeter(mut self, perimeter: &'a [bool]) -> Self {
        self.perimeter = Some(perimeter);
        self
    }

    /// Check every array against the node count.
    pub(crate) fn check_shape(&self, node_count: usize) -> Result<(), RoutingError> {
        check_len("cell_area", self.cell_area.len(), node_count)?;
        if let Runoff::PerNode(r) = self.runoff {
            check_len("runoff", r.len(), node_count)?;
        }
        if let Some(mask) = self.perimeter {
            check_len("perimeter", mask.len(), node_count)?;
        }
        Ok(())
    }

    /// Check cell areas are finite and `>= 0` and runoff rates finite.
    pub(crate) fn check_values(&self) -> Result<(), RoutingError> {
        if let Some((node, &value)) = self
            .cell_area
            .iter()
            .enumerate()
            .find(|(_, a)| !a.is_finite() || **a < 0.0)
        {
            return Err(RoutingError::InvalidNodeValue {
                array: "cell_area",
                node,
                value,
            });
        }
        let bad_rate = match self.runoff {
            Runoff::Default => None,
            Runoff::Uniform(r) => (!r.is_finite()).then_some((0, r)),
            Runoff::PerNode(rates) => rates
                .iter()
                .copied()
                .enumerate()
                .find(|(_, r)| !r.is_finite()),
        };
        match bad_rate {
            Some((node, value)) => Err(RoutingError::InvalidNodeValue {
                array: "runoff",
                node,
                value,
            }),
            None => Ok(()),
        }
    }

    /// Whether `node` is masked out.
    #[inline]
    pub(crate) fn is_perimeter(&self, node: usize) -> bool {
        self.perimeter.is_some_and(|m| m[node])
    }
}

fn check_len(array: &'static str, actual: usize, expected: usize) -> Result<(), RoutingError> {
    if actual == expected {
        Ok(())
    } else {
        Err(RoutingError::ShapeMismatch {
            array,
            expected,
            actual,
        })
    }
}
