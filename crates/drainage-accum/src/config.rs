//! Accumulator configuration.

use drainage_core::AccumulateError;

/// Tunables for a [`FlowAccumulator`](crate::FlowAccumulator).
#[derive(Clone, Debug, PartialEq)]
pub struct AccumulatorConfig {
    /// Uniform external input per unit area used when the caller passes
    /// [`Runoff::Default`](crate::Runoff::Default). Default: 1.0.
    pub default_runoff: f64,
    /// Clamp each loss-function result to `>= 0` before routing it
    /// downstream. Default: true.
    pub clamp_outflow: bool,
    /// How far a multi-receiver row may sum above 1 before it is rejected.
    /// Default: 1e-6.
    pub proportion_tolerance: f64,
    /// Check receiver ranges, proportion rows, cell areas and runoff
    /// values before each run. Array lengths are always checked. With this off, an out-of-range receiver
    /// panics instead of returning an error. Default: true.
    pub validate_inputs: bool,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            default_runoff: 1.0,
            clamp_outflow: true,
            proportion_tolerance: 1e-6,
            validate_inputs: true,
        }
    }
}

impl AccumulatorConfig {
    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// [`AccumulateError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), AccumulateError> {
        if !self.default_runoff.is_finite() {
            return Err(AccumulateError::InvalidConfig {
                reason: format!("default_runoff must be finite, got {}", self.default_runoff),
            });
        }
        if !self.proportion_tolerance.is_finite() || self.proportion_tolerance < 0.0 {
            return Err(AccumulateError::InvalidConfig {
                reason: format!(
                    "proportion_tolerance must be finite and >= 0, got {}",
                    self.proportion_tolerance
                ),
            });
        }
        Ok(())
    }
}
