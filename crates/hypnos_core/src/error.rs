use thiserror::Error;

/// Recoverable failures of the numerical core.
///
/// Optimization non-convergence is deliberately absent: the calibrator
/// returns the input parameters unchanged instead of failing.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A parameter violates its invariant (non-positive time constant or
    /// inertia, negative amplitude, non-finite value). The mutation site
    /// must retain the prior record.
    #[error("invalid parameter `{name}` = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// The adaptive solver exhausted its step budget before reaching the
    /// end of the requested span. Engine state is left unchanged.
    #[error("integration failed at t = {t:.3} h after {steps} steps")]
    IntegrationFailure { t: f64, steps: usize },
}
