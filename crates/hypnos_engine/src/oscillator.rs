//! The damped reaction oscillator (DRO).
//!
//! A second-order linear system m·v′ + c·v + k·x = 0 describing the
//! transient excursion of mood around its baseline. There is no
//! continuous forcing term: every external shock arrives as an
//! instantaneous velocity impulse applied between integration steps.

use hypnos_core::EngineParams;
use serde::{Deserialize, Serialize};

/// (dx/dt, dv/dt) for displacement x and velocity v.
pub fn reaction_derivatives(x: f64, v: f64, params: &EngineParams) -> (f64, f64) {
    let dx = v;
    let dv = -(params.damping * v + params.stiffness * x) / params.inertia;
    (dx, dv)
}

/// c² − 4mk. Negative means oscillatory return to baseline.
pub fn discriminant(params: &EngineParams) -> f64 {
    params.damping * params.damping - 4.0 * params.inertia * params.stiffness
}

/// Stability classification of the oscillator, used by the diagnosis
/// heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DampingRegime {
    /// c² − 4mk < 0: oscillatory, emotionally reactive.
    Underdamped,
    /// c² − 4mk ≥ 0: sluggish, returns to baseline without overshoot.
    Overdamped,
}

impl DampingRegime {
    pub fn classify(params: &EngineParams) -> Self {
        if discriminant(params) < 0.0 {
            DampingRegime::Underdamped
        } else {
            DampingRegime::Overdamped
        }
    }
}
