//! Process C: the circadian rhythm signal.
//!
//! C(t) = A·sin(ωt + φ) + (A/3)·sin(2ωt + φ + π), ω = 2π/24.
//!
//! The second harmonic (one-third amplitude, half-period shift) models
//! the afternoon dip. Both constants are fixed by design, not tunable.

use std::f64::consts::PI;

use hypnos_core::EngineParams;

/// Angular frequency of the 24-hour cycle (rad/h).
pub const OMEGA: f64 = 2.0 * PI / 24.0;

/// Evaluate the circadian signal at simulation time `t` (hours).
///
/// Pure function of (t, phase, amplitude), defined for all real t.
pub fn circadian_signal(t: f64, phase: f64, amplitude: f64) -> f64 {
    let main_wave = amplitude * (OMEGA * t + phase).sin();
    let afternoon_dip = (amplitude / 3.0) * (2.0 * OMEGA * t + phase + PI).sin();
    main_wave + afternoon_dip
}

/// Convenience wrapper reading phase/amplitude from a parameter record.
pub fn circadian_at(params: &EngineParams, t: f64) -> f64 {
    circadian_signal(t, params.phase, params.circadian_amplitude)
}
