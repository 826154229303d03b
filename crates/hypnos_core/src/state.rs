//! Engine state vector and sleep mode.
//!
//! Three coupled variables: sleep pressure S (nominally [0,1], not
//! hard-clamped), reaction displacement x and reaction velocity v
//! (both unbounded reals).

use serde::{Deserialize, Serialize};

/// Guard against NaN and Infinity leaking into the state.
/// Replaces non-finite values with the given homeostatic fallback.
#[inline]
fn sanitize_f64(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("non-finite value in engine state, resetting to {}", fallback);
        fallback
    }
}

/// Which relaxation target governs the sleep-pressure derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepMode {
    Awake,
    Asleep,
}

impl SleepMode {
    pub fn is_asleep(self) -> bool {
        self == SleepMode::Asleep
    }
}

impl Default for SleepMode {
    fn default() -> Self {
        SleepMode::Awake
    }
}

/// The 3-variable state advanced by the integrator and nudged by
/// event impulses. Owned exclusively by one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// Sleep pressure S. May transiently leave [0,1] under extreme
    /// impulses; that is acceptable, not an error.
    pub sleep_pressure: f64,

    /// Mood displacement x from baseline.
    pub displacement: f64,

    /// Mood velocity v. Event impulses add directly to this.
    pub velocity: f64,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            sleep_pressure: 0.1,
            displacement: 0.0,
            velocity: 0.0,
        }
    }
}

impl EngineState {
    /// Pack into the solver's vector layout [S, x, v].
    pub fn to_array(self) -> [f64; 3] {
        [self.sleep_pressure, self.displacement, self.velocity]
    }

    /// Unpack from the solver's vector layout.
    pub fn from_array(y: [f64; 3]) -> Self {
        Self {
            sleep_pressure: y[0],
            displacement: y[1],
            velocity: y[2],
        }
    }

    /// Replace any non-finite component with its resting default.
    pub fn sanitize(&mut self) {
        self.sleep_pressure = sanitize_f64(self.sleep_pressure, 0.1);
        self.displacement = sanitize_f64(self.displacement, 0.0);
        self.velocity = sanitize_f64(self.velocity, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_matches_construction_contract() {
        let s = EngineState::default();
        assert_eq!(s.sleep_pressure, 0.1);
        assert_eq!(s.displacement, 0.0);
        assert_eq!(s.velocity, 0.0);
    }

    #[test]
    fn array_round_trip() {
        let s = EngineState {
            sleep_pressure: 0.4,
            displacement: -0.2,
            velocity: 1.5,
        };
        assert_eq!(EngineState::from_array(s.to_array()), s);
    }

    #[test]
    fn sanitize_recovers_non_finite_components() {
        let mut s = EngineState {
            sleep_pressure: f64::NAN,
            displacement: f64::INFINITY,
            velocity: f64::NEG_INFINITY,
        };
        s.sanitize();
        assert_eq!(s.sleep_pressure, 0.1);
        assert_eq!(s.displacement, 0.0);
        assert_eq!(s.velocity, 0.0);
    }

    #[test]
    fn default_mode_is_awake() {
        assert!(!SleepMode::default().is_asleep());
        assert!(SleepMode::Asleep.is_asleep());
    }
}
