//! Process S: sleep-pressure homeostasis.
//!
//! First-order relaxation toward 1 while awake (accumulation) and
//! toward 0 while asleep (release), with a circadian modulation of the
//! release during biological night.

use hypnos_core::{EngineParams, SleepMode};

/// dS/dt given the current pressure, mode and circadian signal.
///
/// Awake:  dS/dt = (1 − S) / τ_rise
/// Asleep: dS/dt = −S / τ_decay, divided by (1 + 0.3·|C|) when C < 0,
/// so the night modulation is capped at 30%.
pub fn sleep_pressure_derivative(
    sleep_pressure: f64,
    mode: SleepMode,
    params: &EngineParams,
    circadian: f64,
) -> f64 {
    match mode {
        SleepMode::Awake => (1.0 - sleep_pressure) / params.tau_rise,
        SleepMode::Asleep => {
            let mut ds = -sleep_pressure / params.tau_decay;
            if circadian < 0.0 {
                ds /= 1.0 + 0.3 * circadian.abs();
            }
            ds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn awake_pressure_rises_below_asymptote() {
        let p = EngineParams::default();
        let ds = sleep_pressure_derivative(0.1, SleepMode::Awake, &p, 0.0);
        assert!(ds > 0.0);
        assert!((ds - 0.9 / 17.0).abs() < 1e-12);
    }

    #[test]
    fn awake_pressure_falls_above_asymptote() {
        let p = EngineParams::default();
        let ds = sleep_pressure_derivative(1.2, SleepMode::Awake, &p, 0.0);
        assert!(ds < 0.0);
    }

    #[test]
    fn asleep_pressure_decays() {
        let p = EngineParams::default();
        let ds = sleep_pressure_derivative(0.8, SleepMode::Asleep, &p, 0.0);
        assert!((ds - (-0.8 / 5.5)).abs() < 1e-12);
    }

    #[test]
    fn night_coupling_slows_the_derivative_magnitude() {
        // Dividing by (1 + 0.3|C|) shrinks |dS/dt| — a slower derivative
        // toward zero for the same pressure, capping the modulation at 30%.
        let p = EngineParams::default();
        let plain = sleep_pressure_derivative(0.8, SleepMode::Asleep, &p, 0.0);
        let night = sleep_pressure_derivative(0.8, SleepMode::Asleep, &p, -0.4);
        assert!(night.abs() < plain.abs());
        assert!((night - plain / 1.12).abs() < 1e-12);
    }

    #[test]
    fn daytime_circadian_has_no_effect_on_sleep_decay() {
        let p = EngineParams::default();
        let plain = sleep_pressure_derivative(0.8, SleepMode::Asleep, &p, 0.0);
        let day = sleep_pressure_derivative(0.8, SleepMode::Asleep, &p, 0.4);
        assert_eq!(plain, day);
    }
}
