//! Engine parameter record.
//!
//! The original two-process model (Borbély) contributes the sleep
//! homeostasis and circadian constants; the damped reaction oscillator
//! contributes stiffness/damping/inertia. All fields are plain f64 so
//! the record round-trips through a flat JSON object for persistence.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Wrap an angle into (−π, π].
pub fn wrap_phase(phi: f64) -> f64 {
    phi.sin().atan2(phi.cos())
}

/// Mutable, strongly-typed parameter record owned by exactly one engine.
///
/// The calibrator reads a record and returns a *new* one; it never
/// mutates in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Wake accumulation time constant (hours). Adult range 15–19.
    pub tau_rise: f64,

    /// Sleep decay time constant (hours). Shorter than `tau_rise`:
    /// pressure builds slowly and releases fast.
    pub tau_decay: f64,

    /// How strongly sleep pressure drags the mood baseline down.
    pub circadian_gain: f64,

    /// Circadian amplitude (dimensionless, non-negative).
    pub circadian_amplitude: f64,

    /// Reaction stiffness k: restoring force toward baseline.
    pub stiffness: f64,

    /// Reaction damping c: dissipation of mood swings.
    pub damping: f64,

    /// Reaction inertia m (normalized mass).
    pub inertia: f64,

    /// Circadian phase offset (radians), kept in (−π, π].
    /// Negative = evening chronotype, positive = morning chronotype.
    pub phase: f64,

    /// Reference HRV baseline (ms, rMSSD). Divisor in the HRV mapping,
    /// so it must stay strictly positive.
    pub base_hrv: f64,

    /// Sensitivity of stiffness to HRV deviation (fraction per percent).
    pub stress_sensitivity: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            tau_rise: 17.0,
            tau_decay: 5.5,
            circadian_gain: 0.1,
            circadian_amplitude: 0.3,
            stiffness: 12.0,
            damping: 3.5,
            inertia: 1.0,
            phase: 0.0,
            base_hrv: 50.0,
            stress_sensitivity: 0.015,
        }
    }
}

impl EngineParams {
    /// Field names, in declaration order. This is the vocabulary the
    /// untrusted interpreter boundary validates against.
    pub const FIELD_NAMES: [&'static str; 10] = [
        "tau_rise",
        "tau_decay",
        "circadian_gain",
        "circadian_amplitude",
        "stiffness",
        "damping",
        "inertia",
        "phase",
        "base_hrv",
        "stress_sensitivity",
    ];

    /// Check every invariant. Call at construction and after any
    /// mutation; on `Err` the caller must keep its previous record.
    pub fn validate(&self) -> Result<(), ModelError> {
        for name in Self::FIELD_NAMES {
            let value = self.get(name).unwrap_or(f64::NAN);
            if !value.is_finite() {
                return Err(ModelError::InvalidParameter { name, value });
            }
        }
        let strictly_positive = [
            ("tau_rise", self.tau_rise),
            ("tau_decay", self.tau_decay),
            ("inertia", self.inertia),
            ("base_hrv", self.base_hrv),
        ];
        for (name, value) in strictly_positive {
            if value <= 0.0 {
                return Err(ModelError::InvalidParameter { name, value });
            }
        }
        if self.circadian_amplitude < 0.0 {
            return Err(ModelError::InvalidParameter {
                name: "circadian_amplitude",
                value: self.circadian_amplitude,
            });
        }
        Ok(())
    }

    /// Validate and normalize the phase, consuming self.
    pub fn validated(mut self) -> Result<Self, ModelError> {
        self.validate()?;
        self.normalize_phase();
        Ok(self)
    }

    /// Renormalize the phase into (−π, π].
    pub fn normalize_phase(&mut self) {
        self.phase = wrap_phase(self.phase);
    }

    /// Read a field by name. `None` for unknown names.
    pub fn get(&self, name: &str) -> Option<f64> {
        let v = match name {
            "tau_rise" => self.tau_rise,
            "tau_decay" => self.tau_decay,
            "circadian_gain" => self.circadian_gain,
            "circadian_amplitude" => self.circadian_amplitude,
            "stiffness" => self.stiffness,
            "damping" => self.damping,
            "inertia" => self.inertia,
            "phase" => self.phase,
            "base_hrv" => self.base_hrv,
            "stress_sensitivity" => self.stress_sensitivity,
            _ => return None,
        };
        Some(v)
    }

    /// Write a field by name. Returns false for unknown names and does
    /// not validate; callers validate the whole record afterwards.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "tau_rise" => &mut self.tau_rise,
            "tau_decay" => &mut self.tau_decay,
            "circadian_gain" => &mut self.circadian_gain,
            "circadian_amplitude" => &mut self.circadian_amplitude,
            "stiffness" => &mut self.stiffness,
            "damping" => &mut self.damping,
            "inertia" => &mut self.inertia,
            "phase" => &mut self.phase,
            "base_hrv" => &mut self.base_hrv,
            "stress_sensitivity" => &mut self.stress_sensitivity,
            _ => return false,
        };
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_time_constant() {
        let mut p = EngineParams::default();
        p.tau_rise = 0.0;
        assert!(p.validate().is_err());

        let mut p = EngineParams::default();
        p.tau_decay = -1.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_inertia() {
        let mut p = EngineParams::default();
        p.inertia = 0.0;
        assert!(matches!(
            p.validate(),
            Err(ModelError::InvalidParameter { name: "inertia", .. })
        ));
    }

    #[test]
    fn rejects_nan() {
        let mut p = EngineParams::default();
        p.damping = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn named_access_covers_every_field() {
        let p = EngineParams::default();
        for name in EngineParams::FIELD_NAMES {
            assert!(p.get(name).is_some(), "missing getter for {name}");
        }
        assert!(p.get("unknown_field").is_none());
    }

    #[test]
    fn set_unknown_name_is_rejected() {
        let mut p = EngineParams::default();
        assert!(!p.set("adenosine_rate", 1.0));
        assert_eq!(p, EngineParams::default());
    }

    #[test]
    fn flat_json_round_trip() {
        let mut p = EngineParams::default();
        p.tau_rise = 18.25;
        p.phase = -0.4;

        let json = serde_json::to_string(&p).unwrap();
        let back: EngineParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn partial_record_falls_back_to_defaults() {
        let back: EngineParams = serde_json::from_str(r#"{"stiffness": 8.0}"#).unwrap();
        assert_eq!(back.stiffness, 8.0);
        assert_eq!(back.tau_rise, 17.0);
    }

    proptest! {
        #[test]
        fn wrap_phase_lands_in_half_open_interval(phi in -100.0f64..100.0) {
            let w = wrap_phase(phi);
            prop_assert!(w > -std::f64::consts::PI - 1e-12);
            prop_assert!(w <= std::f64::consts::PI + 1e-12);
        }

        #[test]
        fn wrap_phase_is_idempotent(phi in -100.0f64..100.0) {
            let once = wrap_phase(phi);
            let twice = wrap_phase(once);
            prop_assert!((once - twice).abs() < 1e-12);
        }
    }
}
