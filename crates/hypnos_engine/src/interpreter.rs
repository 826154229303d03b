//! Boundary with the external free-text event interpreter.
//!
//! The interpreter (an LLM service invoked by the hosting application,
//! never by the core) returns structured impact estimates for events
//! the fixed vocabulary cannot express. Its output is untrusted data:
//! names are validated against the parameter record, values must be
//! numeric, and everything else is silently discarded. A failed or
//! absent analysis degrades to a neutral default instead of reaching
//! simulation state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::engine::{Engine, StateAdjustment};

/// Structured impact analysis handed over by the interpreter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventAnalysis {
    /// Velocity impulse to apply.
    pub amplitude: f64,
    /// Estimated effect duration in hours (informational; the decay is
    /// governed by the oscillator, not by this value).
    pub duration: f64,
    /// Proposed parameter overrides, keyed by parameter name.
    pub parameters: BTreeMap<String, Value>,
    /// Free-text rationale, for display only.
    pub explanation: String,
}

impl EventAnalysis {
    /// Neutral analysis used when the interpreter fails or returns
    /// nothing usable.
    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Outcome of applying an analysis, for caller-side logging.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedAnalysis {
    pub amplitude: f64,
    /// Parameter names that were accepted.
    pub accepted: Vec<String>,
    /// Parameter names that were discarded (unknown or non-numeric).
    pub discarded: Vec<String>,
}

impl Engine {
    /// Apply an interpreter analysis: amplitude as a velocity impulse,
    /// then each recognized numeric parameter override. An analysis
    /// whose overrides would leave the record invalid is rolled back
    /// entirely (the impulse still stands — it cannot invalidate
    /// anything).
    ///
    /// Passing `None` models interpreter failure and applies the
    /// neutral default.
    pub fn apply_analysis(&mut self, analysis: Option<EventAnalysis>) -> AppliedAnalysis {
        let analysis = analysis.unwrap_or_else(|| {
            tracing::warn!("interpreter returned no usable analysis, applying neutral default");
            EventAnalysis::neutral()
        });

        if analysis.amplitude != 0.0 {
            self.adjust(StateAdjustment::AddVelocity(analysis.amplitude));
        }

        let mut accepted = Vec::new();
        let mut discarded = Vec::new();
        let mut candidate = self.params.clone();

        for (name, value) in &analysis.parameters {
            match value.as_f64() {
                Some(v) if candidate.set(name, v) => accepted.push(name.clone()),
                _ => {
                    tracing::warn!(name = %name, "discarding interpreter parameter");
                    discarded.push(name.clone());
                }
            }
        }

        if !accepted.is_empty() {
            match self.set_params(candidate) {
                Ok(()) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "interpreter overrides rejected, keeping prior parameters");
                    discarded.append(&mut accepted);
                }
            }
        }

        AppliedAnalysis {
            amplitude: analysis.amplitude,
            accepted,
            discarded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> Engine {
        Engine::new(None).unwrap()
    }

    fn analysis_with(params: &[(&str, Value)]) -> EventAnalysis {
        EventAnalysis {
            amplitude: 0.0,
            duration: 1.0,
            parameters: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            explanation: String::new(),
        }
    }

    #[test]
    fn amplitude_becomes_velocity_impulse() {
        let mut e = engine();
        e.apply_analysis(Some(EventAnalysis {
            amplitude: -2.0,
            ..EventAnalysis::neutral()
        }));
        assert_eq!(e.state().velocity, -2.0);
    }

    #[test]
    fn missing_analysis_is_neutral() {
        let mut e = engine();
        let before = (e.state(), e.params().clone());
        let outcome = e.apply_analysis(None);
        assert_eq!(outcome.amplitude, 0.0);
        assert_eq!(e.state(), before.0);
        assert_eq!(e.params(), &before.1);
    }

    #[test]
    fn recognized_numeric_overrides_are_applied() {
        let mut e = engine();
        let outcome = e.apply_analysis(Some(analysis_with(&[("stiffness", json!(9.0))])));
        assert_eq!(outcome.accepted, vec!["stiffness".to_string()]);
        assert_eq!(e.params().stiffness, 9.0);
    }

    #[test]
    fn unknown_names_are_silently_discarded() {
        let mut e = engine();
        let outcome = e.apply_analysis(Some(analysis_with(&[
            ("cortisol_level", json!(3.0)),
            ("damping", json!(4.0)),
        ])));
        assert_eq!(outcome.accepted, vec!["damping".to_string()]);
        assert_eq!(outcome.discarded, vec!["cortisol_level".to_string()]);
        assert_eq!(e.params().damping, 4.0);
    }

    #[test]
    fn non_numeric_values_are_discarded() {
        let mut e = engine();
        let outcome = e.apply_analysis(Some(analysis_with(&[("stiffness", json!("high"))])));
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.discarded, vec!["stiffness".to_string()]);
        assert_eq!(e.params().stiffness, 12.0);
    }

    #[test]
    fn invalidating_overrides_are_rolled_back() {
        let mut e = engine();
        let before = e.params().clone();
        let outcome = e.apply_analysis(Some(analysis_with(&[
            ("tau_rise", json!(-1.0)),
            ("damping", json!(4.0)),
        ])));
        // Both names are known and numeric, but the batch leaves the
        // record invalid, so nothing sticks.
        assert!(outcome.accepted.is_empty());
        assert_eq!(e.params(), &before);
    }

    #[test]
    fn payload_deserializes_from_interpreter_json() {
        let payload = r#"{
            "amplitude": -1.5,
            "duration": 2.0,
            "parameters": {"damping": 5.0},
            "explanation": "argument with a colleague"
        }"#;
        let analysis: EventAnalysis = serde_json::from_str(payload).unwrap();
        assert_eq!(analysis.amplitude, -1.5);
        assert_eq!(analysis.parameters["damping"], json!(5.0));
    }
}
