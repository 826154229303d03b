//! Discrete life events and their parameter/state mutations.
//!
//! Every numeric constant in the mapping table is a fixed design
//! parameter preserved for behavioral compatibility: −30 and +25 base
//! impulses, 0.2/0.15 phase shifts, the 0.8/0.5 remapping exponents and
//! the 0.2–3.0 ratio bounds.

use chrono::{DateTime, Utc};
use hypnos_core::wrap_phase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::{Engine, StateAdjustment};

/// The event vocabulary understood by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SleepStart,
    SleepEnd,
    /// Physiological-signal update; value = current HRV (ms).
    HrvUpdate,
    /// Light exposure; value = intensity/duration. Takes effect only in
    /// the morning [6,10] or evening [18,23] window.
    Sunlight,
    /// Acute stressor; value = severity 0–10, default 5.
    StressEvent,
    /// Physical exercise; value = intensity 0–10, default 5.
    Exercise,
    /// Caffeine intake: scales sleep pressure down by 0.6.
    Caffeine,
    /// Meditation: zeroes velocity and raises damping by 2.0.
    Meditation,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::SleepStart => "sleep_start",
            EventKind::SleepEnd => "sleep_end",
            EventKind::HrvUpdate => "hrv_update",
            EventKind::Sunlight => "sunlight",
            EventKind::StressEvent => "stress_event",
            EventKind::Exercise => "exercise",
            EventKind::Caffeine => "caffeine",
            EventKind::Meditation => "meditation",
        };
        f.write_str(name)
    }
}

/// Unknown event name at the string boundary. The typed mapper itself
/// is total; only callers parsing free-form input can hit this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedEvent(pub String);

impl fmt::Display for UnrecognizedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized event kind `{}`", self.0)
    }
}

impl std::error::Error for UnrecognizedEvent {}

impl FromStr for EventKind {
    type Err = UnrecognizedEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "sleep_start" => EventKind::SleepStart,
            "sleep_end" => EventKind::SleepEnd,
            "hrv_update" => EventKind::HrvUpdate,
            "sunlight" => EventKind::Sunlight,
            "stress_event" => EventKind::StressEvent,
            "exercise" => EventKind::Exercise,
            "caffeine" => EventKind::Caffeine,
            "meditation" => EventKind::Meditation,
            other => {
                tracing::warn!(kind = other, "unrecognized event kind, treating as no-op");
                return Err(UnrecognizedEvent(other.to_string()));
            }
        };
        Ok(kind)
    }
}

/// Ephemeral record of an applied event, handed to logging
/// collaborators. Not retained by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: EventKind,
    /// Caller-supplied intensity/value, if any.
    pub value: Option<f64>,
    /// Impulse or scaling actually applied.
    pub amplitude: f64,
    /// Engine clock at application time (hours).
    pub sim_time: f64,
    pub recorded_at: DateTime<Utc>,
}

impl Engine {
    /// Apply a discrete event to the engine, mutating mode, state or
    /// parameters per the mapping table. Returns a record of what was
    /// applied.
    pub fn apply_event(&mut self, kind: EventKind, value: Option<f64>) -> EventRecord {
        let amplitude = match kind {
            EventKind::SleepStart => {
                self.mode = hypnos_core::SleepMode::Asleep;
                0.0
            }
            EventKind::SleepEnd => {
                self.mode = hypnos_core::SleepMode::Awake;
                0.0
            }
            EventKind::HrvUpdate => self.apply_hrv_update(value),
            EventKind::Sunlight => self.apply_sunlight(value),
            EventKind::StressEvent => self.apply_stress(value),
            EventKind::Exercise => self.apply_exercise(value),
            EventKind::Caffeine => {
                self.adjust(StateAdjustment::ScaleSleepPressure(0.6));
                -0.5
            }
            EventKind::Meditation => {
                self.adjust(StateAdjustment::SetVelocity(0.0));
                self.adjust(StateAdjustment::AddDamping(2.0));
                0.2
            }
        };

        tracing::debug!(%kind, value, amplitude, t = self.clock, "event applied");
        EventRecord {
            kind,
            value,
            amplitude,
            sim_time: self.clock,
            recorded_at: Utc::now(),
        }
    }

    /// HRV → oscillator coefficients. Diminishing-sensitivity power
    /// laws anchored on the construction-time reference record:
    /// k = k₀·ratio^0.8, c = c₀·ratio^0.5, ratio clamped to [0.2, 3.0].
    fn apply_hrv_update(&mut self, value: Option<f64>) -> f64 {
        let current = value.unwrap_or(self.params.base_hrv);
        let ratio = (current / self.params.base_hrv).clamp(0.2, 3.0);
        self.params.stiffness = self.defaults.stiffness * ratio.powf(0.8);
        self.params.damping = self.defaults.damping * ratio.powf(0.5);
        ratio
    }

    /// Light exposure shifts the circadian phase: morning light
    /// advances (+0.2·value), evening light delays (−0.15·value),
    /// midday light does nothing. Phase is renormalized afterwards.
    fn apply_sunlight(&mut self, value: Option<f64>) -> f64 {
        let intensity = value.unwrap_or(1.0);
        let hour = self.clock.rem_euclid(24.0);

        let shift = if (6.0..=10.0).contains(&hour) {
            0.2 * intensity
        } else if (18.0..=23.0).contains(&hour) {
            -0.15 * intensity
        } else {
            0.0
        };

        self.params.phase = wrap_phase(self.params.phase + shift);
        shift
    }

    /// Negative velocity impulse. Fatigue (high S) and low damping both
    /// amplify the shock.
    fn apply_stress(&mut self, value: Option<f64>) -> f64 {
        let severity = value.unwrap_or(5.0);
        let fatigue_factor = 1.0 + 0.5 * self.state.sleep_pressure;
        let neural_factor = 1.0 + (5.0 - self.params.damping) / 5.0;
        let impulse = -30.0 * (severity / 5.0) * fatigue_factor * neural_factor;
        self.adjust(StateAdjustment::AddVelocity(impulse));
        impulse
    }

    /// Positive velocity impulse with sublinear intensity scaling, plus
    /// a temporary damping boost capped at 1.5× the reference value.
    fn apply_exercise(&mut self, value: Option<f64>) -> f64 {
        let intensity = value.unwrap_or(5.0);
        let impulse = 25.0 * (intensity / 5.0).powf(0.7);
        self.adjust(StateAdjustment::AddVelocity(impulse));
        self.params.damping = (self.params.damping * 1.1).min(self.defaults.damping * 1.5);
        impulse
    }
}
