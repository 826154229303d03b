//! The simulation engine.
//!
//! Owns one parameter record, one state vector, the sleep mode and the
//! simulation clock. Advancing time integrates the coupled 3-variable
//! system (Process S + DRO, sharing only the time variable and the
//! mode flag); reading the mood composes circadian baseline and
//! reaction displacement without mutating anything.

use hypnos_core::{EngineParams, EngineState, ModelError, SleepMode};
use serde::{Deserialize, Serialize};

use crate::circadian::circadian_at;
use crate::homeostasis::sleep_pressure_derivative;
use crate::oscillator::reaction_derivatives;
use crate::solver::Solver;

/// Decomposed mood readout at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodReadout {
    /// baseline + reaction.
    pub total: f64,
    /// C(t) − circadian_gain·S + 0.5. The offset centers the baseline
    /// in the positive region for typical parameters.
    pub baseline: f64,
    /// Current oscillator displacement x.
    pub reaction: f64,
    /// Current sleep pressure S.
    pub sleep_pressure: f64,
}

/// Named direct-state operations for effects outside the event
/// vocabulary (caffeine, meditation, interpreter impulses). These
/// replace raw index mutation of the state vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateAdjustment {
    /// Multiply sleep pressure by a factor (caffeine uses 0.6).
    ScaleSleepPressure(f64),
    /// Add an instantaneous velocity impulse.
    AddVelocity(f64),
    /// Overwrite the velocity (meditation zeroes it).
    SetVelocity(f64),
    /// Shift the damping coefficient (meditation adds 2.0).
    AddDamping(f64),
}

pub struct Engine {
    pub(crate) params: EngineParams,
    /// Reference record captured at construction. Event mappings that
    /// rescale k/c (HRV, exercise cap) anchor on this, not on the
    /// current, possibly already-rescaled values.
    pub(crate) defaults: EngineParams,
    pub(crate) state: EngineState,
    pub(crate) mode: SleepMode,
    pub(crate) clock: f64,
    solver: Solver,
}

impl Engine {
    /// Construct with optional parameter overrides. Fails fast on an
    /// invalid record.
    pub fn new(params: Option<EngineParams>) -> Result<Self, ModelError> {
        let params = params.unwrap_or_default().validated()?;
        Ok(Self {
            defaults: params.clone(),
            params,
            state: EngineState::default(),
            mode: SleepMode::Awake,
            clock: 0.0,
            solver: Solver::default(),
        })
    }

    /// Construct with a non-default solver (tighter tolerances, or a
    /// reduced step budget for callers that prefer failing fast).
    pub fn with_solver(params: Option<EngineParams>, solver: Solver) -> Result<Self, ModelError> {
        let mut engine = Self::new(params)?;
        engine.solver = solver;
        Ok(engine)
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// The reference record event mappings rescale from.
    pub fn defaults(&self) -> &EngineParams {
        &self.defaults
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn mode(&self) -> SleepMode {
        self.mode
    }

    /// Simulation clock: hours, advanced only by successful steps.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Position the clock before the first step (session start hour).
    pub fn set_clock(&mut self, hours: f64) {
        self.clock = hours;
    }

    /// Adopt a new parameter record (calibration, persistence reload).
    /// An invalid record is rejected and the prior one retained.
    pub fn set_params(&mut self, params: EngineParams) -> Result<(), ModelError> {
        self.params = params.validated()?;
        Ok(())
    }

    /// Overwrite the state vector (persistence reload, tests).
    /// Non-finite components are reset to their resting defaults.
    pub fn set_state(&mut self, state: EngineState) {
        self.state = state;
        self.state.sanitize();
    }

    /// Integrate the system forward by `duration` hours.
    ///
    /// A non-positive duration is a no-op per caller discipline. On
    /// integration failure the state and clock are left unchanged so
    /// the caller can retry with a smaller span.
    pub fn step(&mut self, duration: f64) -> Result<(), ModelError> {
        if duration <= 0.0 {
            tracing::trace!(duration, "skipping non-positive step");
            return Ok(());
        }

        let params = &self.params;
        let mode = self.mode;
        let derivatives = |t: f64, y: [f64; 3]| -> [f64; 3] {
            let c_t = circadian_at(params, t);
            let ds = sleep_pressure_derivative(y[0], mode, params, c_t);
            let (dx, dv) = reaction_derivatives(y[1], y[2], params);
            [ds, dx, dv]
        };

        let t0 = self.clock;
        let sol = self
            .solver
            .integrate(derivatives, t0, t0 + duration, self.state.to_array())?;
        tracing::trace!(
            steps = sol.steps,
            max_error = sol.max_error,
            t0,
            duration,
            "integration step accepted"
        );

        self.state = EngineState::from_array(sol.y);
        self.state.sanitize();
        self.clock = t0 + duration;
        Ok(())
    }

    /// Pure mood readout at simulation time `t`.
    ///
    /// Callable at any t (retrospective scoring against feedback
    /// timestamps included); no time-consistency check is performed.
    pub fn mood(&self, t: f64) -> MoodReadout {
        let c_t = circadian_at(&self.params, t);
        let s = self.state.sleep_pressure;
        let baseline = c_t - self.params.circadian_gain * s + 0.5;
        MoodReadout {
            total: baseline + self.state.displacement,
            baseline,
            reaction: self.state.displacement,
            sleep_pressure: s,
        }
    }

    /// Apply a named direct-state operation.
    pub fn adjust(&mut self, adjustment: StateAdjustment) {
        match adjustment {
            StateAdjustment::ScaleSleepPressure(factor) => {
                self.state.sleep_pressure *= factor;
            }
            StateAdjustment::AddVelocity(impulse) => {
                self.state.velocity += impulse;
            }
            StateAdjustment::SetVelocity(v) => {
                self.state.velocity = v;
            }
            StateAdjustment::AddDamping(dc) => {
                self.params.damping += dc;
            }
        }
        self.state.sanitize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    fn engine() -> Engine {
        Engine::new(None).unwrap()
    }

    #[test]
    fn construction_fails_fast_on_invalid_constants() {
        let mut p = EngineParams::default();
        p.inertia = -1.0;
        assert!(Engine::new(Some(p)).is_err());
    }

    #[test]
    fn non_positive_step_is_a_noop() {
        let mut e = engine();
        let before = e.state();
        e.step(0.0).unwrap();
        e.step(-1.0).unwrap();
        assert_eq!(e.state(), before);
        assert_eq!(e.clock(), 0.0);
    }

    #[test]
    fn failed_integration_leaves_state_and_clock_untouched() {
        // Zero tolerances make every scaled error estimate non-finite,
        // so the very first step is rejected.
        let mut e = Engine::with_solver(None, Solver::with_tolerances(0.0, 0.0)).unwrap();
        e.set_clock(8.0);
        e.set_state(EngineState {
            displacement: 0.7,
            velocity: -1.0,
            ..EngineState::default()
        });
        let before = e.state();

        assert!(matches!(
            e.step(3.0),
            Err(ModelError::IntegrationFailure { .. })
        ));
        assert_eq!(e.state(), before);
        assert_eq!(e.clock(), 8.0);
    }

    #[test]
    fn clock_advances_by_exact_duration() {
        let mut e = engine();
        e.set_clock(8.0);
        e.step(1.5).unwrap();
        assert!((e.clock() - 9.5).abs() < 1e-12);
    }

    #[test]
    fn awake_sleep_pressure_follows_exponential_approach() {
        // Awake Process S is uncoupled from C, so the closed form
        // S(t) = 1 − (1 − S₀)·e^{−t/τ} is exact.
        let mut e = engine();
        e.step(10.0).unwrap();
        let s = e.state().sleep_pressure;
        let exact = 1.0 - 0.9 * (-10.0f64 / 17.0).exp();
        assert!((s - exact).abs() < 1e-6, "S = {s}, want {exact}");
        assert!(s > 0.1 && s < 0.63);
    }

    #[test]
    fn asleep_sleep_pressure_decreases() {
        let mut e = engine();
        e.step(10.0).unwrap();
        let awake_s = e.state().sleep_pressure;

        e.apply_event(EventKind::SleepStart, None);
        e.step(4.0).unwrap();
        assert!(e.state().sleep_pressure < awake_s);
        assert!(e.state().sleep_pressure > 0.0);
    }

    #[test]
    fn underdamped_reaction_matches_analytic_solution() {
        // k = 12, c = 3.5, m = 1, x₀ = 1, v₀ = 0:
        // x(t) = e^{−γt}(cos ω_d t + (γ/ω_d)·sin ω_d t),
        // γ = c/2m, ω_d = √(k/m − γ²).
        let mut e = engine();
        e.set_state(EngineState {
            displacement: 1.0,
            ..EngineState::default()
        });

        let t = 2.0;
        e.step(t).unwrap();

        let gamma = 3.5 / 2.0;
        let omega_d = (12.0f64 - gamma * gamma).sqrt();
        let exact = (-gamma * t).exp() * ((omega_d * t).cos() + gamma / omega_d * (omega_d * t).sin());

        let x = e.state().displacement;
        assert!(
            (x - exact).abs() < 1e-4,
            "x({t}) = {x}, analytic {exact}"
        );
    }

    #[test]
    fn unforced_reaction_decays_to_rest() {
        let mut e = engine();
        e.set_state(EngineState {
            displacement: 1.0,
            velocity: -2.0,
            ..EngineState::default()
        });
        e.step(50.0).unwrap();
        assert!(e.state().displacement.abs() < 1e-3);
        assert!(e.state().velocity.abs() < 1e-3);
    }

    #[test]
    fn mood_readout_is_idempotent() {
        let mut e = engine();
        e.step(3.0).unwrap();
        let a = e.mood(3.0);
        let b = e.mood(3.0);
        let c = e.mood(3.0);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn mood_composition_holds() {
        let mut e = engine();
        e.set_state(EngineState {
            displacement: 0.25,
            ..EngineState::default()
        });
        let m = e.mood(14.0);
        assert!((m.total - (m.baseline + m.reaction)).abs() < 1e-12);
        assert_eq!(m.reaction, 0.25);
    }

    #[test]
    fn set_params_rejects_and_retains() {
        let mut e = engine();
        let before = e.params().clone();
        let mut bad = before.clone();
        bad.tau_decay = 0.0;
        assert!(e.set_params(bad).is_err());
        assert_eq!(e.params(), &before);
    }

    #[test]
    fn params_round_trip_reproduces_mood() {
        let mut e = engine();
        e.apply_event(EventKind::Sunlight, Some(1.0));
        e.step(2.0).unwrap();

        let json = serde_json::to_string(e.params()).unwrap();
        let restored: EngineParams = serde_json::from_str(&json).unwrap();

        let mut e2 = Engine::new(Some(restored)).unwrap();
        e2.set_state(e.state());
        e2.set_clock(e.clock());

        for t in [0.0, 2.0, 13.5, 26.0] {
            assert_eq!(e.mood(t), e2.mood(t));
        }
    }

    #[test]
    fn named_adjustments_have_reference_effects() {
        let mut e = engine();
        e.set_state(EngineState {
            sleep_pressure: 0.5,
            velocity: 3.0,
            ..EngineState::default()
        });

        // Caffeine: pressure scaled by 0.6.
        e.adjust(StateAdjustment::ScaleSleepPressure(0.6));
        assert!((e.state().sleep_pressure - 0.3).abs() < 1e-12);

        // Meditation: velocity zeroed, damping raised by 2.0.
        let c0 = e.params().damping;
        e.adjust(StateAdjustment::SetVelocity(0.0));
        e.adjust(StateAdjustment::AddDamping(2.0));
        assert_eq!(e.state().velocity, 0.0);
        assert!((e.params().damping - (c0 + 2.0)).abs() < 1e-12);
    }
}
