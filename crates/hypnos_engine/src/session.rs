//! Per-session simulation context.
//!
//! The hosting application owns one `Session` per user context; no
//! process-wide state exists anywhere in the core. Sessions are not
//! shared between users, so no locking is needed — isolation is by
//! construction.

use std::time::Duration;

use hypnos_core::{FeedbackSample, HypnosConfig, ModelError};

use crate::engine::Engine;

/// Maps wall-clock elapsed time onto simulated hours. Owned by the
/// caller; the engine itself never looks at a real clock.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    start_hour: f64,
    /// Simulated seconds per real second.
    time_scale: f64,
}

impl SimClock {
    pub fn new(start_hour: f64, time_scale: f64) -> Self {
        Self {
            start_hour,
            time_scale,
        }
    }

    /// Simulated time (hours) after `elapsed` of real time.
    pub fn sim_hours(&self, elapsed: Duration) -> f64 {
        self.start_hour + elapsed.as_secs_f64() * self.time_scale / 3600.0
    }
}

/// One user's engine plus accumulated feedback.
pub struct Session {
    engine: Engine,
    feedback: Vec<FeedbackSample>,
    feedback_window: usize,
}

impl Session {
    pub fn new(mut engine: Engine, start_hour: f64, feedback_window: usize) -> Self {
        engine.set_clock(start_hour);
        Self {
            engine,
            feedback: Vec::new(),
            feedback_window,
        }
    }

    /// Build a session from configuration (engine overrides applied).
    pub fn from_config(config: &HypnosConfig) -> Result<Self, ModelError> {
        let engine = Engine::new(Some(config.engine.resolve()))?;
        Ok(Self::new(
            engine,
            config.simulation.start_hour,
            config.simulation.feedback_window,
        ))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Step the engine up to `sim_hours` if it lies ahead of the
    /// clock. Returns whether a step was taken; stale or equal times
    /// are a no-op so the clock stays monotone.
    pub fn advance_to(&mut self, sim_hours: f64) -> Result<bool, ModelError> {
        let dt = sim_hours - self.engine.clock();
        if dt <= 0.0 {
            return Ok(false);
        }
        self.engine.step(dt)?;
        Ok(true)
    }

    /// Append one feedback sample (append-only sequence).
    pub fn record_feedback(&mut self, time: f64, score: f64) {
        self.feedback.push(FeedbackSample::new(time, score));
    }

    /// The full accumulated feedback history.
    pub fn feedback(&self) -> &[FeedbackSample] {
        &self.feedback
    }

    /// The most recent window handed to the calibrator.
    pub fn calibration_batch(&self) -> &[FeedbackSample] {
        let start = self.feedback.len().saturating_sub(self.feedback_window);
        &self.feedback[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Engine::new(None).unwrap(), 8.0, 5)
    }

    #[test]
    fn sim_clock_applies_scale_factor() {
        let clock = SimClock::new(8.0, 600.0);
        // 6 real seconds at 600x = one simulated hour.
        assert!((clock.sim_hours(Duration::from_secs(6)) - 9.0).abs() < 1e-9);
        assert_eq!(clock.sim_hours(Duration::ZERO), 8.0);
    }

    #[test]
    fn advance_is_monotone() {
        let mut s = session();
        assert!(s.advance_to(9.0).unwrap());
        assert!((s.engine().clock() - 9.0).abs() < 1e-12);

        // Stale timestamps never rewind the clock.
        assert!(!s.advance_to(8.5).unwrap());
        assert!(!s.advance_to(9.0).unwrap());
        assert!((s.engine().clock() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn calibration_batch_is_the_recent_window() {
        let mut s = session();
        for i in 0..8 {
            s.record_feedback(8.0 + i as f64, 0.1 * i as f64);
        }
        assert_eq!(s.feedback().len(), 8);
        let batch = s.calibration_batch();
        assert_eq!(batch.len(), 5);
        assert_eq!(batch[0].time(), 11.0);
        assert_eq!(batch[4].time(), 15.0);
    }

    #[test]
    fn batch_smaller_than_window_is_whole_history() {
        let mut s = session();
        s.record_feedback(8.0, 0.5);
        assert_eq!(s.calibration_batch().len(), 1);
    }

    #[test]
    fn from_config_honors_start_hour() {
        let s = Session::from_config(&HypnosConfig::default()).unwrap();
        assert_eq!(s.engine().clock(), 8.0);
    }
}
