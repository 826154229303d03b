//! User feedback samples consumed by the calibrator.

use serde::{Deserialize, Serialize};

/// Immutable pair of simulation time and self-reported mood score.
///
/// Samples accumulate in an append-only sequence per session; the
/// calibrator consumes the most recent window in one batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSample {
    time: f64,
    score: f64,
}

impl FeedbackSample {
    /// Construct a sample, clamping the score into [−1, 1].
    /// A non-finite score collapses to neutral 0.
    pub fn new(time: f64, score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            tracing::warn!("non-finite feedback score, recording neutral 0");
            0.0
        };
        Self { time, score }
    }

    /// Simulation time (hours) the report refers to.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Reported mood score in [−1, 1].
    pub fn score(&self) -> f64 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_clamped() {
        assert_eq!(FeedbackSample::new(1.0, 3.0).score(), 1.0);
        assert_eq!(FeedbackSample::new(1.0, -7.5).score(), -1.0);
        assert_eq!(FeedbackSample::new(1.0, 0.25).score(), 0.25);
    }

    #[test]
    fn non_finite_score_becomes_neutral() {
        assert_eq!(FeedbackSample::new(1.0, f64::NAN).score(), 0.0);
    }
}
