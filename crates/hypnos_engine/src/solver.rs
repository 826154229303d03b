//! Adaptive Dormand–Prince 5(4) integrator for the 3-variable system.
//!
//! Classic embedded Runge–Kutta pair: the 5th-order solution advances
//! the state, the 4th-order one supplies the local error estimate used
//! for step-size control. Step count is bounded; exhausting the budget
//! (or collapsing below the minimum step) reports an integration
//! failure and leaves the caller's state untouched.

use hypnos_core::ModelError;

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

/// 5th-order weights (also the last tableau row).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

/// Embedded 4th-order weights.
const E1: f64 = 5179.0 / 57600.0;
const E3: f64 = 7571.0 / 16695.0;
const E4: f64 = 393.0 / 640.0;
const E5: f64 = -92097.0 / 339200.0;
const E6: f64 = 187.0 / 2100.0;
const E7: f64 = 1.0 / 40.0;

/// Smallest step before the integration is declared stuck.
const MIN_STEP: f64 = 1e-12;

/// Final state of a successful integration, plus solver diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct Solution {
    /// Solution value at the end of the span.
    pub y: [f64; 3],
    /// Accepted steps taken.
    pub steps: usize,
    /// Largest scaled local error among accepted steps (≤ 1 by
    /// construction).
    pub max_error: f64,
}

/// Adaptive explicit RK45 solver.
#[derive(Debug, Clone, Copy)]
pub struct Solver {
    rtol: f64,
    atol: f64,
    max_steps: usize,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-8,
            max_steps: 100_000,
        }
    }
}

impl Solver {
    pub fn with_tolerances(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            ..Self::default()
        }
    }

    /// Integrate dy/dt = f(t, y) over [t0, t1] from `y0`.
    ///
    /// A non-positive span returns `y0` unchanged with zero steps.
    pub fn integrate<F>(&self, f: F, t0: f64, t1: f64, y0: [f64; 3]) -> Result<Solution, ModelError>
    where
        F: Fn(f64, [f64; 3]) -> [f64; 3],
    {
        if t1 <= t0 {
            return Ok(Solution {
                y: y0,
                steps: 0,
                max_error: 0.0,
            });
        }

        let span = t1 - t0;
        let mut t = t0;
        let mut y = y0;
        let mut h = (span / 100.0).clamp(MIN_STEP * 10.0, 0.5);
        let mut steps = 0usize;
        let mut max_error = 0.0f64;

        while t < t1 {
            if steps >= self.max_steps {
                return Err(ModelError::IntegrationFailure { t, steps });
            }
            h = h.min(t1 - t);
            if h < MIN_STEP {
                return Err(ModelError::IntegrationFailure { t, steps });
            }

            let k1 = f(t, y);
            let k2 = f(t + C2 * h, add(y, scale(h, [(A21, k1)])));
            let k3 = f(t + C3 * h, add(y, scale(h, [(A31, k1), (A32, k2)])));
            let k4 = f(t + C4 * h, add(y, scale(h, [(A41, k1), (A42, k2), (A43, k3)])));
            let k5 = f(
                t + C5 * h,
                add(y, scale(h, [(A51, k1), (A52, k2), (A53, k3), (A54, k4)])),
            );
            let k6 = f(
                t + h,
                add(
                    y,
                    scale(h, [(A61, k1), (A62, k2), (A63, k3), (A64, k4), (A65, k5)]),
                ),
            );

            // 5th-order candidate (B2 = B7 = 0).
            let y5 = add(y, scale(h, [(B1, k1), (B3, k3), (B4, k4), (B5, k5), (B6, k6)]));
            let k7 = f(t + h, y5);

            // Embedded 4th-order candidate for the error estimate.
            let y4 = add(
                y,
                scale(
                    h,
                    [(E1, k1), (E3, k3), (E4, k4), (E5, k5), (E6, k6), (E7, k7)],
                ),
            );

            let mut err_sq = 0.0;
            for i in 0..3 {
                let tol = self.atol + self.rtol * y[i].abs().max(y5[i].abs());
                let e = (y5[i] - y4[i]) / tol;
                err_sq += e * e;
            }
            let err = (err_sq / 3.0).sqrt();

            if !err.is_finite() {
                return Err(ModelError::IntegrationFailure { t, steps });
            }

            if err <= 1.0 {
                t += h;
                y = y5;
                steps += 1;
                max_error = max_error.max(err);
            }

            // PI-free step control: h ← h · 0.9 · err^(−1/5), bounded.
            let factor = if err > 0.0 {
                (0.9 * err.powf(-0.2)).clamp(0.2, 5.0)
            } else {
                5.0
            };
            h *= factor;
        }

        Ok(Solution {
            y,
            steps,
            max_error,
        })
    }
}

#[inline]
fn add(y: [f64; 3], dy: [f64; 3]) -> [f64; 3] {
    [y[0] + dy[0], y[1] + dy[1], y[2] + dy[2]]
}

/// h · Σ aᵢ·kᵢ over a small stage list.
#[inline]
fn scale<const N: usize>(h: f64, stages: [(f64, [f64; 3]); N]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (a, k) in stages {
        for i in 0..3 {
            out[i] += a * k[i];
        }
    }
    [h * out[0], h * out[1], h * out[2]]
}
