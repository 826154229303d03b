//! Feedback-driven parameter calibration.
//!
//! Fits {τ_rise, stiffness k, damping c} to a short history of
//! (time, self-reported score) pairs by bounded nonlinear least
//! squares. The prediction for each sample uses a scratch engine seeded
//! with the candidate parameters and the caller's *current* state — a
//! deliberate simplification inherited from the reference model: the
//! event history is not replayed, so calibration fits the readout
//! function rather than the full trajectory.
//!
//! The search itself is a Nelder–Mead simplex projected onto the
//! bounding box. Fewer than three samples, or a search that fails to
//! converge, returns the input parameters unchanged.

use hypnos_core::{EngineParams, FeedbackSample};
use hypnos_engine::Engine;

/// Search box: τ_rise ∈ [15, 22], k ∈ [2, 30], c ∈ [0.5, 10].
pub const BOUNDS: [(f64, f64); 3] = [(15.0, 22.0), (2.0, 30.0), (0.5, 10.0)];

const MAX_ITERS: usize = 300;
/// Simplex is considered converged when the objective spread across
/// its vertices falls below this.
const F_TOL: f64 = 1e-10;

/// Fit {τ_rise, k, c} to the feedback history.
///
/// Returns a copy of the engine's parameters with the three fitted
/// fields overwritten, or an unchanged copy when there is nothing to
/// fit (< 3 samples) or the search does not converge. Never mutates
/// the engine or its parameter record.
pub fn optimize_parameters(engine: &Engine, feedback: &[FeedbackSample]) -> EngineParams {
    let current = engine.params().clone();
    if feedback.len() < 3 {
        return current;
    }

    let objective = |x: &[f64; 3]| residual_sum(engine, &current, x, feedback);

    let x0 = project([current.tau_rise, current.stiffness, current.damping]);
    match nelder_mead(&objective, x0) {
        Some(best) => {
            let mut fitted = current;
            fitted.tau_rise = best[0];
            fitted.stiffness = best[1];
            fitted.damping = best[2];
            tracing::debug!(
                tau_rise = fitted.tau_rise,
                stiffness = fitted.stiffness,
                damping = fitted.damping,
                samples = feedback.len(),
                "calibration converged"
            );
            fitted
        }
        None => {
            tracing::warn!("calibration did not converge, keeping prior parameters");
            current
        }
    }
}

/// Σ (clamp(mood_pred(tᵢ)/2, −1, 1) − scoreᵢ)². The /2 normalizes the
/// model's nominal [−2, 2] output onto the score scale.
fn residual_sum(
    engine: &Engine,
    base: &EngineParams,
    x: &[f64; 3],
    feedback: &[FeedbackSample],
) -> f64 {
    let mut candidate = base.clone();
    candidate.tau_rise = x[0];
    candidate.stiffness = x[1];
    candidate.damping = x[2];

    // In-box candidates are always valid records; a failure here means
    // the base record was degenerate, which the search cannot fix.
    let mut scratch = match Engine::new(Some(candidate)) {
        Ok(e) => e,
        Err(_) => return f64::INFINITY,
    };
    scratch.set_state(engine.state());
    scratch.set_clock(engine.clock());

    feedback
        .iter()
        .map(|sample| {
            let pred = scratch.mood(sample.time()).total;
            let normalized = (pred / 2.0).clamp(-1.0, 1.0);
            let r = normalized - sample.score();
            r * r
        })
        .sum()
}

/// Clamp a point into the search box.
fn project(mut x: [f64; 3]) -> [f64; 3] {
    for i in 0..3 {
        x[i] = x[i].clamp(BOUNDS[i].0, BOUNDS[i].1);
    }
    x
}

/// Nelder–Mead on the projected box. Returns the best vertex on
/// convergence, `None` if the iteration budget runs out first.
fn nelder_mead<F>(f: &F, x0: [f64; 3]) -> Option<[f64; 3]>
where
    F: Fn(&[f64; 3]) -> f64,
{
    // Initial simplex: x0 plus one vertex per axis, displaced by 10%
    // of the box span (flipped inward at the upper bound).
    let mut simplex: Vec<([f64; 3], f64)> = Vec::with_capacity(4);
    simplex.push((x0, f(&x0)));
    for i in 0..3 {
        let span = BOUNDS[i].1 - BOUNDS[i].0;
        let mut v = x0;
        let step = 0.1 * span;
        v[i] = if v[i] + step <= BOUNDS[i].1 {
            v[i] + step
        } else {
            v[i] - step
        };
        simplex.push((v, f(&v)));
    }

    for _ in 0..MAX_ITERS {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (best, worst) = (simplex[0].1, simplex[3].1);
        if (worst - best).abs() < F_TOL {
            return Some(simplex[0].0);
        }

        // Centroid of all but the worst vertex.
        let mut centroid = [0.0; 3];
        for (v, _) in &simplex[..3] {
            for i in 0..3 {
                centroid[i] += v[i] / 3.0;
            }
        }

        let reflect = |scale: f64| -> [f64; 3] {
            let mut p = [0.0; 3];
            for i in 0..3 {
                p[i] = centroid[i] + scale * (centroid[i] - simplex[3].0[i]);
            }
            project(p)
        };

        let xr = reflect(1.0);
        let fr = f(&xr);

        if fr < simplex[0].1 {
            // Try expanding past the reflection.
            let xe = reflect(2.0);
            let fe = f(&xe);
            simplex[3] = if fe < fr { (xe, fe) } else { (xr, fr) };
        } else if fr < simplex[2].1 {
            simplex[3] = (xr, fr);
        } else {
            // Contract toward the centroid.
            let xc = reflect(-0.5);
            let fc = f(&xc);
            if fc < simplex[3].1 {
                simplex[3] = (xc, fc);
            } else {
                // Shrink everything toward the best vertex.
                let best_v = simplex[0].0;
                for entry in simplex.iter_mut().skip(1) {
                    let mut v = [0.0; 3];
                    for i in 0..3 {
                        v[i] = best_v[i] + 0.5 * (entry.0[i] - best_v[i]);
                    }
                    let v = project(v);
                    *entry = (v, f(&v));
                }
            }
        }
    }

    None
}
