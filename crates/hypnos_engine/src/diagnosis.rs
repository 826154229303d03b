//! Rule-based diagnosis of the current state.
//!
//! A thin pattern-matching layer over (k, c, m, S, x, v). Rules are
//! evaluated independently, not mutually exclusively, and their
//! evaluation order defines the display order.

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::oscillator::DampingRegime;

/// Advisory strings plus compact state tags for UI badges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub advice: Vec<String>,
    pub tags: Vec<String>,
}

impl Diagnosis {
    fn push(&mut self, tag: &str, lines: &[&str]) {
        self.tags.push(tag.to_string());
        for line in lines {
            self.advice.push(line.to_string());
        }
    }
}

impl Engine {
    /// Map the current state and parameters to advisory text.
    pub fn diagnosis(&self) -> Diagnosis {
        let mut out = Diagnosis::default();
        let params = self.params();
        let state = self.state();
        let s = state.sleep_pressure;
        let x = state.displacement;
        let v = state.velocity;

        // 1. Damping regime.
        match DampingRegime::classify(params) {
            DampingRegime::Underdamped => {
                out.push(
                    "underdamped",
                    &["Emotionally reactive right now: small events can set off visible swings."],
                );
                if params.damping < 1.0 {
                    out.advice.push(
                        "Try breathing exercises or a quiet environment to add damping before the next stressor."
                            .to_string(),
                    );
                }
            }
            DampingRegime::Overdamped => {
                out.push(
                    "overdamped",
                    &[
                        "Emotionally flat and slow to respond.",
                        "Vigorous exercise or strong sensory input can restore responsiveness.",
                    ],
                );
            }
        }

        // 2. Sleep pressure.
        if s > 0.8 {
            out.push(
                "severe-fatigue",
                &[
                    "Severe sleep debt: cognition and mood regulation are impaired.",
                    "A 20-minute nap in a dark, quiet place is the fastest recovery available.",
                ],
            );
        } else if s > 0.5 {
            out.push(
                "fatigue",
                &[
                    "Moderate sleep pressure building up.",
                    "Plan a short rest and avoid high-stakes work until it drops.",
                ],
            );
        }

        // 3. Negative displacement, in order of severity.
        if x < -0.8 {
            out.push(
                "deep-rumination",
                &[
                    "Stuck in a strong negative loop.",
                    "High-intensity exercise or reaching out to someone you trust are the strongest resets.",
                ],
            );
        } else if x < -0.5 {
            out.push(
                "rumination",
                &[
                    "Mood is markedly below baseline.",
                    "A change of environment or 20 minutes of moderate exercise should shorten the episode.",
                ],
            );
        } else if x < -0.2 {
            out.push(
                "mild-negative",
                &["Mood is slightly low; a pleasant activity or short walk is usually enough."],
            );
        }

        // 4. Positive displacement.
        if x > 0.5 {
            out.push(
                "positive",
                &["Mood is elevated: a good window for creative work, learning or social plans."],
            );
        }

        // 5. Velocity.
        if v > 1.0 {
            out.push(
                "volatile",
                &[
                    "Mood is changing fast.",
                    "Defer big decisions until it settles.",
                ],
            );
        } else if v.abs() < 0.1 {
            out.push(
                "steady",
                &["Mood is stable; keep the current rhythm."],
            );
        }

        out
    }
}
