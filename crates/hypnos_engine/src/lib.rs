//! Hypnos simulation engine.
//!
//! A two-process physiological mood model: sleep-pressure homeostasis
//! (Process S) and a circadian rhythm (Process C) set a slow-moving
//! baseline, while a damped second-order oscillator carries transient
//! reactions to discrete life events. The engine integrates the coupled
//! system with an adaptive RK45 solver and recalibrates itself from
//! sparse user feedback (see `hypnos_calibrate`).

pub mod circadian;
pub mod diagnosis;
pub mod engine;
pub mod events;
pub mod homeostasis;
pub mod interpreter;
pub mod oscillator;
pub mod session;
pub mod solver;

pub use diagnosis::Diagnosis;
pub use engine::{Engine, MoodReadout, StateAdjustment};
pub use events::{EventKind, EventRecord, UnrecognizedEvent};
pub use interpreter::{AppliedAnalysis, EventAnalysis};
pub use oscillator::DampingRegime;
pub use session::{Session, SimClock};
pub use solver::{Solution, Solver};
