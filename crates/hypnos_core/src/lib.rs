//! Shared types for the Hypnos mood physiology simulator.
//!
//! The engine itself lives in `hypnos_engine`; this crate holds the
//! parameter record, state vector, feedback samples, error taxonomy
//! and configuration that every other crate agrees on.

pub mod config;
pub mod error;
pub mod feedback;
pub mod params;
pub mod state;

pub use config::{EngineOverrides, HypnosConfig, SimulationConfig};
pub use error::ModelError;
pub use feedback::FeedbackSample;
pub use params::{wrap_phase, EngineParams};
pub use state::{EngineState, SleepMode};
