//! Simulator configuration.
//!
//! TOML file with defaults for every field, then environment-variable
//! overrides on top. Missing file is not an error for
//! `load_or_default`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::params::EngineParams;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HypnosConfig {
    pub simulation: SimulationConfig,
    pub engine: EngineOverrides,
}

impl HypnosConfig {
    /// Load config from a TOML file, falling back to defaults for
    /// missing fields, then apply env var overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file: {}", path.as_ref().display()))?;
        let mut config: HypnosConfig =
            toml::from_str(&content).with_context(|| "failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file doesn't exist or is invalid,
    /// return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("HYPNOS_TIME_SCALE") {
            if let Ok(n) = v.parse() {
                self.simulation.time_scale = n;
            }
        }
        if let Ok(v) = std::env::var("HYPNOS_START_HOUR") {
            if let Ok(n) = v.parse() {
                self.simulation.start_hour = n;
            }
        }
        if let Ok(v) = std::env::var("HYPNOS_FEEDBACK_WINDOW") {
            if let Ok(n) = v.parse() {
                self.simulation.feedback_window = n;
            }
        }
    }
}

/// How the hosting loop maps wall-clock time onto simulated hours.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per real second. 600 = one real second is ten
    /// simulated minutes.
    pub time_scale: f64,

    /// Simulation clock value at session start (hour of day).
    pub start_hour: f64,

    /// Polling cadence of the driving loop, in real seconds.
    pub tick_seconds: f64,

    /// How many of the most recent feedback samples a calibration
    /// batch consumes.
    pub feedback_window: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 600.0,
            start_hour: 8.0,
            tick_seconds: 5.0,
            feedback_window: 5,
        }
    }
}

impl SimulationConfig {
    /// Simulated minutes covered by one polling tick: `tick_seconds`
    /// of real time under `time_scale`. The reference cadence (5 s at
    /// 600x) works out to 50 simulated minutes.
    pub fn tick_minutes(&self) -> f64 {
        self.tick_seconds * self.time_scale / 60.0
    }
}

/// Optional per-user parameter overrides layered over the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineOverrides {
    pub tau_rise: Option<f64>,
    pub tau_decay: Option<f64>,
    pub circadian_gain: Option<f64>,
    pub circadian_amplitude: Option<f64>,
    pub stiffness: Option<f64>,
    pub damping: Option<f64>,
    pub inertia: Option<f64>,
    pub phase: Option<f64>,
    pub base_hrv: Option<f64>,
    pub stress_sensitivity: Option<f64>,
}

impl EngineOverrides {
    /// Produce a parameter record with these overrides applied.
    pub fn resolve(&self) -> EngineParams {
        let mut p = EngineParams::default();
        if let Some(v) = self.tau_rise {
            p.tau_rise = v;
        }
        if let Some(v) = self.tau_decay {
            p.tau_decay = v;
        }
        if let Some(v) = self.circadian_gain {
            p.circadian_gain = v;
        }
        if let Some(v) = self.circadian_amplitude {
            p.circadian_amplitude = v;
        }
        if let Some(v) = self.stiffness {
            p.stiffness = v;
        }
        if let Some(v) = self.damping {
            p.damping = v;
        }
        if let Some(v) = self.inertia {
            p.inertia = v;
        }
        if let Some(v) = self.phase {
            p.phase = v;
        }
        if let Some(v) = self.base_hrv {
            p.base_hrv = v;
        }
        if let Some(v) = self.stress_sensitivity {
            p.stress_sensitivity = v;
        }
        p
    }
}
