use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hypnos_calibrate::optimize_parameters;
use hypnos_core::{EngineParams, HypnosConfig};
use hypnos_engine::{Engine, EventKind, Session};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "hypnos.toml", env = "HYPNOS_CONFIG")]
    config: String,

    /// Simulated hours to run
    #[arg(long, default_value_t = 24.0)]
    hours: f64,

    /// Readout interval in simulated minutes. Defaults to one polling
    /// tick of the configured cadence (`tick_seconds` × `time_scale`).
    #[arg(long)]
    interval: Option<f64>,

    /// JSON-lines schedule of events and feedback (see `Entry`)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Flat JSON parameter record: loaded at start if present, written
    /// back after calibration
    #[arg(long)]
    params_file: Option<PathBuf>,
}

/// One scheduled line of the simulation script. Either an event
/// (`kind` + optional `value`) or a feedback report (`feedback`).
#[derive(Debug, Deserialize)]
struct Entry {
    /// Simulated hour at which the entry fires.
    at: f64,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    feedback: Option<f64>,
}

fn load_schedule(path: &PathBuf) -> Result<Vec<Entry>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut entries = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry: Entry = serde_json::from_str(line)
            .with_context(|| format!("bad schedule entry at line {}", lineno + 1))?;
        entries.push(entry);
    }
    entries.sort_by(|a, b| a.at.total_cmp(&b.at));
    Ok(entries)
}

fn load_params(path: &PathBuf) -> Result<Option<EngineParams>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let params: EngineParams =
        serde_json::from_str(&content).with_context(|| "failed to parse parameter record")?;
    Ok(Some(params))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = HypnosConfig::load_or_default(&args.config);
    info!(
        time_scale = config.simulation.time_scale,
        start_hour = config.simulation.start_hour,
        "starting simulation"
    );

    // Persisted parameters take precedence over config overrides.
    let params = match &args.params_file {
        Some(path) => load_params(path)?.unwrap_or_else(|| config.engine.resolve()),
        None => config.engine.resolve(),
    };
    let engine = Engine::new(Some(params)).context("invalid engine parameters")?;
    let mut session = Session::new(
        engine,
        config.simulation.start_hour,
        config.simulation.feedback_window,
    );

    let schedule = match &args.events {
        Some(path) => load_schedule(path)?,
        None => Vec::new(),
    };
    let mut pending = schedule.iter().peekable();

    let start = config.simulation.start_hour;
    let end = start + args.hours;
    let interval = args.interval.unwrap_or_else(|| config.simulation.tick_minutes());
    let dt = interval / 60.0;

    let mut t = start;
    while t <= end + 1e-9 {
        if let Err(e) = session.advance_to(t) {
            // Degraded mode: report and retry next tick with a smaller
            // effective span; the engine state is still consistent.
            warn!(error = %e, t, "integration step failed, retrying next tick");
            t += dt;
            continue;
        }

        while let Some(entry) = pending.next_if(|e| e.at <= t) {
            apply_entry(&mut session, entry);
        }

        let mood = session.engine().mood(t);
        println!(
            "t={:6.2}h  mood={:+.3}  baseline={:+.3}  reaction={:+.3}  S={:.3}",
            t, mood.total, mood.baseline, mood.reaction, mood.sleep_pressure
        );
        t += dt;
    }

    let diagnosis = session.engine().diagnosis();
    println!("\nstate: [{}]", diagnosis.tags.join(", "));
    for line in &diagnosis.advice {
        println!("  - {line}");
    }

    if session.feedback().len() >= 3 {
        info!(samples = session.feedback().len(), "calibrating from feedback");
        let fitted = optimize_parameters(session.engine(), session.calibration_batch());
        session
            .engine_mut()
            .set_params(fitted)
            .context("calibrated parameters rejected")?;
    }

    if let Some(path) = &args.params_file {
        let json = serde_json::to_string_pretty(session.engine().params())?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "parameter record saved");
    }

    Ok(())
}

fn apply_entry(session: &mut Session, entry: &Entry) {
    if let Some(score) = entry.feedback {
        let t = session.engine().clock();
        session.record_feedback(t, score);
        info!(t, score, "feedback recorded");
        return;
    }

    let Some(kind) = &entry.kind else {
        warn!(at = entry.at, "schedule entry has neither kind nor feedback, skipping");
        return;
    };
    match kind.parse::<EventKind>() {
        Ok(kind) => {
            let record = session.engine_mut().apply_event(kind, entry.value);
            info!(
                kind = %record.kind,
                amplitude = record.amplitude,
                t = record.sim_time,
                "event applied"
            );
        }
        // Unknown kinds are a no-op; the parse already logged a warning.
        Err(_) => {}
    }
}
