mod config;
mod core;
mod encode;
mod hardware;
mod input;
mod playback;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use config::ReplayConfig;
use hardware::{create_interface, CanInterface};
use input::DatalogLoader;
use playback::PlaybackEngine;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("CANBus datalog replay started");

    // Optional settings file as the only argument
    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ReplayConfig::load(explicit.as_deref()).context("Failed to load settings")?;
    info!(
        "ECU {}, {:?} interface {}, {} Hz",
        config.ecu,
        config.interface_type,
        config.interface,
        config.hz
    );

    let loader = DatalogLoader::new(config.schema(), config.short_rows);
    let (store, report) = loader
        .load_path(&config.datalog)
        .with_context(|| format!("Failed to load datalog {}", config.datalog.display()))?;
    if let Some(first) = report.diagnostics.first() {
        warn!(
            "{} cells could not be converted and were replaced with 0, first at line {} column {} ({}): {}",
            report.diagnostics.len(),
            first.line,
            first.column,
            first.field,
            first.error
        );
    }
    if store.is_empty() {
        warn!("Datalog has no data rows, broadcasting zeroed frames");
    }
    if let Some(rate) = store.sample_rate() {
        if (rate - f64::from(config.hz)).abs() > f64::EPSILON {
            info!("Datalog was recorded at {} Hz, replaying at {} Hz", rate, config.hz);
        }
    }

    let mut transport = create_interface(config.interface_type, &config.interface)
        .map_err(|e| anyhow!(e))?;
    transport
        .connect(config.can_config())
        .await
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("Cannot connect to {}", config.interface))?;

    let mut engine = PlaybackEngine::new(&store, transport, config.playback());
    let outcome = tokio::select! {
        result = engine.run() => result.map_err(anyhow::Error::from),
        signal = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            signal.map_err(anyhow::Error::from)
        }
    };

    let stats = engine.stats().clone();
    let position = engine.position();
    let mut transport = engine.into_transport();
    if let Err(e) = transport.disconnect().await {
        warn!("Failed to release {}: {}", transport.name(), e);
    }

    let elapsed = stats
        .started_at
        .map(|start| (Utc::now() - start).num_milliseconds() as f64 / 1000.0)
        .unwrap_or_default();
    info!(
        ticks = stats.ticks,
        cycles = stats.cycles,
        position,
        elapsed_secs = elapsed,
        frames_sent = stats.frames_sent,
        send_errors = stats.send_errors,
        "CANBus datalog replay stopped"
    );
    outcome
}
