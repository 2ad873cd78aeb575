//! Host binary for the Omniscience engagement engine.
//!
//! Runs one visitor session end to end without a browser: a simulated
//! visitor produces raw signals, the session loop reacts to them, and every
//! event the page would render is written to the log.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `omniscience-config.yaml`
//! 2. Initialize structured logging (tracing) at the configured level
//! 3. Build the session with its seeded random source
//! 4. Spawn the simulated visitor feeding the input channel
//! 5. Install the Ctrl-C handler
//! 6. Run the session loop until stopped or the visit ends
//! 7. Log the session summary

mod error;
mod log_callback;
mod visitor;

use std::path::Path;
use std::sync::Arc;

use omniscience_core::config::EngineConfig;
use omniscience_core::control::SessionControl;
use omniscience_core::random::SeededRandom;
use omniscience_core::runner;
use omniscience_core::session::Session;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_callback::LogCallback;
use crate::visitor::{Visitor, VisitorConfig};

/// Configuration file read from the working directory.
const CONFIG_PATH: &str = "omniscience-config.yaml";

/// Capacity of the visitor-to-session channel.
const INPUT_CHANNEL_CAPACITY: usize = 256;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the session fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_found = Path::new(CONFIG_PATH).exists();
    let config = load_config()?;
    let visitor_config = load_visitor_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("omniscience-engine starting");
    if !config_found {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        seed = ?config.session.seed,
        activation_threshold = config.collector.activation_threshold,
        base_interval_ms = config.escalation.base_interval_ms,
        visit_duration_secs = ?visitor_config.visit_duration_secs,
        step_interval_ms = visitor_config.step_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the session.
    let rng = SeededRandom::from_seed_option(config.session.seed);
    let mut session = Session::new(config, Box::new(rng));
    info!(session_id = %session.id(), "Session created");

    // 4. Spawn the simulated visitor.
    let control = Arc::new(SessionControl::new(visitor_config.visit_duration_ms()));
    let (tx, mut rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    let visitor = tokio::spawn(visitor::run_visitor(Visitor::new(visitor_config), tx));

    // 5. Stop cleanly on Ctrl-C.
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, ending session");
                    control.request_stop();
                }
                Err(e) => {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
            }
        });
    }

    // 6. Run the session.
    let mut callback = LogCallback::new();
    let result = runner::run_session(&mut session, &mut rx, &control, &mut callback).await?;

    // Dropping the receiver sends the visitor home.
    drop(rx);
    let sent = visitor.await.map_err(|e| EngineError::Visitor {
        message: format!("visitor task failed: {e}"),
    })?;

    // 7. Log the summary.
    let summary_json = serde_json::to_string(&result.summary).map_err(EngineError::from)?;
    info!(
        end_reason = ?result.end_reason,
        inputs_sent = sent,
        event_batches = callback.batches(),
        revelations = callback.revelations(),
        summary = %summary_json,
        "omniscience-engine shutdown complete"
    );

    Ok(())
}

/// Load the engine configuration from `omniscience-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<EngineConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(EngineConfig::from_file(config_path)?)
    } else {
        let mut config = EngineConfig::default();
        config.session.apply_env_overrides();
        Ok(config)
    }
}

/// Load the simulated visitor's configuration from `omniscience-config.yaml`.
///
/// Reads the `visitor` section from the YAML config file. If the file does
/// not exist or lacks the `visitor` key, defaults are used.
fn load_visitor_config() -> Result<VisitorConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    let config = if config_path.exists() {
        let contents =
            std::fs::read_to_string(config_path).map_err(|e| EngineError::Visitor {
                message: format!("failed to read config file: {e}"),
            })?;

        // Parse the full YAML and extract just the "visitor" section.
        let raw: serde_yml::Value =
            serde_yml::from_str(&contents).map_err(|e| EngineError::Visitor {
                message: format!("failed to parse config YAML: {e}"),
            })?;

        match raw.get("visitor") {
            Some(section) => serde_yml::from_value(section.clone()).map_err(|e| {
                EngineError::Visitor {
                    message: format!("failed to parse visitor config: {e}"),
                }
            })?,
            None => VisitorConfig::default(),
        }
    } else {
        VisitorConfig::default()
    };
    config.validate()?;
    Ok(config)
}
