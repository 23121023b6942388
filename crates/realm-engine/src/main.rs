//! Engine binary for the Realm simulation core.
//!
//! Wires configuration, content and operator controls around the tick
//! loop. Transports are attached by feeding [`realm_core::WorldInput`]s
//! into the input channel; without one the world still ticks its
//! non-player characters.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `realm-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Load entity, area and story content
//! 4. Assemble the world
//! 5. Create operator state from simulation bounds
//! 6. Start the operator console and the Ctrl-C handler
//! 7. Run the simulation loop until stopped or a configured bound
//! 8. Log the result

mod console;
mod error;
mod status_callback;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use realm_core::{Content, OperatorState, RealmConfig, World, runner};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::status_callback::StatusCallback;

const DEFAULT_CONFIG_PATH: &str = "realm-config.yaml";

/// Ticks between status lines.
const STATUS_EVERY_TICKS: u64 = 600;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        world_name = config.world.name,
        tick_interval_ms = config.world.tick_interval_ms,
        content_dir = %config.content.dir.display(),
        "realm-engine starting"
    );

    // 3. Load content.
    let content = Content::load(&config.content).map_err(EngineError::from)?;
    let areas = content.build_areas().map_err(EngineError::from)?;

    // 4. Assemble the world.
    let mut world = World::new(config.world.clone(), content.catalog, content.story, areas)
        .map_err(EngineError::from)?;

    // 5. Create operator state.
    let operator = Arc::new(OperatorState::new(
        config.world.tick_interval_ms,
        &config.simulation,
    ));
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );

    // 6. Operator controls.
    tokio::spawn(console::run(Arc::clone(&operator)));
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current tick");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 7. Run the simulation.
    let (_inputs_tx, mut inputs) = mpsc::unbounded_channel();
    let mut callback = StatusCallback::new(STATUS_EVERY_TICKS);
    let result = runner::run_simulation(&mut world, &mut inputs, &operator, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 8. Log results.
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "realm-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> Result<RealmConfig, EngineError> {
    if path.exists() {
        Ok(RealmConfig::from_file(path)?)
    } else {
        let mut config = RealmConfig::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}
