//! Garden engine binary.
//!
//! Wires the garden service to in-memory persistence and the calendar
//! environment, seeds the configured gardens, then keeps every garden
//! caught up until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `GARDEN_CONFIG` or `garden-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the plant catalog and the garden service
//! 4. Create the seed gardens from the `seed` section
//! 5. Run the catch-up sweep until Ctrl-C

mod error;
mod seed;

use std::path::{Path, PathBuf};
use std::time::Duration;

use garden_core::{
    Clock, GardenConfig, GardenService, InMemoryGardenStore, InMemoryPlayerRegistry, SystemClock,
    run_sweep,
};
use garden_sim::CalendarEnvironment;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::seed::SeedConfig;

const DEFAULT_CONFIG_PATH: &str = "garden-config.yaml";

/// Application entry point for the garden engine.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the seed
/// gardens cannot be created.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    let (config, config_path) = load_config()?;
    init_logging(&config);

    info!(
        config_path = %config_path.display(),
        max_attempts = config.service.max_attempts,
        sweep_interval_secs = config.sweep.interval_secs,
        weather = ?config.sweep.weather,
        "Configuration loaded"
    );

    let seed_config = load_seed_config(&config_path)?;

    let catalog = config.plant_catalog();
    for plant_type in catalog.iter() {
        debug!(
            name = plant_type.name,
            min_level = plant_type.min_level,
            growth_time_minutes = plant_type.growth_time_minutes,
            "Plant type available"
        );
    }
    info!(plant_types = catalog.len(), "Plant catalog ready");

    let service = GardenService::new(
        InMemoryGardenStore::new(),
        InMemoryPlayerRegistry::new(),
        CalendarEnvironment {
            weather: config.sweep.weather,
        },
        catalog,
        config.rules,
    )
    .with_max_attempts(config.service.max_attempts);

    let seeded = seed::seed_gardens(&seed_config, &service, SystemClock.now())?;
    info!(
        gardens = seeded.gardens.len(),
        plants = seeded.plants,
        "Seed gardens ready"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    let sweeps = run_sweep(
        &service,
        &SystemClock,
        Duration::from_secs(config.sweep.interval_secs),
        shutdown,
    )
    .await;

    info!(sweeps, "garden-engine shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured
/// level when set.
fn init_logging(config: &GardenConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load configuration from the path in `GARDEN_CONFIG`, falling back to
/// `garden-config.yaml`. A missing file yields the defaults.
fn load_config() -> Result<(GardenConfig, PathBuf), EngineError> {
    let path = std::env::var_os("GARDEN_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = GardenConfig::from_file(&path)?;
        Ok((config, path))
    } else {
        let mut config = GardenConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok((config, path))
    }
}

/// Read the `seed` section of the config file. A missing file or section
/// yields the default seed.
fn load_seed_config(path: &Path) -> Result<SeedConfig, EngineError> {
    if !path.exists() {
        return Ok(SeedConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Seed {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Seed {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    match raw.get("seed") {
        Some(section) => serde_yml::from_value(section.clone()).map_err(|e| EngineError::Seed {
            message: format!("failed to parse seed config: {e}"),
        }),
        None => Ok(SeedConfig::default()),
    }
}
