//! Configuration loading and typed config structures for the garden service.
//!
//! The canonical configuration lives in `garden-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and a loader that reads and validates the file. Every section
//! and every key is optional; missing values fall back to the defaults.

use std::path::Path;

use garden_sim::{GrowthRules, PlantCatalog};
use garden_types::{PlantType, Weather};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level garden configuration.
///
/// Mirrors the structure of `garden-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GardenConfig {
    /// Simulation rates, thresholds, and windows.
    #[serde(default)]
    pub rules: GrowthRules,

    /// Service behaviour.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Background catch-up sweep.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Plant types to offer instead of the starter catalog.
    #[serde(default)]
    pub catalog: Vec<PlantType>,
}

impl GardenConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `GARDEN_LOG_LEVEL` overrides `logging.level`
    /// - `GARDEN_SWEEP_INTERVAL_SECS` overrides `sweep.interval_secs`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override selected values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GARDEN_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("GARDEN_SWEEP_INTERVAL_SECS") {
            match val.parse() {
                Ok(secs) => self.sweep.interval_secs = secs,
                Err(_) => tracing::warn!(
                    value = %val,
                    "Ignoring non-numeric GARDEN_SWEEP_INTERVAL_SECS"
                ),
            }
        }
    }

    /// Reject values the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.rules.step_secs == 0 {
            return invalid("rules.step_secs must be at least 1");
        }
        if self.rules.max_garden_size == 0 {
            return invalid("rules.max_garden_size must be at least 1");
        }
        if self.rules.default_garden_size == 0
            || self.rules.default_garden_size > self.rules.max_garden_size
        {
            return invalid("rules.default_garden_size must be between 1 and max_garden_size");
        }
        if self.service.max_attempts == 0 {
            return invalid("service.max_attempts must be at least 1");
        }
        if self.sweep.interval_secs == 0 {
            return invalid("sweep.interval_secs must be at least 1");
        }
        Ok(())
    }

    /// The configured catalog, or the starter catalog when none is given.
    pub fn plant_catalog(&self) -> PlantCatalog {
        if self.catalog.is_empty() {
            PlantCatalog::starter()
        } else {
            PlantCatalog::new(self.catalog.iter().cloned())
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Optimistic-concurrency attempts before giving up on a garden.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

/// Sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SweepConfig {
    /// Seconds between two catch-up sweeps over every garden.
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,

    /// Weather reported to every garden by the calendar environment.
    #[serde(default = "default_weather")]
    pub weather: Weather,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
            weather: default_weather(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_weather() -> Weather {
    Weather::Cloudy
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_owned()
}
