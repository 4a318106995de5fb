//! Error types for the garden engine binary.
//!
//! [`EngineError`] wraps every failure that can stop the engine during
//! startup.

/// Top-level error for the garden engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: garden_core::ConfigError,
    },

    /// A garden operation failed while seeding.
    #[error("garden error: {source}")]
    Garden {
        /// The underlying garden error.
        #[from]
        source: garden_sim::GardenError,
    },

    /// Registering a seed owner failed.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: garden_core::RegistryError,
    },

    /// The seed section could not be read or names something unknown.
    #[error("seed error: {message}")]
    Seed {
        /// Description of the seed failure.
        message: String,
    },
}
