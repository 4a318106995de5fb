//! Configuration, persistence seams, and orchestration for the garden
//! growth simulation.
//!
//! This crate wraps the pure simulation in `garden-sim` with everything a
//! running service needs: typed YAML configuration, a versioned store, a
//! player registry, the [`GardenService`] operation surface with optimistic
//! concurrency, and the background sweep.
//!
//! # Modules
//!
//! - [`clock`] -- Wall-clock and manual clock sources ([`Clock`])
//! - [`config`] -- Configuration loading ([`GardenConfig`])
//! - [`players`] -- Player levels and reward credit ([`PlayerRegistry`])
//! - [`service`] -- The operation surface ([`GardenService`])
//! - [`store`] -- Versioned garden persistence ([`GardenStore`])
//! - [`sweep`] -- Periodic catch-up of every garden

pub mod clock;
pub mod config;
pub mod players;
pub mod service;
pub mod store;
pub mod sweep;

// Re-export primary types at crate root for convenience.
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GardenConfig};
pub use players::{Credit, InMemoryPlayerRegistry, PlayerRegistry, RegistryError};
pub use service::{GardenService, SweepReport};
pub use store::{GardenRecord, GardenStore, InMemoryGardenStore, StoreError};
pub use sweep::run_sweep;
