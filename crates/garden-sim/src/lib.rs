//! Decay, growth, and action gating for the garden growth simulation.
//!
//! Everything in this crate is pure: no I/O, no clocks, no locks. Callers
//! pass the current instant and the environmental conditions explicitly,
//! which keeps every transition deterministic and testable. Persistence,
//! concurrency control, and player bookkeeping live in `garden-core`.
//!
//! # Modules
//!
//! - [`catalog`] -- Plant type catalog and the built-in starter types
//! - [`config`] -- Tunable simulation parameters ([`GrowthRules`])
//! - [`decay`] -- Passive resource decay over elapsed time
//! - [`environment`] -- Weather and season effects, [`EnvironmentSource`] seam
//! - [`error`] -- Error kinds for every rejected operation ([`GardenError`])
//! - [`garden`] -- The garden aggregate ([`GardenState`]): catch-up and actions
//! - [`gate`] -- Action validation and authorization
//! - [`growth`] -- Growth progression, stress, and stage bands
//! - [`reward`] -- Harvest rewards and experience levels

pub mod catalog;
pub mod config;
pub mod decay;
pub mod environment;
pub mod error;
pub mod garden;
pub mod gate;
pub mod growth;
pub mod reward;

// Re-export primary types at crate root for convenience.
pub use catalog::PlantCatalog;
pub use config::GrowthRules;
pub use environment::{CalendarEnvironment, EnvironmentSource, FixedEnvironment};
pub use error::{AuthorizationError, GardenError, NotFound, StateConflict, ValidationError};
pub use garden::{ActionOutcome, CatchUpReport, GardenState};
pub use gate::{ActionContext, GardenAction};
pub use reward::{harvest_reward, level_for_experience};
