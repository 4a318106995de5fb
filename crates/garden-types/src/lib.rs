//! Shared type definitions for the garden growth simulation.
//!
//! This crate is the single source of truth for all types used across the
//! workspace. Types defined here flow downstream to `TypeScript` via `ts-rs`
//! so the client renders exactly what the core returns.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Plant stages, seasons, weather, rarity, upgrades
//! - [`structs`] -- Gardens, plant catalog entries, plant instances, snapshots

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{PlantStage, Rarity, Season, Upgrade, Weather};
pub use ids::{GardenId, OwnerId, PlantId, PlantTypeId};
pub use structs::{
    Conditions, Garden, GardenSnapshot, HarvestResult, HarvestReward, PlantInstance, PlantType,
    PlayerProgress, Reconciled, Upgrades,
};
