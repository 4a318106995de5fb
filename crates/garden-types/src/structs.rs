//! Core entity structs for the garden simulation.
//!
//! Covers gardens, the plant catalog, plant instances, and the snapshot
//! and result types returned to callers after every operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{PlantStage, Rarity, Season, Upgrade, Weather};
use crate::ids::{GardenId, OwnerId, PlantId, PlantTypeId};

// ---------------------------------------------------------------------------
// Garden
// ---------------------------------------------------------------------------

/// Upgrade flags installed on a garden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Upgrades {
    /// Halves water decay.
    pub sprinkler: bool,
    /// Halves adverse-weather health damage.
    pub greenhouse: bool,
    /// Slows fertilizer decay.
    pub composter: bool,
}

impl Upgrades {
    /// Whether the given upgrade is installed.
    pub const fn has(&self, upgrade: Upgrade) -> bool {
        match upgrade {
            Upgrade::Sprinkler => self.sprinkler,
            Upgrade::Greenhouse => self.greenhouse,
            Upgrade::Composter => self.composter,
        }
    }

    /// Set the flag for the given upgrade.
    pub const fn install(&mut self, upgrade: Upgrade) {
        match upgrade {
            Upgrade::Sprinkler => self.sprinkler = true,
            Upgrade::Greenhouse => self.greenhouse = true,
            Upgrade::Composter => self.composter = true,
        }
    }
}

/// An owned grid of plant slots with aggregate resource levels.
///
/// The grid size is fixed at creation. Resource levels are percentages in
/// `[0, 100]` and only ever decrease through decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Garden {
    /// Unique garden identifier.
    pub id: GardenId,
    /// The player who owns this garden.
    pub owner_id: OwnerId,
    /// Display name.
    pub name: String,
    /// Number of slots. Positions range over `[0, size)`.
    pub size: u32,
    /// Ground moisture (0--100).
    pub water_level: f64,
    /// Fertilizer available to every plant (0--100).
    pub fertilizer_level: f64,
    /// Soil quality (0--100).
    pub soil_quality: f64,
    /// Installed upgrades.
    pub upgrades: Upgrades,
    /// When the garden was created.
    pub created_at: DateTime<Utc>,
    /// The instant up to which decay and growth have been applied.
    pub last_tick_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Plant catalog
// ---------------------------------------------------------------------------

/// A read-only entry in the plant catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlantType {
    /// Unique plant type identifier.
    pub id: PlantTypeId,
    /// Display name.
    pub name: String,
    /// Flavour text.
    #[serde(default)]
    pub description: String,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Season in which the plant grows faster. `None` means no preference.
    #[serde(default)]
    pub season: Option<Season>,
    /// Weather in which the plant grows faster. `None` means no preference.
    #[serde(default)]
    pub weather: Option<Weather>,
    /// Nominal minutes from seed to harvestable under adequate conditions.
    pub growth_time_minutes: u32,
    /// Water level (0--100) the plant needs for full-rate growth.
    pub water_needs: u32,
    /// Fertilizer supply (0--100) the plant needs for full-rate growth.
    pub fertilizer_needs: u32,
    /// Minimum player level required to plant this type.
    pub min_level: u32,
    /// Items produced per harvest.
    pub yield_count: u32,
    /// Coins per harvested item.
    pub harvest_value: u32,
    /// Experience credited per harvest.
    pub experience_value: u32,
}

// ---------------------------------------------------------------------------
// Plant instance
// ---------------------------------------------------------------------------

/// A plant occupying one slot of a garden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlantInstance {
    /// Unique plant identifier.
    pub id: PlantId,
    /// The garden this plant grows in.
    pub garden_id: GardenId,
    /// Catalog entry for this plant.
    pub plant_type_id: PlantTypeId,
    /// Slot index within the garden grid.
    pub position: u32,
    /// Current lifecycle stage.
    pub stage: PlantStage,
    /// Percentage toward harvestable (0--100).
    pub growth_progress: f64,
    /// Plant moisture (0--100).
    pub water_level: f64,
    /// Plant health (0--100). Zero means withered.
    pub health: f64,
    /// Seconds the plant has continuously spent below the critical
    /// water or fertilizer floor.
    pub stress_secs: u64,
    /// When the seed was planted.
    pub planted_at: DateTime<Utc>,
    /// Last time the plant was watered.
    pub last_watered_at: Option<DateTime<Utc>>,
    /// Last time the plant was fertilized.
    pub last_fertilized_at: Option<DateTime<Utc>>,
    /// When the plant was harvested. Only set on the instance returned by
    /// a harvest, which is no longer part of the garden.
    pub harvested_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Season and weather affecting a garden at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Conditions {
    /// Current season.
    pub season: Season,
    /// Current weather.
    pub weather: Weather,
}

// ---------------------------------------------------------------------------
// Snapshots and results
// ---------------------------------------------------------------------------

/// The complete authoritative view of a garden after catch-up.
///
/// Every operation returns one of these. Callers must replace any state
/// they hold with it rather than merge it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GardenSnapshot {
    /// The garden with resource levels brought up to `garden.last_tick_at`.
    pub garden: Garden,
    /// Every plant in the garden, ordered by position.
    pub plants: Vec<PlantInstance>,
    /// Conditions used for the most recent catch-up.
    pub conditions: Conditions,
    /// Store version of the committed record.
    pub version: u64,
}

impl GardenSnapshot {
    /// Return the plant in the given slot, if any.
    pub fn plant_at(&self, position: u32) -> Option<&PlantInstance> {
        self.plants.iter().find(|p| p.position == position)
    }

    /// Return the plant with the given id, if any.
    pub fn plant(&self, plant_id: PlantId) -> Option<&PlantInstance> {
        self.plants.iter().find(|p| p.id == plant_id)
    }
}

/// Coins and experience earned by one harvest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HarvestReward {
    /// Coins earned.
    pub coins: u64,
    /// Experience earned.
    pub experience: u64,
}

/// A player's progression totals after a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerProgress {
    /// Current level.
    pub level: u32,
    /// Total experience.
    pub experience: u64,
    /// Coin balance.
    pub coins: u64,
}

/// Outcome of a successful harvest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HarvestResult {
    /// The harvested plant as it was removed, with `harvested_at` set.
    pub plant: PlantInstance,
    /// What the harvest earned.
    pub reward: HarvestReward,
    /// The owner's totals after the credit.
    pub progress: PlayerProgress,
    /// Whether the credit raised the owner's level.
    pub level_up: bool,
}

/// An operation result paired with the full authoritative garden state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciled<T> {
    /// The operation-specific result.
    pub result: T,
    /// The garden as committed by the operation.
    pub snapshot: GardenSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrades_install_sets_only_one_flag() {
        let mut upgrades = Upgrades::default();
        upgrades.install(Upgrade::Greenhouse);
        assert!(upgrades.has(Upgrade::Greenhouse));
        assert!(!upgrades.has(Upgrade::Sprinkler));
        assert!(!upgrades.has(Upgrade::Composter));
    }

    #[test]
    fn plant_type_affinities_default_to_none() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "name": "Radish",
            "rarity": "common",
            "growth_time_minutes": 30,
            "water_needs": 40,
            "fertilizer_needs": 0,
            "min_level": 1,
            "yield_count": 1,
            "harvest_value": 5,
            "experience_value": 2
        }"#;
        let parsed: Result<PlantType, _> = serde_json::from_str(json);
        assert!(parsed.is_ok(), "{parsed:?}");
        if let Ok(plant_type) = parsed {
            assert_eq!(plant_type.season, None);
            assert_eq!(plant_type.weather, None);
            assert!(plant_type.description.is_empty());
        }
    }
}
