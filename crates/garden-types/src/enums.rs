//! Enumeration types for the garden simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Plant lifecycle
// ---------------------------------------------------------------------------

/// Discrete lifecycle label of a plant instance.
///
/// The stage is never set directly by a player action. It is derived from
/// growth progress and health by the growth scheduler, with `Withered`
/// overriding every progress band and never being left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PlantStage {
    /// Progress in `[0, 10)`.
    Seed,
    /// Progress in `[10, 30)`.
    Sprout,
    /// Progress in `[30, 70)`.
    Growing,
    /// Progress in `[70, 100)`.
    Mature,
    /// Progress at 100 with health above zero.
    Harvestable,
    /// Health reached zero. Absorbing.
    Withered,
}

impl PlantStage {
    /// Whether the plant still advances its growth progress.
    pub const fn is_growing(self) -> bool {
        !matches!(self, Self::Harvestable | Self::Withered)
    }

    /// Whether the plant has withered.
    pub const fn is_withered(self) -> bool {
        matches!(self, Self::Withered)
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// A season of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Season {
    /// March through May.
    Spring,
    /// June through August.
    Summer,
    /// September through November.
    Autumn,
    /// December through February.
    Winter,
}

/// Weather condition reported by the environment source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Weather {
    /// Clear skies, high evaporation.
    Sunny,
    /// Neutral conditions.
    Cloudy,
    /// Rain, low evaporation.
    Rainy,
    /// Storm; damages exposed plants.
    Stormy,
    /// Fog, slightly reduced evaporation.
    Foggy,
    /// Wind, increased evaporation.
    Windy,
    /// Snow; damages exposed plants.
    Snowy,
}

// ---------------------------------------------------------------------------
// Catalog and upgrades
// ---------------------------------------------------------------------------

/// Rarity tier of a plant type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Rarity {
    /// Available from the start.
    Common,
    /// Slightly harder to come by.
    Uncommon,
    /// Rare.
    Rare,
    /// Epic.
    Epic,
    /// Legendary.
    Legendary,
}

/// A garden upgrade that modulates decay rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Upgrade {
    /// Halves water decay for the garden and its plants.
    Sprinkler,
    /// Halves the health penalty from adverse weather.
    Greenhouse,
    /// Slows fertilizer decay.
    Composter,
}
