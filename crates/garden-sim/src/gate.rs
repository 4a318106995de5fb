//! Action gating: decides whether a player action is permitted.
//!
//! Checks run in a fixed order so that every rejection maps to exactly one
//! error kind:
//!
//! 1. Ownership -- only the garden's owner may act on it
//! 2. Input -- positions inside the grid, amounts in `[1, 100]`
//! 3. Existence -- the plant (or plant type) must exist in this garden
//! 4. Requirements -- player level for planting
//! 5. State -- occupancy, stage, withering, saturation, cooldown, upgrades
//!
//! Validation never mutates. It must run against a garden that has already
//! been caught up to the action instant.

use chrono::{DateTime, Utc};
use garden_types::{GardenId, OwnerId, PlantId, PlantInstance, PlantStage, PlantTypeId, Upgrade};

use crate::catalog::PlantCatalog;
use crate::config::GrowthRules;
use crate::decay::MAX_PERCENT;
use crate::error::{AuthorizationError, GardenError, NotFound, StateConflict, ValidationError};
use crate::garden::GardenState;

/// Smallest accepted water or fertilizer amount.
pub const MIN_AMOUNT: u32 = 1;
/// Largest accepted water or fertilizer amount.
pub const MAX_AMOUNT: u32 = 100;

/// A player action on a garden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GardenAction {
    /// Plant a seed of `plant_type_id` in an empty slot.
    PlantSeed {
        /// Catalog entry to plant.
        plant_type_id: PlantTypeId,
        /// Grid slot, `0..size`.
        position: u32,
        /// The caller's current player level.
        owner_level: u32,
    },
    /// Add moisture to a plant.
    Water {
        /// Target plant.
        plant_id: PlantId,
        /// Moisture to add, `1..=100`.
        amount: u32,
    },
    /// Fertilize a plant, subject to the cooldown.
    Fertilize {
        /// Target plant.
        plant_id: PlantId,
        /// Fertilizer to add to the garden, `1..=100`.
        amount: u32,
    },
    /// Harvest a fully grown plant.
    Harvest {
        /// Target plant.
        plant_id: PlantId,
    },
    /// Remove a plant regardless of its stage.
    Remove {
        /// Target plant.
        plant_id: PlantId,
    },
    /// Install a garden upgrade.
    InstallUpgrade {
        /// The upgrade to install.
        upgrade: Upgrade,
    },
}

impl GardenAction {
    /// Short lowercase name, used in log fields.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PlantSeed { .. } => "plant_seed",
            Self::Water { .. } => "water",
            Self::Fertilize { .. } => "fertilize",
            Self::Harvest { .. } => "harvest",
            Self::Remove { .. } => "remove",
            Self::InstallUpgrade { .. } => "install_upgrade",
        }
    }
}

/// Everything outside the garden that validation needs.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Who is acting.
    pub caller: OwnerId,
    /// The action instant. The garden must be caught up to it.
    pub now: DateTime<Utc>,
    /// Plant type definitions.
    pub catalog: &'a PlantCatalog,
    /// Simulation parameters.
    pub rules: &'a GrowthRules,
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// Reject callers other than the garden's owner.
pub fn authorize_owner(
    garden_id: GardenId,
    owner_id: OwnerId,
    caller: OwnerId,
) -> Result<(), AuthorizationError> {
    if owner_id == caller {
        Ok(())
    } else {
        Err(AuthorizationError::NotOwner { garden_id, caller })
    }
}

/// Reject water and fertilizer amounts outside `[1, 100]`.
pub const fn validate_amount(amount: u32) -> Result<(), ValidationError> {
    if amount < MIN_AMOUNT || amount > MAX_AMOUNT {
        return Err(ValidationError::InvalidAmount { amount });
    }
    Ok(())
}

/// Earliest instant `plant` may be fertilized again, if it has ever been
/// fertilized.
pub fn fertilize_available_at(
    plant: &PlantInstance,
    rules: &GrowthRules,
) -> Option<DateTime<Utc>> {
    plant.last_fertilized_at.map(|last| {
        last.checked_add_signed(rules.fertilize_cooldown())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    })
}

/// Reject a fertilize before the cooldown has fully elapsed.
///
/// The boundary instant itself is accepted.
pub fn check_cooldown(
    plant: &PlantInstance,
    now: DateTime<Utc>,
    rules: &GrowthRules,
) -> Result<(), StateConflict> {
    match fertilize_available_at(plant, rules) {
        Some(available_at) if now < available_at => Err(StateConflict::CooldownActive {
            plant_id: plant.id,
            available_at,
        }),
        _ => Ok(()),
    }
}

/// Reject actions on a withered plant.
const fn ensure_alive(plant: &PlantInstance) -> Result<(), StateConflict> {
    if plant.stage.is_withered() {
        return Err(StateConflict::Withered { plant_id: plant.id });
    }
    Ok(())
}

fn find_plant(state: &GardenState, plant_id: PlantId) -> Result<&PlantInstance, NotFound> {
    state.plant(plant_id).ok_or(NotFound::Plant(plant_id))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Validate `action` against the garden as it stands at its caught-up
/// instant ([`GardenState::action_instant`]).
pub fn validate(
    state: &GardenState,
    action: &GardenAction,
    ctx: &ActionContext<'_>,
) -> Result<(), GardenError> {
    let garden = state.garden();
    authorize_owner(garden.id, garden.owner_id, ctx.caller)?;

    match *action {
        GardenAction::PlantSeed {
            plant_type_id,
            position,
            owner_level,
        } => {
            if position >= garden.size {
                return Err(ValidationError::PositionOutOfBounds {
                    position,
                    size: garden.size,
                }
                .into());
            }
            let plant_type = ctx
                .catalog
                .get(plant_type_id)
                .ok_or(NotFound::PlantType(plant_type_id))?;
            if owner_level < plant_type.min_level {
                return Err(AuthorizationError::LevelTooLow {
                    required: plant_type.min_level,
                    actual: owner_level,
                }
                .into());
            }
            if let Some(occupant) = state.plant_at(position) {
                return Err(StateConflict::SlotOccupied {
                    position,
                    occupant: occupant.id,
                }
                .into());
            }
        }
        GardenAction::Water { plant_id, amount } => {
            validate_amount(amount)?;
            let plant = find_plant(state, plant_id)?;
            ensure_alive(plant)?;
            if plant.water_level >= MAX_PERCENT {
                return Err(StateConflict::AlreadySaturated { plant_id }.into());
            }
        }
        GardenAction::Fertilize { plant_id, amount } => {
            validate_amount(amount)?;
            let plant = find_plant(state, plant_id)?;
            ensure_alive(plant)?;
            check_cooldown(plant, state.action_instant(ctx.now), ctx.rules)?;
        }
        GardenAction::Harvest { plant_id } => {
            let plant = find_plant(state, plant_id)?;
            if plant.stage != PlantStage::Harvestable {
                return Err(StateConflict::NotHarvestable {
                    plant_id,
                    stage: plant.stage,
                }
                .into());
            }
        }
        GardenAction::Remove { plant_id } => {
            find_plant(state, plant_id)?;
        }
        GardenAction::InstallUpgrade { upgrade } => {
            if garden.upgrades.has(upgrade) {
                return Err(StateConflict::UpgradeInstalled { upgrade }.into());
            }
        }
    }
    Ok(())
}
