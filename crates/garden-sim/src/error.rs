//! Error types for the garden-sim crate.
//!
//! Every rejected action maps to exactly one specific kind so callers can
//! render precise feedback. Nothing here is retried except
//! [`GardenError::ConcurrencyConflict`], which the service only surfaces
//! after its bounded retries are exhausted.

use chrono::{DateTime, Utc};
use garden_types::{GardenId, OwnerId, PlantId, PlantStage, PlantTypeId, Upgrade};

/// Bad input: positions, sizes, or amounts outside their valid range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The requested slot is outside the garden grid.
    #[error("position {position} is outside a garden of size {size}")]
    PositionOutOfBounds {
        /// The requested position.
        position: u32,
        /// The garden's grid size.
        size: u32,
    },

    /// A water or fertilizer amount outside `[1, 100]`.
    #[error("amount {amount} must be between 1 and 100")]
    InvalidAmount {
        /// The requested amount.
        amount: u32,
    },

    /// A garden size outside `[1, max]`.
    #[error("garden size {size} must be between 1 and {max}")]
    InvalidGardenSize {
        /// The requested size.
        size: u32,
        /// The configured maximum.
        max: u32,
    },
}

/// The action is well-formed but the current state does not permit it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateConflict {
    /// Another plant already occupies the slot.
    #[error("position {position} is already occupied by plant {occupant}")]
    SlotOccupied {
        /// The requested position.
        position: u32,
        /// The plant in that slot.
        occupant: PlantId,
    },

    /// The plant is not ready to harvest.
    #[error("plant {plant_id} is not harvestable (stage: {stage:?})")]
    NotHarvestable {
        /// The plant targeted by the harvest.
        plant_id: PlantId,
        /// Its stage at the evaluation instant.
        stage: PlantStage,
    },

    /// The plant was fertilized too recently.
    #[error("plant {plant_id} can be fertilized again at {available_at}")]
    CooldownActive {
        /// The plant targeted by the fertilize.
        plant_id: PlantId,
        /// Earliest instant the next fertilize is accepted.
        available_at: DateTime<Utc>,
    },

    /// The plant already holds as much water as it can.
    #[error("plant {plant_id} is already fully watered")]
    AlreadySaturated {
        /// The plant targeted by the water.
        plant_id: PlantId,
    },

    /// The plant has withered; only removal is allowed.
    #[error("plant {plant_id} has withered")]
    Withered {
        /// The withered plant.
        plant_id: PlantId,
    },

    /// The upgrade is already installed.
    #[error("upgrade {upgrade:?} is already installed")]
    UpgradeInstalled {
        /// The requested upgrade.
        upgrade: Upgrade,
    },
}

/// The caller is not allowed to perform the action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    /// The caller does not own the garden.
    #[error("{caller} does not own garden {garden_id}")]
    NotOwner {
        /// The garden being acted on.
        garden_id: GardenId,
        /// The caller.
        caller: OwnerId,
    },

    /// The caller's level is below the plant type's requirement.
    #[error("level {actual} is below the required level {required}")]
    LevelTooLow {
        /// Level required by the plant type.
        required: u32,
        /// The caller's level.
        actual: u32,
    },
}

/// A referenced entity does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    /// Unknown garden.
    #[error("garden not found: {0}")]
    Garden(GardenId),

    /// Unknown plant, or a plant belonging to another garden.
    #[error("plant not found: {0}")]
    Plant(PlantId),

    /// Unknown catalog entry.
    #[error("plant type not found: {0}")]
    PlantType(PlantTypeId),

    /// Unknown player.
    #[error("owner not found: {0}")]
    Owner(OwnerId),
}

/// Errors that can occur during garden operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GardenError {
    /// Bad position, size, or amount.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Occupied slot, wrong stage, active cooldown, and similar.
    #[error("state conflict: {0}")]
    StateConflict(#[from] StateConflict),

    /// Not the owner, or level too low.
    #[error("not authorized: {0}")]
    Authorization(#[from] AuthorizationError),

    /// Unknown garden, plant, plant type, or owner.
    #[error("{0}")]
    NotFound(#[from] NotFound),

    /// Concurrent writers kept invalidating the garden version.
    #[error("garden {garden_id} changed concurrently; gave up after {attempts} attempts")]
    ConcurrencyConflict {
        /// The contended garden.
        garden_id: GardenId,
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// A garden invariant was violated. Indicates a bug; the mutation
    /// that produced it is discarded.
    #[error("invariant violated: {reason}")]
    InvariantViolated {
        /// Which invariant failed.
        reason: String,
    },

    /// The garden store failed.
    #[error("garden store error: {message}")]
    Store {
        /// Description of the store failure.
        message: String,
    },

    /// The player registry failed.
    #[error("player registry error: {message}")]
    Registry {
        /// Description of the registry failure.
        message: String,
    },
}

impl GardenError {
    /// Whether retrying the same call later could succeed without the
    /// caller changing anything.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::Store { .. } | Self::Registry { .. }
        )
    }
}
