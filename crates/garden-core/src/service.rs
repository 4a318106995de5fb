//! The garden service: the operation surface callers use.
//!
//! Every operation follows the same pipeline against a private copy of the
//! garden:
//!
//! 1. Load the record and its version from the [`GardenStore`]
//! 2. Catch up to `now` with the conditions from the [`EnvironmentSource`]
//! 3. Validate and apply the action ([`GardenState::apply`])
//! 4. Commit with compare-and-swap; on a version mismatch start over
//!
//! Attempts are bounded by `max_attempts`, after which the caller gets
//! [`GardenError::ConcurrencyConflict`]. Player levels are read before the
//! attempt loop. A harvest credits its reward just before its
//! compare-and-swap, keyed by the plant so a retry pays once, and revokes
//! it if the harvest never commits. No lock is held across registry calls.
//!
//! Every successful call returns the committed [`GardenSnapshot`] next to
//! its result, so clients can replace their view of the garden wholesale.

use chrono::{DateTime, Utc};
use garden_sim::{
    ActionContext, ActionOutcome, CatchUpReport, EnvironmentSource, GardenAction, GardenError,
    GardenState, GrowthRules, NotFound, PlantCatalog,
};
use garden_types::{
    GardenId, GardenSnapshot, HarvestResult, OwnerId, PlantId, PlantInstance, PlantTypeId,
    Reconciled, Upgrade, Upgrades,
};
use tracing::{debug, error, info, warn};

use crate::players::{Credit, PlayerRegistry, RegistryError};
use crate::store::{GardenStore, StoreError};

/// Default optimistic-concurrency attempts per operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Outcome of a sweep over every stored garden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Gardens visited.
    pub gardens: usize,
    /// Gardens whose caught-up state was written back.
    pub updated: usize,
    /// Gardens that could not be caught up.
    pub failed: usize,
    /// Plants that withered during this sweep.
    pub newly_withered: usize,
    /// Plants that became harvestable during this sweep.
    pub newly_harvestable: usize,
}

/// A committed transaction: the operation result, the snapshot that was
/// written, and what the catch-up did.
struct Committed<T> {
    result: T,
    snapshot: GardenSnapshot,
    report: CatchUpReport,
    written: bool,
}

/// Orchestrates catch-up, validation, and versioned commits for gardens.
#[derive(Debug)]
pub struct GardenService<S, P, E> {
    store: S,
    players: P,
    environment: E,
    catalog: PlantCatalog,
    rules: GrowthRules,
    max_attempts: u32,
}

impl<S, P, E> GardenService<S, P, E>
where
    S: GardenStore,
    P: PlayerRegistry,
    E: EnvironmentSource,
{
    /// Create a service with [`DEFAULT_MAX_ATTEMPTS`].
    pub const fn new(
        store: S,
        players: P,
        environment: E,
        catalog: PlantCatalog,
        rules: GrowthRules,
    ) -> Self {
        Self {
            store,
            players,
            environment,
            catalog,
            rules,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the number of optimistic attempts. Values below 1 are
    /// raised to 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// The garden store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The player registry.
    pub const fn players(&self) -> &P {
        &self.players
    }

    /// The plant catalog.
    pub const fn catalog(&self) -> &PlantCatalog {
        &self.catalog
    }

    /// The simulation rules.
    pub const fn rules(&self) -> &GrowthRules {
        &self.rules
    }

    // -----------------------------------------------------------------------
    // Garden lifecycle
    // -----------------------------------------------------------------------

    /// Create an empty garden for a registered player.
    ///
    /// # Errors
    ///
    /// [`NotFound::Owner`] for an unknown player,
    /// [`garden_sim::ValidationError::InvalidGardenSize`] for a bad size.
    pub fn create_garden(
        &self,
        owner_id: OwnerId,
        name: &str,
        size: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<GardenSnapshot, GardenError> {
        self.players
            .level(owner_id)
            .map_err(|e| registry_error(owner_id, e))?;
        let state = GardenState::create(owner_id, name, size, now, &self.rules)?;
        let conditions = self.environment.conditions(state.garden(), now);
        let (garden, plants) = state.clone().into_parts();
        let version = self
            .store
            .insert(garden, plants)
            .map_err(|e| store_error(state.garden().id, e))?;
        info!(
            garden_id = %state.garden().id,
            owner_id = %owner_id,
            size = state.garden().size,
            "Garden created"
        );
        Ok(state.snapshot(conditions, version))
    }

    /// The garden as of `now`. The catch-up is persisted.
    ///
    /// # Errors
    ///
    /// [`NotFound::Garden`] for an unknown garden, or a store failure.
    pub fn get_garden(
        &self,
        garden_id: GardenId,
        now: DateTime<Utc>,
    ) -> Result<GardenSnapshot, GardenError> {
        self.transact(garden_id, now, |_| Ok(()))
            .map(|committed| committed.snapshot)
    }

    /// Every garden of `owner_id`, each caught up to `now`.
    ///
    /// # Errors
    ///
    /// A store failure, or a garden that could not be caught up.
    pub fn list_gardens(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> Result<Vec<GardenSnapshot>, GardenError> {
        let ids = self
            .store
            .list_by_owner(owner_id)
            .map_err(|e| GardenError::Store {
                message: e.to_string(),
            })?;
        let mut snapshots = Vec::with_capacity(ids.len());
        for garden_id in ids {
            match self.get_garden(garden_id, now) {
                Ok(snapshot) => snapshots.push(snapshot),
                // Deleted between listing and loading.
                Err(GardenError::NotFound(NotFound::Garden(_))) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(snapshots)
    }

    /// Delete a garden and every plant in it.
    ///
    /// # Errors
    ///
    /// [`NotFound::Garden`] for an unknown garden,
    /// [`garden_sim::AuthorizationError::NotOwner`] for anyone but the owner.
    pub fn delete_garden(&self, garden_id: GardenId, owner_id: OwnerId) -> Result<(), GardenError> {
        let record = self
            .store
            .load(garden_id)
            .map_err(|e| store_error(garden_id, e))?;
        garden_sim::gate::authorize_owner(garden_id, record.garden.owner_id, owner_id)?;
        self.store
            .delete(garden_id)
            .map_err(|e| store_error(garden_id, e))?;
        info!(garden_id = %garden_id, owner_id = %owner_id, "Garden deleted");
        Ok(())
    }

    /// Install an upgrade. Time before `now` decays at the old rates.
    ///
    /// # Errors
    ///
    /// [`garden_sim::StateConflict::UpgradeInstalled`] if already present,
    /// plus the usual ownership and concurrency errors.
    pub fn install_upgrade(
        &self,
        garden_id: GardenId,
        owner_id: OwnerId,
        upgrade: Upgrade,
        now: DateTime<Utc>,
    ) -> Result<Reconciled<Upgrades>, GardenError> {
        let action = GardenAction::InstallUpgrade { upgrade };
        let committed = self.act(garden_id, owner_id, &action, now)?;
        Ok(Reconciled {
            result: committed.snapshot.garden.upgrades,
            snapshot: committed.snapshot,
        })
    }

    // -----------------------------------------------------------------------
    // Plant actions
    // -----------------------------------------------------------------------

    /// Plant a seed of `plant_type_id` at `position`.
    ///
    /// # Errors
    ///
    /// Position out of bounds, unknown plant type, level too low, occupied
    /// slot, or the usual ownership and concurrency errors.
    pub fn plant_seed(
        &self,
        garden_id: GardenId,
        owner_id: OwnerId,
        plant_type_id: PlantTypeId,
        position: u32,
        now: DateTime<Utc>,
    ) -> Result<Reconciled<PlantInstance>, GardenError> {
        let owner_level = self
            .players
            .level(owner_id)
            .map_err(|e| registry_error(owner_id, e))?;
        let action = GardenAction::PlantSeed {
            plant_type_id,
            position,
            owner_level,
        };
        let committed = self.act(garden_id, owner_id, &action, now)?;
        match committed.result {
            ActionOutcome::Planted(plant) => Ok(reconciled(plant, committed.snapshot)),
            other => Err(unexpected(&other)),
        }
    }

    /// Add `amount` of water to a plant.
    ///
    /// # Errors
    ///
    /// Invalid amount, unknown or withered plant, saturated plant, or the
    /// usual ownership and concurrency errors.
    pub fn water_plant(
        &self,
        garden_id: GardenId,
        owner_id: OwnerId,
        plant_id: PlantId,
        amount: u32,
        now: DateTime<Utc>,
    ) -> Result<Reconciled<PlantInstance>, GardenError> {
        let action = GardenAction::Water { plant_id, amount };
        let committed = self.act(garden_id, owner_id, &action, now)?;
        match committed.result {
            ActionOutcome::Watered(plant) => Ok(reconciled(plant, committed.snapshot)),
            other => Err(unexpected(&other)),
        }
    }

    /// Fertilize a plant, adding `amount` to the garden's fertilizer.
    ///
    /// # Errors
    ///
    /// Invalid amount, unknown or withered plant, active cooldown, or the
    /// usual ownership and concurrency errors.
    pub fn fertilize_plant(
        &self,
        garden_id: GardenId,
        owner_id: OwnerId,
        plant_id: PlantId,
        amount: u32,
        now: DateTime<Utc>,
    ) -> Result<Reconciled<PlantInstance>, GardenError> {
        let action = GardenAction::Fertilize { plant_id, amount };
        let committed = self.act(garden_id, owner_id, &action, now)?;
        match committed.result {
            ActionOutcome::Fertilized(plant) => Ok(reconciled(plant, committed.snapshot)),
            other => Err(unexpected(&other)),
        }
    }

    /// Harvest a plant and credit the reward to its owner.
    ///
    /// The credit is made inside the attempt, before the compare-and-swap,
    /// so a registry failure leaves the plant in place and nothing paid.
    /// If the harvest then fails to commit, the credit is revoked.
    ///
    /// # Errors
    ///
    /// Unknown plant, plant not harvestable, registry failure, or the usual
    /// ownership and concurrency errors.
    pub fn harvest_plant(
        &self,
        garden_id: GardenId,
        owner_id: OwnerId,
        plant_id: PlantId,
        now: DateTime<Utc>,
    ) -> Result<Reconciled<HarvestResult>, GardenError> {
        let action = GardenAction::Harvest { plant_id };
        let mut credit: Option<Credit> = None;
        let result = self.act_with(garden_id, owner_id, &action, now, |outcome| {
            let ActionOutcome::Harvested { reward, .. } = outcome else {
                return Err(unexpected(outcome));
            };
            let applied = self
                .players
                .credit(owner_id, plant_id, *reward)
                .map_err(|e| registry_error(owner_id, e))?;
            credit = Some(applied);
            Ok(())
        });

        let committed = match result {
            Ok(committed) => committed,
            Err(e) => {
                if credit.is_some() {
                    self.revoke_credit(garden_id, owner_id, plant_id);
                }
                return Err(e);
            }
        };
        let (plant, reward) = match committed.result {
            ActionOutcome::Harvested { plant, reward } => (plant, reward),
            other => return Err(unexpected(&other)),
        };
        let credit = credit.ok_or_else(|| GardenError::InvariantViolated {
            reason: format!("harvest of {plant_id} committed without a credit"),
        })?;
        if credit.level_up {
            info!(owner_id = %owner_id, level = credit.progress.level, "Player levelled up");
        }

        Ok(reconciled(
            HarvestResult {
                plant,
                reward,
                progress: credit.progress,
                level_up: credit.level_up,
            },
            committed.snapshot,
        ))
    }

    fn revoke_credit(&self, garden_id: GardenId, owner_id: OwnerId, plant_id: PlantId) {
        if let Err(e) = self.players.revoke(owner_id, plant_id) {
            error!(
                garden_id = %garden_id,
                plant_id = %plant_id,
                owner_id = %owner_id,
                error = %e,
                "Harvest did not commit and its credit could not be revoked"
            );
        }
    }

    /// Remove a plant without reward, whatever its stage.
    ///
    /// # Errors
    ///
    /// Unknown plant, or the usual ownership and concurrency errors.
    pub fn remove_plant(
        &self,
        garden_id: GardenId,
        owner_id: OwnerId,
        plant_id: PlantId,
        now: DateTime<Utc>,
    ) -> Result<Reconciled<()>, GardenError> {
        let action = GardenAction::Remove { plant_id };
        let committed = self.act(garden_id, owner_id, &action, now)?;
        Ok(reconciled((), committed.snapshot))
    }

    // -----------------------------------------------------------------------
    // Sweep
    // -----------------------------------------------------------------------

    /// Catch up and persist every stored garden.
    ///
    /// Individual failures are logged and counted rather than aborting the
    /// sweep.
    ///
    /// # Errors
    ///
    /// A store failure while listing gardens.
    pub fn catch_up_all(&self, now: DateTime<Utc>) -> Result<SweepReport, GardenError> {
        let ids = self.store.list_ids().map_err(|e| GardenError::Store {
            message: e.to_string(),
        })?;
        let mut report = SweepReport {
            gardens: ids.len(),
            ..SweepReport::default()
        };
        for garden_id in ids {
            match self.transact(garden_id, now, |_| Ok(())) {
                Ok(committed) => {
                    if committed.written {
                        report.updated = report.updated.saturating_add(1);
                    }
                    report.newly_withered = report
                        .newly_withered
                        .saturating_add(committed.report.newly_withered.len());
                    report.newly_harvestable = report
                        .newly_harvestable
                        .saturating_add(committed.report.newly_harvestable.len());
                }
                Err(GardenError::NotFound(NotFound::Garden(_))) => {}
                Err(e) => {
                    warn!(garden_id = %garden_id, error = %e, "Sweep could not catch up garden");
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    fn act(
        &self,
        garden_id: GardenId,
        caller: OwnerId,
        action: &GardenAction,
        now: DateTime<Utc>,
    ) -> Result<Committed<ActionOutcome>, GardenError> {
        self.act_with(garden_id, caller, action, now, |_| Ok(()))
    }

    /// [`Self::act`] with a hook run on each successful outcome just before
    /// its compare-and-swap.
    fn act_with(
        &self,
        garden_id: GardenId,
        caller: OwnerId,
        action: &GardenAction,
        now: DateTime<Utc>,
        before_commit: impl FnMut(&ActionOutcome) -> Result<(), GardenError>,
    ) -> Result<Committed<ActionOutcome>, GardenError> {
        let ctx = ActionContext {
            caller,
            now,
            catalog: &self.catalog,
            rules: &self.rules,
        };
        let result = self.transact_with(
            garden_id,
            now,
            |state| state.apply(action, &ctx),
            before_commit,
        );
        match &result {
            Ok(committed) => info!(
                garden_id = %garden_id,
                action = action.name(),
                version = committed.snapshot.version,
                "Garden action committed"
            ),
            Err(e) => debug!(
                garden_id = %garden_id,
                action = action.name(),
                error = %e,
                "Garden action rejected"
            ),
        }
        result
    }

    fn transact<T>(
        &self,
        garden_id: GardenId,
        now: DateTime<Utc>,
        op: impl FnMut(&mut GardenState) -> Result<T, GardenError>,
    ) -> Result<Committed<T>, GardenError> {
        self.transact_with(garden_id, now, op, |_| Ok(()))
    }

    /// Load, catch up, run `op`, and commit with compare-and-swap, retrying
    /// on version mismatches. `before_commit` sees every successful result
    /// ahead of its write and can veto it. Nothing is written when either
    /// fails or when the garden did not change.
    fn transact_with<T>(
        &self,
        garden_id: GardenId,
        now: DateTime<Utc>,
        mut op: impl FnMut(&mut GardenState) -> Result<T, GardenError>,
        mut before_commit: impl FnMut(&T) -> Result<(), GardenError>,
    ) -> Result<Committed<T>, GardenError> {
        for attempt in 1..=self.max_attempts {
            let record = self
                .store
                .load(garden_id)
                .map_err(|e| store_error(garden_id, e))?;
            let loaded = GardenState::new(record.garden, record.plants);
            let conditions = self.environment.conditions(loaded.garden(), now);

            let mut state = loaded.clone();
            let report = state.catch_up(now, conditions, &self.catalog, &self.rules);
            let result = op(&mut state)?;
            state.check_invariants()?;
            before_commit(&result)?;

            if state == loaded {
                return Ok(Committed {
                    result,
                    snapshot: state.snapshot(conditions, record.version),
                    report,
                    written: false,
                });
            }

            let (garden, plants) = state.clone().into_parts();
            match self.store.compare_and_swap(record.version, garden, plants) {
                Ok(version) => {
                    return Ok(Committed {
                        result,
                        snapshot: state.snapshot(conditions, version),
                        report,
                        written: true,
                    });
                }
                Err(StoreError::VersionMismatch { expected, actual, .. }) => {
                    debug!(
                        garden_id = %garden_id,
                        attempt,
                        expected,
                        actual,
                        "Garden version changed, retrying"
                    );
                }
                Err(e) => return Err(store_error(garden_id, e)),
            }
        }

        warn!(
            garden_id = %garden_id,
            attempts = self.max_attempts,
            "Giving up on contended garden"
        );
        Err(GardenError::ConcurrencyConflict {
            garden_id,
            attempts: self.max_attempts,
        })
    }
}

const fn reconciled<T>(result: T, snapshot: GardenSnapshot) -> Reconciled<T> {
    Reconciled { result, snapshot }
}

fn unexpected(outcome: &ActionOutcome) -> GardenError {
    GardenError::InvariantViolated {
        reason: format!("unexpected action outcome {outcome:?}"),
    }
}

fn store_error(garden_id: GardenId, error: StoreError) -> GardenError {
    match error {
        StoreError::NotFound(_) => NotFound::Garden(garden_id).into(),
        other => GardenError::Store {
            message: other.to_string(),
        },
    }
}

fn registry_error(owner_id: OwnerId, error: RegistryError) -> GardenError {
    match error {
        RegistryError::UnknownPlayer(_) => NotFound::Owner(owner_id).into(),
        RegistryError::Unavailable { message } => GardenError::Registry { message },
    }
}
