//! The garden aggregate: one garden and the plants growing in it.
//!
//! [`GardenState`] owns every mutation of a garden. Time only moves through
//! [`GardenState::catch_up`], which integrates decay and growth in bounded
//! steps from `last_tick_at` to the requested instant. Player actions go
//! through [`GardenState::apply`], which validates against the caught-up
//! state and commits all-or-nothing: the mutation is built on a copy and
//! only replaces the live state if every garden invariant still holds.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use garden_types::{
    Conditions, Garden, GardenId, GardenSnapshot, HarvestReward, OwnerId, PlantId,
    PlantInstance, PlantStage, Upgrade, Upgrades,
};

use crate::catalog::PlantCatalog;
use crate::config::GrowthRules;
use crate::decay::{
    MAX_PERCENT, clamp_percent, decay_garden, decay_plant, effective_elapsed, secs_to_hours,
};
use crate::error::{GardenError, NotFound, ValidationError};
use crate::gate::{ActionContext, GardenAction, validate};
use crate::growth::{advance_plant, refresh_stage};
use crate::reward::harvest_reward;

/// What a committed action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// A new plant was placed.
    Planted(PlantInstance),
    /// The plant after watering.
    Watered(PlantInstance),
    /// The plant after fertilizing.
    Fertilized(PlantInstance),
    /// The plant was harvested and removed.
    Harvested {
        /// The plant as it was when harvested, with `harvested_at` set.
        plant: PlantInstance,
        /// Coins and experience earned.
        reward: HarvestReward,
    },
    /// The plant was removed.
    Removed(PlantInstance),
    /// The upgrade was installed.
    UpgradeInstalled(Upgrade),
}

/// Summary of one catch-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatchUpReport {
    /// Simulated time.
    pub simulated: Duration,
    /// Elapsed time beyond the cap, skipped without simulation.
    pub forgiven: Duration,
    /// Number of integration steps run.
    pub steps: u32,
    /// Plants that withered during this catch-up.
    pub newly_withered: Vec<PlantId>,
    /// Plants that became harvestable during this catch-up.
    pub newly_harvestable: Vec<PlantId>,
}

impl CatchUpReport {
    /// Whether the catch-up advanced the clock at all.
    pub fn is_noop(&self) -> bool {
        self.simulated.is_zero() && self.forgiven.is_zero()
    }
}

/// A garden together with its plants.
#[derive(Debug, Clone, PartialEq)]
pub struct GardenState {
    garden: Garden,
    plants: BTreeMap<PlantId, PlantInstance>,
}

impl GardenState {
    /// Wrap a stored garden and its plants.
    pub fn new(garden: Garden, plants: impl IntoIterator<Item = PlantInstance>) -> Self {
        Self {
            garden,
            plants: plants.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    /// Create an empty garden for `owner_id` at `now`.
    ///
    /// `size` defaults to [`GrowthRules::default_garden_size`] and must lie in
    /// `[1, max_garden_size]`.
    pub fn create(
        owner_id: OwnerId,
        name: impl Into<String>,
        size: Option<u32>,
        now: DateTime<Utc>,
        rules: &GrowthRules,
    ) -> Result<Self, ValidationError> {
        let size = size.unwrap_or(rules.default_garden_size);
        if size == 0 || size > rules.max_garden_size {
            return Err(ValidationError::InvalidGardenSize {
                size,
                max: rules.max_garden_size,
            });
        }
        let garden = Garden {
            id: GardenId::new(),
            owner_id,
            name: name.into(),
            size,
            water_level: clamp_percent(rules.initial_water_level),
            fertilizer_level: clamp_percent(rules.initial_fertilizer_level),
            soil_quality: clamp_percent(rules.initial_soil_quality),
            upgrades: Upgrades::default(),
            created_at: now,
            last_tick_at: now,
        };
        Ok(Self::new(garden, []))
    }

    /// The caught-up instant an action requested at `now` takes effect:
    /// `now`, unless the garden has already been advanced past it.
    pub fn action_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.max(self.garden.last_tick_at)
    }

    /// The garden record.
    pub const fn garden(&self) -> &Garden {
        &self.garden
    }

    /// Look up a plant by id.
    pub fn plant(&self, plant_id: PlantId) -> Option<&PlantInstance> {
        self.plants.get(&plant_id)
    }

    /// The plant occupying `position`, if any.
    pub fn plant_at(&self, position: u32) -> Option<&PlantInstance> {
        self.plants.values().find(|p| p.position == position)
    }

    /// All plants, in id order.
    pub fn plants(&self) -> impl Iterator<Item = &PlantInstance> {
        self.plants.values()
    }

    /// Split into the garden record and its plants ordered by position.
    pub fn into_parts(self) -> (Garden, Vec<PlantInstance>) {
        let mut plants: Vec<_> = self.plants.into_values().collect();
        plants.sort_by_key(|p| p.position);
        (self.garden, plants)
    }

    /// Snapshot for callers, plants ordered by position.
    pub fn snapshot(&self, conditions: Conditions, version: u64) -> GardenSnapshot {
        let mut plants: Vec<_> = self.plants.values().cloned().collect();
        plants.sort_by_key(|p| p.position);
        GardenSnapshot {
            garden: self.garden.clone(),
            plants,
            conditions,
            version,
        }
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Bring the garden up to `now`.
    ///
    /// Simulates at most `max_catch_up_secs`; anything beyond is forgiven
    /// and `last_tick_at` jumps to `now`. Otherwise only whole seconds are
    /// simulated and `last_tick_at` advances by exactly that much, so
    /// frequent calls lose no time. Runs in steps of `step_secs`, each
    /// applying decay and then growth. Calling twice with the same `now`
    /// changes nothing the second time, and a `now` before `last_tick_at`
    /// is a no-op.
    pub fn catch_up(
        &mut self,
        now: DateTime<Utc>,
        conditions: Conditions,
        catalog: &PlantCatalog,
        rules: &GrowthRules,
    ) -> CatchUpReport {
        let last = self.garden.last_tick_at;
        if now <= last {
            return CatchUpReport::default();
        }

        // Whole seconds only; a sub-second remainder stays behind
        // `last_tick_at` for the next call.
        let capped = effective_elapsed(last, now, rules);
        let whole_secs = u64::try_from(capped.num_seconds()).unwrap_or(0);
        let simulated = i64::try_from(whole_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(Duration::zero);
        let forgiven = if capped < now.signed_duration_since(last) {
            now.signed_duration_since(last)
                .checked_sub(&simulated)
                .unwrap_or_else(Duration::zero)
        } else {
            Duration::zero()
        };
        if whole_secs == 0 && forgiven.is_zero() {
            return CatchUpReport::default();
        }
        let stages_before: BTreeMap<PlantId, PlantStage> =
            self.plants.values().map(|p| (p.id, p.stage)).collect();

        let mut remaining = whole_secs;
        let step_len = rules.step_secs.max(1);
        let mut cursor = last;
        let mut steps: u32 = 0;

        while remaining > 0 {
            let step = remaining.min(step_len);
            remaining = remaining.saturating_sub(step);
            let step_delta = i64::try_from(step)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or_else(Duration::zero);
            cursor = cursor.checked_add_signed(step_delta).unwrap_or(now);
            self.step(cursor, step, conditions, catalog, rules);
            steps = steps.saturating_add(1);
        }

        self.garden.last_tick_at = if forgiven.is_zero() {
            last.checked_add_signed(simulated).unwrap_or(now)
        } else {
            now
        };

        let mut report = CatchUpReport {
            simulated,
            forgiven,
            steps,
            ..CatchUpReport::default()
        };
        for plant in self.plants.values() {
            let before = stages_before.get(&plant.id).copied();
            if before == Some(plant.stage) {
                continue;
            }
            match plant.stage {
                PlantStage::Withered => report.newly_withered.push(plant.id),
                PlantStage::Harvestable => report.newly_harvestable.push(plant.id),
                _ => {}
            }
        }

        tracing::debug!(
            garden_id = %self.garden.id,
            simulated_secs = simulated.num_seconds(),
            forgiven_secs = forgiven.num_seconds(),
            steps,
            "Garden caught up"
        );
        report
    }

    /// One integration step ending at `step_end`.
    fn step(
        &mut self,
        step_end: DateTime<Utc>,
        step_secs: u64,
        conditions: Conditions,
        catalog: &PlantCatalog,
        rules: &GrowthRules,
    ) {
        let hours = secs_to_hours(step_secs);
        decay_garden(&mut self.garden, hours, rules);

        for plant in self.plants.values_mut() {
            decay_plant(plant, &self.garden, conditions, hours, rules);
            match catalog.get(plant.plant_type_id) {
                Some(plant_type) => advance_plant(
                    plant,
                    plant_type,
                    &self.garden,
                    conditions,
                    step_end,
                    step_secs,
                    rules,
                ),
                None => {
                    tracing::warn!(
                        plant_id = %plant.id,
                        plant_type_id = %plant.plant_type_id,
                        "Plant type missing from catalog, growth skipped"
                    );
                    // Decay still ran, so health may have reached zero.
                    refresh_stage(plant);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Validate and apply `action` at `ctx.now`.
    ///
    /// The garden must already be caught up to `ctx.now`. On any error the
    /// state is left exactly as it was.
    pub fn apply(
        &mut self,
        action: &GardenAction,
        ctx: &ActionContext<'_>,
    ) -> Result<ActionOutcome, GardenError> {
        validate(self, action, ctx)?;

        let mut next = self.clone();
        let outcome = next.mutate(action, ctx)?;
        next.check_invariants()?;
        *self = next;
        Ok(outcome)
    }

    fn mutate(
        &mut self,
        action: &GardenAction,
        ctx: &ActionContext<'_>,
    ) -> Result<ActionOutcome, GardenError> {
        let at = self.action_instant(ctx.now);
        match *action {
            GardenAction::PlantSeed {
                plant_type_id,
                position,
                ..
            } => {
                let plant = PlantInstance {
                    id: PlantId::new(),
                    garden_id: self.garden.id,
                    plant_type_id,
                    position,
                    stage: PlantStage::Seed,
                    growth_progress: 0.0,
                    water_level: clamp_percent(ctx.rules.seed_water_level),
                    health: MAX_PERCENT,
                    stress_secs: 0,
                    planted_at: at,
                    last_watered_at: None,
                    last_fertilized_at: None,
                    harvested_at: None,
                };
                self.plants.insert(plant.id, plant.clone());
                Ok(ActionOutcome::Planted(plant))
            }
            GardenAction::Water { plant_id, amount } => {
                let plant = self.plant_mut(plant_id)?;
                plant.water_level = clamp_percent(plant.water_level + f64::from(amount));
                plant.last_watered_at = Some(at);
                Ok(ActionOutcome::Watered(plant.clone()))
            }
            GardenAction::Fertilize { plant_id, amount } => {
                let plant = self.plant_mut(plant_id)?;
                plant.last_fertilized_at = Some(at);
                let plant = plant.clone();
                self.garden.fertilizer_level =
                    clamp_percent(self.garden.fertilizer_level + f64::from(amount));
                Ok(ActionOutcome::Fertilized(plant))
            }
            GardenAction::Harvest { plant_id } => {
                let plant_type_id = self.plant_mut(plant_id)?.plant_type_id;
                let plant_type = ctx
                    .catalog
                    .get(plant_type_id)
                    .ok_or(NotFound::PlantType(plant_type_id))?;
                let mut plant = self
                    .plants
                    .remove(&plant_id)
                    .ok_or(NotFound::Plant(plant_id))?;
                let reward = harvest_reward(plant_type, plant.health);
                plant.harvested_at = Some(at);
                Ok(ActionOutcome::Harvested { plant, reward })
            }
            GardenAction::Remove { plant_id } => {
                let plant = self
                    .plants
                    .remove(&plant_id)
                    .ok_or(NotFound::Plant(plant_id))?;
                Ok(ActionOutcome::Removed(plant))
            }
            GardenAction::InstallUpgrade { upgrade } => {
                self.garden.upgrades.install(upgrade);
                Ok(ActionOutcome::UpgradeInstalled(upgrade))
            }
        }
    }

    fn plant_mut(&mut self, plant_id: PlantId) -> Result<&mut PlantInstance, NotFound> {
        self.plants
            .get_mut(&plant_id)
            .ok_or(NotFound::Plant(plant_id))
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Verify every structural and numeric invariant of the garden.
    pub fn check_invariants(&self) -> Result<(), GardenError> {
        let garden = &self.garden;
        check_percent("garden water_level", garden.water_level)?;
        check_percent("garden fertilizer_level", garden.fertilizer_level)?;
        check_percent("garden soil_quality", garden.soil_quality)?;
        if garden.size == 0 {
            return Err(violation(String::from("garden size is zero")));
        }

        let mut occupied = BTreeMap::new();
        for (id, plant) in &self.plants {
            if *id != plant.id {
                return Err(violation(format!("plant {} stored under key {id}", plant.id)));
            }
            if plant.garden_id != garden.id {
                return Err(violation(format!(
                    "plant {} belongs to garden {}",
                    plant.id, plant.garden_id
                )));
            }
            if plant.position >= garden.size {
                return Err(violation(format!(
                    "plant {} at position {} outside size {}",
                    plant.id, plant.position, garden.size
                )));
            }
            if let Some(other) = occupied.insert(plant.position, plant.id) {
                return Err(violation(format!(
                    "plants {other} and {} share position {}",
                    plant.id, plant.position
                )));
            }
            check_percent("plant water_level", plant.water_level)?;
            check_percent("plant health", plant.health)?;
            check_percent("plant growth_progress", plant.growth_progress)?;
            match plant.stage {
                PlantStage::Withered if plant.health > 0.0 => {
                    return Err(violation(format!(
                        "withered plant {} has health {}",
                        plant.id, plant.health
                    )));
                }
                PlantStage::Withered => {}
                PlantStage::Harvestable => {
                    if plant.growth_progress < MAX_PERCENT || plant.health <= 0.0 {
                        return Err(violation(format!(
                            "harvestable plant {} has progress {} and health {}",
                            plant.id, plant.growth_progress, plant.health
                        )));
                    }
                }
                _ => {
                    if plant.growth_progress >= MAX_PERCENT && plant.health > 0.0 {
                        return Err(violation(format!(
                            "fully grown plant {} is still {:?}",
                            plant.id, plant.stage
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn violation(reason: String) -> GardenError {
    GardenError::InvariantViolated { reason }
}

fn check_percent(field: &str, value: f64) -> Result<(), GardenError> {
    if value.is_finite() && (0.0..=MAX_PERCENT).contains(&value) {
        Ok(())
    } else {
        Err(violation(format!("{field} out of range: {value}")))
    }
}
