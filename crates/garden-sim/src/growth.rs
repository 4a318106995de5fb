//! Growth progression applied during catch-up.
//!
//! Each integration step advances a living plant's progress by
//!
//! ```text
//! step / growth_time * 100 * water_factor * fertilizer_factor
//!                          * affinity * weather_rate * soil_factor
//! ```
//!
//! where the resource factors come from [`adequacy_factor`]: full speed when
//! the need is met, linearly slower down to `low_adequacy_factor`, and the
//! flat penalty below `low_adequacy_threshold`. A plant whose water (or
//! required fertilizer) sits below the critical floor accumulates stress;
//! once the grace period is used up it loses health every hour until it
//! withers.
//!
//! Stages follow progress bands and never go backwards.

use chrono::{DateTime, Duration, Utc};
use garden_types::{Conditions, Garden, PlantInstance, PlantStage, PlantType};

use crate::config::GrowthRules;
use crate::decay::{MAX_PERCENT, clamp_percent, secs_to_hours};
use crate::environment::{matches_affinity, weather_growth_rate};

/// Progress within this distance of 100 counts as complete.
const COMPLETION_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Resource adequacy
// ---------------------------------------------------------------------------

/// Ratio of the plant's moisture to its water need. 1.0 when the type
/// needs no water.
pub fn water_adequacy(plant: &PlantInstance, plant_type: &PlantType) -> f64 {
    if plant_type.water_needs == 0 {
        return 1.0;
    }
    plant.water_level / f64::from(plant_type.water_needs)
}

/// Fertilizer available to a plant at `at`.
///
/// The garden's fertilizer level plus a boost from the plant's own last
/// fertilize, fading linearly from 100 to 0 over `fertilizer_effect_secs`.
pub fn fertilizer_supply(
    plant: &PlantInstance,
    garden: &Garden,
    at: DateTime<Utc>,
    rules: &GrowthRules,
) -> f64 {
    let base = clamp_percent(garden.fertilizer_level);
    let Some(fertilized_at) = plant.last_fertilized_at else {
        return base;
    };
    if rules.fertilizer_effect_secs == 0 {
        return base;
    }
    let since = at.signed_duration_since(fertilized_at).max(Duration::zero());
    let since_secs = u64::try_from(since.num_seconds()).unwrap_or(u64::MAX);
    if since_secs >= rules.fertilizer_effect_secs {
        return base;
    }
    let remaining = 1.0 - secs_to_hours(since_secs) / secs_to_hours(rules.fertilizer_effect_secs);
    base + MAX_PERCENT * remaining
}

/// Ratio of the fertilizer supply to the plant's need. 1.0 when the type
/// needs no fertilizer.
pub fn fertilizer_adequacy(
    plant: &PlantInstance,
    plant_type: &PlantType,
    garden: &Garden,
    at: DateTime<Utc>,
    rules: &GrowthRules,
) -> f64 {
    if plant_type.fertilizer_needs == 0 {
        return 1.0;
    }
    fertilizer_supply(plant, garden, at, rules) / f64::from(plant_type.fertilizer_needs)
}

/// Growth factor for one resource given its adequacy ratio.
///
/// 1.0 at or above full adequacy, `low_adequacy_factor` below the low
/// threshold, linear in between.
pub fn adequacy_factor(adequacy: f64, rules: &GrowthRules) -> f64 {
    if adequacy >= 1.0 {
        return 1.0;
    }
    let low = rules.low_adequacy_threshold;
    let floor = rules.low_adequacy_factor;
    if adequacy < low || low >= 1.0 {
        return floor;
    }
    let t = (adequacy - low) / (1.0 - low);
    floor + (1.0 - floor) * t
}

/// Combined affinity, weather, and soil factor.
pub fn environment_factor(
    plant_type: &PlantType,
    garden: &Garden,
    conditions: Conditions,
    rules: &GrowthRules,
) -> f64 {
    let affinity = if matches_affinity(plant_type, conditions) {
        rules.affinity_bonus
    } else {
        1.0
    };
    let soil = 1.0 + rules.soil_growth_bonus * clamp_percent(garden.soil_quality) / MAX_PERCENT;
    affinity * weather_growth_rate(conditions.weather) * soil
}

/// Total growth multiplier for a plant at `at`. Never negative.
pub fn growth_multiplier(
    plant: &PlantInstance,
    plant_type: &PlantType,
    garden: &Garden,
    conditions: Conditions,
    at: DateTime<Utc>,
    rules: &GrowthRules,
) -> f64 {
    let water = adequacy_factor(water_adequacy(plant, plant_type), rules);
    let fertilizer = adequacy_factor(
        fertilizer_adequacy(plant, plant_type, garden, at, rules),
        rules,
    );
    (water * fertilizer * environment_factor(plant_type, garden, conditions, rules)).max(0.0)
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Stage band for a living plant's progress.
pub fn stage_for_progress(progress: f64) -> PlantStage {
    if progress >= MAX_PERCENT {
        PlantStage::Harvestable
    } else if progress >= 70.0 {
        PlantStage::Mature
    } else if progress >= 30.0 {
        PlantStage::Growing
    } else if progress >= 10.0 {
        PlantStage::Sprout
    } else {
        PlantStage::Seed
    }
}

/// Recompute the plant's stage from its health and progress.
///
/// Withering is absorbing: a withered plant keeps its stage, and a plant
/// whose health reached zero withers with health pinned at 0.
pub fn refresh_stage(plant: &mut PlantInstance) {
    if plant.stage.is_withered() {
        return;
    }
    if plant.health <= 0.0 {
        plant.health = 0.0;
        plant.stage = PlantStage::Withered;
        return;
    }
    let banded = stage_for_progress(plant.growth_progress);
    // Stages never regress.
    if banded > plant.stage {
        plant.stage = banded;
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// Advance one plant by a step of `step_secs` ending at `step_end`.
///
/// Applies stress, then growth, then refreshes the stage. Withered plants
/// are left untouched; harvestable plants stop growing but still take
/// stress damage.
pub fn advance_plant(
    plant: &mut PlantInstance,
    plant_type: &PlantType,
    garden: &Garden,
    conditions: Conditions,
    step_end: DateTime<Utc>,
    step_secs: u64,
    rules: &GrowthRules,
) {
    if plant.stage.is_withered() || step_secs == 0 {
        return;
    }

    apply_stress(plant, plant_type, garden, step_end, step_secs, rules);

    if plant.stage.is_growing() && plant.health > 0.0 && plant_type.growth_time_minutes > 0 {
        let total_secs = u64::from(plant_type.growth_time_minutes).saturating_mul(60);
        let fraction = secs_to_hours(step_secs) / secs_to_hours(total_secs);
        let multiplier =
            growth_multiplier(plant, plant_type, garden, conditions, step_end, rules);
        let mut progress = plant.growth_progress + fraction * MAX_PERCENT * multiplier;
        if progress >= MAX_PERCENT - COMPLETION_EPSILON {
            progress = MAX_PERCENT;
        }
        plant.growth_progress = clamp_percent(progress.max(plant.growth_progress));
    } else if plant.stage.is_growing() && plant_type.growth_time_minutes == 0 {
        plant.growth_progress = MAX_PERCENT;
    }

    refresh_stage(plant);
}

/// Accumulate or reset stress and apply health damage past the grace period.
fn apply_stress(
    plant: &mut PlantInstance,
    plant_type: &PlantType,
    garden: &Garden,
    at: DateTime<Utc>,
    step_secs: u64,
    rules: &GrowthRules,
) {
    let floor = rules.critical_adequacy_floor;
    let thirsty = water_adequacy(plant, plant_type) < floor;
    let starving = plant_type.fertilizer_needs > 0
        && fertilizer_adequacy(plant, plant_type, garden, at, rules) < floor;

    if !(thirsty || starving) {
        plant.stress_secs = 0;
        return;
    }

    let before = plant.stress_secs;
    plant.stress_secs = before.saturating_add(step_secs);
    let damage_from = before.max(rules.stress_grace_secs);
    let over_grace = plant.stress_secs.saturating_sub(damage_from);
    if over_grace > 0 {
        let damage = (rules.stress_damage_per_hour * secs_to_hours(over_grace)).max(0.0);
        plant.health = clamp_percent(plant.health - damage);
    }
}
