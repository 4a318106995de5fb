//! Passive resource decay applied during catch-up.
//!
//! Decay is a pure function of elapsed time, the garden's upgrades, and the
//! current weather:
//!
//! - Garden moisture, fertilizer, and soil quality drop at fixed hourly rates
//! - A sprinkler halves water loss; a composter slows fertilizer loss
//! - Plant moisture evaporates at a weather-dependent rate, damped by up to
//!   half by the garden's ground moisture
//! - Adverse weather (storm, snow) damages plant health; a greenhouse halves
//!   the damage
//!
//! Decay never raises a level, and withered plants are left untouched.

use chrono::{DateTime, Duration, Utc};
use garden_types::{Conditions, Garden, PlantInstance};

use crate::config::GrowthRules;
use crate::environment::{evaporation_rate, is_adverse};

/// Upper bound of every percentage field.
pub const MAX_PERCENT: f64 = 100.0;

/// Clamp a percentage into `[0, 100]`. `NaN` becomes 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_PERCENT)
}

/// Elapsed time a catch-up from `last_tick_at` to `now` should simulate.
///
/// Returns zero when `now` is not after `last_tick_at` and caps the result
/// at [`GrowthRules::max_catch_up`].
pub fn effective_elapsed(
    last_tick_at: DateTime<Utc>,
    now: DateTime<Utc>,
    rules: &GrowthRules,
) -> Duration {
    let elapsed = now.signed_duration_since(last_tick_at);
    if elapsed <= Duration::zero() {
        return Duration::zero();
    }
    elapsed.min(rules.max_catch_up())
}

/// Convert a step length in seconds to hours.
#[allow(clippy::cast_precision_loss)]
pub fn secs_to_hours(secs: u64) -> f64 {
    secs as f64 / 3_600.0
}

/// Reduce `level` by `rate * hours`, never increasing it.
fn decayed(level: f64, rate: f64, hours: f64) -> f64 {
    let loss = (rate * hours).max(0.0);
    clamp_percent(level - loss)
}

/// Apply `hours` of decay to the garden-level resources.
pub fn decay_garden(garden: &mut Garden, hours: f64, rules: &GrowthRules) {
    let water_factor = if garden.upgrades.sprinkler {
        rules.sprinkler_factor
    } else {
        1.0
    };
    let fertilizer_factor = if garden.upgrades.composter {
        rules.composter_factor
    } else {
        1.0
    };

    garden.water_level = decayed(
        garden.water_level,
        rules.garden_water_decay_per_hour * water_factor,
        hours,
    );
    garden.fertilizer_level = decayed(
        garden.fertilizer_level,
        rules.fertilizer_decay_per_hour * fertilizer_factor,
        hours,
    );
    garden.soil_quality = decayed(garden.soil_quality, rules.soil_decay_per_hour, hours);
}

/// Hourly plant moisture loss for the garden and weather.
pub fn plant_evaporation_per_hour(
    garden: &Garden,
    conditions: Conditions,
    rules: &GrowthRules,
) -> f64 {
    let sprinkler = if garden.upgrades.sprinkler {
        rules.sprinkler_factor
    } else {
        1.0
    };
    // Wet ground halves evaporation at most.
    let ground = 1.0 - 0.5 * clamp_percent(garden.water_level) / MAX_PERCENT;
    rules.plant_water_decay_per_hour * evaporation_rate(conditions.weather) * sprinkler * ground
}

/// Hourly health loss from the weather, after greenhouse shielding.
pub fn weather_damage_per_hour(garden: &Garden, conditions: Conditions, rules: &GrowthRules) -> f64 {
    if !is_adverse(conditions.weather) {
        return 0.0;
    }
    let shield = if garden.upgrades.greenhouse {
        rules.greenhouse_factor
    } else {
        1.0
    };
    rules.adverse_weather_damage_per_hour * shield
}

/// Apply `hours` of decay to one plant.
///
/// Withered plants are returned unchanged.
pub fn decay_plant(
    plant: &mut PlantInstance,
    garden: &Garden,
    conditions: Conditions,
    hours: f64,
    rules: &GrowthRules,
) {
    if plant.stage.is_withered() {
        return;
    }
    plant.water_level = decayed(
        plant.water_level,
        plant_evaporation_per_hour(garden, conditions, rules),
        hours,
    );
    plant.health = decayed(
        plant.health,
        weather_damage_per_hour(garden, conditions, rules),
        hours,
    );
}
