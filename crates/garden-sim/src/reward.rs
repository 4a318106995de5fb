//! Harvest rewards and experience levels.

use garden_types::{HarvestReward, PlantType};

/// Experience needed per level.
pub const EXPERIENCE_PER_LEVEL: u64 = 100;

/// Reward for harvesting a plant of `plant_type` at `health`.
///
/// Coins are `yield * value * health / 100`, rounded down; experience is the
/// type's flat value. Health is clamped to `[0, 100]`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn harvest_reward(plant_type: &PlantType, health: f64) -> HarvestReward {
    let base = u64::from(plant_type.yield_count).saturating_mul(u64::from(plant_type.harvest_value));
    let coins = if health >= 100.0 {
        base
    } else if health <= 0.0 || health.is_nan() {
        0
    } else {
        (base as f64 * health / 100.0).floor() as u64
    };
    HarvestReward {
        coins,
        experience: u64::from(plant_type.experience_value),
    }
}

/// Level reached with `experience` points. Starts at 1.
pub fn level_for_experience(experience: u64) -> u32 {
    let level = experience
        .checked_div(EXPERIENCE_PER_LEVEL)
        .unwrap_or(0)
        .saturating_add(1);
    u32::try_from(level).unwrap_or(u32::MAX)
}
