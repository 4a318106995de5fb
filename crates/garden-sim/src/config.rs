//! Tunable parameters for decay, growth, and action gating.
//!
//! The [`GrowthRules`] struct bundles every rate, threshold, and window used
//! by the simulation so that callers (the service, tests) can override the
//! defaults. It deserializes from the `rules` section of
//! `garden-config.yaml`; missing keys keep their defaults.

use chrono::Duration;
use serde::Deserialize;

/// Configuration for the garden simulation.
///
/// Rates are expressed per hour of simulated time and are scaled by the
/// length of each catch-up step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GrowthRules {
    /// Longest interval a single catch-up will simulate (default: 24 h).
    ///
    /// Time beyond the cap is forgiven rather than simulated.
    pub max_catch_up_secs: u64,

    /// Length of one integration step during catch-up (default: 1 h).
    pub step_secs: u64,

    /// Garden ground moisture lost per hour (default: 1.0).
    pub garden_water_decay_per_hour: f64,

    /// Garden fertilizer lost per hour (default: 1.0).
    pub fertilizer_decay_per_hour: f64,

    /// Soil quality lost per hour (default: 0.1).
    pub soil_decay_per_hour: f64,

    /// Plant moisture lost per hour in neutral weather (default: 2.0).
    pub plant_water_decay_per_hour: f64,

    /// Multiplier on water decay with a sprinkler (default: 0.5).
    pub sprinkler_factor: f64,

    /// Multiplier on fertilizer decay with a composter (default: 0.5).
    pub composter_factor: f64,

    /// Multiplier on adverse-weather damage with a greenhouse (default: 0.5).
    pub greenhouse_factor: f64,

    /// Health lost per hour in adverse weather (default: 0.5).
    pub adverse_weather_damage_per_hour: f64,

    /// Adequacy below which growth runs at the penalty rate (default: 0.3).
    pub low_adequacy_threshold: f64,

    /// Growth factor applied below the low threshold (default: 0.5).
    pub low_adequacy_factor: f64,

    /// Adequacy below which a plant accumulates stress (default: 0.1).
    pub critical_adequacy_floor: f64,

    /// Stress tolerated before health starts dropping (default: 6 h).
    pub stress_grace_secs: u64,

    /// Health lost per hour once the grace period is exhausted (default: 5.0).
    pub stress_damage_per_hour: f64,

    /// Growth multiplier when season or weather matches the plant's
    /// affinity (default: 1.2).
    pub affinity_bonus: f64,

    /// Extra growth at full soil quality, as a fraction (default: 0.1).
    pub soil_growth_bonus: f64,

    /// How long a fertilize keeps boosting the plant's supply (default: 48 h).
    pub fertilizer_effect_secs: u64,

    /// Minimum time between two fertilize actions on one plant
    /// (default: 24 h).
    pub fertilize_cooldown_secs: u64,

    /// Moisture of a freshly planted seed (default: 50).
    pub seed_water_level: f64,

    /// Ground moisture of a new garden (default: 50).
    pub initial_water_level: f64,

    /// Fertilizer of a new garden (default: 0).
    pub initial_fertilizer_level: f64,

    /// Soil quality of a new garden (default: 50).
    pub initial_soil_quality: f64,

    /// Grid size used when none is requested (default: 9).
    pub default_garden_size: u32,

    /// Largest grid a garden may be created with (default: 64).
    pub max_garden_size: u32,
}

impl Default for GrowthRules {
    fn default() -> Self {
        Self {
            max_catch_up_secs: 86_400,
            step_secs: 3_600,
            garden_water_decay_per_hour: 1.0,
            fertilizer_decay_per_hour: 1.0,
            soil_decay_per_hour: 0.1,
            plant_water_decay_per_hour: 2.0,
            sprinkler_factor: 0.5,
            composter_factor: 0.5,
            greenhouse_factor: 0.5,
            adverse_weather_damage_per_hour: 0.5,
            low_adequacy_threshold: 0.3,
            low_adequacy_factor: 0.5,
            critical_adequacy_floor: 0.1,
            stress_grace_secs: 21_600,
            stress_damage_per_hour: 5.0,
            affinity_bonus: 1.2,
            soil_growth_bonus: 0.1,
            fertilizer_effect_secs: 172_800,
            fertilize_cooldown_secs: 86_400,
            seed_water_level: 50.0,
            initial_water_level: 50.0,
            initial_fertilizer_level: 0.0,
            initial_soil_quality: 50.0,
            default_garden_size: 9,
            max_garden_size: 64,
        }
    }
}

impl GrowthRules {
    /// The catch-up cap as a [`Duration`].
    pub fn max_catch_up(&self) -> Duration {
        secs_to_duration(self.max_catch_up_secs)
    }

    /// The fertilize cooldown as a [`Duration`].
    pub fn fertilize_cooldown(&self) -> Duration {
        secs_to_duration(self.fertilize_cooldown_secs)
    }
}

/// Convert a configured second count to a [`Duration`], saturating at
/// `i64::MAX` seconds.
fn secs_to_duration(secs: u64) -> Duration {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
    Duration::try_seconds(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_values() {
        let rules = GrowthRules::default();
        assert_eq!(rules.max_catch_up_secs, 86_400);
        assert_eq!(rules.fertilize_cooldown(), Duration::hours(24));
        assert_eq!(rules.default_garden_size, 9);
        assert!(rules.step_secs > 0);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "fertilize_cooldown_secs: 3600\nsprinkler_factor: 0.25\n";
        let rules: Result<GrowthRules, _> = serde_yml::from_str(yaml);
        assert!(rules.is_ok(), "{rules:?}");
        let rules = rules.unwrap_or_default();
        assert_eq!(rules.fertilize_cooldown(), Duration::hours(1));
        assert_eq!(rules.step_secs, 3_600);
        assert_eq!(rules.max_catch_up(), Duration::hours(24));
    }
}
