//! Environmental effects on gardens.
//!
//! Weather and season generation live outside the simulation core. This
//! module only defines how a given [`Conditions`] value affects decay and
//! growth, plus the [`EnvironmentSource`] seam through which the service
//! asks for the conditions at an instant.
//!
//! # Weather effects
//!
//! | Weather | Growth | Evaporation | Adverse |
//! |---------|--------|-------------|---------|
//! | Sunny   | 1.2    | 1.5         | no      |
//! | Cloudy  | 1.0    | 1.0         | no      |
//! | Rainy   | 1.1    | 0.3         | no      |
//! | Stormy  | 0.8    | 0.1         | yes     |
//! | Foggy   | 0.9    | 0.8         | no      |
//! | Windy   | 0.95   | 1.3         | no      |
//! | Snowy   | 0.5    | 0.2         | yes     |

use chrono::{DateTime, Datelike, Utc};
use garden_types::{Conditions, Garden, PlantType, Season, Weather};

/// Multiplier applied to plant growth under the given weather.
pub const fn weather_growth_rate(weather: Weather) -> f64 {
    match weather {
        Weather::Sunny => 1.2,
        Weather::Cloudy => 1.0,
        Weather::Rainy => 1.1,
        Weather::Stormy => 0.8,
        Weather::Foggy => 0.9,
        Weather::Windy => 0.95,
        Weather::Snowy => 0.5,
    }
}

/// Multiplier applied to plant evaporation under the given weather.
pub const fn evaporation_rate(weather: Weather) -> f64 {
    match weather {
        Weather::Sunny => 1.5,
        Weather::Cloudy => 1.0,
        Weather::Rainy => 0.3,
        Weather::Stormy => 0.1,
        Weather::Foggy => 0.8,
        Weather::Windy => 1.3,
        Weather::Snowy => 0.2,
    }
}

/// Whether the weather damages plant health.
pub const fn is_adverse(weather: Weather) -> bool {
    matches!(weather, Weather::Stormy | Weather::Snowy)
}

/// Northern-hemisphere meteorological season for a date.
pub fn season_for_date(date: DateTime<Utc>) -> Season {
    match date.month() {
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        9..=11 => Season::Autumn,
        _ => Season::Winter,
    }
}

/// Whether the plant type has an affinity for the current conditions.
///
/// A type with no season and no weather preference never matches.
pub fn matches_affinity(plant_type: &PlantType, conditions: Conditions) -> bool {
    plant_type.season == Some(conditions.season) || plant_type.weather == Some(conditions.weather)
}

/// Source of the season and weather affecting a garden.
///
/// Implementations may consult a weather service or a calendar. They must
/// not block on long I/O: the service calls this inside its retry loop.
pub trait EnvironmentSource: Send + Sync {
    /// Conditions affecting `garden` at `now`.
    fn conditions(&self, garden: &Garden, now: DateTime<Utc>) -> Conditions;
}

/// Constant conditions, independent of garden and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedEnvironment(pub Conditions);

impl FixedEnvironment {
    /// Cloudy weather in spring: neutral evaporation, no damage.
    pub const fn neutral() -> Self {
        Self(Conditions {
            season: Season::Spring,
            weather: Weather::Cloudy,
        })
    }
}

impl EnvironmentSource for FixedEnvironment {
    fn conditions(&self, _garden: &Garden, _now: DateTime<Utc>) -> Conditions {
        self.0
    }
}

/// Season from the calendar, weather held constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarEnvironment {
    /// Weather reported for every instant.
    pub weather: Weather,
}

impl EnvironmentSource for CalendarEnvironment {
    fn conditions(&self, _garden: &Garden, now: DateTime<Utc>) -> Conditions {
        Conditions {
            season: season_for_date(now),
            weather: self.weather,
        }
    }
}
