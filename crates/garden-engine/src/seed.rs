//! Seed gardens for a freshly started engine.
//!
//! The engine keeps its gardens in memory, so every start begins empty.
//! The `seed` section of `garden-config.yaml` lists gardens to create at
//! startup, each with its own newly registered owner and an optional set
//! of plants named from the catalog.

use chrono::{DateTime, Utc};
use garden_core::{GardenService, GardenStore, InMemoryPlayerRegistry};
use garden_sim::EnvironmentSource;
use garden_types::{GardenId, OwnerId};
use serde::Deserialize;
use tracing::info;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// The `seed` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedConfig {
    /// Gardens to create at startup.
    #[serde(default = "default_seed_gardens")]
    pub gardens: Vec<SeedGarden>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            gardens: default_seed_gardens(),
        }
    }
}

/// One garden to create at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedGarden {
    /// Display name.
    pub name: String,

    /// Grid size; the configured default when omitted.
    #[serde(default)]
    pub size: Option<u32>,

    /// Seeds to plant right away.
    #[serde(default)]
    pub plants: Vec<SeedPlant>,
}

/// A seed planted in a startup garden.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedPlant {
    /// Catalog name of the plant type, matched case-insensitively.
    pub plant: String,

    /// Grid slot.
    pub position: u32,
}

fn default_seed_gardens() -> Vec<SeedGarden> {
    vec![SeedGarden {
        name: String::from("Starter Plot"),
        size: None,
        plants: ["Tomato", "Carrot", "Lettuce"]
            .into_iter()
            .zip(0..)
            .map(|(plant, position)| SeedPlant {
                plant: String::from(plant),
                position,
            })
            .collect(),
    }]
}

// -----------------------------------------------------------------------
// Seeding
// -----------------------------------------------------------------------

/// What [`seed_gardens`] created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedResult {
    /// The owner registered for each garden, in config order.
    pub owners: Vec<OwnerId>,
    /// The created gardens, in config order.
    pub gardens: Vec<GardenId>,
    /// Total seeds planted.
    pub plants: usize,
}

/// Create every configured garden at `now`, each with a new owner.
///
/// # Errors
///
/// [`EngineError::Seed`] for a plant name missing from the catalog, or any
/// error the service reports while creating gardens and planting.
pub fn seed_gardens<S, E>(
    config: &SeedConfig,
    service: &GardenService<S, InMemoryPlayerRegistry, E>,
    now: DateTime<Utc>,
) -> Result<SeedResult, EngineError>
where
    S: GardenStore,
    E: EnvironmentSource,
{
    let mut result = SeedResult::default();

    for seed in &config.gardens {
        let owner_id = OwnerId::new();
        service.players().register(owner_id)?;
        let garden_id = service
            .create_garden(owner_id, &seed.name, seed.size, now)?
            .garden
            .id;

        for plant in &seed.plants {
            let plant_type = service
                .catalog()
                .find_by_name(&plant.plant)
                .ok_or_else(|| EngineError::Seed {
                    message: format!(
                        "unknown plant type {:?} in garden {:?}",
                        plant.plant, seed.name
                    ),
                })?;
            service.plant_seed(garden_id, owner_id, plant_type.id, plant.position, now)?;
            result.plants = result.plants.saturating_add(1);
        }

        info!(
            garden_id = %garden_id,
            owner_id = %owner_id,
            name = seed.name,
            plants = seed.plants.len(),
            "Seed garden created"
        );
        result.owners.push(owner_id);
        result.gardens.push(garden_id);
    }

    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use garden_core::InMemoryGardenStore;
    use garden_sim::{FixedEnvironment, GardenError, GrowthRules, PlantCatalog};

    use super::*;

    type Service = GardenService<InMemoryGardenStore, InMemoryPlayerRegistry, FixedEnvironment>;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn service() -> Service {
        GardenService::new(
            InMemoryGardenStore::new(),
            InMemoryPlayerRegistry::new(),
            FixedEnvironment::neutral(),
            PlantCatalog::starter(),
            GrowthRules::default(),
        )
    }

    #[test]
    fn default_seed_plants_the_starter_plot() {
        let service = service();
        let result = seed_gardens(&SeedConfig::default(), &service, t0()).unwrap();

        assert_eq!(result.gardens.len(), 1);
        assert_eq!(result.plants, 3);
        assert_eq!(service.store().list_ids().unwrap(), result.gardens);

        let owner = result.owners.first().copied().unwrap();
        let gardens = service.list_gardens(owner, t0()).unwrap();
        let snapshot = gardens.first().unwrap();
        assert_eq!(snapshot.garden.name, "Starter Plot");
        let positions: Vec<u32> = snapshot.plants.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn empty_seed_creates_nothing() {
        let service = service();
        let config = SeedConfig { gardens: Vec::new() };
        let result = seed_gardens(&config, &service, t0()).unwrap();
        assert_eq!(result, SeedResult::default());
        assert!(service.store().list_ids().unwrap().is_empty());
    }

    #[test]
    fn unknown_plant_name_is_reported() {
        let service = service();
        let config = SeedConfig {
            gardens: vec![SeedGarden {
                name: String::from("Odd"),
                size: Some(4),
                plants: vec![SeedPlant {
                    plant: String::from("Cactus"),
                    position: 0,
                }],
            }],
        };
        let err = seed_gardens(&config, &service, t0()).unwrap_err();
        assert!(matches!(err, EngineError::Seed { .. }));
    }

    #[test]
    fn level_gated_seed_is_rejected() {
        let service = service();
        let config = SeedConfig {
            gardens: vec![SeedGarden {
                name: String::from("Orchard"),
                size: None,
                plants: vec![SeedPlant {
                    plant: String::from("golden apple"),
                    position: 0,
                }],
            }],
        };
        let err = seed_gardens(&config, &service, t0()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Garden {
                source: GardenError::Authorization(_)
            }
        ));
    }

    #[test]
    fn seed_section_parses_from_yaml() {
        let yaml = r"
gardens:
  - name: Balcony
    size: 4
    plants:
      - plant: lettuce
        position: 3
";
        let config: SeedConfig = serde_yml::from_str(yaml).unwrap();
        let garden = config.gardens.first().unwrap();
        assert_eq!(garden.size, Some(4));
        assert_eq!(
            garden.plants,
            vec![SeedPlant {
                plant: String::from("lettuce"),
                position: 3
            }]
        );
    }

    #[test]
    fn project_config_seed_section_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("garden-config.yaml");
        if path.exists() {
            let seed = crate::load_seed_config(&path).unwrap();
            assert_eq!(seed, SeedConfig::default());
        }
    }
}
