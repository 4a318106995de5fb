//! Integration tests for the background catch-up sweep.

#![allow(clippy::unwrap_used)]

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use garden_core::{
    GardenService, GardenStore, InMemoryGardenStore, InMemoryPlayerRegistry, ManualClock,
    run_sweep,
};
use garden_sim::catalog::TOMATO_ID;
use garden_sim::{FixedEnvironment, GrowthRules, PlantCatalog};
use garden_types::{OwnerId, PlantStage};

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
fn catch_up_all_counts_gardens_and_events() {
    let service = service();
    let owner = OwnerId::new();
    service.players().register(owner).unwrap();
    let garden_id = service
        .create_garden(owner, "North", None, t0())
        .unwrap()
        .garden
        .id;
    service.create_garden(owner, "South", None, t0()).unwrap();
    let plant_id = service
        .plant_seed(garden_id, owner, TOMATO_ID, 0, t0())
        .unwrap()
        .result
        .id;
    service
        .water_plant(garden_id, owner, plant_id, 50, t0())
        .unwrap();
    service
        .fertilize_plant(garden_id, owner, plant_id, 50, t0())
        .unwrap();

    let report = service.catch_up_all(t0() + Duration::hours(3)).unwrap();
    assert_eq!(report.gardens, 2);
    assert_eq!(report.updated, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.newly_harvestable, 1);

    // Nothing left to do at the same instant.
    let again = service.catch_up_all(t0() + Duration::hours(3)).unwrap();
    assert_eq!(again.updated, 0);
    assert_eq!(again.newly_harvestable, 0);

    let stored = service.store().load(garden_id).unwrap();
    assert_eq!(stored.plants.first().map(|p| p.stage), Some(PlantStage::Harvestable));
}

#[tokio::test]
async fn sweep_runs_until_shutdown() {
    let service = service();
    let owner = OwnerId::new();
    service.players().register(owner).unwrap();
    let garden_id = service
        .create_garden(owner, "Plot", None, t0())
        .unwrap()
        .garden
        .id;

    let clock = ManualClock::new(t0() + Duration::hours(5));
    let shutdown = tokio::time::sleep(StdDuration::from_millis(50));
    let sweeps = run_sweep(&service, &clock, StdDuration::from_secs(3_600), shutdown).await;

    // The first sweep fires immediately; the next would be an hour later.
    assert_eq!(sweeps, 1);
    let stored = service.store().load(garden_id).unwrap();
    assert_eq!(stored.garden.last_tick_at, t0() + Duration::hours(5));
    assert_eq!(stored.version, 2);
}
