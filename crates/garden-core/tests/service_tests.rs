//! Integration tests for the garden service operation surface.
//!
//! Every test drives the service through its public API with explicit
//! timestamps, an in-memory store and registry, and neutral weather.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use garden_core::{
    Credit, GardenService, GardenStore, InMemoryGardenStore, InMemoryPlayerRegistry,
    PlayerRegistry, RegistryError,
};
use garden_sim::catalog::TOMATO_ID;
use garden_sim::{
    FixedEnvironment, GardenError, GrowthRules, NotFound, PlantCatalog, StateConflict,
    ValidationError,
};
use garden_types::{
    GardenId, GardenSnapshot, HarvestReward, OwnerId, PlantId, PlantStage, PlantType,
    PlantTypeId, Rarity,
};

type Service = GardenService<InMemoryGardenStore, InMemoryPlayerRegistry, FixedEnvironment>;

const SLOW_BEAN_ID: PlantTypeId = PlantTypeId::from_u128(0xbea0);

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Five-day crop with no affinities and no fertilizer need.
fn slow_bean() -> PlantType {
    PlantType {
        id: SLOW_BEAN_ID,
        name: String::from("Slow Bean"),
        description: String::new(),
        rarity: Rarity::Common,
        season: None,
        weather: None,
        growth_time_minutes: 5 * 24 * 60,
        water_needs: 60,
        fertilizer_needs: 0,
        min_level: 1,
        yield_count: 2,
        harvest_value: 10,
        experience_value: 30,
    }
}

fn service() -> Service {
    let starter = PlantCatalog::starter();
    let catalog = PlantCatalog::new(starter.iter().cloned().chain([slow_bean()]));
    GardenService::new(
        InMemoryGardenStore::new(),
        InMemoryPlayerRegistry::new(),
        FixedEnvironment::neutral(),
        catalog,
        GrowthRules::default(),
    )
}

fn setup() -> (Service, OwnerId, GardenId) {
    let service = service();
    let owner = OwnerId::new();
    service.players().register(owner).unwrap();
    let garden_id = service
        .create_garden(owner, "Backyard", None, t0())
        .unwrap()
        .garden
        .id;
    (service, owner, garden_id)
}

fn plant_tomato(service: &Service, owner: OwnerId, garden_id: GardenId, position: u32) -> PlantId {
    service
        .plant_seed(garden_id, owner, TOMATO_ID, position, t0())
        .unwrap()
        .result
        .id
}

fn assert_snapshot_invariants(snapshot: &GardenSnapshot) {
    let mut positions: Vec<u32> = snapshot.plants.iter().map(|p| p.position).collect();
    positions.sort_unstable();
    positions.dedup();
    assert_eq!(positions.len(), snapshot.plants.len(), "duplicate positions");
    for plant in &snapshot.plants {
        assert!(plant.position < snapshot.garden.size);
        assert!((0.0..=100.0).contains(&plant.growth_progress));
        assert!((0.0..=100.0).contains(&plant.water_level));
        assert!((0.0..=100.0).contains(&plant.health));
        let complete = plant.growth_progress >= 100.0 && plant.health > 0.0;
        assert_eq!(plant.stage == PlantStage::Harvestable, complete);
        if plant.stage == PlantStage::Withered {
            assert!(plant.health <= 0.0);
        }
    }
    for level in [
        snapshot.garden.water_level,
        snapshot.garden.fertilizer_level,
        snapshot.garden.soil_quality,
    ] {
        assert!((0.0..=100.0).contains(&level));
    }
}

#[test]
fn five_day_crop_grows_to_harvest() {
    let (service, owner, garden_id) = setup();
    let created = service.get_garden(garden_id, t0()).unwrap();
    assert_eq!(created.garden.size, 9);

    let planted = service
        .plant_seed(garden_id, owner, SLOW_BEAN_ID, 4, t0())
        .unwrap();
    let plant_id = planted.result.id;
    assert_eq!(planted.snapshot.plant_at(4).map(|p| p.id), Some(plant_id));
    service
        .water_plant(garden_id, owner, plant_id, 100, t0())
        .unwrap();

    // Top up every six hours for five days.
    for step in 1..=20 {
        let now = t0() + Duration::hours(6 * step);
        let watered = service
            .water_plant(garden_id, owner, plant_id, 100, now)
            .unwrap();
        assert!(watered.result.water_level >= 60.0);
        assert!(watered.result.health > 99.999);
        assert_snapshot_invariants(&watered.snapshot);
    }

    let end = t0() + Duration::days(5);
    let snapshot = service.get_garden(garden_id, end).unwrap();
    let plant = snapshot.plant(plant_id).unwrap();
    assert_eq!(plant.stage, PlantStage::Harvestable);
    assert!((plant.growth_progress - 100.0).abs() < f64::EPSILON);

    let harvested = service
        .harvest_plant(garden_id, owner, plant_id, end)
        .unwrap();
    assert_eq!(harvested.result.reward.coins, 20);
    assert_eq!(harvested.result.reward.experience, 30);
    assert_eq!(harvested.result.progress.coins, 120);
    assert_eq!(harvested.result.progress.experience, 30);
    assert!(!harvested.result.level_up);
    assert_eq!(harvested.result.plant.harvested_at, Some(end));
    assert!(harvested.snapshot.plant_at(4).is_none());

    let after = service.get_garden(garden_id, end).unwrap();
    assert!(after.plants.is_empty());
}

#[test]
fn watering_clamps_to_full() {
    let (service, owner, garden_id) = setup();
    let plant_id = plant_tomato(&service, owner, garden_id, 0);

    let ninety = service
        .water_plant(garden_id, owner, plant_id, 40, t0())
        .unwrap();
    assert!((ninety.result.water_level - 90.0).abs() < f64::EPSILON);

    let full = service
        .water_plant(garden_id, owner, plant_id, 30, t0())
        .unwrap();
    assert!((full.result.water_level - 100.0).abs() < f64::EPSILON);
    assert_eq!(full.result.last_watered_at, Some(t0()));

    let err = service
        .water_plant(garden_id, owner, plant_id, 1, t0())
        .unwrap_err();
    assert_eq!(
        err,
        GardenError::StateConflict(StateConflict::AlreadySaturated { plant_id })
    );
}

#[test]
fn invalid_amounts_are_rejected() {
    let (service, owner, garden_id) = setup();
    let plant_id = plant_tomato(&service, owner, garden_id, 0);

    for amount in [0, 101] {
        let err = service
            .water_plant(garden_id, owner, plant_id, amount, t0())
            .unwrap_err();
        assert_eq!(
            err,
            GardenError::Validation(ValidationError::InvalidAmount { amount })
        );
    }
}

#[test]
fn fertilize_cooldown_window() {
    let (service, owner, garden_id) = setup();
    let plant_id = plant_tomato(&service, owner, garden_id, 0);

    let first = service
        .fertilize_plant(garden_id, owner, plant_id, 10, t0())
        .unwrap();
    assert_eq!(first.result.last_fertilized_at, Some(t0()));
    assert!((first.snapshot.garden.fertilizer_level - 10.0).abs() < f64::EPSILON);

    let early = t0() + Duration::hours(23);
    let err = service
        .fertilize_plant(garden_id, owner, plant_id, 10, early)
        .unwrap_err();
    assert_eq!(
        err,
        GardenError::StateConflict(StateConflict::CooldownActive {
            plant_id,
            available_at: t0() + Duration::hours(24),
        })
    );

    let ready = t0() + Duration::hours(24) + Duration::seconds(1);
    let second = service.fertilize_plant(garden_id, owner, plant_id, 10, ready);
    // Still alive a day later.
    assert!(second.is_ok(), "{second:?}");
}

#[test]
fn harvesting_unripe_plant_changes_nothing() {
    let (service, owner, garden_id) = setup();
    let plant_id = plant_tomato(&service, owner, garden_id, 0);
    let before = service.store().load(garden_id).unwrap();

    let err = service
        .harvest_plant(garden_id, owner, plant_id, t0())
        .unwrap_err();
    assert_eq!(
        err,
        GardenError::StateConflict(StateConflict::NotHarvestable {
            plant_id,
            stage: PlantStage::Seed,
        })
    );
    assert_eq!(service.store().load(garden_id).unwrap(), before);
}

#[test]
fn occupied_slot_changes_nothing() {
    let (service, owner, garden_id) = setup();
    let occupant = plant_tomato(&service, owner, garden_id, 3);
    let before = service.store().load(garden_id).unwrap();

    let err = service
        .plant_seed(garden_id, owner, TOMATO_ID, 3, t0())
        .unwrap_err();
    assert_eq!(
        err,
        GardenError::StateConflict(StateConflict::SlotOccupied {
            position: 3,
            occupant
        })
    );
    assert_eq!(service.store().load(garden_id).unwrap(), before);
}

#[test]
fn neglected_plant_withers_for_good() {
    let (service, owner, garden_id) = setup();
    let plant_id = plant_tomato(&service, owner, garden_id, 0);

    let mut last = None;
    for half_day in 1..=10 {
        let snapshot = service
            .get_garden(garden_id, t0() + Duration::hours(12 * half_day))
            .unwrap();
        assert_snapshot_invariants(&snapshot);
        last = Some(snapshot);
    }
    let snapshot = last.unwrap();
    let plant = snapshot.plant(plant_id).unwrap();
    assert_eq!(plant.stage, PlantStage::Withered);
    assert!(plant.health.abs() < f64::EPSILON);

    let later = t0() + Duration::days(6);
    let err = service
        .water_plant(garden_id, owner, plant_id, 50, later)
        .unwrap_err();
    assert_eq!(
        err,
        GardenError::StateConflict(StateConflict::Withered { plant_id })
    );
    let err = service
        .fertilize_plant(garden_id, owner, plant_id, 50, later)
        .unwrap_err();
    assert_eq!(
        err,
        GardenError::StateConflict(StateConflict::Withered { plant_id })
    );
    let err = service
        .harvest_plant(garden_id, owner, plant_id, later)
        .unwrap_err();
    assert_eq!(
        err,
        GardenError::StateConflict(StateConflict::NotHarvestable {
            plant_id,
            stage: PlantStage::Withered,
        })
    );

    let still = service.get_garden(garden_id, later).unwrap();
    assert_eq!(still.plant(plant_id).map(|p| p.stage), Some(PlantStage::Withered));

    let removed = service
        .remove_plant(garden_id, owner, plant_id, later)
        .unwrap();
    assert!(removed.snapshot.plant(plant_id).is_none());
}

#[test]
fn other_players_cannot_touch_the_garden() {
    let (service, owner, garden_id) = setup();
    let plant_id = plant_tomato(&service, owner, garden_id, 0);
    let stranger = OwnerId::new();
    service.players().register(stranger).unwrap();

    let err = service
        .water_plant(garden_id, stranger, plant_id, 10, t0())
        .unwrap_err();
    assert!(matches!(err, GardenError::Authorization(_)));
    let err = service
        .remove_plant(garden_id, stranger, plant_id, t0())
        .unwrap_err();
    assert!(matches!(err, GardenError::Authorization(_)));
}

#[test]
fn unknown_plants_and_gardens() {
    let (service, owner, garden_id) = setup();
    let ghost = PlantId::new();
    let err = service
        .remove_plant(garden_id, owner, ghost, t0())
        .unwrap_err();
    assert_eq!(err, GardenError::NotFound(NotFound::Plant(ghost)));

    let missing = GardenId::new();
    let err = service.get_garden(missing, t0()).unwrap_err();
    assert_eq!(err, GardenError::NotFound(NotFound::Garden(missing)));
}

#[test]
fn plants_from_another_garden_are_not_found() {
    let (service, owner, garden_id) = setup();
    let other_garden = service
        .create_garden(owner, "Allotment", Some(4), t0())
        .unwrap()
        .garden
        .id;
    let plant_id = plant_tomato(&service, owner, other_garden, 0);

    let err = service
        .water_plant(garden_id, owner, plant_id, 10, t0())
        .unwrap_err();
    assert_eq!(err, GardenError::NotFound(NotFound::Plant(plant_id)));
}

#[test]
fn mixed_actions_keep_invariants() {
    let (service, owner, garden_id) = setup();
    // Deterministic xorshift so the sequence is reproducible.
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    let mut now = t0();
    for _ in 0..300 {
        now += Duration::minutes(i64::try_from(next() % 240).unwrap());
        let snapshot = service.get_garden(garden_id, now).unwrap();
        assert_snapshot_invariants(&snapshot);

        let position = u32::try_from(next() % 9).unwrap();
        let amount = u32::try_from(next() % 120).unwrap();
        let target = snapshot.plant_at(position).map(|p| p.id);
        let result = match (next() % 5, target) {
            (0, _) | (_, None) => service
                .plant_seed(garden_id, owner, TOMATO_ID, position, now)
                .map(|r| r.snapshot),
            (1, Some(id)) => service
                .water_plant(garden_id, owner, id, amount, now)
                .map(|r| r.snapshot),
            (2, Some(id)) => service
                .fertilize_plant(garden_id, owner, id, amount, now)
                .map(|r| r.snapshot),
            (3, Some(id)) => service
                .harvest_plant(garden_id, owner, id, now)
                .map(|r| r.snapshot),
            (_, Some(id)) => service
                .remove_plant(garden_id, owner, id, now)
                .map(|r| r.snapshot),
        };
        match result {
            Ok(snapshot) => assert_snapshot_invariants(&snapshot),
            Err(e) => assert!(
                matches!(
                    e,
                    GardenError::Validation(_) | GardenError::StateConflict(_)
                ),
                "unexpected error {e:?}"
            ),
        }
    }
}

/// Registry whose credits can be switched off.
#[derive(Debug, Default)]
struct FlakyRegistry {
    inner: InMemoryPlayerRegistry,
    down: AtomicBool,
}

impl PlayerRegistry for FlakyRegistry {
    fn level(&self, owner_id: OwnerId) -> Result<u32, RegistryError> {
        self.inner.level(owner_id)
    }

    fn credit(
        &self,
        owner_id: OwnerId,
        harvest: PlantId,
        reward: HarvestReward,
    ) -> Result<Credit, RegistryError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable {
                message: String::from("down"),
            });
        }
        self.inner.credit(owner_id, harvest, reward)
    }

    fn revoke(&self, owner_id: OwnerId, harvest: PlantId) -> Result<(), RegistryError> {
        self.inner.revoke(owner_id, harvest)
    }
}

#[test]
fn failed_credit_leaves_the_plant_in_place() {
    let service = GardenService::new(
        InMemoryGardenStore::new(),
        FlakyRegistry::default(),
        FixedEnvironment::neutral(),
        PlantCatalog::starter(),
        GrowthRules::default(),
    );
    let owner = OwnerId::new();
    service.players().inner.register(owner).unwrap();
    let garden_id = service
        .create_garden(owner, "Backyard", None, t0())
        .unwrap()
        .garden
        .id;
    let plant_id = service
        .plant_seed(garden_id, owner, TOMATO_ID, 0, t0())
        .unwrap()
        .result
        .id;
    service
        .water_plant(garden_id, owner, plant_id, 100, t0())
        .unwrap();
    service
        .fertilize_plant(garden_id, owner, plant_id, 50, t0())
        .unwrap();

    let ripe = t0() + Duration::hours(3);
    let snapshot = service.get_garden(garden_id, ripe).unwrap();
    assert_eq!(
        snapshot.plant(plant_id).map(|p| p.stage),
        Some(PlantStage::Harvestable)
    );
    let before = service.store().load(garden_id).unwrap();

    service.players().down.store(true, Ordering::SeqCst);
    let err = service
        .harvest_plant(garden_id, owner, plant_id, ripe)
        .unwrap_err();
    assert_eq!(
        err,
        GardenError::Registry {
            message: String::from("down")
        }
    );
    assert_eq!(service.store().load(garden_id).unwrap(), before);
    assert_eq!(service.players().inner.progress(owner).unwrap().coins, 100);

    // Once the registry is back the same harvest goes through, paid once.
    service.players().down.store(false, Ordering::SeqCst);
    let harvested = service
        .harvest_plant(garden_id, owner, plant_id, ripe)
        .unwrap();
    assert_eq!(harvested.result.progress.coins, 145);
    assert!(harvested.snapshot.plant(plant_id).is_none());
    assert_eq!(service.players().inner.progress(owner).unwrap().coins, 145);
}

#[test]
fn frequent_reads_still_advance_time() {
    let (service, owner, garden_id) = setup();
    let plant_id = plant_tomato(&service, owner, garden_id, 0);
    service
        .water_plant(garden_id, owner, plant_id, 100, t0())
        .unwrap();
    service
        .fertilize_plant(garden_id, owner, plant_id, 50, t0())
        .unwrap();

    // Every 900 ms for an hour.
    let mut snapshot = service.get_garden(garden_id, t0()).unwrap();
    for k in 1..=4_000 {
        snapshot = service
            .get_garden(garden_id, t0() + Duration::milliseconds(900 * k))
            .unwrap();
    }

    assert_eq!(snapshot.garden.last_tick_at, t0() + Duration::hours(1));
    assert!(snapshot.garden.water_level < 50.0);
    let plant = snapshot.plant(plant_id).unwrap();
    assert!(plant.growth_progress > 50.0, "progress {}", plant.growth_progress);
}
