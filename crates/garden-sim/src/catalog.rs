//! The plant catalog: read-only definitions of every plantable type.
//!
//! The starter catalog ships five types spanning the rarity range. Ids are
//! fixed so that saved gardens keep resolving across restarts.

use std::collections::BTreeMap;

use garden_types::{PlantType, PlantTypeId, Rarity, Season, Weather};

/// Id of the starter Tomato.
pub const TOMATO_ID: PlantTypeId = PlantTypeId::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0001);
/// Id of the starter Carrot.
pub const CARROT_ID: PlantTypeId = PlantTypeId::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0002);
/// Id of the starter Lettuce.
pub const LETTUCE_ID: PlantTypeId =
    PlantTypeId::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0003);
/// Id of the starter Strawberry.
pub const STRAWBERRY_ID: PlantTypeId =
    PlantTypeId::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0004);
/// Id of the starter Golden Apple.
pub const GOLDEN_APPLE_ID: PlantTypeId =
    PlantTypeId::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0005);

/// Immutable set of plant types, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlantCatalog {
    types: BTreeMap<PlantTypeId, PlantType>,
}

impl PlantCatalog {
    /// Build a catalog from a list of types. Later duplicates of an id
    /// replace earlier ones.
    pub fn new(types: impl IntoIterator<Item = PlantType>) -> Self {
        Self {
            types: types.into_iter().map(|t| (t.id, t)).collect(),
        }
    }

    /// Look up a type by id.
    pub fn get(&self, id: PlantTypeId) -> Option<&PlantType> {
        self.types.get(&id)
    }

    /// Look up a type by case-insensitive name.
    pub fn find_by_name(&self, name: &str) -> Option<&PlantType> {
        self.types
            .values()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Iterate over all types in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PlantType> {
        self.types.values()
    }

    /// Number of types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog has no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The five built-in types.
    pub fn starter() -> Self {
        Self::new([
            starter_type(
                TOMATO_ID,
                "Tomato",
                "A classic summer favourite.",
                Rarity::Common,
                Some(Season::Summer),
                Some(Weather::Sunny),
                [120, 60, 20, 1, 3, 15, 10],
            ),
            starter_type(
                CARROT_ID,
                "Carrot",
                "Crunchy and forgiving.",
                Rarity::Common,
                Some(Season::Spring),
                None,
                [90, 50, 10, 1, 2, 12, 8],
            ),
            starter_type(
                LETTUCE_ID,
                "Lettuce",
                "Fast and thirsty.",
                Rarity::Common,
                Some(Season::Spring),
                Some(Weather::Cloudy),
                [60, 70, 5, 1, 1, 8, 5],
            ),
            starter_type(
                STRAWBERRY_ID,
                "Strawberry",
                "Sweet, slow, and worth it.",
                Rarity::Uncommon,
                Some(Season::Spring),
                Some(Weather::Sunny),
                [180, 80, 30, 3, 2, 25, 15],
            ),
            starter_type(
                GOLDEN_APPLE_ID,
                "Golden Apple",
                "A legend among growers.",
                Rarity::Legendary,
                Some(Season::Autumn),
                Some(Weather::Sunny),
                [360, 90, 50, 10, 1, 100, 50],
            ),
        ])
    }
}

/// `numbers` is `[growth_minutes, water, fertilizer, min_level, yield,
/// value, experience]`.
fn starter_type(
    id: PlantTypeId,
    name: &str,
    description: &str,
    rarity: Rarity,
    season: Option<Season>,
    weather: Option<Weather>,
    numbers: [u32; 7],
) -> PlantType {
    let [
        growth_time_minutes,
        water_needs,
        fertilizer_needs,
        min_level,
        yield_count,
        harvest_value,
        experience_value,
    ] = numbers;
    PlantType {
        id,
        name: String::from(name),
        description: String::from(description),
        rarity,
        season,
        weather,
        growth_time_minutes,
        water_needs,
        fertilizer_needs,
        min_level,
        yield_count,
        harvest_value,
        experience_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_catalog_has_five_types() {
        let catalog = PlantCatalog::starter();
        assert_eq!(catalog.len(), 5);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn lookup_by_id_and_name() {
        let catalog = PlantCatalog::starter();
        let tomato = catalog.get(TOMATO_ID);
        assert_eq!(tomato.map(|t| t.growth_time_minutes), Some(120));
        assert_eq!(
            catalog.find_by_name("golden apple").map(|t| t.id),
            Some(GOLDEN_APPLE_ID)
        );
        assert!(catalog.find_by_name("Cactus").is_none());
    }

    #[test]
    fn level_one_unlocks_commons_only() {
        let catalog = PlantCatalog::starter();
        let unlocked: Vec<_> = catalog
            .iter()
            .filter(|t| t.min_level <= 1)
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(unlocked.len(), 3);
        assert!(!unlocked.contains(&"Strawberry"));
    }
}
