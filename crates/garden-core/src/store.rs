//! Versioned garden persistence.
//!
//! The [`GardenStore`] trait is the seam between the service and whatever
//! holds garden records. Every record carries a version; writers commit with
//! [`GardenStore::compare_and_swap`], which only succeeds when the version
//! they loaded is still current. [`InMemoryGardenStore`] is the reference
//! implementation used by the engine and the tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use garden_types::{Garden, GardenId, OwnerId, PlantInstance};

/// Errors reported by a garden store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The record changed since it was loaded.
    #[error("garden {garden_id} is at version {actual}, expected {expected}")]
    VersionMismatch {
        /// The garden being written.
        garden_id: GardenId,
        /// Version the writer loaded.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// No record with this id.
    #[error("garden {0} not found")]
    NotFound(GardenId),

    /// A record with this id already exists.
    #[error("garden {0} already exists")]
    AlreadyExists(GardenId),

    /// The backing storage failed.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// A stored garden with its plants and version.
#[derive(Debug, Clone, PartialEq)]
pub struct GardenRecord {
    /// The garden row.
    pub garden: Garden,
    /// Plants in the garden.
    pub plants: Vec<PlantInstance>,
    /// Monotonic version, bumped on every successful write.
    pub version: u64,
}

/// Versioned storage for gardens.
///
/// Implementations must make `compare_and_swap` atomic with respect to
/// concurrent writers of the same garden.
pub trait GardenStore: Send + Sync {
    /// Load a garden and its current version.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no such garden exists.
    fn load(&self, garden_id: GardenId) -> Result<GardenRecord, StoreError>;

    /// Store a new garden at version 1.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyExists`] if the id is taken.
    fn insert(&self, garden: Garden, plants: Vec<PlantInstance>) -> Result<u64, StoreError>;

    /// Replace a garden if it is still at `expected_version`, returning the
    /// new version.
    ///
    /// # Errors
    ///
    /// [`StoreError::VersionMismatch`] if another writer got there first,
    /// [`StoreError::NotFound`] if the garden was deleted.
    fn compare_and_swap(
        &self,
        expected_version: u64,
        garden: Garden,
        plants: Vec<PlantInstance>,
    ) -> Result<u64, StoreError>;

    /// Delete a garden and its plants.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no such garden exists.
    fn delete(&self, garden_id: GardenId) -> Result<(), StoreError>;

    /// Ids of every stored garden.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backing storage failed.
    fn list_ids(&self) -> Result<Vec<GardenId>, StoreError>;

    /// Ids of the gardens owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backing storage failed.
    fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<GardenId>, StoreError>;
}

/// A [`GardenStore`] backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryGardenStore {
    records: Mutex<BTreeMap<GardenId, GardenRecord>>,
}

impl InMemoryGardenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, BTreeMap<GardenId, GardenRecord>>, StoreError> {
        self.records.lock().map_err(|e| StoreError::Unavailable {
            message: format!("garden map lock poisoned: {e}"),
        })
    }
}

impl GardenStore for InMemoryGardenStore {
    fn load(&self, garden_id: GardenId) -> Result<GardenRecord, StoreError> {
        self.records()?
            .get(&garden_id)
            .cloned()
            .ok_or(StoreError::NotFound(garden_id))
    }

    fn insert(&self, garden: Garden, plants: Vec<PlantInstance>) -> Result<u64, StoreError> {
        let mut records = self.records()?;
        if records.contains_key(&garden.id) {
            return Err(StoreError::AlreadyExists(garden.id));
        }
        let version = 1;
        records.insert(
            garden.id,
            GardenRecord {
                garden,
                plants,
                version,
            },
        );
        Ok(version)
    }

    fn compare_and_swap(
        &self,
        expected_version: u64,
        garden: Garden,
        plants: Vec<PlantInstance>,
    ) -> Result<u64, StoreError> {
        let mut records = self.records()?;
        let garden_id = garden.id;
        let record = records
            .get_mut(&garden_id)
            .ok_or(StoreError::NotFound(garden_id))?;
        if record.version != expected_version {
            return Err(StoreError::VersionMismatch {
                garden_id,
                expected: expected_version,
                actual: record.version,
            });
        }
        let version = record.version.saturating_add(1);
        *record = GardenRecord {
            garden,
            plants,
            version,
        };
        Ok(version)
    }

    fn delete(&self, garden_id: GardenId) -> Result<(), StoreError> {
        self.records()?
            .remove(&garden_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(garden_id))
    }

    fn list_ids(&self) -> Result<Vec<GardenId>, StoreError> {
        Ok(self.records()?.keys().copied().collect())
    }

    fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<GardenId>, StoreError> {
        Ok(self
            .records()?
            .values()
            .filter(|r| r.garden.owner_id == owner_id)
            .map(|r| r.garden.id)
            .collect())
    }
}
