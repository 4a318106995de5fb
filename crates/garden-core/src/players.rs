//! Player progression: level lookup before actions, reward credit for
//! harvests.
//!
//! The service never holds a garden lock while talking to the registry.
//! Levels are read before the optimistic attempt loop. Harvest rewards are
//! credited inside the attempt, before the garden is committed, and keyed
//! by the harvested plant so a retried attempt pays only once. A harvest
//! that ends up not committing revokes its credit.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use garden_sim::level_for_experience;
use garden_types::{HarvestReward, OwnerId, PlantId, PlayerProgress};

/// Coins a newly registered player starts with.
pub const STARTING_COINS: u64 = 100;

/// Errors reported by a player registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The player is not registered.
    #[error("unknown player {0}")]
    UnknownPlayer(OwnerId),

    /// The backing storage failed.
    #[error("player registry unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// Result of crediting a harvest reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    /// Progress after the credit.
    pub progress: PlayerProgress,
    /// Whether the credit raised the player's level.
    pub level_up: bool,
}

/// Level lookup and reward credit for players.
pub trait PlayerRegistry: Send + Sync {
    /// The player's current level.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownPlayer`] if the player is not registered.
    fn level(&self, owner_id: OwnerId) -> Result<u32, RegistryError>;

    /// Add the reward for harvesting `harvest` to the player's totals.
    ///
    /// Crediting the same harvest again returns the current progress
    /// without paying twice.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownPlayer`] if the player is not registered.
    fn credit(
        &self,
        owner_id: OwnerId,
        harvest: PlantId,
        reward: HarvestReward,
    ) -> Result<Credit, RegistryError>;

    /// Take back the reward credited for `harvest`. Unknown harvests are
    /// ignored.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownPlayer`] if the player is not registered.
    fn revoke(&self, owner_id: OwnerId, harvest: PlantId) -> Result<(), RegistryError>;
}

#[derive(Debug)]
struct Account {
    progress: PlayerProgress,
    /// Credited harvests and whether each one levelled the player up.
    harvests: BTreeMap<PlantId, (HarvestReward, bool)>,
}

/// A [`PlayerRegistry`] backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryPlayerRegistry {
    accounts: Mutex<BTreeMap<OwnerId, Account>>,
}

impl InMemoryPlayerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player at level 1 with the starting coins. Registering
    /// an existing player returns their current progress unchanged.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Unavailable`] if the lock is poisoned.
    pub fn register(&self, owner_id: OwnerId) -> Result<PlayerProgress, RegistryError> {
        let mut accounts = self.accounts()?;
        let account = accounts.entry(owner_id).or_insert_with(|| Account {
            progress: PlayerProgress {
                level: 1,
                experience: 0,
                coins: STARTING_COINS,
            },
            harvests: BTreeMap::new(),
        });
        Ok(account.progress)
    }

    /// A player's current progress.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownPlayer`] if the player is not registered.
    pub fn progress(&self, owner_id: OwnerId) -> Result<PlayerProgress, RegistryError> {
        self.accounts()?
            .get(&owner_id)
            .map(|account| account.progress)
            .ok_or(RegistryError::UnknownPlayer(owner_id))
    }

    fn accounts(&self) -> Result<MutexGuard<'_, BTreeMap<OwnerId, Account>>, RegistryError> {
        self.accounts.lock().map_err(|e| RegistryError::Unavailable {
            message: format!("player map lock poisoned: {e}"),
        })
    }
}

impl PlayerRegistry for InMemoryPlayerRegistry {
    fn level(&self, owner_id: OwnerId) -> Result<u32, RegistryError> {
        self.progress(owner_id).map(|p| p.level)
    }

    fn credit(
        &self,
        owner_id: OwnerId,
        harvest: PlantId,
        reward: HarvestReward,
    ) -> Result<Credit, RegistryError> {
        let mut accounts = self.accounts()?;
        let account = accounts
            .get_mut(&owner_id)
            .ok_or(RegistryError::UnknownPlayer(owner_id))?;
        if let Some(&(_, level_up)) = account.harvests.get(&harvest) {
            return Ok(Credit {
                progress: account.progress,
                level_up,
            });
        }

        let progress = &mut account.progress;
        let before = progress.level;
        progress.experience = progress.experience.saturating_add(reward.experience);
        progress.coins = progress.coins.saturating_add(reward.coins);
        progress.level = level_for_experience(progress.experience);
        let level_up = progress.level > before;
        account.harvests.insert(harvest, (reward, level_up));
        Ok(Credit {
            progress: account.progress,
            level_up,
        })
    }

    fn revoke(&self, owner_id: OwnerId, harvest: PlantId) -> Result<(), RegistryError> {
        let mut accounts = self.accounts()?;
        let account = accounts
            .get_mut(&owner_id)
            .ok_or(RegistryError::UnknownPlayer(owner_id))?;
        if let Some((reward, _)) = account.harvests.remove(&harvest) {
            let progress = &mut account.progress;
            progress.experience = progress.experience.saturating_sub(reward.experience);
            progress.coins = progress.coins.saturating_sub(reward.coins);
            progress.level = level_for_experience(progress.experience);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_players_start_at_level_one() {
        let registry = InMemoryPlayerRegistry::new();
        let owner = OwnerId::new();
        let progress = registry.register(owner).unwrap();
        assert_eq!(progress.level, 1);
        assert_eq!(progress.coins, STARTING_COINS);
        assert_eq!(registry.level(owner).unwrap(), 1);
    }

    #[test]
    fn unknown_players_are_reported() {
        let registry = InMemoryPlayerRegistry::new();
        let owner = OwnerId::new();
        assert_eq!(registry.level(owner), Err(RegistryError::UnknownPlayer(owner)));
    }

    #[test]
    fn credit_accumulates_and_levels_up() {
        let registry = InMemoryPlayerRegistry::new();
        let owner = OwnerId::new();
        registry.register(owner).unwrap();

        let first = registry
            .credit(owner, PlantId::new(), HarvestReward { coins: 45, experience: 60 })
            .unwrap();
        assert!(!first.level_up);
        assert_eq!(first.progress.coins, 145);

        let second = registry
            .credit(owner, PlantId::new(), HarvestReward { coins: 5, experience: 50 })
            .unwrap();
        assert!(second.level_up);
        assert_eq!(second.progress.level, 2);
        assert_eq!(second.progress.experience, 110);
    }

    #[test]
    fn repeated_credit_pays_once() {
        let registry = InMemoryPlayerRegistry::new();
        let owner = OwnerId::new();
        registry.register(owner).unwrap();
        let harvest = PlantId::new();
        let reward = HarvestReward {
            coins: 20,
            experience: 120,
        };

        let first = registry.credit(owner, harvest, reward).unwrap();
        let again = registry.credit(owner, harvest, reward).unwrap();
        assert!(first.level_up);
        assert_eq!(again, first);
        assert_eq!(registry.progress(owner).unwrap().coins, 120);
    }

    #[test]
    fn revoke_restores_progress() {
        let registry = InMemoryPlayerRegistry::new();
        let owner = OwnerId::new();
        let start = registry.register(owner).unwrap();
        let harvest = PlantId::new();
        registry
            .credit(owner, harvest, HarvestReward { coins: 30, experience: 150 })
            .unwrap();

        registry.revoke(owner, harvest).unwrap();
        assert_eq!(registry.progress(owner).unwrap(), start);
        // A second revoke, or one for a harvest never credited, is a no-op.
        registry.revoke(owner, harvest).unwrap();
        registry.revoke(owner, PlantId::new()).unwrap();
        assert_eq!(registry.progress(owner).unwrap(), start);
    }

    #[test]
    #[allow(clippy::panic)]
    fn poisoned_lock_is_unavailable() {
        let registry = InMemoryPlayerRegistry::new();
        let joined = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = registry.accounts.lock();
                    panic!("writer died holding the lock");
                })
                .join()
        });
        assert!(joined.is_err());

        match registry.level(OwnerId::new()) {
            Err(RegistryError::Unavailable { message }) => assert!(message.contains("poisoned")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }
}
