//! Keyed storage of serialized cache snapshots.

use std::collections::BTreeMap;

use geocache_core::{Cell, CellKey, Memento};
use geocache_system_spawn_oracle::SpawnOracle;
use tracing::{debug, warn};

use crate::cache::Cache;

/// Cache snapshots indexed by cell key, holding mementos rather than live caches.
///
/// Reading a cell that was never saved rolls a fresh cache without storing
/// it, so repeated reads of an unvisited cell keep returning the same roll.
/// Only [`CacheStore::save`] commits a cache.
#[derive(Clone, Debug)]
pub struct CacheStore {
    oracle: SpawnOracle,
    max_coins: u32,
    snapshots: BTreeMap<CellKey, String>,
}

impl CacheStore {
    /// Creates an empty store that spawns caches of at most `max_coins` coins.
    #[must_use]
    pub fn new(oracle: SpawnOracle, max_coins: u32) -> Self {
        Self {
            oracle,
            max_coins,
            snapshots: BTreeMap::new(),
        }
    }

    /// Restores the saved cache for `cell`, or rolls a fresh one.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Cache {
        let key = cell.key();
        let Some(memento) = self.snapshots.get(&key) else {
            debug!(%key, "rolling unsaved cache");
            return Cache::spawn(cell, &self.oracle, self.max_coins);
        };

        match Cache::from_memento(memento) {
            Ok(cache) if cache.cell() == cell => cache,
            Ok(cache) => {
                warn!(%key, stored = %cache.cell().key(), "cache snapshot names another cell");
                Cache::spawn(cell, &self.oracle, self.max_coins)
            }
            Err(error) => {
                warn!(%key, %error, "discarding unreadable cache snapshot");
                Cache::spawn(cell, &self.oracle, self.max_coins)
            }
        }
    }

    /// Stores the memento of `cache` under the key of `cell`.
    pub fn save(&mut self, cell: Cell, cache: &Cache) {
        let _ = self.snapshots.insert(cell.key(), cache.to_memento());
    }

    /// Iterates over `(key, memento)` pairs in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&CellKey, &str)> {
        self.snapshots
            .iter()
            .map(|(key, memento)| (key, memento.as_str()))
    }

    /// Replaces every snapshot with the provided pairs.
    pub fn replace(&mut self, snapshots: impl IntoIterator<Item = (CellKey, String)>) {
        self.snapshots = snapshots.into_iter().collect();
    }

    /// Drops every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Number of saved snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no snapshot has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CacheStore {
        CacheStore::new(SpawnOracle::new("store"), 5)
    }

    #[test]
    fn reading_an_unsaved_cell_does_not_commit_it() {
        let store = store();
        let cell = Cell::new(1, 1);
        let first = store.get(cell);
        let second = store.get(cell);
        assert_eq!(first, second);
        assert!(store.is_empty());
    }

    #[test]
    fn saved_decrement_survives_later_reads() {
        let mut store = store();
        let cell = Cell::new(2, 3);
        let mut cache = store.get(cell);
        let initial = cache.coins();
        assert!(cache.collect_one());
        store.save(cell, &cache);
        assert_eq!(store.get(cell).coins(), initial - 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unsaved_decrement_is_lost() {
        let store = store();
        let cell = Cell::new(5, 5);
        let mut cache = store.get(cell);
        let initial = cache.coins();
        assert!(cache.collect_one());
        assert_eq!(store.get(cell).coins(), initial);
    }

    #[test]
    fn corrupt_snapshot_falls_back_to_a_fresh_roll() {
        let mut store = store();
        let cell = Cell::new(8, -8);
        let fresh = store.get(cell);
        store.replace([(cell.key(), "{broken".to_owned())]);
        assert_eq!(store.get(cell), fresh);
    }

    #[test]
    fn snapshot_for_another_cell_is_ignored() {
        let mut store = store();
        let cell = Cell::new(0, 1);
        let fresh = store.get(cell);
        let foreign = Cache::with_coins(Cell::new(9, 9), 0);
        store.replace([(cell.key(), foreign.to_memento())]);
        assert_eq!(store.get(cell), fresh);
    }
}
