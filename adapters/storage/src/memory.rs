//! Volatile store used by tests and one-shot sessions.

use std::collections::BTreeMap;

use geocache_core::{KeyValueStore, StoreError, StoreWrite};

/// Store that keeps every value in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reports whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, batch: Vec<StoreWrite>) -> Result<(), StoreError> {
        apply_batch(&mut self.values, batch);
        Ok(())
    }
}

pub(crate) fn apply_batch(values: &mut BTreeMap<String, String>, batch: Vec<StoreWrite>) {
    for write in batch {
        match write {
            StoreWrite::Set { key, value } => {
                let _ = values.insert(key, value);
            }
            StoreWrite::Remove { key } => {
                let _ = values.remove(&key);
            }
        }
    }
}
