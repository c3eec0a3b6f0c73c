//! Sharded key-addressed map with existence-aware operations.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::error::{Result, StoreError};

/// Concurrent map from identifier to record.
///
/// Every operation is atomic with respect to its key: the map is sharded, and
/// each operation holds only the lock of the shard owning the key, so
/// operations on unrelated keys do not serialize against each other. Values
/// handed out are clones; callers never observe later mutations through them.
pub struct KeyedStore<V> {
    entries: DashMap<String, V>,
}

impl<V: Clone> KeyedStore<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert `value` under `id` unless the key is already present.
    pub fn create(&self, id: &str, value: V) -> Result<V> {
        match self.entries.entry(id.to_string()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
                Ok(value)
            }
        }
    }

    /// Snapshot of the value stored under `id`.
    pub fn read(&self, id: &str) -> Result<V> {
        self.entries
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Replace the value stored under `id`. No field merge takes place.
    pub fn update(&self, id: &str, value: V) -> Result<V> {
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                *entry = value.clone();
                Ok(value)
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    /// Remove the value stored under `id`.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.entries
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Snapshot of all entries, ordered by identifier.
    pub fn list(&self) -> Vec<(String, V)> {
        let mut all: Vec<(String, V)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for KeyedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
