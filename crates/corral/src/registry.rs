//! Thread-safe mapping from [`CorrelationKey`] to the value awaiting delivery.
//!
//! Workers look keys up concurrently while submitters register new ones, so
//! the map sits behind a [`parking_lot::RwLock`]: many readers, one writer.
//! The lock is never held across an `.await`.

use crate::CorrelationKey;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Concurrent key -> value registry with a deliberately narrow contract.
///
/// [`set`](Self::set) overwrites silently. Whoever owned the previous value
/// under a colliding key loses it, and that loss is only observable through the
/// value being dropped. Use [`insert_if_vacant`](Self::insert_if_vacant) for
/// collision-checked registration.
#[derive(Debug)]
pub struct CorrelationRegistry<V> {
    entries: RwLock<HashMap<CorrelationKey, V>>,
}

impl<V> Default for CorrelationRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CorrelationRegistry<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or overwrites the entry for `key` under the exclusive lock.
    pub fn set(&self, key: CorrelationKey, value: V) {
        self.entries.write().insert(key, value);
    }

    /// Inserts only if `key` is not registered. Returns whether it inserted.
    pub fn insert_if_vacant(&self, key: CorrelationKey, value: V) -> bool {
        use std::collections::hash_map::Entry;

        match self.entries.write().entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Removes and returns the entry for `key`, if any.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.write().remove(key)
    }

    /// Removes the entry for `key` only if `predicate` accepts its value.
    pub fn remove_if<F>(&self, key: &str, predicate: F) -> Option<V>
    where
        F: FnOnce(&V) -> bool,
    {
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(predicate) {
            entries.remove(key)
        } else {
            None
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<V: Clone> CorrelationRegistry<V> {
    /// Looks `key` up under the shared lock.
    ///
    /// Returns `None` for unknown keys; never blocks waiting for one to appear.
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.read().get(key).cloned()
    }
}
