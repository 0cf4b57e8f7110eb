//! Least Recently Used (LRU) Map.
//!
//! A fixed-capacity key/value store that evicts the entry which has not been accessed
//! for the longest time. Every insertion and every touching lookup stamps the entry
//! with a fresh value of a monotonic clock; the entry with the smallest stamp is the
//! LRU victim. Stamps are unique, so among equally old entries the one inserted first
//! always loses.
//!
//! # Performance
//!
//! - `get()` / `insert()` / `remove()`: O(log N) for the recency index.
//! - `pop_lru()`: O(log N).
//! - Space: O(N) for the entries plus the recency index.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    stamp: u64,
}

/// Fixed-capacity map with least-recently-used eviction.
#[derive(Debug, Clone)]
pub struct LruMap<K, V> {
    capacity: usize,
    entries: HashMap<K, Slot<V>>,
    /// Recency index: stamp -> key. First entry is the LRU.
    order: BTreeMap<u64, K>,
    clock: u64,
}

impl<K: Copy + Eq + Hash, V> LruMap<K, V> {
    /// Creates an empty map holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            clock: 0,
        }
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `key` is present. Does not affect recency.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, key: &K) -> bool {
        let stamp = self.tick();
        let Some(slot) = self.entries.get_mut(key) else {
            return false;
        };
        let _ = self.order.remove(&slot.stamp);
        slot.stamp = stamp;
        let _ = self.order.insert(stamp, *key);
        true
    }

    /// Looks up `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.touch(key) {
            self.entries.get(key).map(|slot| &slot.value)
        } else {
            None
        }
    }

    /// Looks up `key` mutably and marks it most recently used.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.touch(key) {
            self.entries.get_mut(key).map(|slot| &mut slot.value)
        } else {
            None
        }
    }

    /// Looks up `key` without affecting recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Returns the key that would be evicted next.
    pub fn lru_key(&self) -> Option<K> {
        self.order.values().next().copied()
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key).map(|slot| (key, slot.value))
    }

    /// Inserts `value` under `key`, marking it most recently used.
    ///
    /// Replacing an existing key never evicts. Inserting a new key into a full map
    /// evicts exactly one entry, the LRU, which is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let stamp = self.tick();
        if let Some(slot) = self.entries.get_mut(&key) {
            let _ = self.order.remove(&slot.stamp);
            slot.stamp = stamp;
            slot.value = value;
            let _ = self.order.insert(stamp, key);
            return None;
        }
        let evicted = if self.entries.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };
        let _ = self.entries.insert(key, Slot { value, stamp });
        let _ = self.order.insert(stamp, key);
        evicted
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.entries.remove(key)?;
        let _ = self.order.remove(&slot.stamp);
        Some(slot.value)
    }

    /// Iterates over keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.order.values().copied()
    }

    /// Iterates over entries in arbitrary order without affecting recency.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter().map(|(k, slot)| (k, &slot.value))
    }

    /// Iterates mutably over entries in arbitrary order without affecting recency.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> + '_ {
        self.entries.iter_mut().map(|(k, slot)| (k, &mut slot.value))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
