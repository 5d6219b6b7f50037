//! Bounded cache with least-frequently-used eviction.
//!
//! Every entry carries an access count. Storing an existing key or reading it
//! with [`EvictionCache::get`] bumps the count; when the cache is full, the
//! entry with the lowest count is evicted. There is no recency or decay
//! component: an entry read often long ago outlives one read once just now.
//!
//! The frequency index is a `BTreeMap` ordered by `(frequency, sequence)`,
//! where `sequence` is a monotonically increasing stamp assigned whenever an
//! entry reaches a new frequency. Among entries with equal frequency the one
//! that reached it first is evicted first.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use super::stats::CacheStats;

/// Frequency assigned to a freshly inserted entry.
pub const INITIAL_FREQUENCY: u64 = 1;

/// Errors raised when constructing a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Capacity must be at least one entry.
    #[error("Cache capacity must be greater than zero")]
    ZeroCapacity,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    frequency: u64,
    sequence: u64,
}

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, Slot<V>>,
    index: BTreeMap<(u64, u64), K>,
    next_sequence: u64,
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone,
{
    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Move `key` to the next frequency: erase the old index entry, then
    /// reinsert it one step higher.
    fn touch(&mut self, key: &K) {
        let sequence = self.next_sequence();
        if let Some(slot) = self.entries.get_mut(key) {
            self.index.remove(&(slot.frequency, slot.sequence));
            slot.frequency += 1;
            slot.sequence = sequence;
            self.index.insert((slot.frequency, slot.sequence), key.clone());
        }
    }

    fn insert(&mut self, key: K, value: V) {
        let sequence = self.next_sequence();
        self.index.insert((INITIAL_FREQUENCY, sequence), key.clone());
        self.entries.insert(
            key,
            Slot {
                value,
                frequency: INITIAL_FREQUENCY,
                sequence,
            },
        );
    }

    fn remove(&mut self, key: &K) -> Option<Slot<V>> {
        let slot = self.entries.remove(key)?;
        self.index.remove(&(slot.frequency, slot.sequence));
        Some(slot)
    }

    /// Remove the least frequently used entry.
    fn evict_one(&mut self) -> Option<(K, u64)> {
        let ((frequency, _), key) = self.index.pop_first()?;
        self.entries.remove(&key);
        Some((key, frequency))
    }
}

/// Thread-safe bounded key/value store with LFU eviction.
///
/// All operations take one lock per instance and run in `O(log n)`.
///
/// Ties are broken oldest first: among entries with the lowest frequency, the
/// one that reached that frequency earliest is evicted.
///
/// # Example
///
/// ```
/// use tilescape::cache::EvictionCache;
///
/// let cache = EvictionCache::new(2).unwrap();
/// cache.store("a", 1);
/// cache.store("b", 2);
/// cache.get(&"a");
/// cache.store("c", 3);
///
/// assert!(cache.contains(&"a"));
/// assert!(!cache.contains(&"b"));
/// assert!(cache.contains(&"c"));
/// ```
#[derive(Debug)]
pub struct EvictionCache<K, V> {
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
}

impl<K, V> EvictionCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    /// Create a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ZeroCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                index: BTreeMap::new(),
                next_sequence: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            updates: AtomicU64::new(0),
        })
    }

    /// Insert or replace a value.
    ///
    /// Replacing counts as an access: the value is swapped in place and the
    /// entry's frequency grows by one. Inserting a new key into a full cache
    /// first evicts the least frequently used entry, the oldest one on a tie.
    pub fn store(&self, key: K, value: V) {
        let mut inner = self.inner.lock();

        if let Some(slot) = inner.entries.get_mut(&key) {
            slot.value = value;
            inner.touch(&key);
            self.updates.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if inner.entries.len() >= self.capacity {
            if let Some((evicted, frequency)) = inner.evict_one() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = ?evicted, frequency, capacity = self.capacity, "Evicted cache entry");
            }
        }

        inner.insert(key, value);
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Whether `key` is present. Does not count as an access.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Remove `key`. Returns whether anything was removed.
    pub fn erase(&self, key: &K) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    /// Current access count of `key`, if present.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inner.lock().entries.get(key).map(|slot| slot.frequency)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.index.clear();
    }

    /// Snapshot of the hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            entry_count: self.len(),
            capacity: self.capacity,
        }
    }
}

impl<K, V> EvictionCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    /// Read a value. A hit counts as an access; a miss has no side effects
    /// on the stored entries.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let value = inner.entries.get(key).map(|slot| slot.value.clone());
        match value {
            Some(value) => {
                inner.touch(key);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}
