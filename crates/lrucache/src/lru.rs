//! LRU (Least Recently Used) cache implementation
//!
//! Pairs a key index with the recency list for O(1) lookup, insert and
//! eviction. The index maps each key to the list slot holding its entry.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::list::{Iter, RecencyList};

/// Outcome of [`LruCache::insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion<K, V> {
    /// Stored with room to spare
    Inserted,
    /// Stored after evicting the least recently used entry
    Evicted {
        /// Key of the evicted entry
        key: K,
        /// Value of the evicted entry
        value: V,
    },
    /// Key was already present; nothing changed and the pair is handed back
    Duplicate {
        /// Rejected key
        key: K,
        /// Rejected value
        value: V,
    },
}

impl<K, V> Insertion<K, V> {
    /// Whether the pair was stored
    pub fn is_stored(&self) -> bool {
        !matches!(self, Insertion::Duplicate { .. })
    }
}

/// LRU cache with fixed capacity
pub struct LruCache<K, V> {
    index: HashMap<K, usize, RandomState>,
    list: RecencyList<K, V>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// # Errors
    /// Returns [`Error::InvalidCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        debug!(capacity, "creating lru cache");

        Ok(Self {
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            list: RecencyList::with_capacity(capacity),
            capacity,
        })
    }

    /// Get a value from the cache, marking it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.list.move_to_front(idx);
        self.list.value(idx)
    }

    /// Get a value without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.list.value(idx)
    }

    /// Check whether a key is present without touching recency
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Insert a key-value pair into the cache
    ///
    /// Returns `false` and leaves the cache untouched if the key is already
    /// present: the stored value is not overwritten and its recency is not
    /// refreshed. A full cache evicts its least recently used entry first.
    pub fn put(&mut self, key: K, value: V) -> bool {
        self.insert(key, value).is_stored()
    }

    /// Like [`put`](Self::put), but reports what happened
    pub fn insert(&mut self, key: K, value: V) -> Insertion<K, V> {
        if self.index.contains_key(&key) {
            return Insertion::Duplicate { key, value };
        }

        let evicted = if self.list.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let idx = self.list.push_front(key.clone(), value);
        self.index.insert(key, idx);

        debug_assert!(self.list.len() <= self.capacity);
        debug_assert_eq!(self.index.len(), self.list.len());

        match evicted {
            Some((key, value)) => Insertion::Evicted { key, value },
            None => Insertion::Inserted,
        }
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let (key, value) = self.list.pop_back()?;
        self.index.remove(&key);
        trace!(len = self.list.len(), "evicted least recently used entry");
        Some((key, value))
    }

    /// Verify that the index and the recency list agree
    ///
    /// Walks every entry, so this is O(n). Intended for tests and
    /// diagnostics.
    pub fn check_invariants(&self) -> Result<()> {
        self.list.check()?;

        if self.index.len() != self.list.len() {
            return Err(Error::invariant(format!(
                "index has {} keys, list has {} entries",
                self.index.len(),
                self.list.len()
            )));
        }
        if self.list.len() > self.capacity {
            return Err(Error::invariant(format!(
                "{} entries exceed capacity {}",
                self.list.len(),
                self.capacity
            )));
        }
        for (key, &idx) in &self.index {
            match self.list.key(idx) {
                Some(stored) if stored == key => {}
                Some(_) => {
                    return Err(Error::invariant(format!(
                        "index points slot {} at an entry with a different key",
                        idx
                    )))
                }
                None => {
                    return Err(Error::invariant(format!(
                        "index points at vacant slot {}",
                        idx
                    )))
                }
            }
        }

        Ok(())
    }
}

impl<K, V> LruCache<K, V> {
    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Get the fixed capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if the next new key will evict
    pub fn is_full(&self) -> bool {
        self.list.len() >= self.capacity
    }

    /// Entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.list.iter()
    }

    /// Values from most to least recently used
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Snapshot of the values in recency order, for inspection
    pub fn dump(&self) -> Vec<&V> {
        self.values().collect()
    }
}

impl<'a, K, V> IntoIterator for &'a LruCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Formats as the list of values, most recent first
impl<K, V: fmt::Debug> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values()).finish()
    }
}
