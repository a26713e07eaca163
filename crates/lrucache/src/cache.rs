//! SharedCache: LruCache behind one lock, with statistics

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::lru::{Insertion, LruCache};
use crate::stats::CacheStats;

/// Thread-safe handle to a single LRU cache
///
/// `LruCache` has no internal synchronisation. This wrapper holds one
/// exclusive lock over the index and the recency list for the whole of each
/// operation, eviction included. Clones share the same cache.
pub struct SharedCache<K, V> {
    /// LRU cache guarded by a single lock
    cache: Arc<Mutex<LruCache<K, V>>>,

    /// Cache statistics
    stats: Arc<CacheStats>,

    /// Cache capacity
    capacity: usize,
}

impl<K, V> Clone for SharedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            stats: Arc::clone(&self.stats),
            capacity: self.capacity,
        }
    }
}

impl<K, V> SharedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new shared cache with the given capacity
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of items in cache
    ///
    /// # Returns
    /// * `Result<SharedCache>` - fails on zero capacity
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity)?)),
            stats: Arc::new(CacheStats::new()),
            capacity,
        })
    }

    /// Put a value into the cache
    ///
    /// # Returns
    /// * `bool` - `false` if the key was already present (nothing changes)
    pub fn put(&self, key: K, value: V) -> bool {
        let outcome = self.cache.lock().insert(key, value);

        match outcome {
            Insertion::Inserted => self.stats.record_insert(),
            Insertion::Evicted { .. } => {
                self.stats.record_insert();
                self.stats.record_eviction();
            }
            Insertion::Duplicate { .. } => self.stats.record_rejected(),
        }

        outcome.is_stored()
    }

    /// Get a copy of a value, marking it most recently used
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let value = self.cache.lock().get(key).cloned();

        if value.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }

        value
    }

    /// Run `f` with the lock held
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut LruCache<K, V>) -> R) -> R {
        let mut cache = self.cache.lock();
        f(&mut cache)
    }

    /// Verify index and list consistency under the lock
    pub fn check_invariants(&self) -> Result<()> {
        self.cache.lock().check_invariants()
    }
}

impl<K, V> SharedCache<K, V> {
    /// Copy of the values, most recent first
    pub fn dump(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.cache.lock().values().cloned().collect()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get current cache size
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_shared_zero_capacity() {
        assert!(SharedCache::<u64, String>::new(0).is_err());
    }

    #[test]
    fn test_shared_hit_and_miss() {
        let cache = SharedCache::new(10).unwrap();

        assert!(cache.put(1u64, "test data".to_string()));
        assert_eq!(cache.get(&1), Some("test data".to_string()));
        assert_eq!(cache.get(&2), None);

        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().inserts(), 1);
    }

    #[test]
    fn test_shared_eviction_stats() {
        let cache = SharedCache::new(2).unwrap();

        cache.put(0u64, "data 0");
        cache.put(1, "data 1");
        assert_eq!(cache.len(), 2);

        cache.put(2, "data 2");

        // Cache should evict 0 (LRU), now: [2 (head), 1]
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.dump(), vec!["data 2", "data 1"]);
        assert_eq!(cache.stats().evictions(), 1);
        assert_eq!(cache.get(&0), None);
    }

    #[test]
    fn test_shared_duplicate_put() {
        let cache = SharedCache::new(4).unwrap();

        assert!(cache.put("k", 1));
        assert!(!cache.put("k", 2));

        assert_eq!(cache.get(&"k"), Some(1));
        assert_eq!(cache.stats().rejected(), 1);
        assert_eq!(cache.stats().inserts(), 1);
    }

    #[test]
    fn test_shared_with_lock() {
        let cache = SharedCache::new(3).unwrap();
        cache.put(1u32, 'a');
        cache.put(2, 'b');

        let order = cache.with_lock(|inner| {
            inner.get(&1);
            inner.keys().copied().collect::<Vec<_>>()
        });

        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn test_shared_concurrent_puts() {
        let cache = SharedCache::new(64).unwrap();

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..1_000u64 {
                        cache.put(t * 1_000 + i, i);
                        cache.get(&(t * 1_000 + i / 2));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 64);
        assert_eq!(cache.stats().inserts(), 4_000);
        assert_eq!(cache.stats().evictions(), 4_000 - 64);
        assert!(cache.check_invariants().is_ok());
    }
}
