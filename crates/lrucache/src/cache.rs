//! LruCache: thread-safe LRU cache

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::lru::{Lru, Put};
use crate::stats::{CacheStats, StatsSnapshot};
use crate::traits::Cache;

/// Callback run for every entry dropped to stay within capacity
pub type EvictionListener<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

/// Bounded LRU cache guarded by a single lock
///
/// Index and order list live behind one `RwLock`. `get` takes it in write
/// mode because a hit moves the entry to the front; only observers that
/// leave recency alone (`count`, `peek`, `contains`, `keys`) share it.
pub struct LruCache<K, V> {
    /// Index and order list
    inner: RwLock<Lru<K, V>>,

    /// Cache statistics
    stats: CacheStats,

    /// Called after the lock is released, once per eviction
    listener: Option<EvictionListener<K, V>>,

    /// Cache capacity
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new LruCache with the given capacity
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of resident entries
    ///
    /// # Returns
    /// * `Result<LruCache>` - `Error::InvalidCapacity` if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_listener(capacity, None)
    }

    /// Create a new LruCache that reports evicted entries to `listener`
    ///
    /// The listener runs outside the cache lock, so it may call back into
    /// the cache. It is not called for `delete`, `clear` or `pop_lru`.
    pub fn with_eviction_listener<F>(capacity: usize, listener: F) -> Result<Self>
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        Self::with_listener(capacity, Some(Arc::new(listener)))
    }

    pub(crate) fn with_listener(
        capacity: usize,
        listener: Option<EvictionListener<K, V>>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        debug!(capacity, listener = listener.is_some(), "created LRU cache");

        Ok(Self {
            inner: RwLock::new(Lru::new(capacity)),
            stats: CacheStats::new(),
            listener,
            capacity,
        })
    }

    /// Get a value and mark it most recently used
    pub fn get(&self, key: &K) -> Option<V> {
        let mut lru = self.inner.write();
        match lru.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Insert or replace a value, evicting the LRU entry if needed
    ///
    /// # Returns
    /// * `Result<()>` - `Error::Corrupted` if index and order list disagree
    pub fn set(&self, key: K, value: V) -> Result<()> {
        let evicted = {
            let mut lru = self.inner.write();
            match lru.put(key, value) {
                Ok(Put::Updated) => {
                    self.stats.record_update();
                    None
                }
                Ok(Put::Inserted) => {
                    self.stats.record_insert();
                    None
                }
                Ok(Put::Evicted(key, value)) => {
                    self.stats.record_insert();
                    self.stats.record_eviction();
                    Some((key, value))
                }
                Err(err) => {
                    warn!(error = %err, capacity = self.capacity, "LRU cache rejected insert");
                    return Err(err);
                }
            }
        };

        if let Some((key, value)) = evicted {
            trace!(capacity = self.capacity, "evicted least recently used entry");
            if let Some(listener) = &self.listener {
                listener(&key, &value);
            }
        }

        Ok(())
    }

    /// Remove a key if present
    pub fn delete(&self, key: &K) {
        let mut lru = self.inner.write();
        if lru.remove(key).is_some() {
            self.stats.record_delete();
        }
    }

    /// Remove and return the least recently used entry
    pub fn pop_lru(&self) -> Option<(K, V)> {
        let mut lru = self.inner.write();
        let entry = lru.pop_lru();
        if entry.is_some() {
            self.stats.record_delete();
        }
        entry
    }

    /// Drop every entry (statistics are kept)
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Get current number of entries
    pub fn count(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get a value without changing its recency
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.read().peek(key).cloned()
    }

    /// Check for a key without changing its recency
    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().contains(key)
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<K> {
        self.inner.read().iter().map(|(key, _)| key.clone()).collect()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Copy the statistics while holding the lock
    ///
    /// Writers bump counters under the write lock, so this never shows an
    /// eviction without the insert that caused it.
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        let _lru = self.inner.read();
        self.stats.snapshot()
    }

    /// Verify that index and order list agree
    pub fn check_invariants(&self) -> Result<()> {
        self.inner.read().check_invariants()
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        LruCache::get(self, key)
    }

    fn set(&self, key: K, value: V) -> Result<()> {
        LruCache::set(self, key, value)
    }

    fn delete(&self, key: &K) {
        LruCache::delete(self, key)
    }

    fn clear(&self) {
        LruCache::clear(self)
    }

    fn count(&self) -> usize {
        LruCache::count(self)
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.inner.read().len())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn abc(capacity: usize) -> LruCache<String, i32> {
        let cache = LruCache::new(capacity).unwrap();
        cache.set("a".to_string(), 1).unwrap();
        cache.set("b".to_string(), 2).unwrap();
        cache.set("c".to_string(), 3).unwrap();
        cache
    }

    #[test]
    fn test_cache_zero_capacity() {
        let result = LruCache::<String, i32>::new(0);
        assert!(matches!(result, Err(Error::InvalidCapacity(0))));
    }

    #[test]
    fn test_cache_basic() {
        let cache = abc(3);

        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"z".to_string()), None);
        assert_eq!(cache.count(), 3);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_cache_example_scenario() {
        let cache = abc(3);
        cache.set("d".to_string(), 4).unwrap();

        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"d".to_string()), Some(4));
        assert_eq!(cache.count(), 3);
        assert_eq!(cache.stats().evictions(), 1);
    }

    #[test]
    fn test_cache_get_promotes() {
        let cache = LruCache::new(2).unwrap();
        cache.set("a", 1).unwrap();
        cache.set("b", 2).unwrap();

        cache.get(&"a");
        cache.set("c", 3).unwrap();

        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"c"));
    }

    #[test]
    fn test_cache_update_promotes() {
        let cache = abc(3);

        cache.set("a".to_string(), 10).unwrap();
        assert_eq!(cache.count(), 3);
        assert_eq!(cache.keys(), vec!["a", "c", "b"]);

        cache.set("d".to_string(), 4).unwrap();
        assert_eq!(cache.peek(&"a".to_string()), Some(10));
        assert_eq!(cache.peek(&"b".to_string()), None);
        assert_eq!(cache.stats().snapshot().updates, 1);
    }

    #[test]
    fn test_cache_peek_keeps_order() {
        let cache = abc(3);

        assert_eq!(cache.peek(&"a".to_string()), Some(1));
        assert_eq!(cache.keys(), vec!["c", "b", "a"]);
        assert_eq!(cache.stats().hits(), 0);
    }

    #[test]
    fn test_cache_delete_idempotent() {
        let cache = abc(3);

        cache.delete(&"b".to_string());
        cache.delete(&"b".to_string());
        cache.delete(&"missing".to_string());

        assert_eq!(cache.count(), 2);
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.stats().snapshot().deletes, 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_cache_clear() {
        let cache = abc(3);

        cache.clear();

        assert_eq!(cache.count(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);
        for key in ["a", "b", "c"] {
            assert_eq!(cache.get(&key.to_string()), None);
        }

        cache.set("x".to_string(), 9).unwrap();
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn test_cache_pop_lru() {
        let cache = abc(3);

        assert_eq!(cache.pop_lru(), Some(("a".to_string(), 1)));
        assert_eq!(cache.count(), 2);
        assert_eq!(cache.stats().evictions(), 0);
    }

    #[test]
    fn test_cache_eviction_listener() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cache = LruCache::with_eviction_listener(2, move |key: &&'static str, value: &i32| {
            sink.lock().unwrap().push((*key, *value));
        })
        .unwrap();

        cache.set("a", 1).unwrap();
        cache.set("b", 2).unwrap();
        cache.set("a", 11).unwrap();
        cache.set("c", 3).unwrap();
        cache.delete(&"c");
        cache.clear();

        assert_eq!(*seen.lock().unwrap(), vec![("b", 2)]);
    }

    #[test]
    fn test_cache_listener_may_reenter() {
        let cache = Arc::new_cyclic(|weak: &std::sync::Weak<LruCache<u32, u32>>| {
            let weak = weak.clone();
            LruCache::with_eviction_listener(1, move |_key: &u32, _value: &u32| {
                if let Some(cache) = weak.upgrade() {
                    let _ = cache.count();
                }
            })
            .unwrap()
        });

        cache.set(1, 1).unwrap();
        cache.set(2, 2).unwrap();
        assert_eq!(cache.keys(), vec![2]);
    }

    #[test]
    fn test_cache_as_trait_object() {
        let cache: Arc<dyn Cache<String, i32>> = Arc::new(abc(2));

        assert_eq!(cache.count(), 2);
        assert_eq!(cache.get(&"a".to_string()), None);
        cache.delete(&"b".to_string());
        cache.clear();
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_cache_stats_snapshot_is_consistent() {
        let cache = Arc::new(LruCache::<u64, u64>::new(1).unwrap());

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..50_000 {
                    cache.set(i, i).unwrap();
                }
            })
        };

        // Distinct keys into one slot: every insert after the first evicts
        while !writer.is_finished() {
            let snap = cache.stats_snapshot();
            assert!(snap.inserts == 0 || snap.inserts == snap.evictions + 1, "{:?}", snap);
        }
        writer.join().unwrap();

        let snap = cache.stats_snapshot();
        assert_eq!(snap.inserts, 50_000);
        assert_eq!(snap.evictions, 49_999);
    }

    #[test]
    fn test_cache_repeated_reads_protect_key() {
        let cache = LruCache::<u32, u32>::new(4).unwrap();
        for i in 0..4 {
            cache.set(i, i).unwrap();
        }

        assert_eq!(cache.get(&0), Some(0));
        for i in 10..13 {
            cache.set(i, i).unwrap();
        }

        assert!(cache.contains(&0));
        assert_eq!(cache.keys(), vec![12, 11, 10, 0]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_cache_debug() {
        let cache = abc(5);
        let debug = format!("{:?}", cache);
        assert!(debug.contains("capacity: 5"));
        assert!(debug.contains("len: 3"));
    }
}
