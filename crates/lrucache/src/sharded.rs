//! ShardedLruCache: hash-partitioned LRU cache
//!
//! Each shard is an independent [`LruCache`] with its own lock, so callers
//! touching different shards never contend. Recency is exact inside a shard
//! and approximate across the whole cache.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use ahash::RandomState;
use tracing::debug;

use crate::cache::{EvictionListener, LruCache};
use crate::error::{Error, Result};
use crate::stats::StatsSnapshot;
use crate::traits::Cache;

/// Fixed seeds so a key maps to the same shard for the life of the process
const SHARD_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// LRU cache split into independently locked shards
pub struct ShardedLruCache<K, V> {
    shards: Box<[LruCache<K, V>]>,
    hasher: RandomState,
    capacity: usize,
}

impl<K, V> ShardedLruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache holding `capacity` entries spread over `shards` shards
    ///
    /// # Returns
    /// * `Error::InvalidCapacity` if `capacity` is 0
    /// * `Error::InvalidShardCount` if `shards` is 0 or exceeds `capacity`
    pub fn new(capacity: usize, shards: usize) -> Result<Self> {
        Self::with_listener(capacity, shards, None)
    }

    /// Like [`ShardedLruCache::new`], reporting evictions from every shard
    pub fn with_eviction_listener<F>(capacity: usize, shards: usize, listener: F) -> Result<Self>
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        Self::with_listener(capacity, shards, Some(Arc::new(listener)))
    }

    pub(crate) fn with_listener(
        capacity: usize,
        shards: usize,
        listener: Option<EvictionListener<K, V>>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        if shards == 0 || shards > capacity {
            return Err(Error::InvalidShardCount(shards));
        }

        let base = capacity / shards;
        let extra = capacity % shards;
        let shards = (0..shards)
            .map(|i| {
                let shard_capacity = base + usize::from(i < extra);
                LruCache::with_listener(shard_capacity, listener.clone())
            })
            .collect::<Result<Vec<_>>>()?
            .into_boxed_slice();

        debug!(capacity, shards = shards.len(), "created sharded LRU cache");

        let [k0, k1, k2, k3] = SHARD_SEEDS;
        Ok(Self {
            shards,
            hasher: RandomState::with_seeds(k0, k1, k2, k3),
            capacity,
        })
    }

    fn shard(&self, key: &K) -> &LruCache<K, V> {
        let hash = self.hasher.hash_one(key);
        &self.shards[(hash % self.shards.len() as u64) as usize]
    }

    /// Get a value and mark it most recently used within its shard
    pub fn get(&self, key: &K) -> Option<V> {
        self.shard(key).get(key)
    }

    /// Insert or replace a value; may evict the LRU entry of the key's shard
    pub fn set(&self, key: K, value: V) -> Result<()> {
        self.shard(&key).set(key, value)
    }

    /// Remove a key if present
    pub fn delete(&self, key: &K) {
        self.shard(key).delete(key)
    }

    /// Clear every shard, one at a time
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
    }

    /// Sum of shard sizes; each shard is read under its own lock
    pub fn count(&self) -> usize {
        self.shards.iter().map(LruCache::count).sum()
    }

    /// Check if every shard is empty
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(LruCache::is_empty)
    }

    /// Get a value without changing its recency
    pub fn peek(&self, key: &K) -> Option<V> {
        self.shard(key).peek(key)
    }

    /// Check for a key without changing its recency
    pub fn contains(&self, key: &K) -> bool {
        self.shard(key).contains(key)
    }

    /// Total capacity across all shards
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of shards
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Statistics summed over every shard
    pub fn stats(&self) -> StatsSnapshot {
        self.shards
            .iter()
            .map(LruCache::stats_snapshot)
            .fold(StatsSnapshot::default(), |acc, snap| acc + snap)
    }

    /// Verify every shard's index and order list
    pub fn check_invariants(&self) -> Result<()> {
        self.shards.iter().try_for_each(LruCache::check_invariants)
    }
}

impl<K, V> Cache<K, V> for ShardedLruCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        ShardedLruCache::get(self, key)
    }

    fn set(&self, key: K, value: V) -> Result<()> {
        ShardedLruCache::set(self, key, value)
    }

    fn delete(&self, key: &K) {
        ShardedLruCache::delete(self, key)
    }

    fn clear(&self) {
        ShardedLruCache::clear(self)
    }

    fn count(&self) -> usize {
        ShardedLruCache::count(self)
    }
}

impl<K, V> fmt::Debug for ShardedLruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedLruCache")
            .field("capacity", &self.capacity)
            .field("shards", &self.shards.len())
            .finish()
    }
}
