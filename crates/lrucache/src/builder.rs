//! Builder for configuring caches before construction

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::cache::{EvictionListener, LruCache};
use crate::error::Result;
use crate::sharded::ShardedLruCache;

/// Collects capacity, shard count and an optional eviction listener
///
/// Validation happens in `build`/`build_sharded`, so bad settings surface as
/// [`crate::Error`] values rather than panics.
///
/// ```
/// use lrucache::CacheBuilder;
///
/// let cache = CacheBuilder::<String, u64>::new(1024).build().unwrap();
/// cache.set("answer".to_string(), 42).unwrap();
/// assert_eq!(cache.get(&"answer".to_string()), Some(42));
/// ```
pub struct CacheBuilder<K, V> {
    capacity: usize,
    shards: usize,
    listener: Option<EvictionListener<K, V>>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Start a builder for a cache of `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            shards: 1,
            listener: None,
        }
    }

    /// Number of shards used by [`CacheBuilder::build_sharded`]
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Run `listener` for every entry evicted to stay within capacity
    pub fn eviction_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Build a single-lock cache (the shard setting is ignored)
    pub fn build(self) -> Result<LruCache<K, V>> {
        LruCache::with_listener(self.capacity, self.listener)
    }

    /// Build a sharded cache
    pub fn build_sharded(self) -> Result<ShardedLruCache<K, V>> {
        ShardedLruCache::with_listener(self.capacity, self.shards, self.listener)
    }
}

impl<K, V> fmt::Debug for CacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("capacity", &self.capacity)
            .field("shards", &self.shards)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
