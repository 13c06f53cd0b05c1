//! The cache under test: single-lock or sharded

use std::sync::Arc;
use lrucache::{Cache, CacheBuilder, LruCache, Result, ShardedLruCache, StatsSnapshot};

pub type Key = String;
pub type Value = u64;

#[derive(Clone)]
pub enum Target {
    Single(Arc<LruCache<Key, Value>>),
    Sharded(Arc<ShardedLruCache<Key, Value>>),
}

impl Target {
    /// Single-lock cache for `shards == 1`, sharded otherwise
    pub fn build(capacity: usize, shards: usize) -> Result<Self> {
        let builder = CacheBuilder::new(capacity).shards(shards);
        if shards == 1 {
            Ok(Target::Single(Arc::new(builder.build()?)))
        } else {
            Ok(Target::Sharded(Arc::new(builder.build_sharded()?)))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Target::Single(_) => "single",
            Target::Sharded(_) => "sharded",
        }
    }

    /// The cache through its public trait, as any external caller sees it
    pub fn cache(&self) -> &dyn Cache<Key, Value> {
        match self {
            Target::Single(cache) => &**cache,
            Target::Sharded(cache) => &**cache,
        }
    }

    pub fn peek(&self, key: &Key) -> Option<Value> {
        match self {
            Target::Single(cache) => cache.peek(key),
            Target::Sharded(cache) => cache.peek(key),
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            Target::Single(cache) => cache.capacity(),
            Target::Sharded(cache) => cache.capacity(),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        match self {
            Target::Single(cache) => cache.stats_snapshot(),
            Target::Sharded(cache) => cache.stats(),
        }
    }

    pub fn check_invariants(&self) -> Result<()> {
        match self {
            Target::Single(cache) => cache.check_invariants(),
            Target::Sharded(cache) => cache.check_invariants(),
        }
    }
}
