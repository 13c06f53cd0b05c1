//! # lrucache
//!
//! Bounded, thread-safe LRU (least recently used) cache.
//!
//! ## Architecture
//! - **Index**: AHash map from key to list slot (O(1) lookup)
//! - **Order list**: slot-arena doubly-linked list, front = most recently
//!   used (O(1) promotion and eviction)
//! - **Locking**: one `parking_lot::RwLock` per cache guards both together;
//!   `get` is a writer because a hit reorders the list
//! - **Sharding**: [`ShardedLruCache`] trades exact global LRU order for
//!   per-shard locks
//!
//! ```
//! use lrucache::LruCache;
//!
//! let cache = LruCache::new(3).unwrap();
//! for (key, value) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
//!     cache.set(key.to_string(), value).unwrap();
//! }
//!
//! assert_eq!(cache.get(&"a".to_string()), None);
//! assert_eq!(cache.get(&"d".to_string()), Some(4));
//! assert_eq!(cache.count(), 3);
//! ```

#![warn(missing_docs)]

mod builder;
mod cache;
mod error;
mod lru;
mod sharded;
mod stats;
mod traits;

pub use builder::CacheBuilder;
pub use cache::{EvictionListener, LruCache};
pub use error::{Error, Result};
pub use sharded::ShardedLruCache;
pub use stats::{CacheStats, StatsSnapshot};
pub use traits::Cache;
