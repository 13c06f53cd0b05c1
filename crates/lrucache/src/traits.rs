//! Key-value interface shared by every cache in this crate

use crate::error::Result;

/// Bounded key-value cache usable from many threads at once
///
/// All methods take `&self`; implementations synchronize internally, so a
/// cache is shared as `Arc<C>` or `Arc<dyn Cache<K, V>>`.
pub trait Cache<K, V>: Send + Sync {
    /// Return a clone of the value for `key` and mark it most recently used
    fn get(&self, key: &K) -> Option<V>;

    /// Insert or replace `key`, evicting the least recently used entry when
    /// the cache would grow past capacity
    ///
    /// Fails only if the cache detects internal corruption.
    fn set(&self, key: K, value: V) -> Result<()>;

    /// Remove `key`; a missing key is not an error
    fn delete(&self, key: &K);

    /// Remove every entry, keeping the configured capacity
    fn clear(&self);

    /// Number of resident entries
    fn count(&self) -> usize;
}
