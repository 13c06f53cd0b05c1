//! Error types for lrucache

use std::fmt;

/// Result type alias for lrucache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache construction and operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Capacity must be at least 1
    InvalidCapacity(usize),

    /// Shard count must be in `1..=capacity`
    InvalidShardCount(usize),

    /// Index and order list disagree
    Corrupted(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(cap) => {
                write!(f, "Invalid capacity: {} (must be greater than 0)", cap)
            }
            Error::InvalidShardCount(shards) => {
                write!(f, "Invalid shard count: {} (must be between 1 and capacity)", shards)
            }
            Error::Corrupted(msg) => write!(f, "Cache corrupted: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
