//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Misses and expired keys are not errors; `lookup` reports them as `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Configuration cannot produce a working engine
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Eviction policy name not recognized
    #[error("Unknown eviction policy: {0}")]
    UnknownPolicy(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
