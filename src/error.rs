//! Error types for the cachestack library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when a cache is configured with invalid
//!   parameters (empty id, zero capacity, zero hard links, bad layer set).
//! - [`CacheError`]: Returned by [`Cache`](crate::traits::Cache) operations.
//!   Misses are never errors; this type only carries failures raised by a
//!   cache implementation somewhere in a decorator chain. Decorators forward
//!   it with `?` and never swallow it.
//!
//! ## Example Usage
//!
//! ```
//! use cachestack::error::ConfigError;
//! use cachestack::store::PerpetualCache;
//!
//! let cache: Result<PerpetualCache<u64, u64>, ConfigError> = PerpetualCache::new("users");
//! assert!(cache.is_ok());
//!
//! let bad = PerpetualCache::<u64, u64>::new("");
//! assert!(bad.is_err());
//! ```

use thiserror::Error;

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by constructors that take a cache id, by the capacity and
/// hard-link setters on the decorators, and by
/// [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
/// Carries a human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use cachestack::policy::lru::LruCache;
/// use cachestack::store::PerpetualCache;
///
/// let base = PerpetualCache::<u64, u64>::new("orders").unwrap();
/// let lru = LruCache::new(base);
/// let err = lru.set_capacity(0).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Validates a cache identifier.
///
/// Every concrete cache is identified by a non-empty id.
pub fn validate_id(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::new("cache id must not be empty"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Invalid configuration surfaced during an operation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A cache implementation refused or failed an operation.
    #[error("cache `{id}`: {message}")]
    Backend { id: String, message: String },
}

impl CacheError {
    /// Creates a backend error attributed to the cache with `id`.
    pub fn backend(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            id: id.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
