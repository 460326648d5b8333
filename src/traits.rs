//! # Cache Contract
//!
//! Every storage backend and every decorator in this crate implements the
//! same narrow [`Cache`] trait, so stacks compose as a chain of
//! responsibility: callers only ever talk to the outermost layer.
//!
//! ## Architecture
//!
//! ```text
//!   caller
//!     │  put / get / remove / clear / len
//!     ▼
//!   ┌───────────────────────────┐
//!   │ SoftCache<K, V, _>        │  Cache<K, Arc<V>>
//!   │  hard-link ring + queue   │
//!   └─────────────┬─────────────┘
//!                 │ Cache<K, SoftReference<K, V>>
//!   ┌─────────────▼─────────────┐
//!   │ LruCache<K, _, _>         │  recency list, bounded
//!   └─────────────┬─────────────┘
//!                 │
//!   ┌─────────────▼─────────────┐
//!   │ PerpetualCache<K, _>      │  FxHashMap behind RwLock
//!   └───────────────────────────┘
//! ```
//!
//! ## Contract
//!
//! | Method            | Behavior                                             |
//! |-------------------|------------------------------------------------------|
//! | `id`              | Stable, non-empty identifier                         |
//! | `put`             | Insert or overwrite; never rejects a value           |
//! | `get`             | Cached value or `None`; a miss is not an error       |
//! | `remove`          | Previous value or `None`                             |
//! | `clear`           | Drop entries and reset layer bookkeeping; idempotent |
//! | `len`             | Count of retrievable entries                         |
//! | `read_write_lock` | Optional caller-facing lock for multi-step work      |
//!
//! ## Thread Safety
//!
//! All methods take `&self`. Implementations synchronize the state they own,
//! so a single stack can be shared behind an `Arc` by many threads. Callers
//! that need check-then-insert atomicity across several calls use the handle
//! returned by [`Cache::read_write_lock`], when the stack provides one.
//!
//! ## Absent Values
//!
//! The contract never inspects `V`. When "no result" is itself worth caching,
//! pick `V = Option<T>` and store `None`.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CacheResult, ConfigError};

/// Storage abstraction implemented by every backend and decorator.
///
/// # Example
///
/// ```
/// use cachestack::traits::Cache;
/// use cachestack::store::PerpetualCache;
///
/// fn warm<C: Cache<u64, String>>(cache: &C, rows: &[(u64, &str)]) {
///     for (key, value) in rows {
///         cache.put(*key, value.to_string()).unwrap();
///     }
/// }
///
/// let cache = PerpetualCache::new("users").unwrap();
/// warm(&cache, &[(1, "ada"), (2, "grace")]);
/// assert_eq!(cache.len().unwrap(), 2);
/// assert_eq!(cache.get(&1).unwrap(), Some("ada".to_string()));
/// ```
pub trait Cache<K, V>: Send + Sync {
    /// Returns the identifier of the namespace this cache serves.
    fn id(&self) -> &str;

    /// Inserts or overwrites the entry for `key`.
    fn put(&self, key: K, value: V) -> CacheResult<()>;

    /// Returns the cached value for `key`, or `None` on a miss.
    fn get(&self, key: &K) -> CacheResult<Option<V>>;

    /// Removes the entry for `key`, returning the previous value.
    fn remove(&self, key: &K) -> CacheResult<Option<V>>;

    /// Removes every entry and resets layer-local state.
    fn clear(&self) -> CacheResult<()>;

    /// Returns the number of retrievable entries.
    fn len(&self) -> CacheResult<usize>;

    /// Returns `true` if the cache holds no retrievable entries.
    fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns the lock callers use to coordinate multi-step operations.
    ///
    /// Layers that add no coordination needs of their own forward the
    /// delegate's handle; the innermost layer decides.
    fn read_write_lock(&self) -> Option<&RwLock<()>> {
        None
    }
}

/// Construction from a single cache identifier.
///
/// Every pluggable backend is constructible from its id alone and fails
/// fast when the id is empty.
///
/// # Example
///
/// ```
/// use cachestack::traits::FromId;
/// use cachestack::store::PerpetualCache;
///
/// let cache = PerpetualCache::<u64, u64>::from_id("orders").unwrap();
/// assert!(PerpetualCache::<u64, u64>::from_id("").is_err());
/// # let _ = cache;
/// ```
pub trait FromId: Sized {
    /// Creates an empty cache with the given id.
    fn from_id(id: impl Into<String>) -> Result<Self, ConfigError>;
}

impl<K, V, C> Cache<K, V> for Box<C>
where
    C: Cache<K, V> + ?Sized,
{
    fn id(&self) -> &str {
        (**self).id()
    }

    fn put(&self, key: K, value: V) -> CacheResult<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &K) -> CacheResult<Option<V>> {
        (**self).get(key)
    }

    fn remove(&self, key: &K) -> CacheResult<Option<V>> {
        (**self).remove(key)
    }

    fn clear(&self) -> CacheResult<()> {
        (**self).clear()
    }

    fn len(&self) -> CacheResult<usize> {
        (**self).len()
    }

    fn is_empty(&self) -> CacheResult<bool> {
        (**self).is_empty()
    }

    fn read_write_lock(&self) -> Option<&RwLock<()>> {
        (**self).read_write_lock()
    }
}

impl<K, V, C> Cache<K, V> for Arc<C>
where
    C: Cache<K, V> + ?Sized,
{
    fn id(&self) -> &str {
        (**self).id()
    }

    fn put(&self, key: K, value: V) -> CacheResult<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &K) -> CacheResult<Option<V>> {
        (**self).get(key)
    }

    fn remove(&self, key: &K) -> CacheResult<Option<V>> {
        (**self).remove(key)
    }

    fn clear(&self) -> CacheResult<()> {
        (**self).clear()
    }

    fn len(&self) -> CacheResult<usize> {
        (**self).len()
    }

    fn is_empty(&self) -> CacheResult<bool> {
        (**self).is_empty()
    }

    fn read_write_lock(&self) -> Option<&RwLock<()>> {
        (**self).read_write_lock()
    }
}
