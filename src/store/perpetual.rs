//! Unbounded HashMap-backed base cache.
//!
//! ## Architecture
//! - Entries live in an `FxHashMap<K, V>` behind a `parking_lot::RwLock`.
//! - No eviction of its own: bounding and reclamation are decorator concerns.
//! - Identity is the cache id: two perpetual caches compare equal and hash
//!   identically when their ids match.
//!
//! ## Core Operations
//! - `put`: insert or overwrite by key (write lock).
//! - `get`: clone the stored value (read lock).
//! - `remove` / `clear`: write lock.
//!
//! ## Concurrency Control
//! `PerpetualCache::new` exposes no caller-facing lock. Use
//! [`PerpetualCache::with_read_write_lock`] when callers need to make
//! several operations atomic across the whole stack; decorators above it
//! forward the handle.
//!
//! ## Example Usage
//! ```rust
//! use cachestack::store::PerpetualCache;
//! use cachestack::traits::Cache;
//!
//! let cache = PerpetualCache::with_read_write_lock("orders").unwrap();
//! let lock = cache.read_write_lock().unwrap();
//! {
//!     let _guard = lock.write();
//!     if cache.get(&7).unwrap().is_none() {
//!         cache.put(7, "loaded").unwrap();
//!     }
//! }
//! assert_eq!(cache.get(&7).unwrap(), Some("loaded"));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{CacheResult, ConfigError, validate_id};
use crate::traits::{Cache, FromId};

/// Innermost cache of every stack; stores entries without bound.
pub struct PerpetualCache<K, V> {
    id: String,
    map: RwLock<FxHashMap<K, V>>,
    lock: Option<RwLock<()>>,
}

impl<K, V> PerpetualCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty cache identified by `id`.
    ///
    /// Fails with [`ConfigError`] when `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self {
            id,
            map: RwLock::new(FxHashMap::default()),
            lock: None,
        })
    }

    /// Creates an empty cache that also carries a caller-facing lock.
    pub fn with_read_write_lock(id: impl Into<String>) -> Result<Self, ConfigError> {
        let mut cache = Self::new(id)?;
        cache.lock = Some(RwLock::new(()));
        Ok(cache)
    }

    /// Returns `true` if `key` has an entry.
    pub fn contains(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }
}

impl<K, V> FromId for PerpetualCache<K, V>
where
    K: Eq + Hash,
{
    fn from_id(id: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(id)
    }
}

impl<K, V> Cache<K, V> for PerpetualCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn put(&self, key: K, value: V) -> CacheResult<()> {
        self.map.write().insert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> CacheResult<Option<V>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn remove(&self, key: &K) -> CacheResult<Option<V>> {
        Ok(self.map.write().remove(key))
    }

    fn clear(&self) -> CacheResult<()> {
        self.map.write().clear();
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        Ok(self.map.read().len())
    }

    fn read_write_lock(&self) -> Option<&RwLock<()>> {
        self.lock.as_ref()
    }
}

impl<K, V> PartialEq for PerpetualCache<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<K, V> Eq for PerpetualCache<K, V> {}

impl<K, V> Hash for PerpetualCache<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<K, V> fmt::Debug for PerpetualCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerpetualCache")
            .field("id", &self.id)
            .field("len", &self.map.read().len())
            .field("read_write_lock", &self.lock.is_some())
            .finish()
    }
}
