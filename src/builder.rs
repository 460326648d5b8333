//! Cache stack builder.
//!
//! Assembles a [`PerpetualCache`] and any number of decorators into one
//! [`CacheStack`] over a `Box<dyn Cache<K, Arc<V>>>`, hiding the typed
//! layering (the layers below a soft decorator store [`SoftReference`]s, the
//! ones above store `Arc<V>`).
//!
//! ## Layer Order
//!
//! Layers are applied innermost-first, in call order:
//!
//! ```text
//!   CacheBuilder::new("users").lru(512).soft(64).lru(128)
//!
//!   LruCache(128) ─► SoftCache(64) ─► LruCache(512) ─► PerpetualCache("users")
//!   outermost                                          innermost
//! ```
//!
//! ## Reclamation
//!
//! The built [`CacheStack`] keeps the soft layer's [`Reclaimer`], so the
//! component that observes memory pressure can still reach it once the
//! layers are type-erased.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cachestack::builder::CacheBuilder;
//! use cachestack::traits::Cache;
//!
//! let cache = CacheBuilder::new("users").lru(2).build::<u64, String>();
//! cache.put(1, Arc::new("ada".to_string())).unwrap();
//! cache.put(2, Arc::new("grace".to_string())).unwrap();
//! cache.put(3, Arc::new("linus".to_string())).unwrap();
//!
//! assert_eq!(cache.len().unwrap(), 2);
//! assert_eq!(cache.get(&1).unwrap(), None);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{CacheResult, ConfigError, validate_id};
use crate::policy::lru::LruCache;
use crate::policy::soft::SoftCache;
use crate::reclaim::{Reclaimer, SoftReference};
use crate::store::PerpetualCache;
use crate::traits::Cache;

/// One decorator in a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Bounded recency decorator with the given capacity.
    Lru { capacity: usize },
    /// Reclaim-aware decorator with the given hard-link window.
    Soft { hard_links: usize },
}

/// Plain configuration for a two-layer stack.
///
/// The LRU layer, when present, sits below the soft layer. With the `serde`
/// feature it can be read from a settings file; missing fields take their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CacheConfig {
    pub id: String,
    pub lru_capacity: Option<usize>,
    pub hard_links: Option<usize>,
    pub read_write_lock: bool,
}

/// Builder for decorator stacks over a [`PerpetualCache`].
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    id: String,
    layers: Vec<Layer>,
    read_write_lock: bool,
}

impl CacheBuilder {
    /// Starts a stack whose innermost store is identified by `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layers: Vec::new(),
            read_write_lock: false,
        }
    }

    /// Starts a stack from a [`CacheConfig`].
    pub fn from_config(config: CacheConfig) -> Self {
        let mut builder = Self::new(config.id).read_write_lock(config.read_write_lock);
        if let Some(capacity) = config.lru_capacity {
            builder = builder.lru(capacity);
        }
        if let Some(hard_links) = config.hard_links {
            builder = builder.soft(hard_links);
        }
        builder
    }

    /// Adds a bounded recency layer.
    pub fn lru(mut self, capacity: usize) -> Self {
        self.layers.push(Layer::Lru { capacity });
        self
    }

    /// Adds a reclaim-aware layer.
    pub fn soft(mut self, hard_links: usize) -> Self {
        self.layers.push(Layer::Soft { hard_links });
        self
    }

    /// Gives the store a caller-facing read/write lock.
    pub fn read_write_lock(mut self, enabled: bool) -> Self {
        self.read_write_lock = enabled;
        self
    }

    /// Returns the layers added so far, innermost first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn validate(&self) -> Result<Option<usize>, ConfigError> {
        validate_id(&self.id)?;
        let mut soft_at = None;
        for (index, layer) in self.layers.iter().enumerate() {
            match *layer {
                Layer::Lru { capacity: 0 } => {
                    return Err(ConfigError::new("lru capacity must be greater than zero"));
                },
                Layer::Soft { hard_links: 0 } => {
                    return Err(ConfigError::new("hard link window must be greater than zero"));
                },
                Layer::Soft { .. } if soft_at.is_some() => {
                    return Err(ConfigError::new("a stack may contain at most one soft layer"));
                },
                Layer::Soft { .. } => soft_at = Some(index),
                Layer::Lru { .. } => {},
            }
        }
        Ok(soft_at)
    }

    fn store<K, X>(&self) -> Result<PerpetualCache<K, X>, ConfigError>
    where
        K: Eq + Hash,
    {
        if self.read_write_lock {
            PerpetualCache::with_read_write_lock(self.id.as_str())
        } else {
            PerpetualCache::new(self.id.as_str())
        }
    }

    /// Builds the stack, reporting invalid configuration.
    pub fn try_build<K, V>(&self) -> Result<CacheStack<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        let soft_at = self.validate()?;

        let mut reclaimer = None;
        let cache = match soft_at {
            Some(index) => {
                let (below, above) = self.layers.split_at(index);
                let hard_links = match above.first() {
                    Some(Layer::Soft { hard_links }) => *hard_links,
                    _ => return Err(ConfigError::new("soft layer position is out of range")),
                };

                let store: Box<dyn Cache<K, SoftReference<K, V>>> =
                    Box::new(self.store::<K, SoftReference<K, V>>()?);
                let inner = wrap_lru(store, below)?;
                let soft = SoftCache::with_hard_links(inner, hard_links)?;
                reclaimer = Some(soft.reclaimer());
                let soft: Box<dyn Cache<K, Arc<V>>> = Box::new(soft);
                wrap_lru(soft, &above[1..])?
            },
            None => {
                let store: Box<dyn Cache<K, Arc<V>>> = Box::new(self.store::<K, Arc<V>>()?);
                wrap_lru(store, &self.layers)?
            },
        };

        debug!(cache = self.id.as_str(), layers = self.layers.len(), "built cache stack");
        Ok(CacheStack { cache, reclaimer })
    }

    /// Builds the stack.
    ///
    /// # Panics
    ///
    /// Panics with the configuration error message when the configuration
    /// is invalid. Use [`try_build`](Self::try_build) for runtime input.
    pub fn build<K, V>(&self) -> CacheStack<K, V>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        match self.try_build() {
            Ok(cache) => cache,
            Err(err) => panic!("invalid cache configuration: {err}"),
        }
    }
}

/// A built stack: the outermost layer plus the soft layer's reclaimer.
pub struct CacheStack<K, V> {
    cache: Box<dyn Cache<K, Arc<V>>>,
    reclaimer: Option<Reclaimer<K, V>>,
}

impl<K, V> CacheStack<K, V> {
    /// Returns the memory-manager trigger, if the stack has a soft layer.
    pub fn reclaimer(&self) -> Option<&Reclaimer<K, V>> {
        self.reclaimer.as_ref()
    }

    /// Splits the stack into its outermost layer and reclaimer.
    pub fn into_parts(self) -> (Box<dyn Cache<K, Arc<V>>>, Option<Reclaimer<K, V>>) {
        (self.cache, self.reclaimer)
    }
}

impl<K, V> Cache<K, Arc<V>> for CacheStack<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    fn id(&self) -> &str {
        self.cache.id()
    }

    fn put(&self, key: K, value: Arc<V>) -> CacheResult<()> {
        self.cache.put(key, value)
    }

    fn get(&self, key: &K) -> CacheResult<Option<Arc<V>>> {
        self.cache.get(key)
    }

    fn remove(&self, key: &K) -> CacheResult<Option<Arc<V>>> {
        self.cache.remove(key)
    }

    fn clear(&self) -> CacheResult<()> {
        self.cache.clear()
    }

    fn len(&self) -> CacheResult<usize> {
        self.cache.len()
    }

    fn read_write_lock(&self) -> Option<&RwLock<()>> {
        self.cache.read_write_lock()
    }
}

impl<K, V> fmt::Debug for CacheStack<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStack")
            .field("id", &self.cache.id())
            .field("reclaimable", &self.reclaimer.is_some())
            .finish()
    }
}

fn wrap_lru<K, X>(
    mut cache: Box<dyn Cache<K, X>>,
    layers: &[Layer],
) -> Result<Box<dyn Cache<K, X>>, ConfigError>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    X: 'static,
{
    for layer in layers {
        if let Layer::Lru { capacity } = *layer {
            cache = Box::new(LruCache::with_capacity(cache, capacity)?);
        }
    }
    Ok(cache)
}
