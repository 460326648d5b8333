//! # LRU Decorator
//!
//! Bounds any [`Cache`] to a configurable number of keys by evicting the
//! least recently used one. Both `get` and `put` count as a use.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │ LruCache<K, V, C>                                            │
//!   │                                                              │
//!   │   order: Mutex<RecencyList<K>>      capacity: AtomicUsize    │
//!   │   head ─► [MRU] ◄──► ... ◄──► [LRU] ◄── tail                 │
//!   │                                                              │
//!   │   delegate: C  (owns the values)                             │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decorator tracks keys only; values stay in the delegate.
//!
//! ## Operations
//!
//! | Operation | Delegate         | Recency order                         |
//! |-----------|------------------|---------------------------------------|
//! | `put`     | `put(k, v)`      | record `k`; pop LRU if over capacity  |
//! | `get`     | `get(k)`         | move `k` to MRU if tracked            |
//! | `remove`  | `remove(k)`      | stop tracking `k`                     |
//! | `clear`   | `clear()`        | drop every key                        |
//! | `len`     | `len()`          | -                                     |
//!
//! ## Eviction
//!
//! ```text
//!   capacity = 2
//!
//!   put(A)  put(B)  get(A)  put(C)
//!   [A]     [B,A]   [A,B]   [C,A,B] ─► over capacity ─► pop B ─► delegate.remove(B)
//! ```
//!
//! Each overflowing `put` evicts exactly one key. The victim is popped while
//! the recency lock is held, so two threads never evict the same key; the
//! delegate removal happens after the lock is released. If that removal
//! fails, the victim goes back to the LRU end and is counted as overdue
//! before the error is returned; later `put`s pop overdue victims while the
//! tracked set is still over capacity.
//!
//! ## Capacity Changes
//!
//! [`LruCache::set_capacity`] rejects zero and takes effect on the next
//! eviction check. Shrinking never evicts retroactively.
//!
//! ## Thread Safety
//!
//! `LruCache` is `Send + Sync` when the delegate is. Concurrent `get`/`put`
//! keep the recency list consistent; strict linear recency across racing
//! calls is not guaranteed, bounded size is.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::ds::RecencyList;
use crate::error::{CacheResult, ConfigError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::LruMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::LruMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{LruMetricsRecorder, MetricsReset, MetricsSnapshotProvider};
use crate::traits::Cache;

/// Capacity used by [`LruCache::new`].
pub const DEFAULT_LRU_CAPACITY: usize = 1024;

/// Upper bound on recency slots reserved up front.
const ORDER_PREALLOC: usize = 4096;

/// Decorator that keeps at most `capacity` keys, evicting the least recently
/// used.
///
/// # Example
///
/// ```
/// use cachestack::policy::lru::LruCache;
/// use cachestack::store::PerpetualCache;
/// use cachestack::traits::Cache;
///
/// let cache = LruCache::with_capacity(PerpetualCache::new("users").unwrap(), 2).unwrap();
/// cache.put("a", 1).unwrap();
/// cache.put("b", 2).unwrap();
/// cache.get(&"a").unwrap();
/// cache.put("c", 3).unwrap();
///
/// assert_eq!(cache.get(&"b").unwrap(), None);
/// assert_eq!(cache.get(&"a").unwrap(), Some(1));
/// assert_eq!(cache.get(&"c").unwrap(), Some(3));
/// ```
pub struct LruCache<K, V, C> {
    delegate: C,
    order: Mutex<RecencyList<K>>,
    capacity: AtomicUsize,
    overdue: AtomicUsize,
    #[cfg(feature = "metrics")]
    metrics: LruMetrics,
    _values: PhantomData<fn() -> V>,
}

impl<K, V, C> LruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Cache<K, V>,
{
    /// Wraps `delegate` with the default capacity of 1024 keys.
    pub fn new(delegate: C) -> Self {
        Self::build(delegate, DEFAULT_LRU_CAPACITY)
    }

    /// Wraps `delegate` with a custom capacity.
    ///
    /// Fails with [`ConfigError`] when `capacity` is zero.
    pub fn with_capacity(delegate: C, capacity: usize) -> Result<Self, ConfigError> {
        check_capacity(capacity)?;
        Ok(Self::build(delegate, capacity))
    }

    fn build(delegate: C, capacity: usize) -> Self {
        Self {
            delegate,
            order: Mutex::new(RecencyList::with_capacity(capacity.min(ORDER_PREALLOC))),
            capacity: AtomicUsize::new(capacity),
            overdue: AtomicUsize::new(0),
            #[cfg(feature = "metrics")]
            metrics: LruMetrics::default(),
            _values: PhantomData,
        }
    }

    /// Returns the current capacity.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Changes the capacity used by subsequent eviction checks.
    ///
    /// Fails with [`ConfigError`] when `capacity` is zero; the previous
    /// capacity stays in effect.
    pub fn set_capacity(&self, capacity: usize) -> Result<(), ConfigError> {
        check_capacity(capacity)?;
        let previous = self.capacity.swap(capacity, Ordering::AcqRel);
        debug!(cache = self.delegate.id(), previous, capacity, "lru capacity changed");
        Ok(())
    }

    /// Returns the number of keys in the recency order.
    pub fn tracked_len(&self) -> usize {
        self.order.lock().len()
    }

    /// Returns tracked keys from most to least recently used.
    pub fn recency_order(&self) -> Vec<K> {
        self.order.lock().iter().cloned().collect()
    }

    /// Removes a popped victim from the delegate.
    ///
    /// On failure the victim is tracked again at the LRU end and counted as
    /// overdue, so a later `put` retries it.
    fn evict(&self, eldest: K) -> CacheResult<()> {
        #[cfg(feature = "metrics")]
        self.metrics.record_eviction();
        debug!(cache = self.delegate.id(), "evicting least recently used entry");
        if let Err(err) = self.delegate.remove(&eldest) {
            let mut order = self.order.lock();
            order.restore_lru(eldest);
            self.overdue.fetch_add(1, Ordering::AcqRel);
            return Err(err);
        }
        Ok(())
    }

    /// Pops one victim owed by an earlier failed eviction, if still over
    /// capacity.
    fn take_overdue(&self) -> Option<K> {
        if self.overdue.load(Ordering::Acquire) == 0 {
            return None;
        }
        let capacity = self.capacity();
        let mut order = self.order.lock();
        if order.len() <= capacity {
            self.overdue.store(0, Ordering::Release);
            return None;
        }
        let victim = order.pop_lru()?;
        // non-zero here: every write to `overdue` holds the order lock
        self.overdue.fetch_sub(1, Ordering::AcqRel);
        Some(victim)
    }

    /// Records `key` and, if that overflows the capacity, pops the victim.
    fn cycle(&self, key: K) -> Option<K> {
        let capacity = self.capacity();
        let mut order = self.order.lock();
        order.record(key);
        if order.len() > capacity {
            order.pop_lru()
        } else {
            None
        }
    }
}

fn check_capacity(capacity: usize) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::new("lru capacity must be greater than zero"));
    }
    Ok(())
}

impl<K, V, C> Cache<K, V> for LruCache<K, V, C>
where
    K: Eq + Hash + Clone + Send,
    C: Cache<K, V>,
{
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: K, value: V) -> CacheResult<()> {
        self.delegate.put(key.clone(), value)?;
        #[cfg(feature = "metrics")]
        self.metrics.record_put();

        if let Some(eldest) = self.cycle(key) {
            self.evict(eldest)?;
        }
        while let Some(eldest) = self.take_overdue() {
            self.evict(eldest)?;
        }
        Ok(())
    }

    fn get(&self, key: &K) -> CacheResult<Option<V>> {
        let _touched = self.order.lock().touch(key);
        #[cfg(feature = "metrics")]
        self.metrics.record_get(_touched);
        self.delegate.get(key)
    }

    fn remove(&self, key: &K) -> CacheResult<Option<V>> {
        let previous = self.delegate.remove(key)?;
        self.order.lock().remove(key);
        #[cfg(feature = "metrics")]
        self.metrics.record_remove();
        Ok(previous)
    }

    fn clear(&self) -> CacheResult<()> {
        self.delegate.clear()?;
        let mut order = self.order.lock();
        order.clear();
        self.overdue.store(0, Ordering::Release);
        drop(order);
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        self.delegate.len()
    }

    fn read_write_lock(&self) -> Option<&RwLock<()>> {
        self.delegate.read_write_lock()
    }
}

impl<K, V, C> fmt::Debug for LruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Cache<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("id", &self.delegate.id())
            .field("tracked", &self.tracked_len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "metrics")]
impl<K, V, C> MetricsSnapshotProvider<LruMetricsSnapshot> for LruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Cache<K, V>,
{
    fn snapshot(&self) -> LruMetricsSnapshot {
        LruMetricsSnapshot {
            get_calls: self.metrics.get_calls.get(),
            touch_found: self.metrics.touch_found.get(),
            put_calls: self.metrics.put_calls.get(),
            evictions: self.metrics.evictions.get(),
            remove_calls: self.metrics.remove_calls.get(),
            clear_calls: self.metrics.clear_calls.get(),
            tracked_keys: self.tracked_len(),
            capacity: self.capacity(),
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V, C> MetricsReset for LruCache<K, V, C> {
    fn reset_metrics(&self) {
        self.metrics.reset_metrics();
    }
}
