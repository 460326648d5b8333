//! # Soft-Reference Decorator
//!
//! Stores every value behind a [`SoftReference`] so a memory manager can
//! reclaim cold entries, and pins the most recently read values with hard
//! links so a working set survives memory pressure.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────┐
//!   │ SoftCache<K, V, C>                        implements Cache<K, Arc<V>>
//!   │                                                                   │
//!   │   hard_links: Mutex<VecDeque<Arc<V>>>     front = most recent read│
//!   │   ┌──────┬──────┬──────┬─────┬──────┐                             │
//!   │   │ v9   │ v3   │ v9   │ ... │ v1   │ ──► popped from the back    │
//!   │   └──────┴──────┴──────┴─────┴──────┘     when over the limit     │
//!   │                                                                   │
//!   │   queue: ReferenceQueue<K, V>   ◄── Reclaimer (memory manager)    │
//!   │                                                                   │
//!   │   delegate: C  (Cache<K, SoftReference<K, V>>)                    │
//!   └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation | Behavior                                                    |
//! |-----------|-------------------------------------------------------------|
//! | `put`     | drain queue; delegate `put(k, register(k, v))`              |
//! | `get`     | resolve; reclaimed → remove + miss; live → pin + return     |
//! | `remove`  | drain queue; delegate `remove(k)`                           |
//! | `clear`   | drop hard links; drain queue; delegate `clear()`            |
//! | `len`     | drain queue; delegate `len()`                               |
//!
//! ## Hard Links
//!
//! The ring holds values, not keys, in read order; duplicates are allowed.
//! A value present in the ring is strongly reachable and therefore never
//! reclaimed. [`SoftCache::set_hard_links`] takes effect on the next pin,
//! which trims the ring from the back down to the new limit.
//!
//! ## Size
//!
//! `len` drains notifications already delivered before asking the delegate,
//! so it excludes entries known to be reclaimed. A referent reclaimed without
//! a delivered notification still counts: treat `len` as an upper bound on
//! live entries.
//!
//! ## Thread Safety
//!
//! The hard-link ring is the only structure this layer mutates; it is
//! guarded by a `parking_lot::Mutex`. Queue draining only touches the
//! delegate and runs without that lock.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::error::{CacheResult, ConfigError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::SoftMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::SoftMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{MetricsReset, MetricsSnapshotProvider, SoftMetricsRecorder};
use crate::reclaim::{Reclaimer, ReferenceQueue, SoftReference};
use crate::traits::Cache;

/// Hard-link window used by [`SoftCache::new`].
pub const DEFAULT_HARD_LINKS: usize = 256;

/// Decorator that lets a memory manager reclaim values while pinning the
/// most recently read ones.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use cachestack::policy::soft::SoftCache;
/// use cachestack::store::PerpetualCache;
/// use cachestack::traits::Cache;
///
/// let cache = SoftCache::new(PerpetualCache::new("reports").unwrap());
/// cache.put(1, Arc::new("q1")).unwrap();
///
/// // simulate the memory manager reclaiming the value
/// assert!(cache.reclaimer().force_reclaim(&1));
/// assert_eq!(cache.get(&1).unwrap(), None);
/// assert_eq!(cache.len().unwrap(), 0);
/// ```
pub struct SoftCache<K, V, C> {
    delegate: C,
    hard_links: Mutex<VecDeque<Arc<V>>>,
    hard_link_limit: AtomicUsize,
    queue: ReferenceQueue<K, V>,
    #[cfg(feature = "metrics")]
    metrics: SoftMetrics,
}

impl<K, V, C> SoftCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Cache<K, SoftReference<K, V>>,
{
    /// Wraps `delegate` with the default window of 256 hard links.
    pub fn new(delegate: C) -> Self {
        Self::build(delegate, DEFAULT_HARD_LINKS)
    }

    /// Wraps `delegate` with a custom hard-link window.
    ///
    /// Fails with [`ConfigError`] when `hard_links` is zero.
    pub fn with_hard_links(delegate: C, hard_links: usize) -> Result<Self, ConfigError> {
        check_hard_links(hard_links)?;
        Ok(Self::build(delegate, hard_links))
    }

    fn build(delegate: C, hard_links: usize) -> Self {
        Self {
            delegate,
            hard_links: Mutex::new(VecDeque::new()),
            hard_link_limit: AtomicUsize::new(hard_links),
            queue: ReferenceQueue::new(),
            #[cfg(feature = "metrics")]
            metrics: SoftMetrics::default(),
        }
    }

    /// Returns the hard-link window size.
    pub fn hard_link_limit(&self) -> usize {
        self.hard_link_limit.load(Ordering::Acquire)
    }

    /// Changes the hard-link window used by subsequent pins.
    ///
    /// Fails with [`ConfigError`] when `hard_links` is zero; the previous
    /// window stays in effect.
    pub fn set_hard_links(&self, hard_links: usize) -> Result<(), ConfigError> {
        check_hard_links(hard_links)?;
        let previous = self.hard_link_limit.swap(hard_links, Ordering::AcqRel);
        debug!(cache = self.delegate.id(), previous, hard_links, "hard link window changed");
        Ok(())
    }

    /// Returns the number of values currently pinned.
    pub fn hard_link_count(&self) -> usize {
        self.hard_links.lock().len()
    }

    /// Returns the pinned values, most recently read first.
    pub fn pinned(&self) -> Vec<Arc<V>> {
        self.hard_links.lock().iter().cloned().collect()
    }

    /// Returns the memory-manager trigger for this cache's references.
    pub fn reclaimer(&self) -> Reclaimer<K, V> {
        self.queue.reclaimer()
    }

    /// Removes delegate entries whose referents were reported reclaimed.
    ///
    /// A notification only removes the entry if the delegate still maps the
    /// key to a reclaimed reference, so a value re-inserted after the
    /// reclamation is left alone.
    fn remove_garbage_collected(&self) -> CacheResult<()> {
        let mut purged = 0u64;
        while let Some(key) = self.queue.poll() {
            let stale = match self.delegate.get(&key)? {
                Some(reference) => reference.is_reclaimed(),
                None => false,
            };
            if stale {
                self.delegate.remove(&key)?;
                purged += 1;
            }
        }
        if purged > 0 {
            trace!(cache = self.delegate.id(), purged, "purged reclaimed entries");
            #[cfg(feature = "metrics")]
            self.metrics.record_purged(purged);
        }
        Ok(())
    }

    fn pin(&self, value: Arc<V>) {
        let limit = self.hard_link_limit();
        let mut hard_links = self.hard_links.lock();
        hard_links.push_front(value);
        let mut trimmed = 0usize;
        while hard_links.len() > limit {
            hard_links.pop_back();
            trimmed += 1;
        }
        if trimmed > 1 {
            trace!(cache = self.delegate.id(), trimmed, limit, "hard link window shrank");
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_pin();
    }
}

fn check_hard_links(hard_links: usize) -> Result<(), ConfigError> {
    if hard_links == 0 {
        return Err(ConfigError::new("hard link window must be greater than zero"));
    }
    Ok(())
}

impl<K, V, C> Cache<K, Arc<V>> for SoftCache<K, V, C>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
    C: Cache<K, SoftReference<K, V>>,
{
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: K, value: Arc<V>) -> CacheResult<()> {
        self.remove_garbage_collected()?;
        let reference = self.queue.register(key.clone(), value);
        self.delegate.put(key, reference)
    }

    fn get(&self, key: &K) -> CacheResult<Option<Arc<V>>> {
        let Some(reference) = self.delegate.get(key)? else {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_miss();
            return Ok(None);
        };

        match reference.get() {
            Some(value) => {
                self.pin(Arc::clone(&value));
                #[cfg(feature = "metrics")]
                self.metrics.record_get_hit();
                Ok(Some(value))
            },
            None => {
                debug!(cache = self.delegate.id(), "cached value was reclaimed");
                self.delegate.remove(key)?;
                #[cfg(feature = "metrics")]
                {
                    self.metrics.record_get_miss();
                    self.metrics.record_reclaimed_miss();
                }
                Ok(None)
            },
        }
    }

    fn remove(&self, key: &K) -> CacheResult<Option<Arc<V>>> {
        self.remove_garbage_collected()?;
        Ok(self
            .delegate
            .remove(key)?
            .and_then(|reference| reference.get()))
    }

    fn clear(&self) -> CacheResult<()> {
        self.hard_links.lock().clear();
        self.remove_garbage_collected()?;
        self.delegate.clear()
    }

    fn len(&self) -> CacheResult<usize> {
        self.remove_garbage_collected()?;
        self.delegate.len()
    }

    fn read_write_lock(&self) -> Option<&RwLock<()>> {
        self.delegate.read_write_lock()
    }
}

impl<K, V, C> fmt::Debug for SoftCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Cache<K, SoftReference<K, V>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftCache")
            .field("id", &self.delegate.id())
            .field("hard_links", &self.hard_link_count())
            .field("hard_link_limit", &self.hard_link_limit())
            .field("pending_reclaims", &self.queue.pending())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "metrics")]
impl<K, V, C> MetricsSnapshotProvider<SoftMetricsSnapshot> for SoftCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Cache<K, SoftReference<K, V>>,
{
    fn snapshot(&self) -> SoftMetricsSnapshot {
        SoftMetricsSnapshot {
            get_calls: self.metrics.get_calls.get(),
            get_hits: self.metrics.get_hits.get(),
            get_misses: self.metrics.get_misses.get(),
            reclaimed_misses: self.metrics.reclaimed_misses.get(),
            purged_entries: self.metrics.purged_entries.get(),
            pins: self.metrics.pins.get(),
            hard_links: self.hard_link_count(),
            hard_link_limit: self.hard_link_limit(),
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V, C> MetricsReset for SoftCache<K, V, C> {
    fn reset_metrics(&self) {
        self.metrics.reset_metrics();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::store::PerpetualCache;

    type Soft = SoftCache<u32, String, PerpetualCache<u32, SoftReference<u32, String>>>;

    fn soft(hard_links: usize) -> Soft {
        SoftCache::with_hard_links(PerpetualCache::new("soft-test").unwrap(), hard_links).unwrap()
    }

    fn value(s: &str) -> Arc<String> {
        Arc::new(s.to_string())
    }

    fn pinned(cache: &Soft) -> Vec<String> {
        cache.pinned().iter().map(|v| v.as_str().to_string()).collect()
    }

    // ==============================================
    // CORRECTNESS TESTS MODULE
    // ==============================================
    mod correctness {
        use super::*;

        mod basic_behavior {
            use super::*;

            #[test]
            fn test_defaults() {
                let cache: Soft = SoftCache::new(PerpetualCache::new("defaults").unwrap());
                assert_eq!(cache.hard_link_limit(), DEFAULT_HARD_LINKS);
                assert_eq!(cache.hard_link_count(), 0);
                assert_eq!(cache.id(), "defaults");
            }

            #[test]
            fn test_put_get_roundtrip_shares_arc() {
                let cache = soft(4);
                let v = value("row");
                cache.put(1, Arc::clone(&v)).unwrap();

                let got = cache.get(&1).unwrap().unwrap();
                assert!(Arc::ptr_eq(&v, &got));
                assert_eq!(cache.len().unwrap(), 1);
            }

            #[test]
            fn test_miss_does_not_pin() {
                let cache = soft(4);
                assert_eq!(cache.get(&9).unwrap(), None);
                assert_eq!(cache.hard_link_count(), 0);
            }

            #[test]
            fn test_remove_returns_live_value() {
                let cache = soft(4);
                cache.put(1, value("a")).unwrap();

                assert_eq!(cache.remove(&1).unwrap().as_deref(), Some(&"a".to_string()));
                assert_eq!(cache.remove(&1).unwrap(), None);
                assert_eq!(cache.len().unwrap(), 0);
            }

            #[test]
            fn test_zero_hard_links_rejected() {
                assert!(
                    SoftCache::<u32, String, _>::with_hard_links(
                        PerpetualCache::<u32, SoftReference<u32, String>>::new("zero").unwrap(),
                        0
                    )
                    .is_err()
                );
                let cache = soft(3);
                assert!(cache.set_hard_links(0).is_err());
                assert_eq!(cache.hard_link_limit(), 3);
            }
        }

        mod hard_links {
            use super::*;

            #[test]
            fn test_ring_is_bounded_and_most_recent_first() {
                let cache = soft(2);
                for (k, v) in [(1, "a"), (2, "b"), (3, "c")] {
                    cache.put(k, value(v)).unwrap();
                }
                for k in [1, 2, 3] {
                    cache.get(&k).unwrap();
                }

                assert_eq!(cache.hard_link_count(), 2);
                assert_eq!(pinned(&cache), vec!["c", "b"]);
            }

            #[test]
            fn test_repeated_reads_are_duplicated() {
                let cache = soft(3);
                cache.put(1, value("a")).unwrap();
                cache.put(2, value("b")).unwrap();
                cache.get(&1).unwrap();
                cache.get(&1).unwrap();
                cache.get(&2).unwrap();

                assert_eq!(pinned(&cache), vec!["b", "a", "a"]);
            }

            #[test]
            fn test_shrinking_window_applies_on_next_pin() {
                let cache = soft(4);
                for k in 0..4 {
                    cache.put(k, value(&k.to_string())).unwrap();
                    cache.get(&k).unwrap();
                }
                cache.set_hard_links(2).unwrap();
                assert_eq!(cache.hard_link_count(), 4);

                cache.get(&0).unwrap();
                assert_eq!(pinned(&cache), vec!["0", "3"]);
            }

            #[test]
            fn test_pinned_values_survive_reclaim() {
                let cache = soft(1);
                cache.put(1, value("hot")).unwrap();
                cache.put(2, value("cold")).unwrap();
                cache.get(&1).unwrap();

                assert_eq!(cache.reclaimer().reclaim_all(), 1);
                assert_eq!(cache.len().unwrap(), 1);
                assert_eq!(cache.get(&1).unwrap().as_deref(), Some(&"hot".to_string()));
                assert_eq!(cache.get(&2).unwrap(), None);
            }
        }

        mod reclamation {
            use super::*;

            #[test]
            fn test_reclaimed_get_is_miss_and_cleans_up() {
                let cache = soft(4);
                cache.put(1, value("a")).unwrap();
                cache.put(2, value("b")).unwrap();

                assert!(cache.reclaimer().force_reclaim(&1));
                assert_eq!(cache.get(&1).unwrap(), None);
                assert_eq!(cache.len().unwrap(), 1);
                assert_eq!(cache.get(&2).unwrap().as_deref(), Some(&"b".to_string()));
            }

            #[test]
            fn test_len_drains_notifications() {
                let cache = soft(4);
                for k in 0..5 {
                    cache.put(k, value("v")).unwrap();
                }
                assert_eq!(cache.reclaimer().reclaim(3), 3);
                assert_eq!(cache.len().unwrap(), 2);
            }

            #[test]
            fn test_put_drains_before_insert() {
                let cache = soft(4);
                cache.put(1, value("a")).unwrap();
                cache.reclaimer().force_reclaim(&1);

                cache.put(2, value("b")).unwrap();
                assert_eq!(cache.len().unwrap(), 1);
            }

            #[test]
            fn test_stale_notification_keeps_fresh_value() {
                let cache = soft(4);
                cache.put(1, value("old")).unwrap();
                cache.reclaimer().force_reclaim(&1);

                // replace the entry behind the queue's back so the
                // notification is still pending when the fresh value lands
                let fresh = cache.queue.register(1, value("new"));
                cache.delegate.put(1, fresh).unwrap();

                assert_eq!(cache.len().unwrap(), 1);
                assert_eq!(cache.get(&1).unwrap().as_deref(), Some(&"new".to_string()));
            }

            #[test]
            fn test_notification_for_removed_key_is_ignored() {
                let cache = soft(4);
                cache.put(1, value("a")).unwrap();
                cache.reclaimer().force_reclaim(&1);
                assert_eq!(cache.get(&1).unwrap(), None);

                cache.put(1, value("b")).unwrap();
                assert_eq!(cache.len().unwrap(), 1);
                assert_eq!(cache.get(&1).unwrap().as_deref(), Some(&"b".to_string()));
            }

            #[test]
            fn test_remove_of_reclaimed_entry_returns_none() {
                let cache = soft(4);
                cache.put(1, value("a")).unwrap();
                cache.put(2, value("b")).unwrap();
                cache.reclaimer().force_reclaim(&2);

                assert_eq!(cache.remove(&2).unwrap(), None);
                assert_eq!(cache.remove(&1).unwrap().as_deref(), Some(&"a".to_string()));
            }
        }

        mod clear {
            use super::*;

            #[test]
            fn test_clear_resets_everything() {
                let cache = soft(2);
                cache.put(1, value("a")).unwrap();
                cache.get(&1).unwrap();
                cache.put(2, value("b")).unwrap();
                cache.reclaimer().force_reclaim(&2);

                cache.clear().unwrap();
                assert_eq!(cache.len().unwrap(), 0);
                assert_eq!(cache.hard_link_count(), 0);
                assert_eq!(cache.get(&1).unwrap(), None);
                assert_eq!(cache.reclaimer().registered(), 0);
            }

            #[test]
            fn test_clear_twice() {
                let cache = soft(2);
                cache.put(1, value("a")).unwrap();
                cache.clear().unwrap();
                cache.clear().unwrap();
                assert!(cache.is_empty().unwrap());
            }
        }
    }

    // ==============================================
    // DELEGATION TESTS MODULE
    // ==============================================
    mod delegation {
        use super::*;

        struct BrokenCache;

        impl Cache<u32, SoftReference<u32, String>> for BrokenCache {
            fn id(&self) -> &str {
                "broken"
            }
            fn put(&self, _key: u32, _value: SoftReference<u32, String>) -> CacheResult<()> {
                Err(CacheError::backend("broken", "disk full"))
            }
            fn get(&self, _key: &u32) -> CacheResult<Option<SoftReference<u32, String>>> {
                Err(CacheError::backend("broken", "disk full"))
            }
            fn remove(&self, _key: &u32) -> CacheResult<Option<SoftReference<u32, String>>> {
                Ok(None)
            }
            fn clear(&self) -> CacheResult<()> {
                Ok(())
            }
            fn len(&self) -> CacheResult<usize> {
                Ok(0)
            }
        }

        #[test]
        fn test_delegate_errors_propagate() {
            let cache = SoftCache::new(BrokenCache);
            let expected = CacheError::backend("broken", "disk full");
            assert_eq!(cache.put(1, value("a")).unwrap_err(), expected);
            assert_eq!(cache.get(&1).unwrap_err(), expected);
            assert_eq!(cache.hard_link_count(), 0);
        }

        #[test]
        fn test_read_write_lock_passes_through() {
            let cache: Soft = SoftCache::new(PerpetualCache::with_read_write_lock("locked").unwrap());
            assert!(cache.read_write_lock().is_some());
        }

        #[test]
        fn test_debug_output() {
            let cache = soft(8);
            let dbg = format!("{:?}", cache);
            assert!(dbg.contains("SoftCache"));
            assert!(dbg.contains("hard_link_limit: 8"));
        }
    }

    #[cfg(feature = "metrics")]
    mod metrics {
        use super::*;

        #[test]
        fn test_snapshot_tracks_hits_misses_and_purges() {
            let cache = soft(2);
            cache.put(1, value("a")).unwrap();
            cache.put(2, value("b")).unwrap();
            cache.get(&1).unwrap();
            cache.get(&3).unwrap();
            cache.reclaimer().force_reclaim(&2);
            cache.get(&2).unwrap();
            cache.put(3, value("c")).unwrap();

            let snapshot = cache.snapshot();
            assert_eq!(snapshot.get_calls, 3);
            assert_eq!(snapshot.get_hits, 1);
            assert_eq!(snapshot.get_misses, 2);
            assert_eq!(snapshot.reclaimed_misses, 1);
            assert_eq!(snapshot.pins, 1);
            assert_eq!(snapshot.hard_links, 1);
            assert_eq!(snapshot.hard_link_limit, 2);
        }
    }
}
