//! # Reclaimable References
//!
//! Explicit stand-in for a garbage collector's soft references: values a
//! memory manager may drop under pressure, plus a notification queue the
//! owning cache drains to learn which keys lost their values.
//!
//! ## Architecture
//!
//! ```text
//!   ReferenceQueue<K, V>
//!   ┌────────────────────────────────────────────────────────────────┐
//!   │ register(k, v) ──► SoftReference { key, referent, tx }         │
//!   │                       │                                        │
//!   │ registry: Mutex<VecDeque<Weak<..>>>  (oldest first)            │
//!   │                       ▲                                        │
//!   │ Reclaimer ────────────┘  reclaim(limit) / force_reclaim(k)     │
//!   │      │                                                         │
//!   │      └─► referent = None; tx.send(k) ──► rx ──► poll() -> k    │
//!   └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reachability
//!
//! A referent is *softly reachable* when its [`SoftReference`] holds the only
//! strong handle to it. [`Reclaimer::reclaim`] only clears softly reachable
//! referents, so a value pinned by a hard link or held by a caller survives
//! memory pressure. [`Reclaimer::force_reclaim`] ignores reachability and is
//! meant to simulate reclamation deterministically in tests.
//!
//! ## Registry Hygiene
//!
//! The registry holds weak handles. References dropped by their cache (overwrite,
//! eviction, removal) die on their own and are pruned during sweeps and,
//! amortized, during registration.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::trace;

/// Registry length below which registration never prunes.
const MIN_PRUNE_THRESHOLD: usize = 64;

struct SoftInner<K, V> {
    key: K,
    referent: RwLock<Option<Arc<V>>>,
    queue: Sender<K>,
}

impl<K, V> SoftInner<K, V> {
    fn is_live(&self) -> bool {
        self.referent.read().is_some()
    }
}

impl<K, V> SoftInner<K, V>
where
    K: Clone,
{
    /// Clears the referent and enqueues the key.
    ///
    /// Without `force`, only a softly reachable referent is cleared.
    fn clear_and_enqueue(&self, force: bool) -> bool {
        let mut referent = self.referent.write();
        let reclaimable = match referent.as_ref() {
            Some(value) => force || Arc::strong_count(value) == 1,
            None => false,
        };
        if !reclaimable {
            return false;
        }
        *referent = None;
        drop(referent);
        // a dropped receiver means the owning cache is gone; nothing to notify
        let _ = self.queue.send(self.key.clone());
        true
    }
}

/// Handle to a value the memory manager may reclaim.
///
/// Cloning shares the same referent.
pub struct SoftReference<K, V> {
    inner: Arc<SoftInner<K, V>>,
}

impl<K, V> SoftReference<K, V> {
    /// Resolves the referent, or `None` once it has been reclaimed.
    pub fn get(&self) -> Option<Arc<V>> {
        self.inner.referent.read().clone()
    }

    /// Returns the key this reference was registered under.
    pub fn key(&self) -> &K {
        &self.inner.key
    }

    /// Returns `true` once the referent has been reclaimed.
    pub fn is_reclaimed(&self) -> bool {
        !self.inner.is_live()
    }

    /// Returns `true` if both handles share one referent.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<K, V> Clone for SoftReference<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for SoftReference<K, V>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftReference")
            .field("key", &self.inner.key)
            .field("reclaimed", &self.is_reclaimed())
            .finish()
    }
}

struct Registry<K, V> {
    entries: VecDeque<Weak<SoftInner<K, V>>>,
    prune_threshold: usize,
}

impl<K, V> Registry<K, V> {
    fn prune(&mut self) {
        self.entries
            .retain(|weak| weak.upgrade().is_some_and(|inner| inner.is_live()));
        self.prune_threshold = (self.entries.len() * 2).max(MIN_PRUNE_THRESHOLD);
    }
}

/// Factory for [`SoftReference`]s plus the queue their reclamations land on.
pub struct ReferenceQueue<K, V> {
    sender: Sender<K>,
    receiver: Receiver<K>,
    registry: Arc<Mutex<Registry<K, V>>>,
}

impl<K, V> ReferenceQueue<K, V>
where
    K: Clone,
{
    /// Creates an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            sender,
            receiver,
            registry: Arc::new(Mutex::new(Registry {
                entries: VecDeque::new(),
                prune_threshold: MIN_PRUNE_THRESHOLD,
            })),
        }
    }

    /// Wraps `value` in a reference whose reclamation is reported on this
    /// queue under `key`.
    pub fn register(&self, key: K, value: Arc<V>) -> SoftReference<K, V> {
        let inner = Arc::new(SoftInner {
            key,
            referent: RwLock::new(Some(value)),
            queue: self.sender.clone(),
        });

        let mut registry = self.registry.lock();
        if registry.entries.len() >= registry.prune_threshold {
            registry.prune();
        }
        registry.entries.push_back(Arc::downgrade(&inner));
        SoftReference { inner }
    }

    /// Returns the next reclaimed key, if any, without blocking.
    pub fn poll(&self) -> Option<K> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of notifications waiting to be drained.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Returns a trigger that reclaims references created by this queue.
    pub fn reclaimer(&self) -> Reclaimer<K, V> {
        Reclaimer {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<K, V> Default for ReferenceQueue<K, V>
where
    K: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ReferenceQueue<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceQueue")
            .field("pending", &self.receiver.len())
            .field("registered", &self.registry.lock().entries.len())
            .finish()
    }
}

/// Memory-manager trigger for one [`ReferenceQueue`].
///
/// Hand it to whatever observes memory pressure; tests use it to make
/// reclamation deterministic.
pub struct Reclaimer<K, V> {
    registry: Arc<Mutex<Registry<K, V>>>,
}

impl<K, V> Reclaimer<K, V>
where
    K: Clone,
{
    /// Reclaims up to `limit` softly reachable referents, oldest first.
    ///
    /// Returns how many were reclaimed.
    pub fn reclaim(&self, limit: usize) -> usize {
        let mut registry = self.registry.lock();
        let mut reclaimed = 0;
        let mut kept = VecDeque::with_capacity(registry.entries.len());

        while let Some(weak) = registry.entries.pop_front() {
            let Some(inner) = weak.upgrade() else {
                continue;
            };
            if reclaimed < limit && inner.clear_and_enqueue(false) {
                reclaimed += 1;
                continue;
            }
            if inner.is_live() {
                kept.push_back(weak);
            }
        }

        registry.entries = kept;
        registry.prune_threshold = (registry.entries.len() * 2).max(MIN_PRUNE_THRESHOLD);
        trace!(reclaimed, remaining = registry.entries.len(), "reclaim sweep");
        reclaimed
    }

    /// Reclaims every softly reachable referent.
    pub fn reclaim_all(&self) -> usize {
        self.reclaim(usize::MAX)
    }

    /// Reclaims the live referent registered under `key`, reachable or not.
    ///
    /// Returns `false` if no live reference exists for `key`.
    pub fn force_reclaim(&self, key: &K) -> bool
    where
        K: PartialEq,
    {
        let registry = self.registry.lock();
        registry
            .entries
            .iter()
            .rev()
            .filter_map(Weak::upgrade)
            .find(|inner| inner.key == *key && inner.is_live())
            .is_some_and(|inner| inner.clear_and_enqueue(true))
    }

    /// Returns the number of live, unreclaimed references.
    pub fn registered(&self) -> usize {
        self.registry
            .lock()
            .entries
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|inner| inner.is_live())
            .count()
    }
}

impl<K, V> Clone for Reclaimer<K, V> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<K, V> fmt::Debug for Reclaimer<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reclaimer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_reference_resolves() {
        let queue = ReferenceQueue::new();
        let reference = queue.register("k", Arc::new(5));

        assert_eq!(reference.get().as_deref(), Some(&5));
        assert_eq!(*reference.key(), "k");
        assert!(!reference.is_reclaimed());
        assert_eq!(queue.poll(), None);
    }

    #[test]
    fn reclaim_clears_softly_reachable_and_notifies() {
        let queue = ReferenceQueue::new();
        let a = queue.register("a", Arc::new(1));
        let b = queue.register("b", Arc::new(2));
        let reclaimer = queue.reclaimer();

        assert_eq!(reclaimer.reclaim_all(), 2);
        assert!(a.is_reclaimed());
        assert!(b.get().is_none());
        assert_eq!(queue.pending(), 2);
        assert_eq!(queue.poll(), Some("a"));
        assert_eq!(queue.poll(), Some("b"));
        assert_eq!(queue.poll(), None);
    }

    #[test]
    fn strongly_held_referent_survives() {
        let queue = ReferenceQueue::new();
        let pinned = Arc::new(String::from("hot"));
        let reference = queue.register(1, Arc::clone(&pinned));
        let reclaimer = queue.reclaimer();

        assert_eq!(reclaimer.reclaim_all(), 0);
        assert_eq!(reference.get().as_deref().map(String::as_str), Some("hot"));

        drop(pinned);
        assert_eq!(reclaimer.reclaim_all(), 1);
        assert!(reference.is_reclaimed());
    }

    #[test]
    fn reclaim_respects_limit_and_age() {
        let queue = ReferenceQueue::new();
        let refs: Vec<_> = (0..5).map(|i| queue.register(i, Arc::new(i))).collect();
        let reclaimer = queue.reclaimer();

        assert_eq!(reclaimer.reclaim(2), 2);
        assert!(refs[0].is_reclaimed());
        assert!(refs[1].is_reclaimed());
        assert!(!refs[2].is_reclaimed());
        assert_eq!(reclaimer.registered(), 3);
    }

    #[test]
    fn force_reclaim_ignores_reachability() {
        let queue = ReferenceQueue::new();
        let value = Arc::new(9);
        let reference = queue.register("x", Arc::clone(&value));
        let reclaimer = queue.reclaimer();

        assert!(reclaimer.force_reclaim(&"x"));
        assert!(reference.is_reclaimed());
        assert_eq!(*value, 9);
        assert!(!reclaimer.force_reclaim(&"x"));
        assert!(!reclaimer.force_reclaim(&"missing"));
        assert_eq!(queue.poll(), Some("x"));
    }

    #[test]
    fn dropped_references_are_not_reclaimed() {
        let queue = ReferenceQueue::new();
        let reference = queue.register(1, Arc::new(1));
        drop(reference);

        assert_eq!(queue.reclaimer().reclaim_all(), 0);
        assert_eq!(queue.poll(), None);
    }

    #[test]
    fn registration_prunes_dead_entries() {
        let queue = ReferenceQueue::new();
        for i in 0..1000 {
            drop(queue.register(i, Arc::new(i)));
        }
        let live = queue.register(-1, Arc::new(-1));

        assert!(queue.registry.lock().entries.len() <= MIN_PRUNE_THRESHOLD);
        assert_eq!(queue.reclaimer().registered(), 1);
        drop(live);
    }

    #[test]
    fn clones_share_referent() {
        let queue = ReferenceQueue::new();
        let a = queue.register('k', Arc::new(1u8));
        let b = a.clone();
        assert!(a.ptr_eq(&b));

        queue.reclaimer().force_reclaim(&'k');
        assert!(b.is_reclaimed());
    }
}
