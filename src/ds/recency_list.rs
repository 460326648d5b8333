//! Recency list of keys with O(1) touch and LRU pop.
//!
//! Two decoupled parts: a hash index from key to slot, and a doubly linked
//! list whose nodes live in a slot arena and link to each other by index.
//! Freed slots are recycled through a free list, so steady-state churn does
//! not allocate.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, usize>        slots: Vec<Option<Node<K>>>
//!   ┌─────────┬──────┐                ┌─────┬──────────────────────────────┐
//!   │  key A  │  0   │                │  0  │ { key: A, prev: -, next: 2 } │
//!   │  key C  │  2   │                │  1  │ (free)                       │
//!   │  key D  │  3   │                │  2  │ { key: C, prev: 0, next: 3 } │
//!   └─────────┴──────┘                │  3  │ { key: D, prev: 2, next: - } │
//!                                     └─────┴──────────────────────────────┘
//!   head ─► [A] ◄──► [C] ◄──► [D] ◄── tail
//!           MRU               LRU
//! ```
//!
//! ## Behavior
//! - `record(k)`: moves `k` to MRU, inserting it if untracked
//! - `touch(k)`: moves `k` to MRU only if already tracked
//! - `pop_lru()`: unlinks and returns the tail key
//! - `restore_lru(k)`: puts an untracked `k` back at the tail
//! - `remove(k)` / `clear()`: drop one or all keys
//!
//! The list has no capacity of its own; callers decide when to pop.
//!
//! `debug_validate_invariants()` is available in debug/test builds.

use std::hash::Hash;

use rustc_hash::FxHashMap;

#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Keys ordered from most to least recently used.
#[derive(Debug)]
pub struct RecencyList<K> {
    index: FxHashMap<K, usize>,
    slots: Vec<Option<Node<K>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K> RecencyList<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Marks `key` most recently used, tracking it if needed.
    ///
    /// Returns `true` when `key` was not tracked before.
    pub fn record(&mut self, key: K) -> bool {
        if let Some(&slot) = self.index.get(&key) {
            self.move_to_front(slot);
            return false;
        }
        let slot = self.alloc(Node {
            key: key.clone(),
            prev: None,
            next: None,
        });
        self.attach_front(slot);
        self.index.insert(key, slot);
        true
    }

    /// Marks `key` most recently used if it is tracked.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&slot) => {
                self.move_to_front(slot);
                true
            },
            None => false,
        }
    }

    /// Tracks `key` as least recently used, if it is not tracked already.
    ///
    /// Returns `true` when `key` was inserted at the tail.
    pub fn restore_lru(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let slot = self.alloc(Node {
            key: key.clone(),
            prev: None,
            next: None,
        });
        self.attach_back(slot);
        self.index.insert(key, slot);
        true
    }

    /// Removes and returns the least recently used key.
    pub fn pop_lru(&mut self) -> Option<K> {
        let slot = self.tail?;
        let key = self.release(slot)?;
        self.index.remove(&key);
        Some(key)
    }

    /// Stops tracking `key`; returns `true` if it was tracked.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(slot) => {
                self.release(slot);
                true
            },
            None => false,
        }
    }

    /// Drops every tracked key.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates keys from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            list: self,
            current: self.head,
        }
    }

    fn node(&self, slot: usize) -> Option<&Node<K>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<K>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node<K>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            },
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            },
        }
    }

    fn release(&mut self, slot: usize) -> Option<K> {
        self.detach(slot);
        let node = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        Some(node.key)
    }

    fn move_to_front(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.detach(slot);
        self.attach_front(slot);
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = match self.node(slot) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next = next;
                }
            },
            None => self.head = next,
        }

        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev = prev;
                }
            },
            None => self.tail = prev,
        }

        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(old) => {
                if let Some(node) = self.node_mut(old) {
                    node.prev = Some(slot);
                }
            },
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn attach_back(&mut self, slot: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(slot) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(old) => {
                if let Some(node) = self.node_mut(old) {
                    node.next = Some(slot);
                }
            },
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            assert!(self.index.is_empty());
            return;
        }

        let mut count = 0usize;
        let mut prev = None;
        let mut current = self.head;
        while let Some(slot) = current {
            let node = self.node(slot).expect("linked slot is free");
            assert_eq!(node.prev, prev);
            assert_eq!(self.index.get(&node.key), Some(&slot));
            prev = Some(slot);
            current = node.next;
            count += 1;
            assert!(count <= self.index.len());
        }

        assert_eq!(self.tail, prev);
        assert_eq!(count, self.index.len());
        assert_eq!(self.slots.len() - self.free.len(), count);
    }
}

impl<K> Default for RecencyList<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over keys from most to least recently used.
pub struct Iter<'a, K> {
    list: &'a RecencyList<K>,
    current: Option<usize>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.current?;
        let node = self.list.slots.get(slot)?.as_ref()?;
        self.current = node.next;
        Some(&node.key)
    }
}
