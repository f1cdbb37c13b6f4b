//! Bounded store with least-recently-used eviction.
//!
//! The cache itself never evicts; a store that wants bounded growth does it
//! on its own. `LruStore` is such a store: once `capacity` entries are held,
//! adding a new key forgets the least recently used one.
//!
//! ## Architecture
//!
//! ```text
//!   FxHashMap<K, usize> ──► nodes: Vec<Option<Node>>  (slot arena + free list)
//!
//!   head (MRU) ◄──► node ◄──► node ◄──► tail (LRU)
//! ```
//!
//! Nodes are linked by slot index rather than pointer, so the whole structure
//! is safe code. `get` moves the entry to the MRU position, so both `get` and
//! `add` take the same `parking_lot::Mutex`.
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::store::hashmap::StoreCounters;
use crate::store::traits::{Store, StoreMetrics};

struct Node<K, V> {
    prev: Option<usize>,
    next: Option<usize>,
    key: K,
    value: Arc<V>,
}

struct LruCore<K, V> {
    map: FxHashMap<K, usize>,
    nodes: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    fn node(&self, idx: usize) -> &Node<K, V> {
        self.nodes[idx].as_ref().expect("linked slot is occupied")
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        self.nodes[idx].as_mut().expect("linked slot is occupied")
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_mut(idx);
        node.prev = None;
        node.next = None;
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn get(&mut self, key: &K) -> Option<Arc<V>> {
        let idx = *self.map.get(key)?;
        if self.head != Some(idx) {
            self.detach(idx);
            self.attach_front(idx);
        }
        Some(self.node(idx).value.clone())
    }

    /// Returns `(replaced, evicted)`.
    fn insert(&mut self, key: K, value: Arc<V>) -> (bool, bool) {
        if self.capacity == 0 {
            return (false, false);
        }

        if let Some(&idx) = self.map.get(&key) {
            self.node_mut(idx).value = value;
            if self.head != Some(idx) {
                self.detach(idx);
                self.attach_front(idx);
            }
            return (true, false);
        }

        let evicted = self.map.len() >= self.capacity && self.evict_lru();

        let node = Node {
            prev: None,
            next: None,
            key: key.clone(),
            value,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            },
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            },
        };
        self.map.insert(key, idx);
        self.attach_front(idx);
        (false, evicted)
    }

    fn evict_lru(&mut self) -> bool {
        let Some(idx) = self.tail else {
            return false;
        };
        self.detach(idx);
        if let Some(node) = self.nodes[idx].take() {
            self.map.remove(&node.key);
        }
        self.free.push(idx);
        true
    }
}

/// Thread-safe LRU store with a fixed entry capacity.
///
/// A capacity of 0 creates a store that accepts nothing, equivalent to
/// [`NullStore`](crate::store::null::NullStore).
pub struct LruStore<K, V> {
    inner: Mutex<LruCore<K, V>>,
    metrics: StoreCounters,
}

impl<K, V> LruStore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an LRU store holding at most `capacity` entries.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use bustcache::store::lru::LruStore;
    /// use bustcache::store::traits::Store;
    ///
    /// let store: LruStore<u32, &str> = LruStore::new(1);
    /// store.add(1, Arc::new("one"));
    /// store.add(2, Arc::new("two"));
    /// assert!(store.get(&1).is_none());
    /// assert_eq!(store.get(&2).as_deref(), Some(&"two"));
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCore::new(capacity)),
            metrics: StoreCounters::default(),
        }
    }

    /// Maximum number of entries held.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }
}

impl<K, V> fmt::Debug for LruStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LruStore")
            .field("len", &inner.map.len())
            .field("capacity", &inner.capacity)
            .finish()
    }
}

impl<K, V> Store<K, V> for LruStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    fn add(&self, key: K, value: Arc<V>) {
        let (replaced, evicted) = self.inner.lock().insert(key, value);
        self.metrics.record_write(replaced);
        if evicted {
            self.metrics.inc_eviction();
        }
    }

    fn get(&self, key: &K) -> Option<Arc<V>> {
        let found = self.inner.lock().get(key);
        self.metrics.record_lookup(&found);
        found
    }

    fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics.snapshot()
    }
}
