//! HashMap-backed store guarded by a read/write lock.
//!
//! ## Architecture
//! - Keys live in a `HashMap<K, Arc<V>>` for O(1) lookup.
//! - A single `parking_lot::RwLock` guards the map: `add` takes the write
//!   lock, `get` the shared read lock.
//! - No capacity, no eviction. Entries stay until the store is dropped.
//!
//! ## Performance Trade-offs
//! - Reads proceed in parallel; writers block everyone for the duration of
//!   one insert.
//! - Under heavy write contention prefer sharding your keys across caches, or
//!   use [`CopyOnWriteStore`](crate::store::cow::CopyOnWriteStore) when reads
//!   vastly outnumber writes.
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//!
//! use bustcache::store::hashmap::SyncMapStore;
//! use bustcache::store::traits::Store;
//!
//! let store: SyncMapStore<&str, String> = SyncMapStore::new();
//! store.add("k1", Arc::new("a".to_string()));
//! assert_eq!(store.get(&"k1").as_deref(), Some(&"a".to_string()));
//! ```
//!
//! ## Type Constraints
//! - `K: Eq + Hash` for key lookup.
//! - `S: BuildHasher` for custom hashers (defaults to `RandomState`).
use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::store::traits::{Store, StoreMetrics};

/// Store metrics counters shared by the concurrent stores.
#[derive(Debug, Default)]
pub(crate) struct StoreCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    evictions: AtomicU64,
}

impl StoreCounters {
    /// Snapshot current store metrics.
    pub(crate) fn snapshot(&self) -> StoreMetrics {
        StoreMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Count a lookup as a hit or a miss.
    pub(crate) fn record_lookup<T>(&self, found: &Option<T>) {
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a write as an insert or an update of an existing key.
    pub(crate) fn record_write(&self, replaced: bool) {
        if replaced {
            self.updates.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inserts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn inc_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }
}

/// Concurrent HashMap-backed store.
pub struct SyncMapStore<K, V, S = RandomState> {
    map: RwLock<HashMap<K, Arc<V>, S>>,
    metrics: StoreCounters,
}

impl<K, V> SyncMapStore<K, V, RandomState>
where
    K: Eq + Hash,
{
    /// Create an empty store with the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V, S> SyncMapStore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Create an empty store with a custom hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            map: RwLock::new(HashMap::with_hasher(hasher)),
            metrics: StoreCounters::default(),
        }
    }

    /// Check whether a key exists.
    pub fn contains(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }
}

impl<K, V> Default for SyncMapStore<K, V, RandomState>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for SyncMapStore<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncMapStore")
            .field("len", &self.map.read().len())
            .finish()
    }
}

impl<K, V, S> Store<K, V> for SyncMapStore<K, V, S>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
    S: BuildHasher + Send + Sync,
{
    fn add(&self, key: K, value: Arc<V>) {
        let previous = self.map.write().insert(key, value);
        self.metrics.record_write(previous.is_some());
    }

    fn get(&self, key: &K) -> Option<Arc<V>> {
        let found = self.map.read().get(key).cloned();
        self.metrics.record_lookup(&found);
        found
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics.snapshot()
    }
}
