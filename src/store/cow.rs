//! Copy-on-write store with lock-free reads.
//!
//! ## Architecture
//!
//! ```text
//!   reader ──load()──► ArcSwap ──► Arc<HashMap<K, Arc<V>>>   (snapshot N)
//!
//!   writer ──lock()──► clone snapshot N ──insert──► store() snapshot N+1
//! ```
//!
//! - Readers never block: they load the currently published snapshot and
//!   look the key up in it.
//! - Writers serialize on a `parking_lot::Mutex`, clone the whole map, apply
//!   the insert, then publish the new map atomically.
//! - Old snapshots are freed once the last reader drops its guard.
//!
//! ## Performance Trade-offs
//! - `get` is O(1) and lock-free.
//! - `add` is O(n) in the number of entries because of the full clone.
//!
//! ## When to Use
//! - Memoization workloads: many hits, few first-time computations.
//! - Small to medium key spaces that are written once and read often.
use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::store::hashmap::StoreCounters;
use crate::store::traits::{Store, StoreMetrics};

/// Copy-on-write HashMap store published through an atomic pointer swap.
pub struct CopyOnWriteStore<K, V, S = RandomState> {
    snapshot: ArcSwap<HashMap<K, Arc<V>, S>>,
    writer: Mutex<()>,
    metrics: StoreCounters,
}

impl<K, V> CopyOnWriteStore<K, V, RandomState>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty store with the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V, S> CopyOnWriteStore<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher + Clone,
{
    /// Create an empty store with a custom hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::with_hasher(hasher)),
            writer: Mutex::new(()),
            metrics: StoreCounters::default(),
        }
    }

    /// Return the currently published snapshot.
    ///
    /// The snapshot is immutable; later writes publish a new map and leave
    /// this one untouched.
    pub fn snapshot(&self) -> Arc<HashMap<K, Arc<V>, S>> {
        self.snapshot.load_full()
    }
}

impl<K, V> Default for CopyOnWriteStore<K, V, RandomState>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for CopyOnWriteStore<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOnWriteStore")
            .field("len", &self.snapshot.load().len())
            .finish()
    }
}

impl<K, V, S> Store<K, V> for CopyOnWriteStore<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
    S: BuildHasher + Clone + Send + Sync,
{
    fn add(&self, key: K, value: Arc<V>) {
        let _writer = self.writer.lock();
        let mut next = HashMap::clone(&self.snapshot.load());
        let replaced = next.insert(key, value).is_some();
        self.snapshot.store(Arc::new(next));
        self.metrics.record_write(replaced);
    }

    fn get(&self, key: &K) -> Option<Arc<V>> {
        let found = self.snapshot.load().get(key).cloned();
        self.metrics.record_lookup(&found);
        found
    }

    fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics.snapshot()
    }
}
