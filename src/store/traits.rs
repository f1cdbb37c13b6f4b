//! Storage backends for memoized values.
//!
//! A store only owns key/value associations. It never decides when a value is
//! stale; that is the cache's job (see [`Cache::bust`](crate::cache::Cache::bust)).
//! Whether and when a store forgets a key (capacity, eviction) is entirely up
//! to the store.
//!
//! ## Contract
//!
//! - [`Store::add`] unconditionally associates `key` with `value`, replacing
//!   any previous association. There is no error channel: a store that can
//!   fail must behave as if the value was never added.
//! - [`Store::get`] returns the current association, if any.
//! - Everything else (`len`, `metrics`) has a default and is optional.
//! - Per key, `add`/`get` are linearizable. Nothing is promised across keys.

use std::sync::Arc;

/// Snapshot of store-level metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub updates: u64,
    pub evictions: u64,
}

/// Key/value backing for a [`Cache`](crate::cache::Cache).
///
/// Implementations must be safe to share between threads; the cache calls
/// `add`/`get` through `&self` from any thread.
pub trait Store<K, V>: Send + Sync {
    /// Associate `key` with `value`, overwriting any previous value.
    fn add(&self, key: K, value: Arc<V>);

    /// Fetch the value currently associated with `key`.
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Current number of entries.
    ///
    /// Diagnostics only; the cache never calls it. Stores that do not track
    /// their size keep the default of 0.
    fn len(&self) -> usize {
        0
    }

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the store's current metrics.
    fn metrics(&self) -> StoreMetrics {
        StoreMetrics::default()
    }
}

impl<K, V, S> Store<K, V> for Arc<S>
where
    S: Store<K, V> + ?Sized,
{
    #[inline]
    fn add(&self, key: K, value: Arc<V>) {
        (**self).add(key, value)
    }

    #[inline]
    fn get(&self, key: &K) -> Option<Arc<V>> {
        (**self).get(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn metrics(&self) -> StoreMetrics {
        (**self).metrics()
    }
}

impl<K, V, S> Store<K, V> for Box<S>
where
    S: Store<K, V> + ?Sized,
{
    #[inline]
    fn add(&self, key: K, value: Arc<V>) {
        (**self).add(key, value)
    }

    #[inline]
    fn get(&self, key: &K) -> Option<Arc<V>> {
        (**self).get(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn metrics(&self) -> StoreMetrics {
        (**self).metrics()
    }
}
