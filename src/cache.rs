//! # Memoizing Cache with Dynamic-Scope Busting
//!
//! [`Cache`] memoizes the results of closures in a pluggable [`Store`] and
//! lets callers force recomputation for everything that runs inside a
//! [`bust`](Cache::bust) call, however deeply nested.
//!
//! ## Operations
//!
//! | Method        | Key                     | Behavior                                   |
//! |---------------|-------------------------|--------------------------------------------|
//! | `cache`       | caller supplied         | hit: return stored value; miss: compute    |
//! | `wrap`        | identity of the closure | same as `cache`                            |
//! | `try_cache`   | caller supplied         | `Err` is returned and nothing is stored    |
//! | `try_wrap`    | identity of the closure | same as `try_cache`                        |
//! | `bust`        | -                       | every call inside `body` recomputes, on    |
//! |               |                         | any cache                                  |
//!
//! ## Store Traffic
//!
//! - hit: one `get`, zero `add`
//! - miss: one `get`, one `add`
//! - inside `bust`: zero `get`, one `add`
//!
//! The store is never locked across the computation, so a computation may
//! re-enter the same cache (recursive memoization) on the same thread.
//!
//! ## Example
//!
//! ```
//! use std::cell::Cell;
//!
//! use bustcache::Cache;
//!
//! let cache: Cache<&str, String> = Cache::in_memory();
//! let calls = Cell::new(0);
//! let foo = || {
//!     cache.cache("foo", || {
//!         calls.set(calls.get() + 1);
//!         "Foo!".to_string()
//!     })
//! };
//!
//! assert_eq!(*foo(), "Foo!");
//! assert_eq!(*foo(), "Foo!");
//! assert_eq!(calls.get(), 1);
//!
//! cache.bust(|| assert_eq!(*foo(), "Foo!"));
//! assert_eq!(calls.get(), 2);
//! ```

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::scope::{self, BustGuard, FnId};
use crate::store::hashmap::SyncMapStore;
use crate::store::traits::Store;

/// Snapshot of cache-level counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Lookups answered from the store.
    pub hits: u64,
    /// Lookups that found nothing and ran the computation.
    pub misses: u64,
    /// Computations forced by an open bust scope.
    pub busted: u64,
    /// Bust scopes entered.
    pub busts: u64,
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    busted: AtomicU64,
    busts: AtomicU64,
}

impl CacheCounters {
    fn snapshot(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            busted: self.busted.load(Ordering::Relaxed),
            busts: self.busts.load(Ordering::Relaxed),
        }
    }

    fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Memoizing cache bound to one store.
///
/// `Cache` is `Send + Sync` whenever its store is, so one instance can be
/// shared by any number of threads (behind an `Arc` or in scoped threads).
/// To share one store between several caches, pass an `Arc<S>`.
pub struct Cache<K, V, S = SyncMapStore<K, V>> {
    store: S,
    metrics: CacheCounters,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V> Cache<K, V, SyncMapStore<K, V>>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    /// Creates a cache backed by a [`SyncMapStore`].
    pub fn in_memory() -> Self {
        Self::new(SyncMapStore::new())
    }
}

impl<K, V> Default for Cache<K, V, SyncMapStore<K, V>>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<K, V, S> Cache<K, V, S>
where
    S: Store<K, V>,
{
    /// Creates a cache backed by `store`.
    ///
    /// # Panics
    ///
    /// Panics if the process-wide bust-scope self-check fails
    /// (see [`scope::calibrate`]).
    pub fn new(store: S) -> Self {
        scope::ensure_calibrated();
        Self::bootstrap(store)
    }

    /// Constructs without running the self-check; used by the self-check.
    pub(crate) fn bootstrap(store: S) -> Self {
        Cache {
            store,
            metrics: CacheCounters::default(),
            _marker: PhantomData,
        }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns `true` if the current thread is inside a `bust` of any cache.
    #[inline]
    pub fn is_busting(&self) -> bool {
        scope::is_busting()
    }

    /// Snapshot of this cache's counters.
    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.snapshot()
    }

    /// Returns the value stored under `key`, or computes, stores and returns it.
    ///
    /// Inside a [`bust`](Self::bust) scope (of any cache) the store is not
    /// consulted: `computation` always runs and its result replaces the
    /// stored value.
    ///
    /// If `computation` panics, nothing is stored.
    pub fn cache<F>(&self, key: K, computation: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.lookup(&key) {
            return value;
        }
        let value = Arc::new(computation());
        self.store.add(key, Arc::clone(&value));
        value
    }

    /// Like [`cache`](Self::cache), but for fallible computations.
    ///
    /// An `Err` is handed back to the caller and nothing is stored, so the
    /// next call for the same key runs the computation again.
    pub fn try_cache<F, E>(&self, key: K, computation: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        let value = Arc::new(computation()?);
        self.store.add(key, Arc::clone(&value));
        Ok(value)
    }

    /// Memoizes `computation` under a key derived from its type.
    ///
    /// Every closure expression has its own type (see [`FnId`]), so two
    /// distinct closures never share a slot, even when they produce equal
    /// values or are passed through the same generic helper. Every execution
    /// of one closure expression shares one slot.
    ///
    /// ```
    /// use bustcache::{Cache, Store};
    ///
    /// let cache: Cache<String, &str> = Cache::in_memory();
    /// let a = || cache.wrap(|| "A");
    /// let b = || cache.wrap(|| "B");
    ///
    /// assert_eq!(*a(), "A");
    /// assert_eq!(*b(), "B");
    /// assert_eq!(*a(), "A");
    /// assert_eq!(cache.store().len(), 2);
    /// ```
    pub fn wrap<F>(&self, computation: F) -> Arc<V>
    where
        K: From<FnId>,
        F: FnOnce() -> V,
    {
        self.cache(FnId::of::<F>().into(), computation)
    }

    /// Like [`wrap`](Self::wrap), but for fallible computations.
    pub fn try_wrap<F, E>(&self, computation: F) -> Result<Arc<V>, E>
    where
        K: From<FnId>,
        F: FnOnce() -> Result<V, E>,
    {
        self.try_cache(FnId::of::<F>().into(), computation)
    }

    /// Runs `body` with cache busting enabled.
    ///
    /// Every `cache`/`wrap` call made by the current thread while `body` runs,
    /// on this cache or any other, directly or through any number of nested
    /// closures or further `bust` calls, recomputes and overwrites its entry.
    /// The bust is counted in this cache's [`metrics`](Self::metrics).
    ///
    /// The scope is closed on every exit path, including a panic in `body`.
    /// Threads spawned from `body` do not inherit it.
    pub fn bust<R, F>(&self, body: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = BustGuard::enter();
        CacheCounters::inc(&self.metrics.busts);
        body()
    }

    fn lookup(&self, key: &K) -> Option<Arc<V>> {
        if self.is_busting() {
            CacheCounters::inc(&self.metrics.busted);
            trace!(depth = scope::depth(), "busting, recomputing");
            return None;
        }
        match self.store.get(key) {
            Some(value) => {
                CacheCounters::inc(&self.metrics.hits);
                trace!("cache hit");
                Some(value)
            },
            None => {
                CacheCounters::inc(&self.metrics.misses);
                trace!("cache miss");
                None
            },
        }
    }
}

impl<K, V, S> fmt::Debug for Cache<K, V, S>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("store", &self.store)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
