//! Runtime selection of a cache's backing store.
//!
//! [`Cache::new`] takes any concrete store and is the zero-cost path. When the
//! backend is picked at runtime (configuration, CLI flag, benchmark matrix),
//! [`CacheBuilder`] builds a cache over a boxed [`Store`] instead.
//!
//! ## Example
//!
//! ```rust
//! use bustcache::builder::{CacheBuilder, StoreKind};
//!
//! let cache = CacheBuilder::new(StoreKind::CopyOnWrite).build::<u64, String>();
//! assert_eq!(*cache.cache(1, || "hello".to_string()), "hello");
//! assert_eq!(*cache.cache(1, || unreachable!()), "hello");
//! ```

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use tracing::debug;

use crate::cache::Cache;
use crate::error::ConfigError;
use crate::store::cow::CopyOnWriteStore;
use crate::store::hashmap::SyncMapStore;
use crate::store::lru::LruStore;
use crate::store::null::NullStore;
use crate::store::traits::Store;

/// Type-erased store used by builder-made caches.
pub type DynStore<K, V> = Box<dyn Store<K, V>>;

/// Available store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// Read/write-locked hash map.
    #[default]
    SyncMap,
    /// Copy-on-write hash map with lock-free reads.
    CopyOnWrite,
    /// Bounded LRU store; requires `capacity > 0`.
    Lru { capacity: usize },
    /// Remembers nothing; every call computes.
    Null,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::SyncMap => f.write_str("sync-map"),
            StoreKind::CopyOnWrite => f.write_str("cow"),
            StoreKind::Lru { capacity } => write!(f, "lru:{capacity}"),
            StoreKind::Null => f.write_str("null"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    /// Parses `sync-map`, `cow`, `null`, or `lru:<capacity>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sync-map" | "syncmap" | "mem" => Ok(StoreKind::SyncMap),
            "cow" | "copy-on-write" => Ok(StoreKind::CopyOnWrite),
            "null" => Ok(StoreKind::Null),
            other => {
                let capacity = other
                    .strip_prefix("lru:")
                    .ok_or_else(|| ConfigError::new(format!("unknown store kind: {other:?}")))?;
                let capacity = capacity.parse::<usize>().map_err(|err| {
                    ConfigError::new(format!("invalid lru capacity {capacity:?}: {err}"))
                })?;
                Ok(StoreKind::Lru { capacity })
            },
        }
    }
}

/// Builder for caches with a runtime-selected store.
#[derive(Debug, Clone, Default)]
pub struct CacheBuilder {
    kind: StoreKind,
}

impl CacheBuilder {
    /// Create a builder for the given store kind.
    pub fn new(kind: StoreKind) -> Self {
        Self { kind }
    }

    /// Replace the store kind.
    pub fn store(mut self, kind: StoreKind) -> Self {
        self.kind = kind;
        self
    }

    /// The configured store kind.
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Build a cache, validating the configuration.
    pub fn try_build<K, V>(&self) -> Result<Cache<K, V, DynStore<K, V>>, ConfigError>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        let store: DynStore<K, V> = match self.kind {
            StoreKind::SyncMap => Box::new(SyncMapStore::new()),
            StoreKind::CopyOnWrite => Box::new(CopyOnWriteStore::new()),
            StoreKind::Lru { capacity: 0 } => {
                return Err(ConfigError::new("lru store capacity must be > 0"));
            },
            StoreKind::Lru { capacity } => Box::new(LruStore::new(capacity)),
            StoreKind::Null => Box::new(NullStore),
        };
        debug!(store = %self.kind, "building cache");
        Ok(Cache::new(store))
    }

    /// Build a cache.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid; use
    /// [`try_build`](Self::try_build) to handle that case.
    pub fn build<K, V>(&self) -> Cache<K, V, DynStore<K, V>>
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
