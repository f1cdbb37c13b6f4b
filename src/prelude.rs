pub use crate::builder::{CacheBuilder, DynStore, StoreKind};
pub use crate::cache::{Cache, CacheMetrics};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::scope::FnId;
pub use crate::store::cow::CopyOnWriteStore;
pub use crate::store::hashmap::SyncMapStore;
pub use crate::store::lru::LruStore;
pub use crate::store::null::NullStore;
pub use crate::store::traits::{Store, StoreMetrics};
