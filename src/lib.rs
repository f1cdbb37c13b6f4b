//! bustcache: function-result memoization with dynamic-scope cache busting.
//!
//! A [`Cache`] memoizes closures in a pluggable [`Store`]. Anything that runs
//! inside [`Cache::bust`] on the same thread, at any nesting depth and on any
//! cache, recomputes and refreshes its entry instead of reading it.
//!
//! ```
//! use bustcache::Cache;
//!
//! let cache: Cache<u64, u64> = Cache::in_memory();
//! assert_eq!(*cache.cache(1, || 10), 10);
//! assert_eq!(*cache.cache(1, || 20), 10);
//! assert_eq!(*cache.bust(|| cache.cache(1, || 30)), 30);
//! assert_eq!(*cache.cache(1, || 40), 30);
//! ```

pub mod builder;
pub mod cache;
pub mod error;
pub mod prelude;
pub mod scope;
pub mod store;

pub use crate::cache::{Cache, CacheMetrics};
pub use crate::scope::FnId;
pub use crate::store::traits::Store;
