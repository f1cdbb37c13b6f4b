//! Error types for the bustcache library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned when the bust-scope self-check observes a
//!   bust depth that disagrees with the bootstrap `bust` it just ran.
//!   Cache construction treats this as fatal.
//! - [`ConfigError`]: Returned when builder parameters are invalid
//!   (e.g. an LRU store with zero capacity).
//!
//! ## Example Usage
//!
//! ```
//! use bustcache::builder::{CacheBuilder, StoreKind};
//! use bustcache::error::ConfigError;
//!
//! let ok = CacheBuilder::new(StoreKind::Lru { capacity: 16 }).try_build::<u64, u64>();
//! assert!(ok.is_ok());
//!
//! let bad: Result<_, ConfigError> =
//!     CacheBuilder::new(StoreKind::Lru { capacity: 0 }).try_build::<u64, u64>();
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when bust-scope detection does not behave as required.
///
/// Produced by [`scope::calibrate`](crate::scope::calibrate). Carries a
/// human-readable description of which check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
///
/// # Example
///
/// ```
/// use bustcache::builder::{CacheBuilder, StoreKind};
///
/// let err = CacheBuilder::new(StoreKind::Lru { capacity: 0 })
///     .try_build::<u64, u64>()
///     .err()
///     .expect("zero-capacity LRU should be rejected");
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
