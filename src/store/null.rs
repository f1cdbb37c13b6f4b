//! A store that remembers nothing.
//!
//! Every `get` misses, every `add` is dropped. A cache backed by it calls its
//! computation every time, which makes it useful for checking bust-scope
//! behavior independently of storage, and as the backing of the bootstrap
//! cache used by [`scope::calibrate`](crate::scope::calibrate).

use std::sync::Arc;

use crate::store::traits::Store;

/// Store that never holds a value.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl NullStore {
    pub fn new() -> Self {
        NullStore
    }
}

impl<K, V> Store<K, V> for NullStore {
    #[inline]
    fn add(&self, _key: K, _value: Arc<V>) {}

    #[inline]
    fn get(&self, _key: &K) -> Option<Arc<V>> {
        None
    }
}
