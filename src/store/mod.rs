//! Store contract and the bundled backends.
//!
//! | Store              | Reads            | Writes               | Bounded |
//! |--------------------|------------------|----------------------|---------|
//! | `SyncMapStore`     | shared lock      | exclusive lock       | no      |
//! | `CopyOnWriteStore` | lock-free        | lock + full clone    | no      |
//! | `LruStore`         | exclusive lock   | exclusive lock       | yes     |
//! | `NullStore`        | always misses    | dropped              | -       |

pub mod cow;
pub mod hashmap;
pub mod lru;
pub mod null;
pub mod traits;
