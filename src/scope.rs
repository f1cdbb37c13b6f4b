//! # Bust-Scope Detection
//!
//! Answers one question, cheaply: "is the code running right now nested, at
//! any depth and through any number of closures, inside a
//! [`Cache::bust`](crate::cache::Cache::bust) call on this thread?"
//!
//! ## Architecture
//!
//! ```text
//!   a.bust(body)
//!      │
//!      ▼
//!   BustGuard::enter ──► ACTIVE_BUSTS += 1        (process-wide)
//!      │                 BUST_DEPTH[thread] += 1
//!      │
//!      ├── body() ──► ... ──► b.cache(k, f)        (any cache)
//!      │                          │
//!      │                          ├─ ACTIVE_BUSTS == 0 ?  → not busting (fast path)
//!      │                          └─ BUST_DEPTH[thread] > 0 ?
//!      ▼
//!   BustGuard::drop  ──► BUST_DEPTH[thread] -= 1, ACTIVE_BUSTS -= 1
//! ```
//!
//! A bust scope covers every cache: a memoized call on cache `b` made inside
//! `a.bust(..)` recomputes too. The depth is thread-local, so a bust scope is
//! bound to the thread that opened it. Work handed to another thread during
//! `bust` reads from its caches normally.
//!
//! `ACTIVE_BUSTS` lets the common case (nobody is busting anywhere) skip the
//! thread-local read. Any nonzero depth on any thread keeps it nonzero, so the
//! shortcut never changes the answer.
//!
//! ## Self-Calibration
//!
//! [`calibrate`] runs a bootstrap `bust` against a [`NullStore`] cache once
//! per process and verifies that detection reports exactly what it should
//! inside, around, and after that scope. Cache construction panics if it
//! does not.

use std::any::{TypeId, type_name};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::cache::Cache;
use crate::error::InvariantError;
use crate::store::null::NullStore;

static ACTIVE_BUSTS: AtomicUsize = AtomicUsize::new(0);

static CALIBRATION: OnceLock<Result<(), InvariantError>> = OnceLock::new();

thread_local! {
    /// Nesting depth of open bust scopes on this thread.
    static BUST_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Number of bust scopes currently open, across all threads.
pub fn active_busts() -> usize {
    ACTIVE_BUSTS.load(Ordering::Acquire)
}

/// Nesting depth of open bust scopes on the current thread.
pub fn depth() -> usize {
    BUST_DEPTH.try_with(Cell::get).unwrap_or(0)
}

/// Returns `true` if a bust scope is open on the current thread.
#[inline]
pub fn is_busting() -> bool {
    active_busts() != 0 && depth() > 0
}

/// RAII marker for one open bust scope.
///
/// Entering bumps the process-wide count and the current thread's depth;
/// dropping undoes both, including during a panic unwind. The guard is
/// `!Send`: it must be dropped on the thread whose depth it raised.
pub(crate) struct BustGuard {
    _thread_bound: PhantomData<*const ()>,
}

impl BustGuard {
    pub(crate) fn enter() -> Self {
        ACTIVE_BUSTS.fetch_add(1, Ordering::AcqRel);
        let depth = BUST_DEPTH.with(|depth| {
            let raised = depth.get() + 1;
            depth.set(raised);
            raised
        });
        debug!(depth, "entered bust scope");
        BustGuard {
            _thread_bound: PhantomData,
        }
    }
}

impl Drop for BustGuard {
    fn drop(&mut self) {
        // the thread-local may already be gone during thread teardown
        let depth = BUST_DEPTH
            .try_with(|depth| {
                let open = depth.get();
                debug_assert!(open > 0, "bust guard dropped with no open scope on this thread");
                let lowered = open.saturating_sub(1);
                depth.set(lowered);
                lowered
            })
            .unwrap_or(0);
        ACTIVE_BUSTS.fetch_sub(1, Ordering::AcqRel);
        debug!(depth, "left bust scope");
    }
}

/// Compile-time identity of a closure or function item handed to
/// [`Cache::wrap`](crate::cache::Cache::wrap).
///
/// Every closure expression and every `fn` item has its own type, so two
/// distinct closures never share a key, while the same closure shares its key
/// wherever it is wrapped (directly or through generic helpers). Function
/// pointers erase that identity: all `fn() -> V` pointers share one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FnId {
    id: TypeId,
    name: &'static str,
}

impl FnId {
    /// Identity of the type `F`. Lifetimes in `F` are ignored.
    pub fn of<F: ?Sized>() -> Self {
        FnId {
            id: typeid::of::<F>(),
            name: type_name::<F>(),
        }
    }

    /// Compiler-provided type name. Not unique: sibling closures in one
    /// function share it.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl fmt::Display for FnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Includes the type id, so distinct closures map to distinct strings. The
/// text is only stable within one build.
impl From<FnId> for String {
    fn from(fn_id: FnId) -> Self {
        format!("{}@{:?}", fn_id.name, fn_id.id)
    }
}

/// Verify bust-scope detection once per process.
///
/// The result is computed on first call and cached; every later call returns
/// the same outcome.
pub fn calibrate() -> Result<(), InvariantError> {
    CALIBRATION.get_or_init(run_calibration).clone()
}

/// Panics if [`calibrate`] fails.
pub(crate) fn ensure_calibrated() {
    if let Err(err) = calibrate() {
        panic!("bustcache: unable to verify bust scope detection: {err}");
    }
}

fn run_calibration() -> Result<(), InvariantError> {
    let probe: Cache<(), (), NullStore> = Cache::bootstrap(NullStore);
    let bystander: Cache<(), (), NullStore> = Cache::bootstrap(NullStore);
    // a cache may be first built inside someone else's bust scope
    let base = depth();

    let (inside, bystander_inside, outer_depth, nested_depth) = probe.bust(|| {
        let nested_depth = probe.bust(depth);
        (probe.is_busting(), bystander.is_busting(), depth(), nested_depth)
    });

    if !inside || outer_depth != base + 1 {
        return Err(InvariantError::new("bust scope not visible inside its own body"));
    }
    if !bystander_inside {
        return Err(InvariantError::new("bust scope not visible to another cache"));
    }
    if nested_depth != base + 2 {
        return Err(InvariantError::new(format!(
            "nested bust scope reported depth {nested_depth}, expected {}",
            base + 2
        )));
    }
    if depth() != base {
        return Err(InvariantError::new("bust scope still open after bust returned"));
    }

    debug!(base, "bust scope detection calibrated");
    Ok(())
}
