//! DHAT heap profiler for bustcache.
//!
//! Run with: cargo run --bin dhat_profile --release --features dhat-heap
//! View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use bustcache::builder::{CacheBuilder, StoreKind};
use bustcache::{Cache, Store};

/// Simple XorShift64 RNG for deterministic workloads.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (u64::MAX as f64);
        (self.next_u64() as f64) * SCALE
    }
}

/// Hotset lookups: 90% of accesses hit 10% of keys, every 500th in a bust.
fn hotset_workload<S: Store<u64, u64>>(
    cache: &Cache<u64, u64, S>,
    operations: usize,
    universe: u64,
    seed: u64,
) {
    let mut rng = XorShift64::new(seed);
    let hot_size = universe / 10;

    for i in 0..operations {
        let key = if rng.next_f64() < 0.9 {
            rng.next_u64() % hot_size
        } else {
            hot_size + (rng.next_u64() % (universe - hot_size))
        };

        if i % 500 == 0 {
            cache.bust(|| cache.cache(key, || key));
        } else {
            cache.cache(key, || key);
        }
    }
}

/// Recursive memoization: every sub-result gets its own entry.
fn fib<S: Store<u64, u64>>(cache: &Cache<u64, u64, S>, k: u64) -> u64 {
    if k < 2 {
        return k;
    }
    let a = cache.cache(k - 1, || fib(cache, k - 1));
    let b = cache.cache(k - 2, || fib(cache, k - 2));
    *a + *b
}

fn profile(kind: StoreKind) {
    println!("=== Profiling {kind} ===");
    let operations = 100_000;
    let universe = 16_384;

    let cache = CacheBuilder::new(kind).build::<u64, u64>();

    hotset_workload(&cache, operations, universe, 42);
    fib(&cache, 90);
    // busting skips every lookup, so the recurrence is exponential here
    cache.bust(|| fib(&cache, 20));

    let metrics = cache.metrics();
    println!(
        "  Final size: {}, hits: {}, misses: {}, busted: {}",
        cache.store().len(),
        metrics.hits,
        metrics.misses,
        metrics.busted
    );
}

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    let kinds = [
        StoreKind::SyncMap,
        StoreKind::CopyOnWrite,
        StoreKind::Lru { capacity: 4096 },
    ];
    for kind in kinds {
        profile(kind);
    }

    println!("\nProfile written to dhat-heap.json");
}
