// ==============================================
// BUST SCOPE BEHAVIOR TESTS (integration)
// ==============================================
//
// End-to-end checks of memoization and dynamic-scope busting through the
// public API: nesting, recursion, key independence, and pluggable stores.

use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bustcache::builder::{CacheBuilder, StoreKind};
use bustcache::store::lru::LruStore;
use bustcache::store::null::NullStore;
use bustcache::{Cache, Store};

/// Runs `cache(key, ..)` and asserts both the value and whether the
/// computation ran.
fn check_cache_use<S>(
    cache: &Cache<&'static str, String, S>,
    key: &'static str,
    val: &str,
    ran: bool,
) where
    S: Store<&'static str, String>,
{
    let computed = Cell::new(false);
    let got = cache.cache(key, || {
        computed.set(true);
        val.to_string()
    });
    assert_eq!(*got, val, "value for {key:?}");
    assert_eq!(computed.get(), ran, "computation ran for {key:?}");
}

// ==============================================
// Basics
// ==============================================

mod basics {
    use super::*;

    #[test]
    fn foo_scenario() {
        let cache: Cache<&str, String> = Cache::in_memory();
        let count = Cell::new(0);
        let foo = || {
            cache.cache("foo", || {
                count.set(count.get() + 1);
                "Foo!".to_string()
            })
        };

        assert_eq!(*foo(), "Foo!");
        assert_eq!(*foo(), "Foo!");
        assert_eq!(count.get(), 1);

        let busted = cache.bust(foo);
        assert_eq!(*busted, "Foo!");
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn every_call_inside_bust_recomputes() {
        let cache: Cache<String, String> = Cache::in_memory();
        let count = Cell::new(0);
        let get_foo = || {
            cache.wrap(|| {
                count.set(count.get() + 1);
                "Foo!".to_string()
            })
        };

        assert_eq!(*get_foo(), "Foo!");
        assert_eq!(*get_foo(), "Foo!");
        assert_eq!(count.get(), 1);

        cache.bust(|| {
            assert_eq!(*get_foo(), "Foo!");
            assert_eq!(count.get(), 2);
            assert_eq!(*get_foo(), "Foo!");
            assert_eq!(count.get(), 3);
        });

        assert_eq!(*get_foo(), "Foo!");
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn optional_keys() {
        let cache: Cache<Option<u32>, String> = Cache::in_memory();
        assert_eq!(*cache.cache(None, || "Foo!".to_string()), "Foo!");
        assert_eq!(*cache.cache(None, || "Bar!".to_string()), "Foo!");
        assert_eq!(*cache.cache(Some(0), || "Baz!".to_string()), "Baz!");
    }

    #[test]
    fn mixed_key_kinds_do_not_collide() {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        enum Key {
            Name(&'static str),
            Id(i64),
        }

        let cache: Cache<Key, &str> = Cache::in_memory();
        let calls = Cell::new(0);
        let compute = |v| {
            calls.set(calls.get() + 1);
            v
        };

        assert_eq!(*cache.cache(Key::Name("abc"), || compute("Foo!")), "Foo!");
        assert_eq!(*cache.cache(Key::Id(123), || compute("Foo!")), "Foo!");
        assert_eq!(calls.get(), 2);
    }
}

// ==============================================
// Nesting
// ==============================================

mod nesting {
    use super::*;

    #[test]
    fn nested_caching_and_busting() {
        let cache: Cache<String, String> = Cache::in_memory();
        let count = Cell::new(0);

        let get_foo = || {
            cache.wrap(|| {
                count.set(count.get() + 1);
                "Foo!".to_string()
            })
        };
        let get_bar = || {
            cache.wrap(|| {
                get_foo();
                get_foo();
                count.set(count.get() + 1);
                "Bar!".to_string()
            })
        };

        assert_eq!(*get_foo(), "Foo!");
        assert_eq!(count.get(), 1);

        assert_eq!(*get_bar(), "Bar!");
        assert_eq!(count.get(), 2);

        cache.bust(|| {
            assert_eq!(*get_foo(), "Foo!");
            assert_eq!(count.get(), 3);

            assert_eq!(*get_bar(), "Bar!");
            assert_eq!(count.get(), 6);

            (|| {
                assert_eq!(*get_bar(), "Bar!");
                assert_eq!(count.get(), 9);
            })();

            cache.bust(|| {
                assert_eq!(*get_bar(), "Bar!");
                assert_eq!(count.get(), 12);
            });

            // still busting after the inner scope closed
            assert!(cache.is_busting());
        });

        assert_eq!(*get_bar(), "Bar!");
        assert_eq!(count.get(), 12);
        assert!(!cache.is_busting());
    }

    fn deep(cache: &Cache<u32, u32>, depth: u32, calls: &Cell<u32>) -> u32 {
        if depth == 0 {
            return *cache.cache(0, || {
                calls.set(calls.get() + 1);
                7
            });
        }
        let next = || deep(cache, depth - 1, calls);
        next()
    }

    #[test]
    fn busting_reaches_arbitrary_depth() {
        let cache: Cache<u32, u32> = Cache::in_memory();
        let calls = Cell::new(0);

        assert_eq!(deep(&cache, 200, &calls), 7);
        assert_eq!(deep(&cache, 200, &calls), 7);
        assert_eq!(calls.get(), 1);

        cache.bust(|| assert_eq!(deep(&cache, 200, &calls), 7));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn deferred_bust_scope() {
        struct BustOnDrop<'a> {
            cache: &'a Cache<&'static str, String>,
        }

        impl Drop for BustOnDrop<'_> {
            fn drop(&mut self) {
                self.cache.bust(|| check_cache_use(self.cache, "foo", "Foo!", true));
                check_cache_use(self.cache, "foo", "Foo!", false);
            }
        }

        let cache: Cache<&str, String> = Cache::in_memory();
        check_cache_use(&cache, "foo", "Foo!", true);
        {
            let _deferred = BustOnDrop { cache: &cache };
            check_cache_use(&cache, "foo", "Foo!", false);
        }
        check_cache_use(&cache, "foo", "Foo!", false);
    }
}

// ==============================================
// Independence
// ==============================================

mod independence {
    use super::*;

    #[test]
    fn busting_one_key_leaves_others_cached() {
        let cache: Cache<&str, String> = Cache::in_memory();
        check_cache_use(&cache, "foo", "Foo!", true);
        check_cache_use(&cache, "bar", "Bar!", true);

        cache.bust(|| check_cache_use(&cache, "foo", "Foo!", true));

        check_cache_use(&cache, "bar", "Bar!", false);
        check_cache_use(&cache, "foo", "Foo!", false);
    }

    #[test]
    fn busting_one_cache_recomputes_on_another() {
        let first: Cache<&str, String> = Cache::in_memory();
        let second: Cache<&str, String> = Cache::in_memory();
        check_cache_use(&first, "foo", "Foo!", true);
        check_cache_use(&second, "foo", "Foo!", true);

        first.bust(|| {
            check_cache_use(&first, "foo", "Foo!", true);
            check_cache_use(&second, "foo", "Foo!", true);
        });

        check_cache_use(&first, "foo", "Foo!", false);
        check_cache_use(&second, "foo", "Foo!", false);
    }

    #[test]
    fn nested_memoization_across_caches_is_busted() {
        let names: Cache<u32, String> = Cache::in_memory();
        let greetings: Cache<u32, String> = Cache::in_memory();
        let lookups = Cell::new(0);

        let name = |id: u32| {
            names.cache(id, || {
                lookups.set(lookups.get() + 1);
                format!("user{id}")
            })
        };
        let greet = |id: u32| greetings.cache(id, || format!("hello {}", name(id)));

        assert_eq!(*greet(1), "hello user1");
        assert_eq!(*greet(1), "hello user1");
        assert_eq!(lookups.get(), 1);

        greetings.bust(|| assert_eq!(*greet(1), "hello user1"));
        assert_eq!(lookups.get(), 2);
        assert_eq!(names.metrics().busted, 1);
    }

    #[test]
    fn caches_sharing_a_store_are_busted_together() {
        let store = Arc::new(bustcache::store::hashmap::SyncMapStore::new());
        let first: Cache<&str, String, _> = Cache::new(Arc::clone(&store));
        let second: Cache<&str, String, _> = Cache::new(Arc::clone(&store));

        check_cache_use(&first, "foo", "Foo!", true);
        check_cache_use(&second, "foo", "Foo!", false);

        second.bust(|| check_cache_use(&first, "foo", "Foo!", true));
        check_cache_use(&second, "foo", "Foo!", false);
        assert_eq!(Store::<&str, String>::len(&store), 1);
    }

    #[test]
    fn wrapped_closures_are_distinct() {
        let cache: Cache<String, &str, NullStore> = Cache::new(NullStore);
        let calls = Cell::new(0);

        let get_a = || {
            cache.wrap(|| {
                calls.set(calls.get() + 1);
                "A"
            })
        };
        assert_eq!(*get_a(), "A");
        // null store: runs again, same closure
        assert_eq!(*get_a(), "A");
        assert_eq!(calls.get(), 2);

        let cached: Cache<String, &str> = Cache::in_memory();
        let a = || cached.wrap(|| "A");
        let also_a = || cached.wrap(|| "A");
        a();
        also_a();
        a();
        assert_eq!(cached.store().len(), 2);
    }

    fn memoized<F>(cache: &Cache<String, u32>, computation: F) -> u32
    where
        F: FnOnce() -> u32,
    {
        *cache.wrap(computation)
    }

    #[test]
    fn closures_through_a_shared_helper_get_their_own_slots() {
        let cache: Cache<String, u32> = Cache::in_memory();
        let calls = Cell::new(0);
        let one = || {
            calls.set(calls.get() + 1);
            1
        };
        let two = || {
            calls.set(calls.get() + 1);
            2
        };

        assert_eq!(memoized(&cache, one), 1);
        assert_eq!(memoized(&cache, two), 2);
        assert_eq!(memoized(&cache, one), 1);
        assert_eq!(memoized(&cache, two), 2);
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.store().len(), 2);

        cache.bust(|| assert_eq!(memoized(&cache, two), 2));
        assert_eq!(calls.get(), 3);
    }
}

// ==============================================
// Recursion
// ==============================================

mod recursion {
    use super::*;

    fn fib(cache: &Cache<u64, u64>, k: u64) -> u64 {
        if k < 2 {
            return k;
        }
        let a = cache.cache(k - 1, || fib(cache, k - 1));
        let b = cache.cache(k - 2, || fib(cache, k - 2));
        *a + *b
    }

    #[test]
    fn memoized_fibonacci_is_fast_and_correct() {
        let cache = Cache::in_memory();
        let start = Instant::now();
        assert_eq!(fib(&cache, 90), 2_880_067_194_370_816_120);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn fibonacci_inside_bust_recomputes_every_call() {
        let cache = Cache::in_memory();
        assert_eq!(fib(&cache, 30), 832_040);

        let (value, busted) = cache.bust(|| {
            let before = cache.metrics().busted;
            let value = fib(&cache, 20);
            (value, cache.metrics().busted - before)
        });

        assert_eq!(value, 6_765);
        assert_eq!(busted, memoized_calls(20));
        assert_eq!(fib(&cache, 20), 6_765);
    }

    /// `cache` calls made by `fib(k)` when nothing is ever served from the store.
    fn memoized_calls(k: u64) -> u64 {
        if k < 2 { 0 } else { 2 + memoized_calls(k - 1) + memoized_calls(k - 2) }
    }
}

// ==============================================
// Pluggable Stores
// ==============================================

mod stores {
    use super::*;

    #[test]
    fn backed_by_bounded_lru_store() {
        let cache = Cache::new(LruStore::new(10));

        check_cache_use(&cache, "foo", "Foo!", true);
        check_cache_use(&cache, "foo", "Foo!", false);
        check_cache_use(&cache, "bar", "Bar!", true);
        check_cache_use(&cache, "foo", "Foo!", false);

        cache.bust(|| {
            check_cache_use(&cache, "bar", "Bar!", true);
            check_cache_use(&cache, "foo", "Foo!", true);
        });

        check_cache_use(&cache, "foo", "Foo!", false);
        check_cache_use(&cache, "bar", "Bar!", false);
    }

    #[test]
    fn evicted_entries_are_recomputed() {
        let cache = Cache::new(LruStore::new(1));
        check_cache_use(&cache, "foo", "Foo!", true);
        check_cache_use(&cache, "bar", "Bar!", true);
        check_cache_use(&cache, "foo", "Foo!", true);
        assert_eq!(cache.store().metrics().evictions, 2);
    }

    #[test]
    fn builder_made_caches_bust_the_same_way() {
        for kind in [
            StoreKind::SyncMap,
            StoreKind::CopyOnWrite,
            StoreKind::Lru { capacity: 8 },
        ] {
            let cache = CacheBuilder::new(kind).build::<&'static str, String>();
            check_cache_use(&cache, "foo", "Foo!", true);
            check_cache_use(&cache, "foo", "Foo!", false);
            cache.bust(|| check_cache_use(&cache, "foo", "Foo!", true));
            check_cache_use(&cache, "foo", "Foo!", false);
        }
    }
}
