//! Integration Tests for the public cache API
//!
//! Exercises the cache through its public surface: eviction order, TTL
//! behavior, error handling, multi-threaded access and the background sweeper.

use std::sync::Once;
use std::thread;
use std::time::Duration;

use lru_ttl_cache::{CacheConfig, CacheError, LruTtlCache, ManualClock};

// == Helper Functions ==

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lru_ttl_cache=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

fn create_test_cache(capacity: usize) -> (LruTtlCache<String, String>, ManualClock) {
    init_tracing();
    let clock = ManualClock::new();
    let cache = LruTtlCache::with_clock(capacity, clock.clone()).unwrap();
    (cache, clock)
}

fn s(value: &str) -> String {
    value.to_string()
}

// == Construction ==

#[test]
fn test_zero_capacity_is_rejected() {
    let result = LruTtlCache::<String, String>::new(0);
    assert_eq!(result.err(), Some(CacheError::InvalidCapacity(0)));
}

#[test]
fn test_cap_is_fixed() {
    let (cache, _) = create_test_cache(5);
    for i in 0..20 {
        cache.add(format!("key{}", i), s("v"));
    }
    assert_eq!(cache.cap(), 5);
    assert_eq!(cache.len(), 5);
}

// == LRU Behavior ==

#[test]
fn test_lru_evicts_least_recently_added() {
    let (cache, _) = create_test_cache(3);

    cache.add(s("A"), s("a"));
    cache.add(s("B"), s("b"));
    cache.add(s("C"), s("c"));
    cache.add(s("D"), s("d"));

    assert_eq!(cache.get("A"), None);
    assert_eq!(cache.get("B"), Some(s("b")));
    assert_eq!(cache.get("C"), Some(s("c")));
    assert_eq!(cache.get("D"), Some(s("d")));
}

#[test]
fn test_get_promotes_entry() {
    let (cache, _) = create_test_cache(3);

    cache.add(s("A"), s("a"));
    cache.add(s("B"), s("b"));
    cache.add(s("C"), s("c"));
    assert_eq!(cache.get("A"), Some(s("a")));
    cache.add(s("D"), s("d"));

    assert_eq!(cache.get("B"), None);
    assert_eq!(cache.get("A"), Some(s("a")));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_update_keeps_single_entry() {
    let (cache, _) = create_test_cache(3);

    cache.add(s("k"), s("v1"));
    cache.add(s("k"), s("v2"));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("k"), Some(s("v2")));
}

#[test]
fn test_update_moves_entry_to_front() {
    let (cache, _) = create_test_cache(2);

    cache.add(s("A"), s("a"));
    cache.add(s("B"), s("b"));
    cache.add(s("A"), s("a2"));
    cache.add(s("C"), s("c"));

    assert_eq!(cache.keys(), vec![s("C"), s("A")]);
}

// == TTL Behavior ==

#[test]
fn test_ttl_expiry_is_lazy() {
    let (cache, clock) = create_test_cache(3);

    cache.add_with_ttl(s("x"), s("v"), Duration::from_secs(1)).unwrap();
    cache.add(s("y"), s("v"));
    assert_eq!(cache.len(), 2);

    clock.advance(Duration::from_millis(1001));

    assert_eq!(cache.get("x"), None);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("y"), Some(s("v")));
}

#[test]
fn test_plain_add_clears_ttl() {
    let (cache, clock) = create_test_cache(3);

    cache.add_with_ttl(s("x"), s("v"), Duration::from_secs(5)).unwrap();
    cache.add(s("x"), s("v2"));
    clock.advance(Duration::from_secs(6));

    assert_eq!(cache.get("x"), Some(s("v2")));
    assert_eq!(cache.ttl_remaining("x"), None);
}

#[test]
fn test_add_with_ttl_on_existing_key_updates_value_and_deadline() {
    let (cache, clock) = create_test_cache(3);

    cache.add(s("x"), s("v1"));
    cache.add_with_ttl(s("x"), s("v2"), Duration::from_secs(2)).unwrap();
    assert_eq!(cache.get("x"), Some(s("v2")));

    cache.add_with_ttl(s("x"), s("v3"), Duration::from_secs(10)).unwrap();
    clock.advance(Duration::from_secs(5));
    assert_eq!(cache.get("x"), Some(s("v3")));

    clock.advance(Duration::from_secs(5));
    assert_eq!(cache.get("x"), None);
}

#[test]
fn test_zero_ttl_is_rejected_without_mutation() {
    let (cache, _) = create_test_cache(3);
    cache.add(s("k"), s("original"));

    let result = cache.add_with_ttl(s("k"), s("changed"), Duration::ZERO);

    assert_eq!(result, Err(CacheError::InvalidTtl(Duration::ZERO)));
    assert_eq!(cache.peek("k"), Some(s("original")));
    assert_eq!(cache.ttl_remaining("k"), None);
    assert_eq!(cache.len(), 1);
}

// == Remove / Clear ==

#[test]
fn test_remove_missing_is_noop() {
    let (cache, _) = create_test_cache(3);
    assert_eq!(cache.remove("missing"), None);
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_remove_ttl_entry() {
    let (cache, clock) = create_test_cache(3);

    cache.add_with_ttl(s("a"), s("1"), Duration::from_secs(1)).unwrap();
    cache.add_with_ttl(s("b"), s("2"), Duration::from_secs(2)).unwrap();
    assert_eq!(cache.remove("a"), Some(s("1")));

    clock.advance(Duration::from_secs(3));
    assert_eq!(cache.purge_expired(), 1);
    assert!(cache.is_empty());
}

#[test]
fn test_clear_empties_cache() {
    let (cache, _) = create_test_cache(3);

    cache.add(s("a"), s("1"));
    cache.add_with_ttl(s("b"), s("2"), Duration::from_secs(1)).unwrap();
    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), None);
}

// == Concurrency ==

#[test]
fn test_concurrent_access_respects_capacity() {
    let (cache, _) = create_test_cache(50);
    let mut handles = Vec::new();

    for worker in 0..8 {
        let cache = cache.clone();
        handles.push(thread::spawn(move || {
            for i in 0..500 {
                let key = format!("key{}", (worker * 37 + i) % 120);
                match i % 4 {
                    0 => cache.add(key, format!("value{}", i)),
                    1 => cache
                        .add_with_ttl(key, format!("value{}", i), Duration::from_secs(30))
                        .unwrap(),
                    2 => {
                        if let Some(value) = cache.get(&key) {
                            assert!(value.starts_with("value"));
                        }
                    }
                    _ => {
                        cache.remove(&key);
                    }
                }
                assert!(cache.len() <= cache.cap());
            }
        }));
    }

    for handle in handles {
        handle.join().expect("worker thread should not panic");
    }

    assert!(cache.len() <= 50);
    assert_eq!(cache.keys().len(), cache.len());
}

// == Background Sweeper ==

#[tokio::test]
async fn test_with_sweeper_removes_cold_entries() {
    init_tracing();
    let (cache, sweeper) =
        LruTtlCache::<String, String>::with_sweeper(10, Duration::from_millis(20)).unwrap();
    assert!(sweeper.is_enabled());

    cache.add_with_ttl(s("cold"), s("v"), Duration::from_millis(30)).unwrap();
    cache.add(s("durable"), s("v"));

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().expirations, 1);

    sweeper.shutdown().await;
}

#[tokio::test]
async fn test_with_sweeper_runs_when_handle_is_discarded() {
    init_tracing();
    let (cache, _) =
        LruTtlCache::<String, String>::with_sweeper(10, Duration::from_millis(20)).unwrap();

    cache.add_with_ttl(s("cold"), s("v"), Duration::from_millis(30)).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(cache.len(), 0);
    assert_eq!(cache.stats().expirations, 1);
}

#[tokio::test]
async fn test_with_sweeper_zero_interval_is_disabled() {
    let (cache, sweeper) = LruTtlCache::<String, String>::with_sweeper(10, Duration::ZERO).unwrap();
    assert!(!sweeper.is_enabled());

    cache.add_with_ttl(s("x"), s("v"), Duration::from_millis(10)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Still present until an operation sweeps lazily.
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("x"), None);
    assert_eq!(cache.len(), 0);
}

#[tokio::test]
async fn test_from_config() {
    let config = CacheConfig::new(4, Duration::from_millis(50));
    let (cache, sweeper) = LruTtlCache::<String, u64>::from_config(&config).unwrap();

    assert_eq!(cache.cap(), 4);
    assert!(sweeper.is_enabled());

    sweeper.shutdown().await;
}

#[tokio::test]
async fn test_from_config_rejects_zero_capacity() {
    let config = CacheConfig::new(0, Duration::from_millis(50));
    let result = LruTtlCache::<String, u64>::from_config(&config);
    assert!(matches!(result, Err(CacheError::InvalidCapacity(0))));
}

#[test]
fn test_with_sweeper_requires_runtime() {
    let result = LruTtlCache::<String, String>::with_sweeper(10, Duration::from_millis(10));
    assert!(matches!(result, Err(CacheError::NoRuntime)));
}
