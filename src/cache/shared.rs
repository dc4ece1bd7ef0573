//! Shared Cache Handle
//!
//! The thread-safe entry point: one exclusive lock around the whole
//! [`CacheStore`], so the hash index, recency list and expiration heap are
//! always mutated together.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::store::CacheStore;
use crate::cache::CacheStats;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{spawn_sweeper, SweeperHandle};

// == LRU TTL Cache ==
/// A capacity-bounded LRU cache with optional per-entry TTL.
///
/// Cloning is cheap and yields another handle to the same cache.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use lru_ttl_cache::LruTtlCache;
///
/// let cache = LruTtlCache::new(2).unwrap();
/// cache.add("a", 1);
/// cache.add_with_ttl("b", 2, Duration::from_secs(60)).unwrap();
/// cache.add("c", 3);
///
/// assert_eq!(cache.get("a"), None);
/// assert_eq!(cache.get("c"), Some(3));
/// ```
pub struct LruTtlCache<K, V> {
    store: Arc<Mutex<CacheStore<K, V>>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> Clone for LruTtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<K, V> fmt::Debug for LruTtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruTtlCache")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<K, V> LruTtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructors ==
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// Fails with `InvalidCapacity` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_clock(capacity, SystemClock)
    }

    /// Creates a cache that reads time from `clock`.
    pub fn with_clock<C>(capacity: usize, clock: C) -> Result<Self>
    where
        C: Clock + 'static,
    {
        Ok(Self {
            store: Arc::new(Mutex::new(CacheStore::new(capacity)?)),
            clock: Arc::new(clock),
        })
    }

    /// Creates a cache and starts a background sweeper on the current tokio runtime.
    ///
    /// A zero `sweep_interval` disables the sweeper and returns an inert handle;
    /// expired entries are then only removed lazily. Dropping the returned
    /// handle leaves the sweeper running.
    pub fn with_sweeper(capacity: usize, sweep_interval: Duration) -> Result<(Self, SweeperHandle)>
    where
        K: Send + 'static,
        V: Send + 'static,
    {
        let cache = Self::new(capacity)?;
        let handle = cache.start_sweeper(sweep_interval)?;
        Ok((cache, handle))
    }

    /// Creates a cache and its sweeper from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Result<(Self, SweeperHandle)>
    where
        K: Send + 'static,
        V: Send + 'static,
    {
        Self::with_sweeper(config.capacity, config.sweep_interval)
    }

    /// Starts a background sweeper for this cache.
    ///
    /// The sweeper does not keep the cache alive: it stops by itself once
    /// every handle to the cache has been dropped.
    pub fn start_sweeper(&self, interval: Duration) -> Result<SweeperHandle>
    where
        K: Send + 'static,
        V: Send + 'static,
    {
        spawn_sweeper(self, interval)
    }

    // == Operations ==
    /// Stores a value with no expiration, clearing any TTL the key had.
    pub fn add(&self, key: K, value: V) {
        let mut store = self.store.lock();
        store.add(key, value, self.clock.now());
    }

    /// Stores a value that expires after `ttl`.
    ///
    /// Fails with `InvalidTtl` if `ttl` is zero; the cache is left unchanged.
    pub fn add_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        let mut store = self.store.lock();
        store.add_with_ttl(key, value, ttl, self.clock.now())
    }

    /// Returns a clone of the value for `key` and marks it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut store = self.store.lock();
        store.get(key, self.clock.now())
    }

    /// Returns a clone of the value for `key` without marking it used.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.store.lock();
        store.peek(key, self.clock.now()).cloned()
    }

    /// Returns true if `key` holds a live entry. Does not affect recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.store.lock();
        store.peek(key, self.clock.now()).is_some()
    }

    /// Returns the remaining lifetime of `key`, or None if it is absent or has no TTL.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.store.lock();
        store.ttl_remaining(key, self.clock.now())
    }

    /// Removes `key`, returning its value if it was present. No-op when absent.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut store = self.store.lock();
        store.remove(key, self.clock.now())
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    /// Removes all expired entries now, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut store = self.store.lock();
        store.purge_expired(self.clock.now())
    }

    /// Returns live keys ordered from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        let store = self.store.lock();
        store.keys(self.clock.now())
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity fixed at construction.
    pub fn cap(&self) -> usize {
        self.store.lock().cap()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    // == Sweeper Access ==
    /// Weak handle to the locked store, used by the background sweeper.
    pub(crate) fn downgrade(&self) -> Weak<Mutex<CacheStore<K, V>>> {
        Arc::downgrade(&self.store)
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    #[cfg(test)]
    pub(crate) fn check_consistency(&self) -> std::result::Result<(), String> {
        self.store.lock().check_consistency()
    }
}
