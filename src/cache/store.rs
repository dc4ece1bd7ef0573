//! Cache Store Module
//!
//! Eviction and expiration engine combining the recency index with the
//! expiration heap.
//!
//! `CacheStore` is not synchronized; [`LruTtlCache`](crate::cache::LruTtlCache)
//! puts one lock around it. Every mutating operation first runs the lazy
//! expiration sweep, so an entry is never observed after its deadline.

use std::borrow::Borrow;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::entry::{CacheEntry, SlotId};
use crate::cache::heap::ExpirationHeap;
use crate::cache::lru::RecencyIndex;
use crate::cache::CacheStats;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Capacity-bounded storage with LRU eviction and per-entry TTL.
#[derive(Debug)]
pub(crate) struct CacheStore<K, V> {
    /// Entries, hash index and recency order
    index: RecencyIndex<K, V>,
    /// TTL-bearing entries ordered by deadline
    heap: ExpirationHeap,
    /// Performance statistics
    stats: CacheStats,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore holding at most `capacity` entries.
    ///
    /// Fails with `InvalidCapacity` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 1 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        Ok(Self {
            index: RecencyIndex::new(capacity),
            heap: ExpirationHeap::new(),
            stats: CacheStats::default(),
        })
    }

    // == Add ==
    /// Stores a value that never expires.
    ///
    /// Overwriting a key replaces its value, clears any TTL and marks it most
    /// recently used. A new key evicts the least recently used entry when the
    /// cache is full.
    pub fn add(&mut self, key: K, value: V, now: Instant) {
        self.purge_expired(now);

        if let Some(id) = self.index.lookup(&key) {
            self.unschedule(id);
            if let Some(entry) = self.index.get_mut(id) {
                entry.value = value;
                entry.expires_at = None;
            }
            self.index.touch(id);
            return;
        }

        self.make_room();
        self.index.insert(CacheEntry::new(key, value, None));
        self.stats.set_total_entries(self.index.len());
    }

    // == Add With TTL ==
    /// Stores a value that expires `ttl` after `now`.
    ///
    /// Fails with `InvalidTtl` for a zero duration, leaving the cache untouched.
    pub fn add_with_ttl(&mut self, key: K, value: V, ttl: Duration, now: Instant) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }

        // A deadline past the representable range can never be reached.
        let expires_at = now.checked_add(ttl);

        self.purge_expired(now);

        if let Some(id) = self.index.lookup(&key) {
            let heap_index = match self.index.get_mut(id) {
                Some(entry) => {
                    entry.value = value;
                    entry.expires_at = expires_at;
                    entry.heap_index
                }
                None => None,
            };
            match (heap_index, expires_at) {
                (Some(pos), Some(_)) => self.heap.fix(&mut self.index, pos),
                (Some(pos), None) => {
                    self.heap.remove(&mut self.index, pos);
                }
                (None, Some(_)) => self.heap.push(&mut self.index, id),
                (None, None) => {}
            }
            self.index.touch(id);
            return Ok(());
        }

        self.make_room();
        let id = self.index.insert(CacheEntry::new(key, value, expires_at));
        if expires_at.is_some() {
            self.heap.push(&mut self.index, id);
        }
        self.stats.set_total_entries(self.index.len());
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// Entries whose deadline is at or before `now` are swept first, so an
    /// entry expiring at exactly `now` is reported as missing.
    pub fn get<Q>(&mut self, key: &Q, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.purge_expired(now);

        match self.index.lookup(key) {
            Some(id) => {
                self.index.touch(id);
                self.stats.record_hit();
                self.index.get(id).map(|entry| entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Returns a live entry's value without affecting recency or statistics.
    pub fn peek<Q>(&self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key, now).map(|entry| &entry.value)
    }

    // == Time To Live ==
    /// Returns the remaining lifetime of a live entry.
    ///
    /// `None` if the key is absent, expired, or has no TTL.
    pub fn ttl_remaining<Q>(&self, key: &Q, now: Instant) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key, now)
            .and_then(|entry| entry.ttl_remaining(now))
    }

    // == Remove ==
    /// Removes an entry by key, returning its value if it was live.
    pub fn remove<Q>(&mut self, key: &Q, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.purge_expired(now);

        let id = self.index.lookup(key)?;
        self.unschedule(id);
        let entry = self.index.delete(id)?;
        self.stats.set_total_entries(self.index.len());
        Some(entry.value)
    }

    // == Clear ==
    /// Discards every entry.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
        self.stats.set_total_entries(0);
    }

    // == Purge Expired ==
    /// Removes every entry whose deadline is at or before `now`.
    ///
    /// Pops the heap root while it is expired, so the cost is proportional to
    /// the number of expired entries. Returns the number removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;

        while let Some(root) = self.heap.peek_min() {
            match self.index.get(root).and_then(|entry| entry.expires_at) {
                Some(deadline) if deadline <= now => {}
                _ => break,
            }
            self.heap.pop_min(&mut self.index);
            self.index.delete(root);
            removed += 1;
        }

        if removed > 0 {
            trace!(removed, "swept expired entries");
            self.stats.record_expirations(removed);
            self.stats.set_total_entries(self.index.len());
        }
        removed
    }

    // == Keys ==
    /// Returns live keys ordered from most to least recently used.
    pub fn keys(&self, now: Instant) -> Vec<K> {
        self.index
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(_, entry)| entry.key.clone())
            .collect()
    }

    // == Length ==
    /// Returns the current number of entries, including any not yet swept.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns the configured capacity.
    pub fn cap(&self) -> usize {
        self.index.capacity()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.index.len());
        stats
    }

    // == Internals ==
    fn live_entry<Q>(&self, key: &Q, now: Instant) -> Option<&CacheEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.index.lookup(key)?;
        self.index.get(id).filter(|entry| !entry.is_expired(now))
    }

    /// Takes an entry out of the expiration heap if it is scheduled there.
    fn unschedule(&mut self, id: SlotId) {
        if let Some(pos) = self.index.get(id).and_then(|entry| entry.heap_index) {
            self.heap.remove(&mut self.index, pos);
        }
    }

    /// Evicts the least recently used entry if the cache is full.
    fn make_room(&mut self) {
        if !self.index.is_full() {
            return;
        }
        if let Some(id) = self.index.least_recent() {
            self.unschedule(id);
            if self.index.evict_least_recent().is_some() {
                debug!(capacity = self.index.capacity(), "evicted least recently used entry");
                self.stats.record_eviction();
            }
        }
    }

    // == Consistency Check ==
    /// Verifies that the hash index, the recency list and the expiration heap agree.
    #[cfg(test)]
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.index.len() > self.index.capacity() {
            return Err(format!(
                "len {} exceeds capacity {}",
                self.index.len(),
                self.index.capacity()
            ));
        }

        let mut listed = 0;
        let mut with_ttl = 0;
        for (id, entry) in self.index.iter() {
            listed += 1;
            if self.index.lookup(&entry.key) != Some(id) {
                return Err(format!("list slot {:?} is not reachable from the map", id));
            }
            if entry.expires_at.is_some() {
                with_ttl += 1;
                if entry.heap_index.is_none() {
                    return Err(format!("slot {:?} has a TTL but is not in the heap", id));
                }
            } else if entry.heap_index.is_some() {
                return Err(format!("slot {:?} has no TTL but claims a heap slot", id));
            }
        }
        if listed != self.index.len() {
            return Err(format!(
                "recency list holds {} entries but the map holds {}",
                listed,
                self.index.len()
            ));
        }
        if with_ttl != self.heap.len() {
            return Err(format!(
                "{} entries carry a TTL but the heap holds {}",
                with_ttl,
                self.heap.len()
            ));
        }

        for (pos, id) in self.heap.iter() {
            let entry = self
                .index
                .get(id)
                .ok_or_else(|| format!("heap position {} points at a free slot", pos))?;
            if entry.heap_index != Some(pos) {
                return Err(format!(
                    "stale heap index: slot {:?} records {:?} but sits at {}",
                    id, entry.heap_index, pos
                ));
            }
        }
        self.heap.check_order(&self.index)
    }
}
