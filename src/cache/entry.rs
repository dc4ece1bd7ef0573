//! Cache Entry Module
//!
//! Defines the unit of storage: value, optional expiration and the links that
//! place it in the recency list and the expiration heap.

use std::time::{Duration, Instant};

// == Slot Id ==
/// Stable handle to an entry's slot in the recency index arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotId(pub(crate) usize);

impl SlotId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

// == Cache Entry ==
/// A single cache entry with value and bookkeeping metadata.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<K, V> {
    /// The key this entry is stored under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
    /// Neighbour towards the most-recent end
    pub(crate) prev: Option<SlotId>,
    /// Neighbour towards the least-recent end
    pub(crate) next: Option<SlotId>,
    /// Position in the expiration heap, None when not in the heap
    pub(crate) heap_index: Option<usize>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a detached entry that is in neither the list nor the heap.
    pub fn new(key: K, value: V, expires_at: Option<Instant>) -> Self {
        Self {
            key,
            value,
            expires_at,
            prev: None,
            next: None,
            heap_index: None,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// An entry whose expiration instant equals `now` is expired.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has a TTL that hasn't elapsed
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }
}
