//! Recency Index Module
//!
//! Owns every cache entry and implements Least Recently Used ordering.
//!
//! Entries live in a slot arena and are threaded into a doubly-linked list by
//! slot id, so admit, touch, evict and delete are all O(1):
//! - `head` = most recently used
//! - `tail` = least recently used (next eviction candidate)

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use crate::cache::entry::{CacheEntry, SlotId};
use crate::cache::heap::HeapSlots;

// == Recency Index ==
/// Hash index from key to entry plus a recency-ordered list of entries.
#[derive(Debug)]
pub(crate) struct RecencyIndex<K, V> {
    /// Key to arena slot
    map: HashMap<K, SlotId>,
    /// Entry storage, `None` for free slots
    slots: Vec<Option<CacheEntry<K, V>>>,
    /// Free slot numbers available for reuse
    free: Vec<usize>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    capacity: usize,
}

impl<K, V> RecencyIndex<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty index that holds at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    // == Lookup ==
    /// Returns the slot holding `key`, if present.
    pub fn lookup<Q>(&self, key: &Q) -> Option<SlotId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).copied()
    }

    pub fn get(&self, id: SlotId) -> Option<&CacheEntry<K, V>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut CacheEntry<K, V>> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    // == Insert ==
    /// Places a new entry at the most-recent end and returns its slot.
    ///
    /// The caller must make room first: inserting into a full index, or
    /// inserting a key that is already present, is a bookkeeping defect.
    pub fn insert(&mut self, entry: CacheEntry<K, V>) -> SlotId {
        debug_assert!(!self.is_full(), "recency index capacity exceeded");
        debug_assert!(!self.map.contains_key(&entry.key), "duplicate key inserted");

        let key = entry.key.clone();
        let id = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                SlotId(idx)
            }
            None => {
                self.slots.push(Some(entry));
                SlotId(self.slots.len() - 1)
            }
        };

        self.map.insert(key, id);
        self.push_front(id);
        id
    }

    // == Touch ==
    /// Marks an entry as most recently used.
    pub fn touch(&mut self, id: SlotId) {
        if self.head == Some(id) {
            return;
        }
        self.unlink(id);
        self.push_front(id);
    }

    // == Least Recent ==
    /// Returns the next eviction candidate without removing it.
    pub fn least_recent(&self) -> Option<SlotId> {
        self.tail
    }

    // == Evict Least Recent ==
    /// Removes and returns the least recently used entry.
    ///
    /// Returns None if the index is empty.
    pub fn evict_least_recent(&mut self) -> Option<CacheEntry<K, V>> {
        let id = self.tail?;
        self.delete(id)
    }

    // == Delete ==
    /// Removes an entry from both the map and the ordering.
    pub fn delete(&mut self, id: SlotId) -> Option<CacheEntry<K, V>> {
        if self.get(id).is_none() {
            return None;
        }
        self.unlink(id);

        let entry = self.slots.get_mut(id.index())?.take()?;
        self.free.push(id.index());
        self.map.remove(&entry.key);
        Some(entry)
    }

    // == Clear ==
    /// Discards every entry.
    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.map.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Iteration ==
    /// Iterates over entries from most to least recently used.
    pub fn iter(&self) -> RecencyIter<'_, K, V> {
        RecencyIter {
            index: self,
            cursor: self.head,
        }
    }

    // == List Plumbing ==
    fn unlink(&mut self, id: SlotId) {
        let (prev, next) = match self.get(id) {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.get_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.get_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(entry) = self.get_mut(id) {
            entry.prev = None;
            entry.next = None;
        }
    }

    fn push_front(&mut self, id: SlotId) {
        let old_head = self.head;
        if let Some(entry) = self.get_mut(id) {
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(node) = self.get_mut(h) {
                    node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }
}

// == Heap Slot Access ==
impl<K, V> HeapSlots for RecencyIndex<K, V>
where
    K: Eq + Hash + Clone,
{
    fn deadline(&self, id: SlotId) -> Option<Instant> {
        self.get(id).and_then(|entry| entry.expires_at)
    }

    fn set_heap_index(&mut self, id: SlotId, index: Option<usize>) {
        if let Some(entry) = self.get_mut(id) {
            entry.heap_index = index;
        }
    }
}

// == Recency Iterator ==
/// Walks the recency list from the most-recent end.
pub(crate) struct RecencyIter<'a, K, V> {
    index: &'a RecencyIndex<K, V>,
    cursor: Option<SlotId>,
}

impl<'a, K, V> Iterator for RecencyIter<'a, K, V>
where
    K: Eq + Hash + Clone,
{
    type Item = (SlotId, &'a CacheEntry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let entry = self.index.get(id)?;
        self.cursor = entry.next;
        Some((id, entry))
    }
}
