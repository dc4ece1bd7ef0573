//! Expiration Heap Module
//!
//! Array-backed min-heap of TTL-bearing entries ordered by expiration instant.
//!
//! The heap stores slot ids only; each entry records its own position in the
//! heap array (`heap_index`). Every swap rewrites the position of both swapped
//! entries, which is what makes O(log n) removal and re-keying of an arbitrary
//! entry possible without scanning.
//!
//! | Operation  | Complexity |
//! |------------|------------|
//! | `push`     | O(log n)   |
//! | `peek_min` | O(1)       |
//! | `pop_min`  | O(log n)   |
//! | `remove`   | O(log n)   |
//! | `fix`      | O(log n)   |

use std::time::Instant;

use crate::cache::entry::SlotId;

// == Slot Access ==
/// Access to the entries the heap orders.
///
/// Implemented by the store that owns the entries so the heap can read
/// deadlines and keep each entry's recorded position current.
pub(crate) trait HeapSlots {
    /// Expiration instant of the entry in `id`. Always `Some` for entries in the heap.
    fn deadline(&self, id: SlotId) -> Option<Instant>;

    /// Records the heap position of `id`; `None` marks it as not in the heap.
    fn set_heap_index(&mut self, id: SlotId, index: Option<usize>);
}

// == Expiration Heap ==
#[derive(Debug, Default)]
pub(crate) struct ExpirationHeap {
    items: Vec<SlotId>,
}

impl ExpirationHeap {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every element without touching the entries' recorded positions.
    ///
    /// Only valid when the entries themselves are being discarded too.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    // == Push ==
    /// Inserts `id` using its current deadline.
    pub fn push<S: HeapSlots>(&mut self, slots: &mut S, id: SlotId) {
        let pos = self.items.len();
        self.items.push(id);
        slots.set_heap_index(id, Some(pos));
        self.sift_up(slots, pos);
    }

    // == Peek Min ==
    /// Returns the entry with the earliest deadline without removing it.
    pub fn peek_min(&self) -> Option<SlotId> {
        self.items.first().copied()
    }

    // == Pop Min ==
    /// Removes and returns the entry with the earliest deadline.
    ///
    /// Returns None if the heap is empty.
    pub fn pop_min<S: HeapSlots>(&mut self, slots: &mut S) -> Option<SlotId> {
        self.remove_at(slots, 0)
    }

    // == Remove ==
    /// Removes the entry stored at heap position `pos`.
    ///
    /// `pos` is the entry's own recorded `heap_index`.
    pub fn remove<S: HeapSlots>(&mut self, slots: &mut S, pos: usize) -> Option<SlotId> {
        self.remove_at(slots, pos)
    }

    // == Fix ==
    /// Restores heap order after the deadline of the entry at `pos` changed.
    pub fn fix<S: HeapSlots>(&mut self, slots: &mut S, pos: usize) {
        if pos < self.items.len() {
            self.restore(slots, pos);
        }
    }

    // == Internals ==
    fn remove_at<S: HeapSlots>(&mut self, slots: &mut S, pos: usize) -> Option<SlotId> {
        if pos >= self.items.len() {
            return None;
        }

        let last = self.items.len() - 1;
        if pos != last {
            self.swap(slots, pos, last);
        }
        let removed = self.items.pop()?;
        slots.set_heap_index(removed, None);

        if pos < self.items.len() {
            self.restore(slots, pos);
        }
        Some(removed)
    }

    fn restore<S: HeapSlots>(&mut self, slots: &mut S, pos: usize) {
        if self.sift_up(slots, pos) == pos {
            self.sift_down(slots, pos);
        }
    }

    fn sift_up<S: HeapSlots>(&mut self, slots: &mut S, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(slots, pos, parent) {
                break;
            }
            self.swap(slots, pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down<S: HeapSlots>(&mut self, slots: &mut S, mut pos: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.less(slots, right, left) {
                right
            } else {
                left
            };
            if !self.less(slots, child, pos) {
                break;
            }
            self.swap(slots, pos, child);
            pos = child;
        }
    }

    fn less<S: HeapSlots>(&self, slots: &S, a: usize, b: usize) -> bool {
        slots.deadline(self.items[a]) < slots.deadline(self.items[b])
    }

    fn swap<S: HeapSlots>(&mut self, slots: &mut S, a: usize, b: usize) {
        self.items.swap(a, b);
        slots.set_heap_index(self.items[a], Some(a));
        slots.set_heap_index(self.items[b], Some(b));
    }

    // == Consistency Check ==
    /// Iterates over the stored slot ids in array order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (usize, SlotId)> + '_ {
        self.items.iter().copied().enumerate()
    }

    /// Verifies heap order against the current deadlines.
    #[cfg(test)]
    pub fn check_order<S: HeapSlots>(&self, slots: &S) -> Result<(), String> {
        for pos in 1..self.items.len() {
            let parent = (pos - 1) / 2;
            if self.less(slots, pos, parent) {
                return Err(format!(
                    "heap order violated: slot at {} expires before its parent at {}",
                    pos, parent
                ));
            }
        }
        Ok(())
    }
}
