//! Recency Table - fixed-capacity arena with an intrusive LRU list
//!
//! Entries live in a slab of slots; a doubly-linked list threaded through
//! slot indices keeps them ordered from least to most recently used. Freed
//! slots are recycled, so the slab never grows past `capacity`.
//!
//! ```text
//!  head (LRU)                                   tail (MRU)
//!     │                                             │
//!  [slot 3] ⇄ [slot 0] ⇄ [slot 5] ⇄ ... ⇄ [slot 1]
//! ```
//!
//! All operations are O(1) apart from `iter` and `clear`.

use std::collections::HashMap;

use super::entry::Key;

/// Index of a slot in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotIdx(usize);

struct Slot<V> {
    key: Key,
    value: V,
    prev: Option<SlotIdx>,
    next: Option<SlotIdx>,
}

/// Capacity-bounded, access-ordered table
pub(crate) struct RecencyTable<V> {
    slots: Vec<Option<Slot<V>>>,
    free: Vec<SlotIdx>,
    index: HashMap<Key, SlotIdx>,
    /// Least recently used
    head: Option<SlotIdx>,
    /// Most recently used
    tail: Option<SlotIdx>,
    capacity: usize,
}

impl<V> RecencyTable<V> {
    /// Create an empty table; the arena is allocated up front
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
            capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    /// Look up without touching recency
    #[cfg(test)]
    pub fn peek(&self, key: &Key) -> Option<&V> {
        let idx = *self.index.get(key)?;
        Some(&self.node(idx).value)
    }

    /// Look up and mark as most recently used
    pub fn get_mut(&mut self, key: &Key) -> Option<&mut V> {
        let idx = *self.index.get(key)?;
        self.move_to_back(idx);
        Some(&mut self.node_mut(idx).value)
    }

    /// Insert or overwrite `key`, marking it most recently used.
    ///
    /// When a new key arrives at capacity, the least recently used entry is
    /// evicted first and returned. Overwrites never evict.
    pub fn insert(&mut self, key: Key, value: V) -> Option<(Key, V)> {
        if let Some(&idx) = self.index.get(&key) {
            self.node_mut(idx).value = value;
            self.move_to_back(idx);
            return None;
        }

        if self.capacity == 0 {
            return Some((key, value));
        }

        let evicted = if self.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let idx = self.alloc(key, value);
        self.link_back(idx);
        self.index.insert(key, idx);
        evicted
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &Key) -> Option<V> {
        let idx = self.index.remove(key)?;
        Some(self.release(idx).value)
    }

    /// Least recently used entry, without touching it
    pub fn peek_lru(&self) -> Option<(Key, &V)> {
        let idx = self.head?;
        let node = self.node(idx);
        Some((node.key, &node.value))
    }

    /// Remove and return the least recently used entry
    pub fn pop_lru(&mut self) -> Option<(Key, V)> {
        let idx = self.head?;
        let slot = self.release(idx);
        self.index.remove(&slot.key);
        Some((slot.key, slot.value))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterate from least to most recently used
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            table: self,
            current: self.head,
        }
    }

    /// Number of arena slots ever allocated
    #[cfg(test)]
    fn arena_len(&self) -> usize {
        self.slots.len()
    }

    // -- Internal helpers --

    fn alloc(&mut self, key: Key, value: V) -> SlotIdx {
        let slot = Slot {
            key,
            value,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx.0] = Some(slot);
                idx
            }
            None => {
                let idx = SlotIdx(self.slots.len());
                self.slots.push(Some(slot));
                idx
            }
        }
    }

    /// Unlink and vacate a slot. The caller maintains `index`.
    fn release(&mut self, idx: SlotIdx) -> Slot<V> {
        self.unlink(idx);
        let slot = self.slots[idx.0]
            .take()
            .expect("RecencyTable: release of vacant slot");
        self.free.push(idx);
        slot
    }

    fn unlink(&mut self, idx: SlotIdx) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }

        let node = self.node_mut(idx);
        node.prev = None;
        node.next = None;
    }

    fn link_back(&mut self, idx: SlotIdx) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(idx);
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(t) => self.node_mut(t).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn move_to_back(&mut self, idx: SlotIdx) {
        if self.tail == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_back(idx);
    }

    #[inline]
    fn node(&self, idx: SlotIdx) -> &Slot<V> {
        self.slots[idx.0]
            .as_ref()
            .expect("RecencyTable: dangling slot index")
    }

    #[inline]
    fn node_mut(&mut self, idx: SlotIdx) -> &mut Slot<V> {
        self.slots[idx.0]
            .as_mut()
            .expect("RecencyTable: dangling slot index")
    }
}

/// LRU → MRU iterator
pub(crate) struct Iter<'a, V> {
    table: &'a RecencyTable<V>,
    current: Option<SlotIdx>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Key, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = self.table.slots[idx.0].as_ref()?;
        self.current = node.next;
        Some((node.key, &node.value))
    }
}

// =============================================================================
// Tests
// =============================================================================
