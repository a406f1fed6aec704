//! # Raw Hash Table
//!
//! Chained hash index shared by [`ArenaHashSet`](super::ArenaHashSet) and
//! [`ArenaHashMap`](super::ArenaHashMap).
//!
//! ## Layout (struct of arrays)
//!
//! ```text
//! buckets: [ 0 | 3 | 0 | 1 | ... ]   1-based slot index of chain head, 0 = empty
//! hashes:  [ h0 | h1 | -1 | ... ]     -1 marks a removed slot
//! nexts:   [ -1 | 0  | -1 | ... ]     next slot in chain (or free list), -1 = end
//! keys:    [ k0 | k1 | .. | ... ]
//! ```
//!
//! Slot arrays and the bucket array always have the same (prime) length.
//! Removed slots are threaded onto a free list and reused before the table
//! grows.

use std::fmt;
use std::hash::{Hash, Hasher};

use bytemuck::Pod;
use rustc_hash::FxHasher;

use super::array::ArenaArray;
use super::primes::next_prime;
use crate::memory::Arena;

const END: i32 = -1;
const REMOVED: i32 = -1;

/// Result of [`RawTable::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Slot {
    /// Slot index holding the key.
    pub index: usize,
    /// Whether the key was added by this call.
    pub is_new: bool,
    /// New slot capacity if the table grew.
    pub resized: Option<usize>,
}

#[inline]
fn hash_of<K: Hash>(key: &K) -> i32 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    (hasher.finish() as u32 & 0x7FFF_FFFF) as i32
}

pub(crate) struct RawTable<K> {
    buckets: ArenaArray<i32>,
    hashes: ArenaArray<i32>,
    nexts: ArenaArray<i32>,
    keys: ArenaArray<K>,
    /// High-water mark of used slots.
    count: usize,
    free_list: i32,
    free_count: usize,
}

impl<K> Clone for RawTable<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for RawTable<K> {}

impl<K> fmt::Debug for RawTable<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTable")
            .field("capacity", &self.buckets.len())
            .field("count", &self.count)
            .field("free_count", &self.free_count)
            .finish()
    }
}

impl<K: Pod + Eq + Hash> RawTable<K> {
    pub fn with_capacity(arena: &mut Arena, capacity: usize) -> Self {
        let capacity = next_prime(capacity);
        Self {
            buckets: ArenaArray::new_zeroed(arena, capacity),
            hashes: ArenaArray::new(arena, capacity),
            nexts: ArenaArray::new(arena, capacity),
            keys: ArenaArray::new(arena, capacity),
            count: 0,
            free_list: END,
            free_count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count - self.free_count
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Slot holding `key`, if present.
    pub fn find(&self, arena: &Arena, key: &K) -> Option<usize> {
        let hash = hash_of(key);
        let hashes = self.hashes.as_slice(arena);
        let nexts = self.nexts.as_slice(arena);
        let keys = self.keys.as_slice(arena);

        let mut i = self.buckets.get(arena, self.bucket_of(hash)) - 1;
        while i >= 0 {
            let slot = i as usize;
            if hashes[slot] == hash && keys[slot] == *key {
                return Some(slot);
            }
            i = nexts[slot];
        }
        None
    }

    /// Finds or adds `key`.
    pub fn insert(&mut self, arena: &mut Arena, key: K) -> Slot {
        if let Some(index) = self.find(arena, &key) {
            return Slot {
                index,
                is_new: false,
                resized: None,
            };
        }

        let mut resized = None;
        let index = if self.free_count > 0 {
            let slot = self.free_list as usize;
            self.free_list = self.nexts.get(arena, slot);
            self.free_count -= 1;
            slot
        } else {
            if self.count == self.capacity() {
                self.grow(arena);
                resized = Some(self.capacity());
            }
            self.count += 1;
            self.count - 1
        };

        let hash = hash_of(&key);
        let bucket = self.bucket_of(hash);
        let head = self.buckets.get(arena, bucket);
        self.hashes.set(arena, index, hash);
        self.nexts.set(arena, index, head - 1);
        self.keys.set(arena, index, key);
        self.buckets.set(arena, bucket, index as i32 + 1);

        Slot {
            index,
            is_new: true,
            resized,
        }
    }

    /// Unlinks `key` and returns the slot it occupied.
    pub fn remove(&mut self, arena: &mut Arena, key: &K) -> Option<usize> {
        let hash = hash_of(key);
        let bucket = self.bucket_of(hash);
        let mut prev = END;
        let mut i = self.buckets.get(arena, bucket) - 1;

        while i >= 0 {
            let slot = i as usize;
            let next = self.nexts.get(arena, slot);
            if self.hashes.get(arena, slot) == hash && self.keys.get(arena, slot) == *key {
                if prev == END {
                    self.buckets.set(arena, bucket, next + 1);
                } else {
                    self.nexts.set(arena, prev as usize, next);
                }
                self.hashes.set(arena, slot, REMOVED);
                self.nexts.set(arena, slot, self.free_list);
                self.free_list = i;
                self.free_count += 1;
                return Some(slot);
            }
            prev = i;
            i = next;
        }
        None
    }

    /// Forgets every key, keeping capacity.
    pub fn clear(&mut self, arena: &mut Arena) {
        self.buckets.fill(arena, 0);
        self.count = 0;
        self.free_list = END;
        self.free_count = 0;
    }

    /// Indices of occupied slots.
    pub fn occupied<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = usize> + 'a {
        let hashes = &self.hashes.as_slice(arena)[..self.count];
        hashes
            .iter()
            .enumerate()
            .filter(|&(_, &h)| h != REMOVED)
            .map(|(i, _)| i)
    }

    #[inline]
    pub fn keys_slice<'a>(&self, arena: &'a Arena) -> &'a [K] {
        self.keys.as_slice(arena)
    }

    pub fn free(self, arena: &mut Arena) {
        self.buckets.free(arena);
        self.hashes.free(arena);
        self.nexts.free(arena);
        self.keys.free(arena);
    }

    #[inline]
    fn bucket_of(&self, hash: i32) -> usize {
        hash as usize % self.capacity()
    }

    fn grow(&mut self, arena: &mut Arena) {
        let new_capacity = next_prime(self.count * 2);
        self.hashes.resize(arena, new_capacity, false);
        self.nexts.resize(arena, new_capacity, false);
        self.keys.resize(arena, new_capacity, false);

        self.buckets.free(arena);
        self.buckets = ArenaArray::new_zeroed(arena, new_capacity);

        // Growth only happens with an empty free list, so every slot below
        // `count` is live.
        for slot in 0..self.count {
            let bucket = self.bucket_of(self.hashes.get(arena, slot));
            let head = self.buckets.get(arena, bucket);
            self.nexts.set(arena, slot, head - 1);
            self.buckets.set(arena, bucket, slot as i32 + 1);
        }

        tracing::debug!(capacity = new_capacity, "hash table grew");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_find_remove() {
        let mut arena = Arena::new(4096);
        let mut table = RawTable::<u32>::with_capacity(&mut arena, 0);
        let a = table.insert(&mut arena, 10);
        assert!(a.is_new);
        let again = table.insert(&mut arena, 10);
        assert!(!again.is_new);
        assert_eq!(again.index, a.index);

        assert_eq!(table.find(&arena, &10), Some(a.index));
        assert_eq!(table.find(&arena, &11), None);
        assert_eq!(table.remove(&mut arena, &10), Some(a.index));
        assert_eq!(table.find(&arena, &10), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_free_slot_reused_before_growth() {
        let mut arena = Arena::new(4096);
        let mut table = RawTable::<u64>::with_capacity(&mut arena, 3);
        for k in 0..3 {
            table.insert(&mut arena, k);
        }
        let freed = table.remove(&mut arena, &1).unwrap();
        let slot = table.insert(&mut arena, 99);
        assert_eq!(slot.index, freed);
        assert_eq!(slot.resized, None);
        assert_eq!(table.capacity(), 3);
    }

    #[test]
    fn test_growth_rehashes() {
        let mut arena = Arena::new(1 << 16);
        let mut table = RawTable::<u32>::with_capacity(&mut arena, 3);
        let mut grew = false;
        for k in 0..500 {
            grew |= table.insert(&mut arena, k * 7).resized.is_some();
        }
        assert!(grew);
        assert_eq!(table.len(), 500);
        assert!((0..500).all(|k| table.find(&arena, &(k * 7)).is_some()));
        assert_eq!(table.occupied(&arena).count(), 500);
    }

    #[test]
    fn test_remove_from_chain_middle() {
        let mut arena = Arena::new(4096);
        // Capacity 3 forces collisions.
        let mut table = RawTable::<u16>::with_capacity(&mut arena, 3);
        for k in [1, 2, 3] {
            table.insert(&mut arena, k);
        }
        for k in [2, 1, 3] {
            assert!(table.remove(&mut arena, &k).is_some());
            assert!(table.find(&arena, &k).is_none());
        }
        assert_eq!(table.len(), 0);
        table.clear(&mut arena);
        assert_eq!(table.occupied(&arena).count(), 0);
    }
}
