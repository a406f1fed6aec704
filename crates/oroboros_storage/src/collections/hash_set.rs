//! Arena-backed hash set.

use std::fmt;
use std::hash::Hash;

use bytemuck::Pod;

use super::raw_table::RawTable;
use crate::memory::Arena;

/// Hash set of plain-old-data keys stored in the arena.
///
/// Keys are hashed with `FxHasher` into a prime number of buckets. Removed
/// slots are recycled before the set grows.
pub struct ArenaHashSet<K> {
    table: RawTable<K>,
}

impl<K> Clone for ArenaHashSet<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for ArenaHashSet<K> {}

impl<K> fmt::Debug for ArenaHashSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaHashSet")
            .field("table", &self.table)
            .finish()
    }
}

impl<K: Pod + Eq + Hash> ArenaHashSet<K> {
    /// Creates an empty set.
    pub fn new(arena: &mut Arena) -> Self {
        Self::with_capacity(arena, 0)
    }

    /// Creates an empty set sized for at least `capacity` keys.
    pub fn with_capacity(arena: &mut Arena, capacity: usize) -> Self {
        Self {
            table: RawTable::with_capacity(arena, capacity),
        }
    }

    /// Number of keys.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Slot capacity before the next growth.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Adds `key`. Returns `true` if it was not already present.
    pub fn insert(&mut self, arena: &mut Arena, key: K) -> bool {
        self.table.insert(arena, key).is_new
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, arena: &Arena, key: &K) -> bool {
        self.table.find(arena, key).is_some()
    }

    /// Removes `key`. Returns `true` if it was present.
    pub fn remove(&mut self, arena: &mut Arena, key: &K) -> bool {
        self.table.remove(arena, key).is_some()
    }

    /// Removes every key, keeping capacity.
    pub fn clear(&mut self, arena: &mut Arena) {
        self.table.clear(arena);
    }

    /// Iterates over the keys in slot order.
    pub fn iter<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = K> + 'a {
        let keys = self.table.keys_slice(arena);
        self.table.occupied(arena).map(move |slot| keys[slot])
    }

    /// Releases the backing allocations.
    pub fn free(self, arena: &mut Arena) {
        self.table.free(arena);
    }
}
