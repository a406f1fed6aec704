//! # Arena Hash Map
//!
//! Key/value map in the arena. Keys and chain metadata live in a
//! [`RawTable`]; values sit in a parallel array indexed by the same slot.

use std::fmt;
use std::hash::Hash;

use bytemuck::Pod;

use super::array::ArenaArray;
use super::raw_table::RawTable;
use crate::memory::Arena;

/// Hash map of plain-old-data keys and values stored in the arena.
///
/// # Example
///
/// ```rust,ignore
/// let mut map = ArenaHashMap::<u32, f32>::new(&mut arena);
/// map.insert(&mut arena, 7, 1.5);
/// map.update(&mut arena, 7, |v| *v *= 2.0);
/// assert_eq!(map.get(&arena, &7), Some(3.0));
/// ```
pub struct ArenaHashMap<K, V> {
    table: RawTable<K>,
    values: ArenaArray<V>,
}

impl<K, V> Clone for ArenaHashMap<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for ArenaHashMap<K, V> {}

impl<K, V> fmt::Debug for ArenaHashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaHashMap")
            .field("table", &self.table)
            .field("values", &self.values)
            .finish()
    }
}

impl<K: Pod + Eq + Hash, V: Pod> ArenaHashMap<K, V> {
    /// Creates an empty map.
    pub fn new(arena: &mut Arena) -> Self {
        Self::with_capacity(arena, 0)
    }

    /// Creates an empty map sized for at least `capacity` entries.
    pub fn with_capacity(arena: &mut Arena, capacity: usize) -> Self {
        let table = RawTable::with_capacity(arena, capacity);
        let values = ArenaArray::new(arena, table.capacity());
        Self { table, values }
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the map is empty.
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

    /// Inserts or overwrites. Returns the previous value, if any.
    pub fn insert(&mut self, arena: &mut Arena, key: K, value: V) -> Option<V> {
        let (slot, is_new) = self.slot_for(arena, key);
        let previous = if is_new {
            None
        } else {
            Some(self.values.get(arena, slot))
        };
        self.values.set(arena, slot, value);
        previous
    }

    /// Value for `key`, if present.
    #[must_use]
    pub fn get(&self, arena: &Arena, key: &K) -> Option<V> {
        self.table
            .find(arena, key)
            .map(|slot| self.values.get(arena, slot))
    }

    /// Value for `key`, inserting `default` first if absent.
    pub fn get_or_insert(&mut self, arena: &mut Arena, key: K, default: V) -> V {
        let (slot, is_new) = self.slot_for(arena, key);
        if is_new {
            self.values.set(arena, slot, default);
        }
        self.values.get(arena, slot)
    }

    /// Applies `f` to the value for `key` in place. Returns `false` if the
    /// key is absent.
    pub fn update<F>(&mut self, arena: &mut Arena, key: K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        match self.table.find(arena, &key) {
            Some(slot) => {
                f(&mut self.values.as_mut_slice(arena)[slot]);
                true
            }
            None => false,
        }
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, arena: &Arena, key: &K) -> bool {
        self.table.find(arena, key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, arena: &mut Arena, key: &K) -> Option<V> {
        let slot = self.table.remove(arena, key)?;
        Some(self.values.get(arena, slot))
    }

    /// Removes every entry, keeping capacity.
    pub fn clear(&mut self, arena: &mut Arena) {
        self.table.clear(arena);
    }

    /// Iterates over `(key, value)` pairs in slot order.
    pub fn iter<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = (K, V)> + 'a {
        let keys = self.table.keys_slice(arena);
        let values = self.values.as_slice(arena);
        self.table
            .occupied(arena)
            .map(move |slot| (keys[slot], values[slot]))
    }

    /// Iterates over the keys in slot order.
    pub fn keys<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = K> + 'a {
        self.iter(arena).map(|(k, _)| k)
    }

    /// Iterates over the values in slot order.
    pub fn values<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = V> + 'a {
        self.iter(arena).map(|(_, v)| v)
    }

    /// Releases the backing allocations.
    pub fn free(self, arena: &mut Arena) {
        self.table.free(arena);
        self.values.free(arena);
    }

    /// Finds or creates the slot for `key`, keeping `values` in step with
    /// table growth.
    fn slot_for(&mut self, arena: &mut Arena, key: K) -> (usize, bool) {
        let slot = self.table.insert(arena, key);
        if let Some(capacity) = slot.resized {
            self.values.resize(arena, capacity, true);
        }
        (slot.index, slot.is_new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_insert_overwrite_get() {
        let mut arena = Arena::new(4096);
        let mut map = ArenaHashMap::<u32, i64>::new(&mut arena);
        assert_eq!(map.insert(&mut arena, 1, 10), None);
        assert_eq!(map.insert(&mut arena, 1, 11), Some(10));
        assert_eq!(map.get(&arena, &1), Some(11));
        assert_eq!(map.get(&arena, &2), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_get_or_insert_and_update() {
        let mut arena = Arena::new(4096);
        let mut map = ArenaHashMap::<u16, u32>::new(&mut arena);
        assert_eq!(map.get_or_insert(&mut arena, 3, 100), 100);
        assert_eq!(map.get_or_insert(&mut arena, 3, 5), 100);
        assert!(map.update(&mut arena, 3, |v| *v += 1));
        assert!(!map.update(&mut arena, 4, |v| *v += 1));
        assert_eq!(map.get(&arena, &3), Some(101));
    }

    #[test]
    fn test_values_survive_growth() {
        let mut arena = Arena::new(1 << 16);
        let mut map = ArenaHashMap::<u32, u64>::new(&mut arena);
        for k in 0..1_000u32 {
            map.insert(&mut arena, k, u64::from(k) * 3);
        }
        assert!(map.capacity() >= 1_000);
        assert!((0..1_000u32).all(|k| map.get(&arena, &k) == Some(u64::from(k) * 3)));
    }

    #[test]
    fn test_matches_std_map() {
        let mut arena = Arena::new(1 << 16);
        let mut map = ArenaHashMap::<u32, u32>::new(&mut arena);
        let mut model = HashMap::new();
        for i in 0..3_000u32 {
            let key = i.wrapping_mul(40_503) % 512;
            match i % 4 {
                0 => assert_eq!(map.remove(&mut arena, &key), model.remove(&key)),
                _ => assert_eq!(map.insert(&mut arena, key, i), model.insert(key, i)),
            }
        }
        let collected: HashMap<u32, u32> = map.iter(&arena).collect();
        assert_eq!(collected, model);
        assert_eq!(map.keys(&arena).count(), model.len());

        map.clear(&mut arena);
        assert!(map.is_empty());
        assert_eq!(map.get(&arena, &0), None);
    }
}
