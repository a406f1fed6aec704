//! # Arena List
//!
//! Growable vector of plain-old-data in the arena.

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

use super::growth::Growth;
use crate::memory::{Arena, Handle};

/// Handle + length + capacity header for a growable list of `T`.
///
/// # Example
///
/// ```rust,ignore
/// let mut list = ArenaList::<u32>::new(&mut arena);
/// list.push(&mut arena, 1);
/// list.push(&mut arena, 2);
/// assert_eq!(list.as_slice(&arena), &[1, 2]);
/// ```
pub struct ArenaList<T> {
    handle: Handle,
    len: usize,
    capacity: usize,
    growth: Growth,
    _marker: PhantomData<T>,
}

impl<T> Clone for ArenaList<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaList<T> {}

impl<T> fmt::Debug for ArenaList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaList")
            .field("handle", &self.handle)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T: Pod> ArenaList<T> {
    /// Creates an empty list with a small initial capacity.
    pub fn new(arena: &mut Arena) -> Self {
        Self::with_capacity(arena, super::growth::MIN_CAPACITY)
    }

    /// Creates an empty list with room for `capacity` elements.
    pub fn with_capacity(arena: &mut Arena, capacity: usize) -> Self {
        Self {
            handle: arena.alloc_array::<T>(capacity),
            len: 0,
            capacity,
            growth: Growth::Doubling,
            _marker: PhantomData,
        }
    }

    /// Replaces the growth policy.
    #[must_use]
    pub fn with_growth(mut self, growth: Growth) -> Self {
        self.growth = growth;
        self
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements the list can hold before growing.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Backing handle. Changes whenever the list grows.
    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Ensures room for `additional` more elements.
    pub fn reserve(&mut self, arena: &mut Arena, additional: usize) {
        let required = self.len + additional;
        if required > self.capacity {
            let new_capacity = self.growth.next_capacity(self.capacity, required);
            self.handle = arena.realloc(self.handle, new_capacity * std::mem::size_of::<T>());
            self.capacity = new_capacity;
        }
    }

    /// Appends an element.
    pub fn push(&mut self, arena: &mut Arena, value: T) {
        self.reserve(arena, 1);
        arena.slice_mut::<T>(self.handle, self.len + 1)[self.len] = value;
        self.len += 1;
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self, arena: &Arena) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(arena.slice::<T>(self.handle, self.len + 1)[self.len])
    }

    /// Inserts at `index`, shifting later elements right.
    pub fn insert(&mut self, arena: &mut Arena, index: usize, value: T) {
        debug_assert!(index <= self.len, "Insert index {index} out of bounds ({})", self.len);
        self.reserve(arena, 1);
        let data = arena.slice_mut::<T>(self.handle, self.len + 1);
        data.copy_within(index..self.len, index + 1);
        data[index] = value;
        self.len += 1;
    }

    /// Removes `index`, shifting later elements left.
    pub fn remove(&mut self, arena: &mut Arena, index: usize) -> T {
        debug_assert!(index < self.len, "Remove index {index} out of bounds ({})", self.len);
        let data = arena.slice_mut::<T>(self.handle, self.len);
        let value = data[index];
        data.copy_within(index + 1.., index);
        self.len -= 1;
        value
    }

    /// Removes `index` by moving the last element into its place.
    pub fn swap_remove(&mut self, arena: &mut Arena, index: usize) -> T {
        debug_assert!(index < self.len, "Remove index {index} out of bounds ({})", self.len);
        let data = arena.slice_mut::<T>(self.handle, self.len);
        let value = data[index];
        data[index] = data[self.len - 1];
        self.len -= 1;
        value
    }

    /// Reads element `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, arena: &Arena, index: usize) -> T {
        debug_assert!(index < self.len, "Index {index} out of bounds ({})", self.len);
        self.as_slice(arena)[index]
    }

    /// Writes element `index`.
    #[inline]
    pub fn set(&self, arena: &mut Arena, index: usize, value: T) {
        debug_assert!(index < self.len, "Index {index} out of bounds ({})", self.len);
        self.as_mut_slice(arena)[index] = value;
    }

    /// Last element, if any.
    #[must_use]
    pub fn last(&self, arena: &Arena) -> Option<T> {
        self.as_slice(arena).last().copied()
    }

    /// Drops all elements, keeping capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Shortens the list to `len` elements.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    /// Live elements.
    #[inline]
    #[must_use]
    pub fn as_slice<'a>(&self, arena: &'a Arena) -> &'a [T] {
        arena.slice::<T>(self.handle, self.len)
    }

    /// Live elements, mutably.
    #[inline]
    pub fn as_mut_slice<'a>(&self, arena: &'a mut Arena) -> &'a mut [T] {
        arena.slice_mut::<T>(self.handle, self.len)
    }

    /// Iterates over copies of the live elements.
    pub fn iter<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = T> + 'a {
        self.as_slice(arena).iter().copied()
    }

    /// Releases the backing allocation.
    pub fn free(self, arena: &mut Arena) {
        arena.free(self.handle);
    }
}

impl<T: Pod + PartialEq> ArenaList<T> {
    /// Whether any element equals `value`.
    #[must_use]
    pub fn contains(&self, arena: &Arena, value: &T) -> bool {
        self.as_slice(arena).contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut arena = Arena::new(4096);
        let mut list = ArenaList::<u32>::new(&mut arena);
        for i in 0..100 {
            list.push(&mut arena, i);
        }
        assert_eq!(list.len(), 100);
        assert!(list.capacity() >= 100);
        assert_eq!(list.pop(&arena), Some(99));
        assert_eq!(list.get(&arena, 42), 42);
        assert!(list.iter(&arena).eq(0..99));
    }

    #[test]
    fn test_growth_preserves_elements() {
        let mut arena = Arena::new(1024);
        let mut list = ArenaList::<u64>::with_capacity(&mut arena, 2).with_growth(Growth::Factor(1.5));
        for i in 0..50u64 {
            list.push(&mut arena, i * i);
        }
        assert!(list.as_slice(&arena).iter().enumerate().all(|(i, &v)| v == (i * i) as u64));
    }

    #[test]
    fn test_insert_remove() {
        let mut arena = Arena::new(4096);
        let mut list = ArenaList::<u8>::new(&mut arena);
        for v in [1, 2, 4] {
            list.push(&mut arena, v);
        }
        list.insert(&mut arena, 2, 3);
        list.insert(&mut arena, 0, 0);
        assert_eq!(list.as_slice(&arena), &[0, 1, 2, 3, 4]);

        assert_eq!(list.remove(&mut arena, 1), 1);
        assert_eq!(list.as_slice(&arena), &[0, 2, 3, 4]);

        assert_eq!(list.swap_remove(&mut arena, 0), 0);
        assert_eq!(list.as_slice(&arena), &[4, 2, 3]);
        assert!(list.contains(&arena, &2));
        assert!(!list.contains(&arena, &0));
    }

    #[test]
    fn test_empty_pop_and_clear() {
        let mut arena = Arena::new(4096);
        let mut list = ArenaList::<i16>::new(&mut arena);
        assert_eq!(list.pop(&arena), None);
        list.push(&mut arena, -1);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.last(&arena), None);
    }
}
