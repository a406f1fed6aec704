//! # Arena Array
//!
//! Fixed-length array of plain-old-data living in the arena. Length only
//! changes through an explicit [`ArenaArray::resize`].

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

use crate::memory::{Arena, Handle};

/// Handle + length header for an array of `T` in the arena.
///
/// The header is `Copy`; the elements live in the arena and every access
/// takes the arena explicitly.
///
/// # Example
///
/// ```rust,ignore
/// let mut arr = ArenaArray::<u32>::new(&mut arena, 10);
/// arr.set(&mut arena, 3, 6);
/// arr.resize(&mut arena, 20, true); // [10, 20) zeroed
/// ```
pub struct ArenaArray<T> {
    handle: Handle,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T> Clone for ArenaArray<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaArray<T> {}

impl<T> fmt::Debug for ArenaArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaArray")
            .field("handle", &self.handle)
            .field("len", &self.len)
            .finish()
    }
}

impl<T: Pod> ArenaArray<T> {
    /// Allocates an array of `len` elements. Contents are unspecified.
    pub fn new(arena: &mut Arena, len: usize) -> Self {
        Self {
            handle: arena.alloc_array::<T>(len),
            len,
            _marker: PhantomData,
        }
    }

    /// Allocates a zeroed array of `len` elements.
    pub fn new_zeroed(arena: &mut Arena, len: usize) -> Self {
        let array = Self::new(arena, len);
        arena.bytes_mut(array.handle).fill(0);
        array
    }

    /// Allocates an array holding a copy of `values`.
    pub fn from_slice(arena: &mut Arena, values: &[T]) -> Self {
        let handle = arena.alloc_array::<T>(values.len());
        arena
            .slice_mut::<T>(handle, values.len())
            .copy_from_slice(values);
        Self {
            handle,
            len: values.len(),
            _marker: PhantomData,
        }
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Backing handle.
    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
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

    /// All elements.
    #[inline]
    #[must_use]
    pub fn as_slice<'a>(&self, arena: &'a Arena) -> &'a [T] {
        arena.slice::<T>(self.handle, self.len)
    }

    /// All elements, mutably.
    #[inline]
    pub fn as_mut_slice<'a>(&self, arena: &'a mut Arena) -> &'a mut [T] {
        arena.slice_mut::<T>(self.handle, self.len)
    }

    /// Overwrites every element with `value`.
    pub fn fill(&self, arena: &mut Arena, value: T) {
        self.as_mut_slice(arena).fill(value);
    }

    /// Changes the length, preserving elements `[0, min(old, new))` at
    /// their indices. With `clear_new`, only the added region is zeroed.
    pub fn resize(&mut self, arena: &mut Arena, new_len: usize, clear_new: bool) {
        let size = std::mem::size_of::<T>();
        self.handle = arena.realloc(self.handle, new_len * size);
        if clear_new && new_len > self.len {
            arena.mem_clear(self.handle, self.len * size, (new_len - self.len) * size);
        }
        self.len = new_len;
    }

    /// Releases the backing allocation.
    pub fn free(self, arena: &mut Arena) {
        arena.free(self.handle);
    }
}
