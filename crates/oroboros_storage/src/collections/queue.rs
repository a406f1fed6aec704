//! # Arena Queue
//!
//! FIFO ring buffer in the arena.
//!
//! ```text
//!  capacity = 8, head = 5, len = 5
//!  [ d e . . . a b c ]
//!        ^tail  ^head
//! ```
//!
//! Growing a wrapped ring moves the `[head, old_capacity)` run to the end of
//! the new allocation so the logical order survives.

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

use super::growth::{Growth, MIN_CAPACITY};
use crate::memory::{Arena, Handle};

/// Ring-buffer queue header.
pub struct ArenaQueue<T> {
    handle: Handle,
    head: usize,
    len: usize,
    capacity: usize,
    growth: Growth,
    _marker: PhantomData<T>,
}

impl<T> Clone for ArenaQueue<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaQueue<T> {}

impl<T> fmt::Debug for ArenaQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaQueue")
            .field("handle", &self.handle)
            .field("head", &self.head)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T: Pod> ArenaQueue<T> {
    /// Creates an empty queue.
    pub fn new(arena: &mut Arena) -> Self {
        Self::with_capacity(arena, MIN_CAPACITY)
    }

    /// Creates an empty queue with room for `capacity` elements.
    pub fn with_capacity(arena: &mut Arena, capacity: usize) -> Self {
        Self {
            handle: arena.alloc_array::<T>(capacity),
            head: 0,
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

    /// Number of queued elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements the ring can hold before growing.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends to the back.
    pub fn push_back(&mut self, arena: &mut Arena, value: T) {
        if self.len == self.capacity {
            self.grow(arena);
        }
        let tail = (self.head + self.len) % self.capacity;
        arena.slice_mut::<T>(self.handle, self.capacity)[tail] = value;
        self.len += 1;
    }

    /// Removes from the front.
    pub fn pop_front(&mut self, arena: &Arena) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = arena.slice::<T>(self.handle, self.capacity)[self.head];
        self.head = (self.head + 1) % self.capacity;
        self.len -= 1;
        Some(value)
    }

    /// Front element without removing it.
    #[must_use]
    pub fn peek_front(&self, arena: &Arena) -> Option<T> {
        (self.len > 0).then(|| arena.slice::<T>(self.handle, self.capacity)[self.head])
    }

    /// Element at logical position `index` (0 = front).
    #[must_use]
    pub fn get(&self, arena: &Arena, index: usize) -> Option<T> {
        (index < self.len)
            .then(|| arena.slice::<T>(self.handle, self.capacity)[(self.head + index) % self.capacity])
    }

    /// Iterates front to back.
    pub fn iter<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = T> + 'a {
        let data = arena.slice::<T>(self.handle, self.capacity);
        let (head, len, capacity) = (self.head, self.len, self.capacity);
        (0..len).map(move |i| data[(head + i) % capacity])
    }

    /// Drops all elements, keeping capacity.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Releases the backing allocation.
    pub fn free(self, arena: &mut Arena) {
        arena.free(self.handle);
    }

    fn grow(&mut self, arena: &mut Arena) {
        let size = std::mem::size_of::<T>();
        let old_capacity = self.capacity;
        let new_capacity = self.growth.next_capacity(old_capacity, old_capacity + 1);
        self.handle = arena.realloc(self.handle, new_capacity * size);

        // Unwrap: move the run that started at `head` to the end.
        if self.head + self.len > old_capacity {
            let run = old_capacity - self.head;
            let new_head = new_capacity - run;
            arena.mem_move(self.handle, self.head * size, new_head * size, run * size);
            self.head = new_head;
        }
        self.capacity = new_capacity;
    }
}
