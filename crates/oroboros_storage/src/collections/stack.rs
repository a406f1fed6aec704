//! LIFO stack in the arena, a thin view over [`ArenaList`].

use bytemuck::Pod;

use super::growth::Growth;
use super::list::ArenaList;
use crate::memory::Arena;

/// Arena-backed stack.
#[derive(Debug)]
pub struct ArenaStack<T> {
    items: ArenaList<T>,
}

impl<T> Clone for ArenaStack<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaStack<T> {}

impl<T: Pod> ArenaStack<T> {
    /// Creates an empty stack.
    pub fn new(arena: &mut Arena) -> Self {
        Self {
            items: ArenaList::new(arena),
        }
    }

    /// Creates an empty stack with room for `capacity` elements.
    pub fn with_capacity(arena: &mut Arena, capacity: usize) -> Self {
        Self {
            items: ArenaList::with_capacity(arena, capacity),
        }
    }

    /// Replaces the growth policy.
    #[must_use]
    pub fn with_growth(self, growth: Growth) -> Self {
        Self {
            items: self.items.with_growth(growth),
        }
    }

    /// Pushes onto the top.
    #[inline]
    pub fn push(&mut self, arena: &mut Arena, value: T) {
        self.items.push(arena, value);
    }

    /// Pops the top element.
    #[inline]
    pub fn pop(&mut self, arena: &Arena) -> Option<T> {
        self.items.pop(arena)
    }

    /// Top element without removing it.
    #[inline]
    #[must_use]
    pub fn peek(&self, arena: &Arena) -> Option<T> {
        self.items.last(arena)
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the stack is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops all elements, keeping capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Elements bottom to top.
    #[inline]
    #[must_use]
    pub fn as_slice<'a>(&self, arena: &'a Arena) -> &'a [T] {
        self.items.as_slice(arena)
    }

    /// Releases the backing allocation.
    pub fn free(self, arena: &mut Arena) {
        self.items.free(arena);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_order() {
        let mut arena = Arena::new(4096);
        let mut stack = ArenaStack::<u32>::with_capacity(&mut arena, 1);
        for i in 0..20 {
            stack.push(&mut arena, i);
        }
        assert_eq!(stack.peek(&arena), Some(19));
        for i in (0..20).rev() {
            assert_eq!(stack.pop(&arena), Some(i));
        }
        assert!(stack.is_empty());
        assert_eq!(stack.peek(&arena), None);
    }
}
