//! # Persistent Bit Vector
//!
//! Fixed-capacity bit vector stored in the arena, for long-lived bitsets
//! such as archetype signatures. Capacity only changes through an explicit
//! [`BitVec::resize`].

use super::ops::{words_for, BitOps, WORD_BITS};
use crate::collections::ArenaArray;
use crate::memory::Arena;

/// Word-wise operation applied by [`BitVec::combine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitOp {
    /// `self |= other`
    Union,
    /// `self &= other`
    Intersect,
    /// `self &= !other`
    Remove,
}

/// Arena-backed bit vector.
///
/// # Example
///
/// ```rust,ignore
/// let mut bits = BitVec::new(&mut arena, 256);
/// bits.words_mut(&mut arena).set(42, true);
/// assert_eq!(bits.words(&arena).find(0, 42), Some(0));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct BitVec {
    words: ArenaArray<u64>,
}

impl BitVec {
    /// Allocates a cleared vector holding at least `bits` bits.
    pub fn new(arena: &mut Arena, bits: usize) -> Self {
        Self {
            words: ArenaArray::new_zeroed(arena, words_for(bits)),
        }
    }

    /// Capacity in bits (a multiple of 64).
    #[inline]
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    /// Backing words.
    #[inline]
    #[must_use]
    pub fn words<'a>(&self, arena: &'a Arena) -> &'a [u64] {
        self.words.as_slice(arena)
    }

    /// Backing words, mutably.
    #[inline]
    pub fn words_mut<'a>(&self, arena: &'a mut Arena) -> &'a mut [u64] {
        self.words.as_mut_slice(arena)
    }

    /// Sets or clears bit `index`.
    #[inline]
    pub fn set(&self, arena: &mut Arena, index: usize, value: bool) {
        self.words_mut(arena).set(index, value);
    }

    /// Whether bit `index` is set.
    #[inline]
    #[must_use]
    pub fn is_set(&self, arena: &Arena, index: usize) -> bool {
        self.words(arena).is_set(index)
    }

    /// Grows or shrinks to hold at least `bits` bits. New bits are clear.
    pub fn resize(&mut self, arena: &mut Arena, bits: usize) {
        self.words.resize(arena, words_for(bits), true);
    }

    /// Applies `op` with `other` as the right-hand side.
    pub fn combine(&self, arena: &mut Arena, other: &BitVec, op: BitOp) {
        let (dst, src) = arena.slice_pair_mut::<u64>(
            self.words.handle(),
            self.words.len(),
            other.words.handle(),
            other.words.len(),
        );
        match op {
            BitOp::Union => dst.union(src),
            BitOp::Intersect => dst.intersect(src),
            BitOp::Remove => dst.remove(src),
        }
    }

    /// Releases the backing allocation.
    pub fn free(self, arena: &mut Arena) {
        self.words.free(arena);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_clear() {
        let mut arena = Arena::new(4096);
        let bits = BitVec::new(&mut arena, 100);
        assert_eq!(bits.bit_len(), 128);
        assert_eq!(bits.words(&arena).count_ones(), 0);
        assert_eq!(bits.words(&arena).find(0, 128), Some(0));
    }

    #[test]
    fn test_resize_zero_fills() {
        let mut arena = Arena::new(4096);
        let mut bits = BitVec::new(&mut arena, 64);
        bits.words_mut(&mut arena).invert();
        bits.resize(&mut arena, 1000);
        let words = bits.words(&arena);
        assert_eq!(words.count_ones(), 64);
        assert_eq!(words.find(0, 900), Some(64));
    }

    #[test]
    fn test_combine() {
        let mut arena = Arena::new(4096);
        let a = BitVec::new(&mut arena, 128);
        let b = BitVec::new(&mut arena, 64);
        a.set(&mut arena, 3, true);
        a.set(&mut arena, 100, true);
        b.set(&mut arena, 3, true);
        b.set(&mut arena, 7, true);

        a.combine(&mut arena, &b, BitOp::Union);
        assert_eq!(a.words(&arena).ones().collect::<Vec<_>>(), vec![3, 7, 100]);

        a.combine(&mut arena, &b, BitOp::Remove);
        assert_eq!(a.words(&arena).ones().collect::<Vec<_>>(), vec![100]);

        a.set(&mut arena, 7, true);
        a.combine(&mut arena, &b, BitOp::Intersect);
        // Word 1 lies past `b` and is cleared.
        assert_eq!(a.words(&arena).ones().collect::<Vec<_>>(), vec![7]);
        assert!(a.is_set(&arena, 7));
    }
}
