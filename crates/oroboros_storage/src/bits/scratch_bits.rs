//! Transient bit vector drawn from a [`ScratchArena`].

use std::ops::{Deref, DerefMut};

use super::ops::words_for;
use crate::memory::{ScratchArena, ScratchBuf};

/// Single-use bit vector whose storage never moves.
///
/// All of [`BitOps`](super::BitOps) is available through `Deref` to
/// `[u64]`. Call [`release`](Self::release) when done.
pub struct ScratchBits<'a> {
    buf: ScratchBuf<'a>,
}

impl<'a> ScratchBits<'a> {
    /// Takes a cleared vector of at least `bits` bits from `scratch`.
    #[must_use]
    pub fn new(scratch: &'a ScratchArena, bits: usize) -> Self {
        Self {
            buf: scratch.alloc_words(words_for(bits)),
        }
    }

    /// Takes a vector from `scratch` holding a copy of `words`.
    #[must_use]
    pub fn from_words(scratch: &'a ScratchArena, words: &[u64]) -> Self {
        let mut buf = scratch.alloc_words(words.len());
        buf.copy_from_slice(words);
        Self { buf }
    }

    /// Returns the storage to the scratch pool.
    #[inline]
    pub fn release(self) {
        self.buf.release();
    }
}

impl Deref for ScratchBits<'_> {
    type Target = [u64];

    #[inline]
    fn deref(&self) -> &[u64] {
        &self.buf
    }
}

impl DerefMut for ScratchBits<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u64] {
        &mut self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitOps;

    #[test]
    fn test_scratch_bits_algebra_and_release() {
        let scratch = ScratchArena::new(4);
        let mut a = ScratchBits::new(&scratch, 128);
        a.set_range(0, 10, true);
        let b = ScratchBits::from_words(&scratch, &[0b11, 0]);
        a.remove(&b);
        assert_eq!(a.count_bits(0, 128), 8);
        assert_eq!(a.find(0, 2), Some(0));
        assert_eq!(a.find(2, 2), Some(10));
        assert_eq!(scratch.outstanding(), 2);

        a.release();
        b.release();
        assert_eq!(scratch.outstanding(), 0);
        assert_eq!(scratch.idle_count(), 2);

        // Reused storage comes back cleared.
        let c = ScratchBits::new(&scratch, 64);
        assert_eq!(c.count_ones(), 0);
    }
}
