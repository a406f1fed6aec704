//! # Bit Operations
//!
//! [`BitOps`] works on any `[u64]` word slice, so the arena-backed
//! [`BitVec`](super::BitVec) and the pooled [`ScratchBits`](super::ScratchBits)
//! share one implementation.
//!
//! Bit `i` lives in word `i / 64` at position `i % 64` (LSB first).
//!
//! ## Find
//!
//! [`BitOps::find`] looks for the first run of `n` unset bits at or after
//! `pos`. It walks 64-bit words and keeps a running zero run across word
//! boundaries:
//!
//! - an all-zero unit extends the run
//! - an all-one unit breaks it
//! - a mixed unit extends the run by its trailing zeros, then restarts it
//!   from its leading zeros
//!
//! A run that touches neither edge of a mixed unit is at most `width - 2`
//! bits long, so only for `n <= width - 2` does the scan split the unit into
//! halves (64 → 32 → 16 → 8) and finally walk single bits.

use super::iter::Ones;

/// Bits per word.
pub const WORD_BITS: usize = 64;

/// Number of words needed for `bits` bits.
#[inline]
#[must_use]
pub const fn words_for(bits: usize) -> usize {
    (bits + WORD_BITS - 1) / WORD_BITS
}

/// Bit-vector operations over a word slice.
pub trait BitOps {
    /// Number of addressable bits.
    fn bit_len(&self) -> usize;

    /// Sets or clears bit `index`.
    fn set(&mut self, index: usize, value: bool);

    /// Whether bit `index` is set.
    fn is_set(&self, index: usize) -> bool;

    /// Sets or clears every bit in `[start, end)`.
    fn set_range(&mut self, start: usize, end: usize, value: bool);

    /// Clears every bit.
    fn clear_all(&mut self);

    /// `self |= other` over the overlapping words.
    fn union(&mut self, other: &[u64]);

    /// `self &= other`. Words past the end of `other` are cleared.
    fn intersect(&mut self, other: &[u64]);

    /// `self &= !other` over the overlapping words.
    fn remove(&mut self, other: &[u64]);

    /// Flips every bit.
    fn invert(&mut self);

    /// Number of set bits in `[pos, pos + num_bits)`.
    fn count_bits(&self, pos: usize, num_bits: usize) -> usize;

    /// Total number of set bits.
    fn count_ones(&self) -> usize;

    /// Whether any bit in `[pos, pos + num_bits)` is set.
    fn test_any(&self, pos: usize, num_bits: usize) -> bool;

    /// Whether every bit in `[pos, pos + num_bits)` is set.
    fn test_all(&self, pos: usize, num_bits: usize) -> bool;

    /// Whether no bit in `[pos, pos + num_bits)` is set.
    fn test_none(&self, pos: usize, num_bits: usize) -> bool {
        !self.test_any(pos, num_bits)
    }

    /// Smallest index `>= pos` where `num_bits` consecutive unset bits
    /// begin.
    fn find(&self, pos: usize, num_bits: usize) -> Option<usize>;

    /// Iterates over the indices of set bits.
    fn ones(&self) -> Ones<'_>;
}

/// Yields `(word_index, mask)` for every word touched by `[start, end)`.
fn range_masks(start: usize, end: usize) -> impl Iterator<Item = (usize, u64)> {
    let first = start / WORD_BITS;
    let last = if end > start { (end - 1) / WORD_BITS + 1 } else { first };
    (first..last).map(move |w| {
        let lo = start.max(w * WORD_BITS) - w * WORD_BITS;
        let hi = end.min((w + 1) * WORD_BITS) - w * WORD_BITS;
        (w, mask_between(lo, hi))
    })
}

/// Mask with bits `[lo, hi)` set, `hi <= 64`.
#[inline]
fn mask_between(lo: usize, hi: usize) -> u64 {
    let upper = if hi >= WORD_BITS { u64::MAX } else { (1u64 << hi) - 1 };
    let lower = (1u64 << lo) - 1;
    upper & !lower
}

#[inline]
fn full_mask(width: u32) -> u64 {
    if width as usize >= WORD_BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Running zero run carried across units.
#[derive(Clone, Copy, Debug, Default)]
struct Run {
    start: usize,
    len: usize,
}

impl Run {
    #[inline]
    fn extend(&mut self, at: usize, by: usize) {
        if self.len == 0 {
            self.start = at;
        }
        self.len += by;
    }
}

/// Scans one unit of `width` bits whose bit 0 is global index `base`.
fn scan_unit(value: u64, width: u32, base: usize, n: usize, run: &mut Run) -> Option<usize> {
    let full = full_mask(width);
    let value = value & full;

    if value == 0 {
        run.extend(base, width as usize);
        return (run.len >= n).then_some(run.start);
    }
    if value == full {
        run.len = 0;
        return None;
    }

    // Mixed unit. A short run may hide inside; look closer.
    if n + 2 <= width as usize {
        if width > 8 {
            let half = width / 2;
            return scan_unit(value, half, base, n, run)
                .or_else(|| scan_unit(value >> half, half, base + half as usize, n, run));
        }
        for bit in 0..width as usize {
            if value >> bit & 1 == 1 {
                run.len = 0;
            } else {
                run.extend(base + bit, 1);
                if run.len >= n {
                    return Some(run.start);
                }
            }
        }
        return None;
    }

    // Only edge runs can be long enough.
    let trailing = value.trailing_zeros() as usize;
    run.extend(base, trailing);
    if trailing > 0 && run.len >= n {
        return Some(run.start);
    }
    let leading = (value.leading_zeros() - (64 - width)) as usize;
    run.len = leading;
    run.start = base + width as usize - leading;
    (leading > 0 && run.len >= n).then_some(run.start)
}

impl BitOps for [u64] {
    #[inline]
    fn bit_len(&self) -> usize {
        self.len() * WORD_BITS
    }

    #[inline]
    fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.bit_len(), "Bit {index} out of bounds");
        let mask = 1u64 << (index % WORD_BITS);
        let word = &mut self[index / WORD_BITS];
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    #[inline]
    fn is_set(&self, index: usize) -> bool {
        debug_assert!(index < self.bit_len(), "Bit {index} out of bounds");
        (self[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    fn set_range(&mut self, start: usize, end: usize, value: bool) {
        debug_assert!(end <= self.bit_len(), "Range end {end} out of bounds");
        for (w, mask) in range_masks(start, end) {
            if value {
                self[w] |= mask;
            } else {
                self[w] &= !mask;
            }
        }
    }

    fn clear_all(&mut self) {
        self.fill(0);
    }

    fn union(&mut self, other: &[u64]) {
        for (a, b) in self.iter_mut().zip(other) {
            *a |= b;
        }
    }

    fn intersect(&mut self, other: &[u64]) {
        let overlap = self.len().min(other.len());
        for (a, b) in self[..overlap].iter_mut().zip(other) {
            *a &= b;
        }
        self[overlap..].fill(0);
    }

    fn remove(&mut self, other: &[u64]) {
        for (a, b) in self.iter_mut().zip(other) {
            *a &= !b;
        }
    }

    fn invert(&mut self) {
        for word in self.iter_mut() {
            *word = !*word;
        }
    }

    fn count_bits(&self, pos: usize, num_bits: usize) -> usize {
        let end = (pos + num_bits).min(self.bit_len());
        range_masks(pos, end)
            .map(|(w, mask)| (self[w] & mask).count_ones() as usize)
            .sum()
    }

    fn count_ones(&self) -> usize {
        self.iter().map(|w| w.count_ones() as usize).sum()
    }

    fn test_any(&self, pos: usize, num_bits: usize) -> bool {
        let end = (pos + num_bits).min(self.bit_len());
        range_masks(pos, end).any(|(w, mask)| self[w] & mask != 0)
    }

    fn test_all(&self, pos: usize, num_bits: usize) -> bool {
        let end = pos + num_bits;
        if end > self.bit_len() {
            return false;
        }
        range_masks(pos, end).all(|(w, mask)| self[w] & mask == mask)
    }

    fn find(&self, pos: usize, num_bits: usize) -> Option<usize> {
        let bit_len = self.bit_len();
        if num_bits == 0 {
            return (pos <= bit_len).then_some(pos);
        }
        if pos >= bit_len {
            return None;
        }

        let first = pos / WORD_BITS;
        let below_pos = (1u64 << (pos % WORD_BITS)) - 1;
        let mut run = Run::default();

        for (w, &word) in self.iter().enumerate().skip(first) {
            let word = if w == first { word | below_pos } else { word };
            if let Some(start) = scan_unit(word, 64, w * WORD_BITS, num_bits, &mut run) {
                return Some(start);
            }
        }
        None
    }

    fn ones(&self) -> Ones<'_> {
        Ones::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_find(words: &[u64], pos: usize, n: usize) -> Option<usize> {
        let len = words.bit_len();
        if n == 0 {
            return (pos <= len).then_some(pos);
        }
        (pos..len.saturating_sub(n - 1)).find(|&s| (s..s + n).all(|i| !words.is_set(i)))
    }

    #[test]
    fn test_set_and_range() {
        let mut words = [0u64; 3];
        words.set(5, true);
        words.set(130, true);
        assert!(words.is_set(5));
        assert!(!words.is_set(6));
        words.set_range(60, 70, true);
        assert_eq!(words.count_bits(0, 192), 12);
        assert!(words.test_all(60, 10));
        assert!(!words.test_all(59, 10));
        words.set_range(62, 66, false);
        assert_eq!(words.count_bits(60, 10), 6);
        words.set(5, false);
        assert!(words.test_none(0, 60));
    }

    #[test]
    fn test_algebra() {
        let a = [0b1100u64, u64::MAX];
        let b = [0b1010u64];

        let mut u = a;
        u.union(&b);
        assert_eq!(u, [0b1110, u64::MAX]);

        let mut i = a;
        i.intersect(&b);
        assert_eq!(i, [0b1000, 0]);

        let mut r = a;
        r.remove(&b);
        assert_eq!(r, [0b0100, u64::MAX]);

        let mut inv = a;
        inv.invert();
        inv.invert();
        assert_eq!(inv, a);
    }

    #[test]
    fn test_union_then_intersect_restores_domain() {
        let a = [0xF0F0_u64, 0x1234];
        let b = [0x0FF0_u64, 0xFFFF];
        let mut v = a;
        v.union(&b);
        v.intersect(&b);
        assert_eq!(v, b);
    }

    #[test]
    fn test_find_basics() {
        let mut words = [u64::MAX; 2];
        assert_eq!(words.find(0, 1), None);
        assert_eq!(words.find(0, 0), Some(0));
        assert_eq!(words.find(128, 0), Some(128));
        assert_eq!(words.find(129, 0), None);

        words.set_range(62, 67, false);
        assert_eq!(words.find(0, 5), Some(62));
        assert_eq!(words.find(0, 6), None);
        assert_eq!(words.find(63, 3), Some(63));
        assert_eq!(words.find(0, 2), Some(62));

        words.set(100, false);
        assert_eq!(words.find(67, 1), Some(100));
    }

    #[test]
    fn test_find_inside_small_units() {
        // Run of 3 strictly inside a byte: bits 10..13.
        let mut words = [u64::MAX];
        words.set_range(10, 13, false);
        assert_eq!(words.find(0, 3), Some(10));
        assert_eq!(words.find(11, 2), Some(11));
        assert_eq!(words.find(0, 4), None);
    }

    #[test]
    fn test_find_matches_brute_force_patterns() {
        let patterns: [u64; 6] = [
            0,
            u64::MAX,
            0x8000_0000_0000_0001,
            0x00FF_00FF_0F0F_3333,
            0xF000_0000_0000_000F,
            0x0101_0101_0101_0101,
        ];
        for &a in &patterns {
            for &b in &patterns {
                let words = [a, b, !a];
                for n in [0, 1, 2, 3, 6, 7, 8, 15, 31, 62, 63, 64, 65, 100] {
                    for pos in [0, 1, 7, 63, 64, 100, 191] {
                        assert_eq!(
                            words.find(pos, n),
                            brute_find(&words, pos, n),
                            "words={words:x?} pos={pos} n={n}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_ones_iterator() {
        let mut words = [0u64; 3];
        for i in [0, 63, 64, 150] {
            words.set(i, true);
        }
        assert_eq!(words.ones().collect::<Vec<_>>(), vec![0, 63, 64, 150]);
        assert_eq!(words.count_ones(), 4);
    }
}
