//! Set-bit iteration.

/// Iterator over the indices of set bits in a word slice.
///
/// Uses `trailing_zeros` to jump straight to the next set bit, so empty
/// regions cost one comparison per word.
pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current_word: u64,
}

impl<'a> Ones<'a> {
    /// Starts iterating over `words`.
    #[must_use]
    pub fn new(words: &'a [u64]) -> Self {
        Self {
            words,
            word_idx: 0,
            current_word: words.first().copied().unwrap_or(0),
        }
    }
}

impl Iterator for Ones<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit = self.current_word.trailing_zeros() as usize;
                // Clear lowest set bit
                self.current_word &= self.current_word - 1;
                return Some(self.word_idx * 64 + bit);
            }

            self.word_idx += 1;
            if self.word_idx >= self.words.len() {
                return None;
            }
            self.current_word = self.words[self.word_idx];
        }
    }
}
