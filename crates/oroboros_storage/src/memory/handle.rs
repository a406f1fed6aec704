//! # Arena Handles
//!
//! A [`Handle`] names an allocation by `(block, offset)` instead of by
//! address, so it survives any arena growth that relocates raw pointers.

use std::fmt;

/// Relocatable reference to an arena allocation.
///
/// The offset points at the first payload byte; the allocation header sits
/// in the 16 bytes directly before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Handle {
    /// Index of the backing block.
    pub(crate) block: u32,
    /// Byte offset of the payload within the block.
    pub(crate) offset: u32,
}

impl Handle {
    /// The null handle. Resolving it is a programmer error.
    pub const NULL: Self = Self {
        block: u32::MAX,
        offset: 0,
    };

    #[inline]
    pub(crate) const fn new(block: u32, offset: u32) -> Self {
        Self { block, offset }
    }

    /// Returns `true` for [`Handle::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.block == u32::MAX
    }

    /// Index of the block this handle points into.
    #[inline]
    #[must_use]
    pub const fn block(self) -> u32 {
        self.block
    }

    /// Payload byte offset within the block.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.offset
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle(null)")
        } else {
            write!(f, "Handle(block={}, off={})", self.block, self.offset)
        }
    }
}
