//! # Bit Vectors
//!
//! Set algebra and free-run search over 64-bit words.
//!
//! - [`BitOps`]: every operation, implemented once for `[u64]`
//! - [`BitVec`]: persistent, arena-backed, fixed capacity
//! - [`ScratchBits`]: transient, drawn from a [`ScratchArena`](crate::memory::ScratchArena)

mod arena_bits;
mod iter;
mod ops;
mod scratch_bits;

pub use arena_bits::{BitOp, BitVec};
pub use iter::Ones;
pub use ops::{words_for, BitOps, WORD_BITS};
pub use scratch_bits::ScratchBits;
