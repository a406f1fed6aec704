//! # Memory Management
//!
//! The arena every persistent container lives in, plus the scratch pool for
//! job-local data.
//!
//! ## Design Philosophy
//!
//! - Everything persistent is addressed by [`Handle`], never by pointer
//! - The arena is passed explicitly to every operation
//! - Raw pointers are only trusted inside a [`StableScope`]

mod arena;
mod cache;
mod handle;
mod scratch;

pub use arena::{Arena, ArenaStats, ALIGN};
pub use cache::{PtrCache, StableScope};
pub use handle::Handle;
pub use scratch::{ScratchArena, ScratchBuf};
