//! # OROBOROS Storage
//!
//! The memory substrate under every component:
//! - Relocatable arena with handle-based addressing
//! - Growable containers living in the arena
//! - Bit vectors with a multi-granularity free-run search
//! - Paged generational sparse sets with per-page spinlocks
//!
//! ## Architecture Rules
//!
//! 1. **Handles, not pointers** - Anything stored long-term is an arena
//!    [`Handle`]; raw addresses are re-resolved after structural mutation
//! 2. **Explicit context** - The [`Arena`] is passed to every operation,
//!    there is no global allocator state
//! 3. **Page-granular contention** - Sparse-set workers only ever contend on
//!    one 64-id page
//!
//! ## Example
//!
//! ```rust,ignore
//! use oroboros_storage::{Arena, ArenaList, EntityKey, PagedSparseSet, StorageConfig};
//!
//! let config = StorageConfig::default();
//! let mut arena = Arena::from_config(&config)?;
//! let mut list = ArenaList::<u32>::new(&mut arena);
//! list.push(&mut arena, 7);
//!
//! let positions = PagedSparseSet::new(16, &config)?;
//! positions.set(EntityKey::new(5, 1), Some(&[0u8; 16]));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bits;
pub mod collections;
pub mod config;
pub mod error;
pub mod memory;
pub mod sparse;

pub use bits::{BitOp, BitOps, BitVec, ScratchBits};
pub use collections::{
    ArenaArray, ArenaHashMap, ArenaHashSet, ArenaList, ArenaQueue, ArenaStack, Growth,
};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use memory::{Arena, ArenaStats, Handle, PtrCache, ScratchArena, ScratchBuf, StableScope};
pub use sparse::{
    Component, ComponentSet, EntityKey, Generation, PagedSparseSet, TagSparseSet,
};
