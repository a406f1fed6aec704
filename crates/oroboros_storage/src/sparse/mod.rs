//! # Paged Sparse Sets
//!
//! Concurrent generational sparse sets for component storage.
//!
//! ## Design Philosophy
//!
//! - Ids are grouped into 64-id index pages, each with its own spinlock
//! - Live ids of a page stay packed in dense slots; removal swap-compacts
//! - Payloads sit in separately locked data pages
//! - A generation mismatch is a miss, never an error
//!
//! Dense slot positions are not stable: any removal in a page may move the
//! last payload of that page. Hold [`EntityKey`]s, never slot pointers.

mod entity;
mod lock;
mod page;
mod page_table;
mod set;
mod tag;
mod typed;

pub use entity::{EntityKey, Generation};
pub use lock::{SpinGuard, SpinLock};
pub use page::PAGE_SIZE;
pub use set::PagedSparseSet;
pub use tag::TagSparseSet;
pub use typed::{Component, ComponentSet};
