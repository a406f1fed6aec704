//! # Arena Collections
//!
//! Growable containers whose elements live in an [`Arena`](crate::memory::Arena).
//!
//! Every container is a small `Copy` header (handle, length, capacity) and
//! every operation takes the arena explicitly: `&mut Arena` for anything
//! that may allocate, `&Arena` for reads. Element types are restricted to
//! [`bytemuck::Pod`] so the arena can move them with plain byte copies.
//!
//! Containers must be [`free`](ArenaList::free)d explicitly or reclaimed in
//! bulk with [`Arena::reset`](crate::memory::Arena::reset).

mod array;
mod growth;
mod hash_map;
mod hash_set;
mod list;
mod primes;
mod queue;
mod raw_table;
mod stack;

pub use array::ArenaArray;
pub use growth::{Growth, MIN_CAPACITY};
pub use hash_map::ArenaHashMap;
pub use hash_set::ArenaHashSet;
pub use list::ArenaList;
pub use primes::{is_prime, next_prime};
pub use queue::ArenaQueue;
pub use stack::ArenaStack;
