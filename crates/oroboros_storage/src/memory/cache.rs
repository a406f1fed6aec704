//! # Pointer Cache
//!
//! Resolving a handle costs a block lookup and a header read. Hot loops that
//! touch the same allocation many times can keep the resolved address in a
//! [`PtrCache`], tagged with the arena version it was captured at. A
//! mismatched version means something structural happened in between and
//! the cache re-resolves. The cache also remembers which arena it was filled
//! from, so handing it a different arena is a miss rather than a stale hit.
//!
//! [`StableScope`] is the "no structural mutation" promise made explicit: it
//! holds `&Arena`, so nothing can call `alloc`/`free`/`realloc` until it is
//! dropped.

// SAFETY: `StableScope::slice` rebuilds a slice from a cached address; the
// scope's shared borrow of the arena keeps that address valid.
#![allow(unsafe_code)]

use std::ptr::NonNull;

use bytemuck::Pod;

use super::arena::Arena;
use super::handle::Handle;

/// A resolved payload address tagged with the arena and version at capture.
#[derive(Clone, Copy, Debug)]
pub struct PtrCache {
    handle: Handle,
    ptr: Option<NonNull<u8>>,
    arena: u64,
    version: u64,
}

impl PtrCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handle: Handle::NULL,
            ptr: None,
            arena: 0,
            version: 0,
        }
    }

    /// Returns the cached address for `handle`, re-resolving through the
    /// arena if the cache is empty, was filled from another arena, holds
    /// another handle, or is stale.
    #[inline]
    pub fn resolve(&mut self, arena: &Arena, handle: Handle) -> NonNull<u8> {
        match self.ptr {
            Some(ptr) if self.handle == handle && self.is_current(arena) => ptr,
            _ => {
                let ptr = arena.resolve(handle);
                self.handle = handle;
                self.ptr = Some(ptr);
                self.arena = arena.id();
                self.version = arena.version();
                ptr
            }
        }
    }

    /// Whether the cached address is still usable against `arena`.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, arena: &Arena) -> bool {
        self.ptr.is_some() && self.is_current(arena)
    }

    #[inline]
    fn is_current(&self, arena: &Arena) -> bool {
        self.arena == arena.id() && self.version == arena.version()
    }

    /// Version the cached address was captured at.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Drops the cached address.
    #[inline]
    pub fn invalidate(&mut self) {
        self.ptr = None;
    }
}

impl Default for PtrCache {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: the cached pointer is only dereferenced through a `StableScope`
// borrowing the arena it was resolved from.
unsafe impl Send for PtrCache {}

/// A read-only window on the arena in which no structural mutation occurs.
pub struct StableScope<'a> {
    arena: &'a Arena,
}

impl<'a> StableScope<'a> {
    pub(crate) fn new(arena: &'a Arena) -> Self {
        Self { arena }
    }

    /// The arena this scope borrows.
    #[inline]
    #[must_use]
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Arena version, constant for the lifetime of the scope.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.arena.version()
    }

    /// Views `len` elements of `handle` as `T`, reusing `cache` when valid.
    #[inline]
    #[must_use]
    pub fn slice<T: Pod>(&self, cache: &mut PtrCache, handle: Handle, len: usize) -> &'a [T] {
        debug_assert!(
            len * std::mem::size_of::<T>() <= self.arena.len_of(handle),
            "Cached slice exceeds allocation"
        );
        let ptr = cache.resolve(self.arena, handle);
        debug_assert_eq!(
            ptr.as_ptr() as usize % std::mem::align_of::<T>(),
            0,
            "Misaligned cached slice"
        );
        // SAFETY: the address came from `arena.resolve` at the current
        // version, the allocation holds at least `len` elements, payloads
        // are 16-byte aligned, and `'a` borrows the arena so it cannot be
        // structurally mutated while the slice lives.
        unsafe { std::slice::from_raw_parts(ptr.as_ptr().cast::<T>(), len) }
    }
}
