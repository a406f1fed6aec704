//! # Arena Allocator
//!
//! Block-based allocator addressed through relocatable [`Handle`]s.
//!
//! ## Layout
//!
//! ```text
//! Block 0: [hdr|payload....][hdr|payload..][hdr|payload......]   free
//!                ^ Handle { block: 0, offset: 16 }               ^ cursor
//! Block 1: [hdr|payload..........................]
//! ```
//!
//! Every allocation is rounded up to a power-of-two size class and preceded
//! by a 16-byte header. Freed allocations are kept on per-class free lists
//! and handed out again before the bump cursor advances.
//!
//! ## Versioning
//!
//! The arena carries a version counter that changes whenever a structural
//! operation could invalidate a raw pointer obtained from [`Arena::resolve`]:
//! adding a block, freeing, relocating in [`Arena::realloc`], and resetting.
//! [`PtrCache`](super::PtrCache) compares against it.
//!
//! ## Thread Safety
//!
//! Structural mutation takes `&mut self`; resolution takes `&self`. Any
//! number of threads may resolve concurrently as long as nobody holds the
//! arena mutably, which the borrow checker enforces.

// SAFETY: Blocks are raw 16-byte-aligned allocations. All unsafe is confined
// to `Block` and is documented at each site.
#![allow(unsafe_code)]

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ops::Range;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};

use super::cache::StableScope;
use super::handle::Handle;
use crate::config::StorageConfig;
use crate::error::StorageResult;

/// Alignment of every payload returned by the arena.
pub const ALIGN: usize = 16;

/// Bytes reserved in front of every payload.
const HEADER_BYTES: usize = 16;

/// Smallest size class payload.
const MIN_CLASS_BYTES: usize = 16;

/// Number of size classes (16 B up to 32 GiB).
const SIZE_CLASSES: usize = 32;

/// Source of per-arena identities.
static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

const STATE_LIVE: u32 = 0xA11C_0CED;
const STATE_FREE: u32 = 0xF4EE_D00D;

/// Per-allocation bookkeeping stored in front of the payload.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
struct AllocHeader {
    /// Requested payload length in bytes.
    len: u32,
    /// Size class index.
    class: u32,
    /// `STATE_LIVE` or `STATE_FREE`.
    state: u32,
    /// Padding to keep payloads 16-byte aligned.
    _reserved: u32,
}

/// Returns the size class that fits `size` payload bytes.
#[inline]
fn class_for(size: usize) -> usize {
    let cap = size.max(MIN_CLASS_BYTES).next_power_of_two();
    (cap.trailing_zeros() - MIN_CLASS_BYTES.trailing_zeros()) as usize
}

/// Payload capacity of a size class.
#[inline]
const fn class_capacity(class: usize) -> usize {
    MIN_CLASS_BYTES << class
}

/// A single zeroed, 16-byte-aligned backing block with a bump cursor.
struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
    cursor: usize,
}

impl Block {
    fn new(size: usize) -> Self {
        let layout = Layout::from_size_align(size.max(ALIGN), ALIGN).expect("Invalid layout");

        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };

        Self {
            ptr,
            layout,
            cursor: 0,
        }
    }

    #[inline]
    fn size(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.size() - self.cursor
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        // SAFETY: ptr is valid for layout.size() initialised (zeroed) bytes
        // for as long as the block lives.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.size()) }
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size()) }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated in `Block::new` with this layout.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

// SAFETY: Block owns its allocation outright; shared access is read-only.
unsafe impl Send for Block {}
// SAFETY: &Block only hands out shared byte slices.
unsafe impl Sync for Block {}

/// Arena usage statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Number of backing blocks.
    pub blocks: usize,
    /// Total bytes reserved across all blocks.
    pub reserved_bytes: usize,
    /// Bytes handed out by the bump cursors (headers included).
    pub used_bytes: usize,
    /// Allocations currently live.
    pub live_allocations: usize,
    /// Allocations sitting on free lists.
    pub free_allocations: usize,
    /// Current arena version.
    pub version: u64,
}

/// Growable, relocatable-handle arena.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new(1 << 20);
/// let h = arena.alloc_array::<u32>(10);
/// arena.slice_mut::<u32>(h, 10)[3] = 42;
/// let h = arena.realloc(h, 20 * 4); // may relocate
/// assert_eq!(arena.slice::<u32>(h, 20)[3], 42);
/// ```
pub struct Arena {
    blocks: Vec<Block>,
    /// Block currently being bump-allocated from.
    current: usize,
    block_bytes: usize,
    free_lists: Vec<Vec<Handle>>,
    version: u64,
    live: usize,
    /// Process-unique identity, never reused.
    id: u64,
}

impl Arena {
    /// Creates an arena whose regular blocks hold `block_bytes` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `block_bytes` is smaller than one minimum allocation.
    #[must_use]
    pub fn new(block_bytes: usize) -> Self {
        assert!(
            block_bytes >= HEADER_BYTES + MIN_CLASS_BYTES,
            "Block size must fit at least one allocation"
        );
        Self {
            blocks: vec![Block::new(block_bytes)],
            current: 0,
            block_bytes,
            free_lists: (0..SIZE_CLASSES).map(|_| Vec::new()).collect(),
            version: 0,
            live: 0,
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Creates an arena from a validated [`StorageConfig`].
    ///
    /// # Errors
    ///
    /// Returns the validation error if the config is out of range.
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self::new(config.arena_block_bytes))
    }

    /// Process-unique identity of this arena. Two arenas never share one,
    /// even when their versions and handles coincide.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current structural version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Enters a stable scope: no structural mutation is possible while the
    /// returned scope is alive, so cached pointers stay valid inside it.
    #[inline]
    pub fn stable(&self) -> StableScope<'_> {
        StableScope::new(self)
    }

    // =========================================================================
    // Structural operations
    // =========================================================================

    /// Allocates `size` bytes. Contents are unspecified (stale bytes when a
    /// free-listed allocation is reused).
    ///
    /// # Panics
    ///
    /// Panics if `size` does not fit in `u32` (4 GiB and up).
    pub fn alloc(&mut self, size: usize) -> Handle {
        let len = u32::try_from(size).expect("Allocation exceeds the 4 GiB handle range");
        let class = class_for(size);
        let handle = match self.free_lists[class].pop() {
            Some(handle) => handle,
            None => self.bump(class),
        };

        *self.header_mut(handle) = AllocHeader {
            len,
            class: class as u32,
            state: STATE_LIVE,
            _reserved: 0,
        };
        self.live += 1;
        handle
    }

    /// Allocates `size` zeroed bytes.
    pub fn alloc_zeroed(&mut self, size: usize) -> Handle {
        let handle = self.alloc(size);
        self.bytes_mut(handle).fill(0);
        handle
    }

    /// Allocates room for `count` values of `T`.
    pub fn alloc_array<T: Pod>(&mut self, count: usize) -> Handle {
        debug_assert!(
            std::mem::align_of::<T>() <= ALIGN,
            "Element alignment exceeds arena alignment"
        );
        self.alloc(count * std::mem::size_of::<T>())
    }

    /// Releases an allocation. The handle must not be used again.
    pub fn free(&mut self, handle: Handle) {
        self.debug_check(handle);
        let header = self.header_mut(handle);
        header.state = STATE_FREE;
        let class = header.class as usize;
        self.free_lists[class].push(handle);
        self.live -= 1;
        self.version += 1;
    }

    /// Resizes an allocation to `new_size` bytes, preserving the first
    /// `min(old, new)` bytes.
    ///
    /// Stays in place when the size class still fits; otherwise moves the
    /// contents to a new allocation, frees the old one and bumps the
    /// version. Bytes past the old length are unspecified.
    ///
    /// # Panics
    ///
    /// Panics if `new_size` does not fit in `u32` (4 GiB and up).
    pub fn realloc(&mut self, handle: Handle, new_size: usize) -> Handle {
        let len = u32::try_from(new_size).expect("Allocation exceeds the 4 GiB handle range");
        self.debug_check(handle);
        let header = self.header(handle);
        if new_size <= class_capacity(header.class as usize) {
            self.header_mut(handle).len = len;
            return handle;
        }

        let moved = self.alloc(new_size);
        let keep = (header.len as usize).min(new_size);
        self.mem_copy(handle, 0, moved, 0, keep);
        self.free(handle);

        tracing::debug!(
            from = %handle,
            to = %moved,
            bytes = new_size,
            "arena allocation relocated"
        );
        moved
    }

    /// Drops every block but the first and forgets all allocations.
    pub fn reset(&mut self) {
        self.blocks.truncate(1);
        let first = &mut self.blocks[0];
        let used = first.cursor;
        first.bytes_mut()[..used].fill(0);
        first.cursor = 0;
        self.current = 0;
        for list in &mut self.free_lists {
            list.clear();
        }
        self.live = 0;
        self.version += 1;
        tracing::debug!(version = self.version, "arena reset");
    }

    fn bump(&mut self, class: usize) -> Handle {
        let total = HEADER_BYTES + class_capacity(class);

        // Oversized requests get a dedicated block and leave `current` alone.
        if total > self.block_bytes {
            let index = self.push_block(total);
            self.blocks[index].cursor = total;
            return Handle::new(index as u32, HEADER_BYTES as u32);
        }

        if self.blocks[self.current].remaining() < total {
            self.current = self.push_block(self.block_bytes);
        }

        let block = &mut self.blocks[self.current];
        let offset = block.cursor + HEADER_BYTES;
        block.cursor += total;
        Handle::new(self.current as u32, offset as u32)
    }

    fn push_block(&mut self, size: usize) -> usize {
        self.blocks.push(Block::new(size));
        self.version += 1;
        let index = self.blocks.len() - 1;
        tracing::debug!(block = index, bytes = size, "arena block added");
        index
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolves a handle to its payload address.
    ///
    /// The pointer is valid until the next structural mutation and is only
    /// suitable for reads; use [`resolve_mut`](Self::resolve_mut) to write.
    #[inline]
    #[must_use]
    pub fn resolve(&self, handle: Handle) -> NonNull<u8> {
        self.debug_check(handle);
        let block = &self.blocks[handle.block as usize];
        NonNull::from(&block.bytes()[handle.offset as usize..]).cast::<u8>()
    }

    /// Resolves a handle to a writable payload address.
    #[inline]
    #[must_use]
    pub fn resolve_mut(&mut self, handle: Handle) -> NonNull<u8> {
        self.debug_check(handle);
        let block = &mut self.blocks[handle.block as usize];
        NonNull::from(&mut block.bytes_mut()[handle.offset as usize..]).cast::<u8>()
    }

    /// Requested length of an allocation in bytes.
    #[inline]
    #[must_use]
    pub fn len_of(&self, handle: Handle) -> usize {
        self.debug_check(handle);
        self.header(handle).len as usize
    }

    /// Usable capacity of an allocation before `realloc` must relocate.
    #[inline]
    #[must_use]
    pub fn capacity_of(&self, handle: Handle) -> usize {
        self.debug_check(handle);
        class_capacity(self.header(handle).class as usize)
    }

    /// Payload bytes of an allocation.
    #[inline]
    #[must_use]
    pub fn bytes(&self, handle: Handle) -> &[u8] {
        let (block, range) = self.locate(handle);
        &self.blocks[block].bytes()[range]
    }

    /// Mutable payload bytes of an allocation.
    #[inline]
    pub fn bytes_mut(&mut self, handle: Handle) -> &mut [u8] {
        let (block, range) = self.locate(handle);
        &mut self.blocks[block].bytes_mut()[range]
    }

    /// Views the first `len` elements of an allocation as `T`.
    #[inline]
    #[must_use]
    pub fn slice<T: Pod>(&self, handle: Handle, len: usize) -> &[T] {
        let bytes = self.bytes(handle);
        bytemuck::cast_slice(&bytes[..len * std::mem::size_of::<T>()])
    }

    /// Mutably views the first `len` elements of an allocation as `T`.
    #[inline]
    pub fn slice_mut<T: Pod>(&mut self, handle: Handle, len: usize) -> &mut [T] {
        let bytes = self.bytes_mut(handle);
        bytemuck::cast_slice_mut(&mut bytes[..len * std::mem::size_of::<T>()])
    }

    /// Borrows two distinct allocations at once: the first mutably, the
    /// second shared.
    pub fn bytes_pair_mut(&mut self, dst: Handle, src: Handle) -> (&mut [u8], &[u8]) {
        debug_assert_ne!(dst, src, "Pair borrow of the same allocation");
        let (db, dr) = self.locate(dst);
        let (sb, sr) = self.locate(src);

        if db == sb {
            let bytes = self.blocks[db].bytes_mut();
            if dr.start < sr.start {
                let (lo, hi) = bytes.split_at_mut(sr.start);
                (&mut lo[dr], &hi[..sr.len()])
            } else {
                let dlen = dr.len();
                let (lo, hi) = bytes.split_at_mut(dr.start);
                (&mut hi[..dlen], &lo[sr])
            }
        } else if db < sb {
            let (lo, hi) = self.blocks.split_at_mut(sb);
            (&mut lo[db].bytes_mut()[dr], &hi[0].bytes()[sr])
        } else {
            let (lo, hi) = self.blocks.split_at_mut(db);
            (&mut hi[0].bytes_mut()[dr], &lo[sb].bytes()[sr])
        }
    }

    /// Typed version of [`bytes_pair_mut`](Self::bytes_pair_mut).
    pub fn slice_pair_mut<T: Pod>(
        &mut self,
        dst: Handle,
        dst_len: usize,
        src: Handle,
        src_len: usize,
    ) -> (&mut [T], &[T]) {
        let size = std::mem::size_of::<T>();
        let (d, s) = self.bytes_pair_mut(dst, src);
        (
            bytemuck::cast_slice_mut(&mut d[..dst_len * size]),
            bytemuck::cast_slice(&s[..src_len * size]),
        )
    }

    // =========================================================================
    // Memory primitives
    // =========================================================================

    /// Zeroes `len` bytes starting at `offset`.
    pub fn mem_clear(&mut self, handle: Handle, offset: usize, len: usize) {
        self.bytes_mut(handle)[offset..offset + len].fill(0);
    }

    /// Copies `len` bytes between two allocations (or within one).
    pub fn mem_copy(
        &mut self,
        src: Handle,
        src_offset: usize,
        dst: Handle,
        dst_offset: usize,
        len: usize,
    ) {
        if src == dst {
            self.mem_move(src, src_offset, dst_offset, len);
            return;
        }
        let (d, s) = self.bytes_pair_mut(dst, src);
        d[dst_offset..dst_offset + len].copy_from_slice(&s[src_offset..src_offset + len]);
    }

    /// Moves `len` bytes within one allocation; the ranges may overlap.
    pub fn mem_move(&mut self, handle: Handle, src_offset: usize, dst_offset: usize, len: usize) {
        self.bytes_mut(handle)
            .copy_within(src_offset..src_offset + len, dst_offset);
    }

    /// Returns usage statistics.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            blocks: self.blocks.len(),
            reserved_bytes: self.blocks.iter().map(Block::size).sum(),
            used_bytes: self.blocks.iter().map(|b| b.cursor).sum(),
            live_allocations: self.live,
            free_allocations: self.free_lists.iter().map(Vec::len).sum(),
            version: self.version,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    #[inline]
    fn header(&self, handle: Handle) -> AllocHeader {
        let off = handle.offset as usize;
        let bytes = &self.blocks[handle.block as usize].bytes()[off - HEADER_BYTES..off];
        *bytemuck::from_bytes::<AllocHeader>(bytes)
    }

    #[inline]
    fn header_mut(&mut self, handle: Handle) -> &mut AllocHeader {
        let off = handle.offset as usize;
        let bytes = &mut self.blocks[handle.block as usize].bytes_mut()[off - HEADER_BYTES..off];
        bytemuck::from_bytes_mut::<AllocHeader>(bytes)
    }

    #[inline]
    fn locate(&self, handle: Handle) -> (usize, Range<usize>) {
        self.debug_check(handle);
        let start = handle.offset as usize;
        let len = self.header(handle).len as usize;
        (handle.block as usize, start..start + len)
    }

    #[inline]
    fn debug_check(&self, handle: Handle) {
        debug_assert!(!handle.is_null(), "Use of null arena handle");
        debug_assert!(
            (handle.block as usize) < self.blocks.len(),
            "Handle {handle} points past the last block"
        );
        debug_assert!(
            self.header(handle).state == STATE_LIVE,
            "Use of freed arena handle {handle}"
        );
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(StorageConfig::DEFAULT_ARENA_BLOCK_BYTES)
    }
}
