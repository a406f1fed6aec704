//! # Sparse-Set Pages
//!
//! ```text
//! IndexPage (64 ids)                 DataPage (page_bytes)
//! ┌───────────────┐                  ┌──────────────────────────┐
//! │ tags[local]   │ OCCUPIED | gen   │ slot 0 │ slot 1 │ ...    │
//! │ dense[local]  │ 1-based slot ──┐ └──────────────────────────┘
//! │ owners[slot]  │ local id       │   global slot = page * 64 + slot
//! │ head          │ live count     └─▶ data page = global / per_page
//! └───────────────┘
//! ```
//!
//! Index pages are mutated only under their own lock. Tags are published
//! with `Release` after the dense mapping, so lock-free readers that see a
//! matching tag also see its slot.
//!
//! Data pages come straight from the system allocator rather than the arena,
//! so creating one never needs `&mut Arena` and never bumps its version.

// SAFETY: DataPage owns a raw allocation; access rules are documented on
// each method.
#![allow(unsafe_code)]

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use super::entity::Generation;
use super::lock::SpinLock;
use crate::memory::ALIGN;

/// Ids covered by one index page.
pub const PAGE_SIZE: usize = 64;

/// Tag bit marking an occupied id. Lets generation 0 be a live generation.
const OCCUPIED: u32 = 1 << 16;
const VACANT: u32 = 0;

#[inline]
const fn tag_for(generation: Generation) -> u32 {
    OCCUPIED | generation as u32
}

/// Outcome of [`IndexPage::occupy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Occupancy {
    /// Dense slot (0-based) holding the id.
    pub slot: usize,
    /// The generation was not live before the call.
    pub is_new: bool,
    /// A dense slot was appended (the id was vacant).
    pub appended: bool,
}

/// Outcome of [`IndexPage::vacate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Vacated {
    /// Slot that held the removed id.
    pub removed: usize,
    /// Last live slot before removal; its payload must move to `removed`.
    pub last: usize,
}

/// Id → dense-slot mapping for 64 consecutive ids.
pub(crate) struct IndexPage {
    pub lock: SpinLock,
    tags: [AtomicU32; PAGE_SIZE],
    /// 1-based dense slot per local id, 0 = none.
    dense: [AtomicU16; PAGE_SIZE],
    /// Local id per dense slot.
    owners: [AtomicU16; PAGE_SIZE],
    head: AtomicU16,
}

impl IndexPage {
    pub fn new() -> Self {
        Self {
            lock: SpinLock::new(),
            tags: std::array::from_fn(|_| AtomicU32::new(VACANT)),
            dense: std::array::from_fn(|_| AtomicU16::new(0)),
            owners: std::array::from_fn(|_| AtomicU16::new(0)),
            head: AtomicU16::new(0),
        }
    }

    /// Live ids in this page.
    #[inline]
    pub fn head(&self) -> usize {
        self.head.load(Ordering::Acquire) as usize
    }

    /// Lock-free generation check.
    #[inline]
    pub fn matches(&self, local: usize, generation: Generation) -> bool {
        self.tags[local].load(Ordering::Acquire) == tag_for(generation)
    }

    /// Lock-free slot lookup for a live generation.
    #[inline]
    pub fn slot_of(&self, local: usize, generation: Generation) -> Option<usize> {
        if !self.matches(local, generation) {
            return None;
        }
        match self.dense[local].load(Ordering::Acquire) {
            0 => None,
            d => Some(d as usize - 1),
        }
    }

    /// Live generation and local id owning dense `slot`.
    #[inline]
    pub fn owner_of(&self, slot: usize) -> (usize, Generation) {
        let local = self.owners[slot].load(Ordering::Acquire) as usize;
        let tag = self.tags[local].load(Ordering::Acquire);
        (local, tag as Generation)
    }

    /// Makes `generation` the live generation of `local`. Caller holds
    /// `lock`.
    pub fn occupy(&self, local: usize, generation: Generation) -> Occupancy {
        let tag = self.tags[local].load(Ordering::Relaxed);
        let wanted = tag_for(generation);

        if tag & OCCUPIED != 0 {
            let slot = self.dense[local].load(Ordering::Relaxed) as usize - 1;
            if tag != wanted {
                // Stale generation: keep the slot, swap the tag.
                self.tags[local].store(wanted, Ordering::Release);
            }
            return Occupancy {
                slot,
                is_new: tag != wanted,
                appended: false,
            };
        }

        let slot = self.head.load(Ordering::Relaxed);
        debug_assert!((slot as usize) < PAGE_SIZE, "Index page overflow");
        self.owners[slot as usize].store(local as u16, Ordering::Relaxed);
        self.dense[local].store(slot + 1, Ordering::Release);
        self.head.store(slot + 1, Ordering::Release);
        self.tags[local].store(wanted, Ordering::Release);
        Occupancy {
            slot: slot as usize,
            is_new: true,
            appended: true,
        }
    }

    /// Removes `local` if `generation` is live, swap-compacting the dense
    /// slots. Caller holds `lock`.
    pub fn vacate(&self, local: usize, generation: Generation) -> Option<Vacated> {
        if self.tags[local].load(Ordering::Relaxed) != tag_for(generation) {
            return None;
        }

        let removed = self.dense[local].load(Ordering::Relaxed) as usize - 1;
        let last = self.head.load(Ordering::Relaxed) as usize - 1;

        self.tags[local].store(VACANT, Ordering::Release);
        self.dense[local].store(0, Ordering::Release);

        if removed != last {
            let moved = self.owners[last].load(Ordering::Relaxed);
            self.owners[removed].store(moved, Ordering::Relaxed);
            self.dense[moved as usize].store(removed as u16 + 1, Ordering::Release);
        }
        self.head.store(last as u16, Ordering::Release);

        Some(Vacated { removed, last })
    }

    /// Checks `dense[owner[i]] == i + 1` for every live slot and that the
    /// occupied tags match `head`.
    pub fn verify(&self) -> bool {
        let head = self.head();
        let occupied = self
            .tags
            .iter()
            .filter(|t| t.load(Ordering::Acquire) & OCCUPIED != 0)
            .count();
        if occupied != head {
            return false;
        }
        (0..head).all(|slot| {
            let local = self.owners[slot].load(Ordering::Acquire) as usize;
            self.dense[local].load(Ordering::Acquire) as usize == slot + 1
                && self.tags[local].load(Ordering::Acquire) & OCCUPIED != 0
        })
    }
}

/// Zeroed, 16-byte-aligned payload storage guarded by its own lock.
pub(crate) struct DataPage {
    pub lock: SpinLock,
    ptr: NonNull<u8>,
    layout: Layout,
}

impl DataPage {
    pub fn new(bytes: usize) -> Self {
        let layout = Layout::from_size_align(bytes.max(ALIGN), ALIGN).expect("Invalid layout");

        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };

        Self {
            lock: SpinLock::new(),
            ptr,
            layout,
        }
    }

    /// Address of byte `offset`.
    #[inline]
    pub fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset < self.layout.size(), "Data page offset out of range");
        // SAFETY: offset is within the allocation.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }

    /// Mutable view of `len` bytes at `offset`.
    ///
    /// # Safety
    ///
    /// The caller must hold `lock` (or otherwise have exclusive access to
    /// the page) and must not create overlapping views.
    #[inline]
    pub unsafe fn bytes_mut(&self, offset: usize, len: usize) -> &mut [u8] {
        assert!(offset + len <= self.layout.size(), "Data page range out of bounds");
        // SAFETY: range checked above; exclusivity is the caller's contract.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr().add(offset), len) }
    }

    /// Copies `len` bytes from `src` to `dst` within this page.
    ///
    /// # Safety
    ///
    /// The caller must hold `lock`.
    #[inline]
    pub unsafe fn copy_within(&self, src: usize, dst: usize, len: usize) {
        assert!(
            src.max(dst) + len <= self.layout.size(),
            "Data page range out of bounds"
        );
        // SAFETY: both ranges checked above; `copy` permits overlap.
        unsafe { std::ptr::copy(self.ptr.as_ptr().add(src), self.ptr.as_ptr().add(dst), len) };
    }
}

impl Drop for DataPage {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated in `DataPage::new` with this layout.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

// SAFETY: DataPage owns its allocation; all mutation goes through `lock`.
unsafe impl Send for DataPage {}
// SAFETY: as above.
unsafe impl Sync for DataPage {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupy_and_vacate_swap_compacts() {
        let page = IndexPage::new();
        let a = page.occupy(3, 1);
        let b = page.occupy(9, 0);
        let c = page.occupy(20, 5);
        assert_eq!((a.slot, b.slot, c.slot), (0, 1, 2));
        assert!(a.is_new && a.appended);
        assert_eq!(page.head(), 3);

        // Same generation again is not new.
        assert!(!page.occupy(9, 0).is_new);

        let v = page.vacate(3, 1).unwrap();
        assert_eq!(v, Vacated { removed: 0, last: 2 });
        assert_eq!(page.slot_of(20, 5), Some(0));
        assert_eq!(page.owner_of(0), (20, 5));
        assert!(page.verify());
        assert_eq!(page.head(), 2);
    }

    #[test]
    fn test_stale_generation_keeps_slot() {
        let page = IndexPage::new();
        page.occupy(0, 1);
        page.occupy(1, 1);
        let again = page.occupy(1, 2);
        assert_eq!(again.slot, 1);
        assert!(again.is_new);
        assert!(!again.appended);
        assert!(!page.matches(1, 1));
        assert!(page.matches(1, 2));
        assert!(page.vacate(1, 1).is_none());
        assert!(page.verify());
    }

    #[test]
    fn test_data_page_is_zeroed_and_aligned() {
        let page = DataPage::new(256);
        assert_eq!(page.ptr_at(0).as_ptr() as usize % ALIGN, 0);
        let _guard = page.lock.lock();
        // SAFETY: lock held, single view.
        let bytes = unsafe { page.bytes_mut(0, 256) };
        assert!(bytes.iter().all(|&b| b == 0));
        bytes[..4].copy_from_slice(&[1, 2, 3, 4]);
        // SAFETY: lock held; `bytes` is not used afterwards.
        unsafe { page.copy_within(0, 8, 4) };
        // SAFETY: lock held, single view.
        assert_eq!(unsafe { page.bytes_mut(8, 4) }, &[1, 2, 3, 4]);
    }
}
