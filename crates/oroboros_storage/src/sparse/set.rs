//! # Paged Sparse Set
//!
//! Generational sparse set with fixed-size byte payloads.
//!
//! Ids map to 64-id index pages; each page keeps its live ids packed in
//! dense slots `0..head`. Payloads live in data pages addressed by the
//! global dense position `page * 64 + slot`.
//!
//! ## Locking
//!
//! - `has`/`read` are lock-free
//! - mutations lock the index page, then data pages in ascending order
//! - `set` keeps the index lock while it writes the payload, so a
//!   concurrent `remove` on the same page cannot move the slot mid-copy
//!
//! Page tables grow only in [`PagedSparseSet::reserve`], which takes
//! `&mut self` and therefore cannot race with any other operation.
//!
//! The set owns its pages outright and takes no [`Arena`](crate::memory::Arena):
//! pages are created lazily from `&self`, which arena allocation cannot do.

// SAFETY: payload views come from `DataPage::bytes_mut`, always under the
// data page's lock or with `&mut self`.
#![allow(unsafe_code)]

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::entity::EntityKey;
use super::page::{DataPage, IndexPage, PAGE_SIZE};
use super::page_table::PageTable;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

/// Splits an id into (index page, local id).
#[inline]
pub(crate) fn split_id(id: u32) -> (usize, usize) {
    let id = id as usize;
    (id / PAGE_SIZE, id % PAGE_SIZE)
}

/// Index pages needed to cover `entities` ids.
#[inline]
pub(crate) fn index_pages_for(entities: usize) -> usize {
    (entities + PAGE_SIZE - 1) / PAGE_SIZE
}

/// Concurrent generational sparse set with byte payloads.
///
/// # Example
///
/// ```rust,ignore
/// let set = PagedSparseSet::new(4, &StorageConfig::default())?;
/// let key = EntityKey::new(5, 1);
/// assert!(set.set(key, Some(&[0xAA; 4])));
/// assert!(set.has(key));
/// assert!(set.remove(key));
/// ```
pub struct PagedSparseSet {
    index: PageTable<IndexPage>,
    data: PageTable<DataPage>,
    element_size: usize,
    page_bytes: usize,
    per_page: usize,
    len: AtomicUsize,
}

impl PagedSparseSet {
    /// Creates a set for `element_size`-byte payloads covering
    /// `config.initial_entity_capacity` ids.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ZeroSizedElement`] for zero-sized payloads,
    /// [`StorageError::ElementTooLarge`] if one payload exceeds a data page,
    /// and any config validation error.
    pub fn new(element_size: usize, config: &StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        if element_size == 0 {
            return Err(StorageError::ZeroSizedElement);
        }
        if element_size > config.data_page_bytes {
            return Err(StorageError::ElementTooLarge {
                size: element_size,
                page_bytes: config.data_page_bytes,
            });
        }

        let per_page = config.data_page_bytes / element_size;
        let index_pages = index_pages_for(config.initial_entity_capacity);
        Ok(Self {
            index: PageTable::new(index_pages),
            data: PageTable::new(Self::data_pages_for(index_pages, per_page)),
            element_size,
            page_bytes: config.data_page_bytes,
            per_page,
            len: AtomicUsize::new(0),
        })
    }

    /// Payload size in bytes.
    #[inline]
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Number of live ids.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether no id is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of ids the page tables cover.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.index.len() * PAGE_SIZE
    }

    /// Grows the page tables to cover at least `entities` ids.
    ///
    /// Takes `&mut self`: call it at a sync point with no workers active.
    pub fn reserve(&mut self, entities: usize) {
        let index_pages = index_pages_for(entities);
        if index_pages <= self.index.len() {
            return;
        }
        self.index.grow(index_pages);
        self.data
            .grow(Self::data_pages_for(index_pages, self.per_page));
        tracing::debug!(
            capacity = self.capacity(),
            data_pages = self.data.len(),
            "sparse set reserved"
        );
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Makes `key` live and writes its payload (zeroes when `data` is
    /// `None`). Returns `true` if this generation was not live before.
    ///
    /// # Panics
    ///
    /// Panics if the id is beyond [`capacity`](Self::capacity) or `data`
    /// is not exactly [`element_size`](Self::element_size) bytes.
    pub fn set(&self, key: EntityKey, data: Option<&[u8]>) -> bool {
        self.upsert_with(key, |slot, _| match data {
            Some(bytes) => slot.copy_from_slice(bytes),
            None => slot.fill(0),
        })
        .1
    }

    /// Upsert without writing: returns the payload address and whether the
    /// occupancy is new. A new slot may hold stale bytes; the caller decides
    /// whether to initialise it.
    ///
    /// The pointer is only valid until the next `remove` in the same page.
    ///
    /// # Panics
    ///
    /// Panics if the id is beyond [`capacity`](Self::capacity).
    pub fn get(&self, key: EntityKey) -> (NonNull<u8>, bool) {
        let (page_no, local) = split_id(key.id());
        let page = self.index_page(page_no);
        let _index_guard = page.lock.lock();
        let occupancy = page.occupy(local, key.generation());
        if occupancy.appended {
            self.len.fetch_add(1, Ordering::AcqRel);
        }
        let (dp, offset) = self.locate(page_no, occupancy.slot);
        (self.data_page(dp).ptr_at(offset), occupancy.is_new)
    }

    /// Upserts `key` and runs `f` on its payload under the page locks.
    /// `f` gets the payload bytes and whether the occupancy is new.
    ///
    /// # Panics
    ///
    /// Panics if the id is beyond [`capacity`](Self::capacity).
    pub fn upsert_with<R>(&self, key: EntityKey, f: impl FnOnce(&mut [u8], bool) -> R) -> (R, bool) {
        let (page_no, local) = split_id(key.id());
        let page = self.index_page(page_no);
        let _index_guard = page.lock.lock();
        let occupancy = page.occupy(local, key.generation());
        if occupancy.appended {
            self.len.fetch_add(1, Ordering::AcqRel);
        }

        let (dp, offset) = self.locate(page_no, occupancy.slot);
        let data_page = self.data_page(dp);
        let _data_guard = data_page.lock.lock();
        // SAFETY: data page lock held; one view.
        let slot = unsafe { data_page.bytes_mut(offset, self.element_size) };
        (f(slot, occupancy.is_new), occupancy.is_new)
    }

    /// Removes `key` if its generation is live. The last live payload of
    /// the page moves into the freed slot.
    pub fn remove(&self, key: EntityKey) -> bool {
        let (page_no, local) = split_id(key.id());
        let Some(page) = self.index.get(page_no) else {
            return false;
        };
        let _index_guard = page.lock.lock();
        let Some(vacated) = page.vacate(local, key.generation()) else {
            return false;
        };
        self.len.fetch_sub(1, Ordering::AcqRel);

        if vacated.removed != vacated.last {
            self.move_payload(page_no, vacated.last, vacated.removed);
        }
        true
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Whether `key`'s generation is live. Lock-free.
    #[inline]
    #[must_use]
    pub fn has(&self, key: EntityKey) -> bool {
        let (page_no, local) = split_id(key.id());
        self.index
            .get(page_no)
            .is_some_and(|page| page.matches(local, key.generation()))
    }

    /// Payload address of a live `key`. Lock-free.
    ///
    /// The pointer is only valid until the next `remove` in the same page.
    #[must_use]
    pub fn read(&self, key: EntityKey) -> Option<NonNull<u8>> {
        let (page_no, local) = split_id(key.id());
        let slot = self.index.get(page_no)?.slot_of(local, key.generation())?;
        let (dp, offset) = self.locate(page_no, slot);
        Some(self.data.get(dp)?.ptr_at(offset))
    }

    /// Copies a live `key`'s payload into `out`. Returns `false` on a miss.
    ///
    /// # Panics
    ///
    /// Panics if `out` is not exactly [`element_size`](Self::element_size)
    /// bytes.
    pub fn read_into(&self, key: EntityKey, out: &mut [u8]) -> bool {
        let (page_no, local) = split_id(key.id());
        let Some(page) = self.index.get(page_no) else {
            return false;
        };
        let _index_guard = page.lock.lock();
        let Some(slot) = page.slot_of(local, key.generation()) else {
            return false;
        };
        let (dp, offset) = self.locate(page_no, slot);
        let Some(data_page) = self.data.get(dp) else {
            return false;
        };
        let _data_guard = data_page.lock.lock();
        // SAFETY: data page lock held; one view.
        out.copy_from_slice(unsafe { data_page.bytes_mut(offset, self.element_size) });
        true
    }

    /// Visits every live id and its payload in page order.
    pub fn for_each(&mut self, mut f: impl FnMut(EntityKey, &mut [u8])) {
        for page_no in 0..self.index.len() {
            let Some(page) = self.index.get(page_no) else {
                continue;
            };
            for slot in 0..page.head() {
                let (local, generation) = page.owner_of(slot);
                let id = (page_no * PAGE_SIZE + local) as u32;
                let (dp, offset) = self.locate(page_no, slot);
                let Some(data_page) = self.data.get(dp) else {
                    continue;
                };
                // SAFETY: &mut self excludes every other accessor.
                let bytes = unsafe { data_page.bytes_mut(offset, self.element_size) };
                f(EntityKey::new(id, generation), bytes);
            }
        }
    }

    /// Checks the dense/owner cross-maps of every page and the live count.
    #[must_use]
    pub fn verify_invariants(&self) -> bool {
        let mut live = 0;
        for (_, page) in self.index.pages() {
            let _guard = page.lock.lock();
            if !page.verify() {
                return false;
            }
            live += page.head();
        }
        live == self.len()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    #[inline]
    fn data_pages_for(index_pages: usize, per_page: usize) -> usize {
        (index_pages * PAGE_SIZE + per_page - 1) / per_page
    }

    /// (data page, byte offset) of dense `slot` in index page `page_no`.
    #[inline]
    fn locate(&self, page_no: usize, slot: usize) -> (usize, usize) {
        let global = page_no * PAGE_SIZE + slot;
        (
            global / self.per_page,
            (global % self.per_page) * self.element_size,
        )
    }

    #[inline]
    fn index_page(&self, page_no: usize) -> &IndexPage {
        assert!(
            page_no < self.index.len(),
            "Entity page {page_no} beyond reserved capacity {}; reserve at a sync point",
            self.capacity()
        );
        self.index.get_or_create(page_no, IndexPage::new)
    }

    #[inline]
    fn data_page(&self, dp: usize) -> &DataPage {
        let bytes = self.page_bytes;
        self.data.get_or_create(dp, || DataPage::new(bytes))
    }

    /// Moves payload `from` → `to` within index page `page_no`. Caller holds
    /// the index page lock.
    fn move_payload(&self, page_no: usize, from: usize, to: usize) {
        let (src_page, src_off) = self.locate(page_no, from);
        let (dst_page, dst_off) = self.locate(page_no, to);

        if src_page == dst_page {
            let page = self.data_page(src_page);
            let _guard = page.lock.lock();
            // SAFETY: lock held.
            unsafe { page.copy_within(src_off, dst_off, self.element_size) };
            return;
        }

        let src = self.data_page(src_page);
        let dst = self.data_page(dst_page);
        // Ascending page order.
        let (_first, _second) = if src_page < dst_page {
            (src.lock.lock(), dst.lock.lock())
        } else {
            (dst.lock.lock(), src.lock.lock())
        };
        // SAFETY: both locks held; distinct pages so the views are disjoint.
        let (to_bytes, from_bytes) = unsafe {
            (
                dst.bytes_mut(dst_off, self.element_size),
                src.bytes_mut(src_off, self.element_size),
            )
        };
        to_bytes.copy_from_slice(from_bytes);
    }
}

impl std::fmt::Debug for PagedSparseSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedSparseSet")
            .field("element_size", &self.element_size)
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("per_page", &self.per_page)
            .finish()
    }
}
