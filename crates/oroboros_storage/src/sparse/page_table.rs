//! Lazily populated page table.
//!
//! Each slot starts empty and is filled on first touch under the slot's own
//! double-checked lock, so workers touching different pages never contend.
//! The table itself only grows through `&mut self`.
//!
//! Pages are boxed system allocations, not arena blocks. First touch happens
//! under `&self` on worker threads, and the [`Arena`](crate::memory::Arena)
//! needs `&mut` for any allocation.

// SAFETY: pages are leaked boxes owned by the table; see each site.
#![allow(unsafe_code)]

use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use super::lock::SpinLock;

struct PageSlot<P> {
    page: AtomicPtr<P>,
    lock: SpinLock,
}

impl<P> PageSlot<P> {
    fn empty() -> Self {
        Self {
            page: AtomicPtr::new(ptr::null_mut()),
            lock: SpinLock::new(),
        }
    }
}

pub(crate) struct PageTable<P> {
    slots: Vec<PageSlot<P>>,
    _owns: PhantomData<Box<P>>,
}

impl<P> PageTable<P> {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| PageSlot::empty()).collect(),
            _owns: PhantomData,
        }
    }

    /// Number of page slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Page `index` if it has been created.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&P> {
        let page = self.slots.get(index)?.page.load(Ordering::Acquire);
        // SAFETY: non-null pointers come from `Box::into_raw` and live until
        // the table drops.
        unsafe { page.as_ref() }
    }

    /// Page `index`, created with `init` on first touch.
    ///
    /// # Panics
    ///
    /// Panics if `index` is past the end of the table.
    pub fn get_or_create(&self, index: usize, init: impl FnOnce() -> P) -> &P {
        let slot = &self.slots[index];
        let page = slot.page.load(Ordering::Acquire);
        if !page.is_null() {
            // SAFETY: see `get`.
            return unsafe { &*page };
        }

        let _guard = slot.lock.lock();
        let page = slot.page.load(Ordering::Acquire);
        if !page.is_null() {
            // SAFETY: see `get`.
            return unsafe { &*page };
        }

        let page = Box::into_raw(Box::new(init()));
        slot.page.store(page, Ordering::Release);
        tracing::trace!(page = index, "sparse page created");
        // SAFETY: just created from a live box.
        unsafe { &*page }
    }

    /// Grows the table to `len` slots. Never shrinks.
    pub fn grow(&mut self, len: usize) {
        if len > self.slots.len() {
            self.slots.resize_with(len, PageSlot::empty);
        }
    }

    /// Created pages in index order.
    pub fn pages(&self) -> impl Iterator<Item = (usize, &P)> + '_ {
        (0..self.slots.len()).filter_map(|i| self.get(i).map(|page| (i, page)))
    }
}

impl<P> Drop for PageTable<P> {
    fn drop(&mut self) {
        for slot in &mut self.slots {
            let page = *slot.page.get_mut();
            if !page.is_null() {
                // SAFETY: created by `Box::into_raw` and never freed elsewhere.
                drop(unsafe { Box::from_raw(page) });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_lazy_creation_once() {
        let table = PageTable::<u64>::new(4);
        assert!(table.get(1).is_none());
        assert_eq!(*table.get_or_create(1, || 7), 7);
        assert_eq!(*table.get_or_create(1, || 9), 7);
        assert_eq!(table.pages().count(), 1);
        assert!(table.get(10).is_none());
    }

    #[test]
    fn test_concurrent_first_touch_creates_one_page() {
        let table = PageTable::<usize>::new(1);
        let inits = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let page = table.get_or_create(0, || inits.fetch_add(1, Ordering::SeqCst));
                    assert_eq!(*page, 0);
                });
            }
        });
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_grow_keeps_pages() {
        let mut table = PageTable::<u32>::new(1);
        table.get_or_create(0, || 5);
        table.grow(8);
        assert_eq!(table.len(), 8);
        assert_eq!(table.get(0), Some(&5));
        assert!(table.get(7).is_none());
        assert_eq!(table.pages().map(|(i, _)| i).collect::<Vec<_>>(), vec![0]);
    }
}
