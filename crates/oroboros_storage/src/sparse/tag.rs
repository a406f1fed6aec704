//! Presence-only sparse set for zero-sized marker components.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::entity::EntityKey;
use super::page::{IndexPage, PAGE_SIZE};
use super::page_table::PageTable;
use super::set::{index_pages_for, split_id};
use crate::config::StorageConfig;

/// Generational sparse set without payloads.
///
/// Same index pages and locking as [`PagedSparseSet`](super::PagedSparseSet),
/// no data pages.
pub struct TagSparseSet {
    index: PageTable<IndexPage>,
    len: AtomicUsize,
}

impl TagSparseSet {
    /// Creates a set covering `config.initial_entity_capacity` ids.
    #[must_use]
    pub fn new(config: &StorageConfig) -> Self {
        Self::with_capacity(config.initial_entity_capacity)
    }

    /// Creates a set covering at least `entities` ids.
    #[must_use]
    pub fn with_capacity(entities: usize) -> Self {
        Self {
            index: PageTable::new(index_pages_for(entities)),
            len: AtomicUsize::new(0),
        }
    }

    /// Marks `key` present. Returns `true` if this generation was not
    /// present before.
    ///
    /// # Panics
    ///
    /// Panics if the id is beyond [`capacity`](Self::capacity).
    pub fn set(&self, key: EntityKey) -> bool {
        let (page_no, local) = split_id(key.id());
        assert!(
            page_no < self.index.len(),
            "Entity page {page_no} beyond reserved capacity {}; reserve at a sync point",
            self.capacity()
        );
        let page = self.index.get_or_create(page_no, IndexPage::new);
        let _guard = page.lock.lock();
        let occupancy = page.occupy(local, key.generation());
        if occupancy.appended {
            self.len.fetch_add(1, Ordering::AcqRel);
        }
        occupancy.is_new
    }

    /// Clears `key` if its generation is present.
    pub fn remove(&self, key: EntityKey) -> bool {
        let (page_no, local) = split_id(key.id());
        let Some(page) = self.index.get(page_no) else {
            return false;
        };
        let _guard = page.lock.lock();
        let removed = page.vacate(local, key.generation()).is_some();
        if removed {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    /// Whether `key`'s generation is present. Lock-free.
    #[inline]
    #[must_use]
    pub fn has(&self, key: EntityKey) -> bool {
        let (page_no, local) = split_id(key.id());
        self.index
            .get(page_no)
            .is_some_and(|page| page.matches(local, key.generation()))
    }

    /// Number of present ids.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether no id is present.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of ids the page table covers.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.index.len() * PAGE_SIZE
    }

    /// Grows the page table to cover at least `entities` ids.
    pub fn reserve(&mut self, entities: usize) {
        self.index.grow(index_pages_for(entities));
        tracing::debug!(capacity = self.capacity(), "tag set reserved");
    }

    /// Present keys in page order.
    pub fn keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.index.pages().flat_map(|(page_no, page)| {
            (0..page.head()).map(move |slot| {
                let (local, generation) = page.owner_of(slot);
                EntityKey::new((page_no * PAGE_SIZE + local) as u32, generation)
            })
        })
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
}

impl std::fmt::Debug for TagSparseSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagSparseSet")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_lifecycle() {
        let tags = TagSparseSet::with_capacity(128);
        let key = EntityKey::new(77, 0);
        assert!(tags.set(key));
        assert!(!tags.set(key));
        assert!(tags.has(key));
        assert!(tags.set(key.next_generation()));
        assert!(!tags.has(key));
        assert_eq!(tags.len(), 1);
        assert!(!tags.remove(key));
        assert!(tags.remove(key.next_generation()));
        assert!(tags.is_empty());
        assert!(tags.verify_invariants());
    }

    #[test]
    fn test_keys_and_reserve() {
        let mut tags = TagSparseSet::new(&StorageConfig::default());
        tags.reserve(10_000);
        for id in [9_000u32, 2, 65] {
            tags.set(EntityKey::new(id, 1));
        }
        tags.remove(EntityKey::new(2, 1));
        let keys: Vec<_> = tags.keys().collect();
        assert_eq!(keys, vec![EntityKey::new(65, 1), EntityKey::new(9_000, 1)]);
    }
}
