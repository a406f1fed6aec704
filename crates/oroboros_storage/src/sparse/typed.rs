//! # Typed Component Sets
//!
//! Components are pure data containers with no behavior. They must be
//! `Pod` so a [`PagedSparseSet`] can store them as raw bytes.

use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

use super::entity::EntityKey;
use super::set::PagedSparseSet;
use crate::config::StorageConfig;
use crate::error::StorageResult;

/// Marker trait for component types.
///
/// Components must be:
/// - `Copy`: No heap allocations, bitwise copyable
/// - `Pod`: Plain old data, safe to store as bytes
/// - `Zeroable`: A zeroed payload is a valid value
/// - `Default`: Value for freshly upserted slots
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     const ID: u8 = 3;
/// }
/// ```
pub trait Component: Copy + Pod + Zeroable + Default + Send + Sync + 'static {
    /// Unique identifier for this component type (0-63).
    const ID: u8;
}

/// [`PagedSparseSet`] storing values of one component type.
pub struct ComponentSet<C: Component> {
    raw: PagedSparseSet,
    _marker: PhantomData<C>,
}

impl<C: Component> ComponentSet<C> {
    /// Creates a set sized from `config`.
    ///
    /// # Errors
    ///
    /// Fails for zero-sized components, components larger than a data page,
    /// or an invalid config.
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        Ok(Self {
            raw: PagedSparseSet::new(std::mem::size_of::<C>(), config)?,
            _marker: PhantomData,
        })
    }

    /// Component type id.
    #[inline]
    #[must_use]
    pub const fn component_id(&self) -> u8 {
        C::ID
    }

    /// Stores `value` for `key`. Returns `true` if the occupancy is new.
    #[inline]
    pub fn insert(&self, key: EntityKey, value: &C) -> bool {
        self.raw.set(key, Some(bytemuck::bytes_of(value)))
    }

    /// Copy of the value for `key`.
    #[must_use]
    pub fn get(&self, key: EntityKey) -> Option<C> {
        let mut value = C::zeroed();
        self.raw
            .read_into(key, bytemuck::bytes_of_mut(&mut value))
            .then_some(value)
    }

    /// Runs `f` on the value for `key`, inserting `C::default()` first if
    /// the occupancy is new. Returns whether it was new.
    pub fn upsert(&self, key: EntityKey, f: impl FnOnce(&mut C)) -> bool {
        self.raw
            .upsert_with(key, |bytes, is_new| {
                let mut value = if is_new {
                    C::default()
                } else {
                    bytemuck::pod_read_unaligned(bytes)
                };
                f(&mut value);
                bytes.copy_from_slice(bytemuck::bytes_of(&value));
            })
            .1
    }

    /// Removes the value for `key`.
    #[inline]
    pub fn remove(&self, key: EntityKey) -> bool {
        self.raw.remove(key)
    }

    /// Whether `key` has a value.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: EntityKey) -> bool {
        self.raw.has(key)
    }

    /// Number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether no value is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Grows coverage to at least `entities` ids.
    pub fn reserve(&mut self, entities: usize) {
        self.raw.reserve(entities);
    }

    /// Visits every stored value mutably, in page order.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(EntityKey, &mut C)) {
        self.raw.for_each(|key, bytes| {
            let mut value: C = bytemuck::pod_read_unaligned(bytes);
            f(key, &mut value);
            bytes.copy_from_slice(bytemuck::bytes_of(&value));
        });
    }

    /// Underlying byte-level set.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &PagedSparseSet {
        &self.raw
    }
}

impl<C: Component> std::fmt::Debug for ComponentSet<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSet")
            .field("component_id", &C::ID)
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Velocity {
        x: f32,
        y: f32,
        z: f32,
        _padding: f32,
    }

    impl Component for Velocity {
        const ID: u8 = 1;
    }

    fn velocity(x: f32) -> Velocity {
        Velocity {
            x,
            ..Velocity::default()
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let set = ComponentSet::<Velocity>::new(&StorageConfig::default()).unwrap();
        let key = EntityKey::new(42, 1);
        assert!(set.insert(key, &velocity(1.5)));
        assert_eq!(set.get(key), Some(velocity(1.5)));
        assert_eq!(set.get(key.next_generation()), None);
        assert!(set.remove(key));
        assert!(!set.contains(key));
        assert_eq!(set.component_id(), 1);
    }

    #[test]
    fn test_upsert_defaults_then_accumulates() {
        let set = ComponentSet::<Velocity>::new(&StorageConfig::default()).unwrap();
        let key = EntityKey::new(7, 0);
        assert!(set.upsert(key, |v| v.x += 1.0));
        assert!(!set.upsert(key, |v| v.x += 1.0));
        assert_eq!(set.get(key).map(|v| v.x), Some(2.0));
    }

    #[test]
    fn test_for_each_mut() {
        let mut set = ComponentSet::<Velocity>::new(&StorageConfig::default()).unwrap();
        for id in 0..10 {
            set.insert(EntityKey::new(id, 0), &velocity(id as f32));
        }
        set.for_each_mut(|_, v| v.y = v.x * 2.0);
        assert_eq!(set.get(EntityKey::new(4, 0)).map(|v| v.y), Some(8.0));
        assert_eq!(set.len(), 10);
    }
}
