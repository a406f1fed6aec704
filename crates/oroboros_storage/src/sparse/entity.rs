//! # Entity Keys
//!
//! Sparse sets are addressed by `(id, generation)` pairs issued by the
//! entity table. The set never issues ids itself; it only compares
//! generations to tell a live reference from a recycled id.

/// Generation counter stored per id.
pub type Generation = u16;

/// Id + generation pair identifying one occupancy of an entity slot.
///
/// Packed into a single `u64`:
/// - Lower 32 bits: entity id
/// - Next 16 bits: generation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityKey(u64);

impl EntityKey {
    /// Creates a key from id and generation.
    #[inline]
    #[must_use]
    pub const fn new(id: u32, generation: Generation) -> Self {
        Self(((generation as u64) << 32) | (id as u64))
    }

    /// Entity id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0 as u32
    }

    /// Generation the caller believes is current.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> Generation {
        (self.0 >> 32) as Generation
    }

    /// Same id, next generation (wrapping).
    #[inline]
    #[must_use]
    pub const fn next_generation(self) -> Self {
        Self::new(self.id(), self.generation().wrapping_add(1))
    }

    /// Raw packed representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl From<(u32, Generation)> for EntityKey {
    fn from((id, generation): (u32, Generation)) -> Self {
        Self::new(id, generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_roundtrip() {
        let key = EntityKey::new(123_456, 65_000);
        assert_eq!(key.id(), 123_456);
        assert_eq!(key.generation(), 65_000);
        assert_eq!(EntityKey::from((123_456, 65_000)), key);
    }

    #[test]
    fn test_next_generation_wraps() {
        let key = EntityKey::new(7, Generation::MAX);
        let next = key.next_generation();
        assert_eq!(next.id(), 7);
        assert_eq!(next.generation(), 0);
        assert_ne!(next, key);
    }
}
