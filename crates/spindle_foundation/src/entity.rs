//! Entity identifiers with generational indices.

use std::fmt;

/// Entity identifier with generational index for stale reference detection.
///
/// The generation counter increments when an entity index is reused after
/// destruction, so a held `EntityId` can be recognized as stale instead of
/// silently aliasing a new entity.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct EntityId {
    /// Index into entity storage.
    pub index: u64,
    /// Generation counter for stale reference detection.
    pub generation: u32,
}

impl EntityId {
    /// Creates a new entity ID with the given index and generation.
    #[must_use]
    pub const fn new(index: u64, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns a sentinel value representing "no entity".
    ///
    /// This uses `u64::MAX` as the index, which should never be allocated.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            index: u64::MAX,
            generation: 0,
        }
    }

    /// Returns true if this is the null sentinel value.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u64::MAX
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "EntityId(null)")
        } else {
            write!(f, "EntityId({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({})", self.index)
        }
    }
}
