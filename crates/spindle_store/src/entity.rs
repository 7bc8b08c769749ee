//! Entity lifecycle management with generational indices.
//!
//! The `EntityStore` manages entity allocation and tracks generations
//! to detect stale references to destroyed entities.

// Allow u64 to usize casts - we target 64-bit systems
#![allow(clippy::cast_possible_truncation)]

use spindle_foundation::{EntityId, Error, Result};

/// Per-index slot state.
#[derive(Debug, Clone, Copy)]
struct Slot {
    /// Current generation for this index. Bumped each time the index is
    /// reused, so old `EntityId`s stop matching.
    generation: u32,
    /// Whether the slot currently holds a live entity.
    alive: bool,
}

/// Manages entity lifecycle and generation tracking.
///
/// Entities are allocated from a free list when available, otherwise new
/// indices are allocated. When an entity is destroyed its index goes on the
/// free list; reuse increments the generation.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    /// Slot state for each entity index.
    slots: Vec<Slot>,
    /// Free list of indices available for reuse.
    free_list: Vec<u64>,
    /// Count of live entities.
    live_count: usize,
}

impl EntityStore {
    /// Creates a new empty entity store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a new entity, returns its ID.
    ///
    /// Reuses indices from the free list when available.
    pub fn spawn(&mut self) -> EntityId {
        self.live_count += 1;

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.alive = true;
            EntityId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u64;
            self.slots.push(Slot {
                generation: 1,
                alive: true,
            });
            EntityId::new(index, 1)
        }
    }

    /// Destroys an entity.
    ///
    /// Returns `Ok(())` if the entity existed and was destroyed.
    /// Returns `Err` if the entity is stale or already destroyed.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        self.validate(id)?;

        self.slots[id.index as usize].alive = false;
        self.free_list.push(id.index);
        self.live_count -= 1;

        Ok(())
    }

    /// Checks if an entity exists and is not stale.
    #[must_use]
    pub fn exists(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == id.generation)
    }

    /// Validates that an entity is live.
    ///
    /// Returns `Ok(())` if the entity exists. Returns `Err` with a
    /// [`spindle_foundation::ErrorKind::StaleEntity`] kind if the entity was
    /// destroyed, or `EntityNotFound` if the index was never allocated.
    pub fn validate(&self, id: EntityId) -> Result<()> {
        let Some(slot) = self.slots.get(id.index as usize) else {
            return Err(Error::entity_not_found(id));
        };

        if slot.alive && slot.generation == id.generation {
            Ok(())
        } else {
            // Either the index was reused (generation mismatch) or the
            // entity was destroyed and the slot is waiting on the free list.
            Err(Error::stale_entity(id))
        }
    }

    /// Returns the total number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Iterates over all live entity IDs.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(idx, slot)| EntityId::new(idx as u64, slot.generation))
    }

    /// Returns the current generation for an index, if it was ever allocated.
    ///
    /// Useful for debugging and testing.
    #[must_use]
    pub fn generation(&self, index: u64) -> Option<u32> {
        self.slots.get(index as usize).map(|slot| slot.generation)
    }
}
