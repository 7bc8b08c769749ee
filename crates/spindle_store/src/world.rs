//! The attribute store.
//!
//! A `World` owns entity lifecycle, per-entity attribute rows, and the
//! attribute-name interner. Reads are Nil-tolerant: a missing attribute or
//! an unresolvable path segment is `Value::Nil`, never an error. Errors are
//! reserved for dead entity handles.

use std::collections::HashMap;

use spindle_foundation::{AttrId, AttrMap, AttrPath, EntityId, Interner, Result, Value};

use crate::entity::EntityStore;

/// Attribute storage for a population of entities.
///
/// Attribute rows are persistent maps, so snapshotting a row (or the value
/// of a sequence attribute) is O(1). The world itself mutates in place:
/// reactive caching and observation need a single logical timeline, not
/// immutable world snapshots.
#[derive(Debug, Clone, Default)]
pub struct World {
    /// Entity lifecycle management.
    entities: EntityStore,
    /// Attribute rows, keyed by full (index, generation) identity.
    rows: HashMap<EntityId, AttrMap<AttrId, Value>>,
    /// Attribute-name interner.
    interner: Interner,
}

impl World {
    /// Creates a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Spawns a new entity with no attributes.
    pub fn spawn(&mut self) -> EntityId {
        let id = self.entities.spawn();
        self.rows.insert(id, AttrMap::new());
        id
    }

    /// Spawns a new entity with the given initial attributes.
    pub fn spawn_with<N, I>(&mut self, attrs: I) -> EntityId
    where
        N: AsRef<str>,
        I: IntoIterator<Item = (N, Value)>,
    {
        let id = self.entities.spawn();
        let mut row = AttrMap::new();
        for (name, value) in attrs {
            let attr = self.interner.intern(name.as_ref());
            if !value.is_nil() {
                row = row.insert(attr, value);
            }
        }
        self.rows.insert(id, row);
        id
    }

    /// Destroys an entity, releasing its attribute row.
    ///
    /// # Errors
    /// Returns an error if the entity is already destroyed or unknown.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        self.entities.despawn(id)?;
        self.rows.remove(&id);
        Ok(())
    }

    /// Checks if an entity exists and is not stale.
    #[must_use]
    pub fn exists(&self, id: EntityId) -> bool {
        self.entities.exists(id)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates over all live entity IDs.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter()
    }

    // =========================================================================
    // Attribute access
    // =========================================================================

    /// Gets an attribute value by name.
    ///
    /// Returns `Value::Nil` if the entity has no such attribute.
    ///
    /// # Errors
    /// Returns an error if the entity is dead or unknown.
    pub fn get(&self, id: EntityId, name: &str) -> Result<Value> {
        self.entities.validate(id)?;
        Ok(self.lookup(id, name))
    }

    /// Gets an attribute value by interned ID.
    ///
    /// # Errors
    /// Returns an error if the entity is dead or unknown.
    pub fn get_id(&self, id: EntityId, attr: AttrId) -> Result<Value> {
        self.entities.validate(id)?;
        Ok(self
            .rows
            .get(&id)
            .and_then(|row| row.get(&attr))
            .cloned()
            .unwrap_or(Value::Nil))
    }

    /// Sets an attribute value, returning whether the value actually changed.
    ///
    /// Change detection is by value equality (`EntityRef` compares by
    /// identity). Setting an attribute to its current value reports no
    /// change, and setting a missing attribute to `Nil` is a no-op.
    ///
    /// # Errors
    /// Returns an error if the entity is dead or unknown.
    pub fn set(&mut self, id: EntityId, name: &str, value: Value) -> Result<bool> {
        let attr = self.interner.intern(name);
        self.set_id(id, attr, value)
    }

    /// Sets an attribute value by interned ID.
    ///
    /// # Errors
    /// Returns an error if the entity is dead or unknown.
    pub fn set_id(&mut self, id: EntityId, attr: AttrId, value: Value) -> Result<bool> {
        self.entities.validate(id)?;

        let row = self.rows.entry(id).or_default();
        let old = row.get(&attr).cloned().unwrap_or(Value::Nil);
        if old == value {
            return Ok(false);
        }

        // Nil is "absent": store it as removal so rows stay compact.
        *row = if value.is_nil() {
            row.remove(&attr)
        } else {
            row.insert(attr, value)
        };
        Ok(true)
    }

    /// Resolves a dotted path against an entity.
    ///
    /// Traversal crosses nested entities (`EntityRef` attributes) and
    /// string-keyed `Value::Map`s. Any missing or non-traversable
    /// intermediate, including a dead entity reference, resolves the
    /// whole path to `Nil`.
    ///
    /// # Errors
    /// Returns an error only if the *root* entity is dead or unknown.
    pub fn get_path(&self, id: EntityId, path: &AttrPath) -> Result<Value> {
        self.entities.validate(id)?;

        let segments = path.segments();
        let mut current = self.lookup(id, &segments[0]);

        for segment in &segments[1..] {
            current = match current {
                Value::EntityRef(nested) if self.entities.exists(nested) => {
                    self.lookup(nested, segment)
                }
                Value::Map(map) => map
                    .get(&Value::String(segment.clone()))
                    .cloned()
                    .unwrap_or(Value::Nil),
                _ => Value::Nil,
            };
        }

        Ok(current)
    }

    /// Reads a single attribute off a live entity, Nil when absent.
    fn lookup(&self, id: EntityId, name: &str) -> Value {
        let Some(attr) = self.interner.resolve(name) else {
            return Value::Nil;
        };
        self.rows
            .get(&id)
            .and_then(|row| row.get(&attr))
            .cloned()
            .unwrap_or(Value::Nil)
    }

    // =========================================================================
    // Interner access
    // =========================================================================

    /// Interns an attribute name.
    pub fn attr_id(&mut self, name: &str) -> AttrId {
        self.interner.intern(name)
    }

    /// Looks up an attribute name without interning it.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<AttrId> {
        self.interner.resolve(name)
    }

    /// Gets the name for an interned attribute ID.
    #[must_use]
    pub fn attr_name(&self, attr: AttrId) -> Option<&str> {
        self.interner.name(attr)
    }
}
