//! Attribute-name interning.
//!
//! Attribute names are interned to enable fast equality comparison and
//! compact map keys in attribute rows and dependency sets.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Interned attribute-name identifier.
///
/// Names like `state`, `nap-time`, or `firstName` are interned once per
/// world; equality and hashing are then a `u32` compare.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttrId(pub(crate) u32);

impl AttrId {
    /// Returns the raw index of this attribute name.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttrId({})", self.0)
    }
}

/// Interner for attribute names.
///
/// Maps names to unique IDs and back. Not thread-safe; each world owns one
/// and synchronizes externally if needed.
#[derive(Clone, Debug, Default)]
pub struct Interner {
    /// Name storage, indexed by `AttrId`.
    names: Vec<Arc<str>>,
    /// Map from name to ID.
    name_map: HashMap<Arc<str>, AttrId>,
}

impl Interner {
    /// Creates a new empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns an attribute name, returning its [`AttrId`].
    ///
    /// # Panics
    ///
    /// Panics if the number of interned names exceeds `u32::MAX`.
    pub fn intern(&mut self, name: &str) -> AttrId {
        if let Some(&id) = self.name_map.get(name) {
            return id;
        }

        let idx = u32::try_from(self.names.len()).expect("too many interned attribute names");
        let arc: Arc<str> = name.into();
        self.names.push(arc.clone());

        let id = AttrId(idx);
        self.name_map.insert(arc, id);
        id
    }

    /// Looks up an already-interned name without interning it.
    ///
    /// Returns `None` if the name has never been interned, which for
    /// attribute access means "no entity has ever held this attribute".
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<AttrId> {
        self.name_map.get(name).copied()
    }

    /// Gets the name for an ID.
    #[must_use]
    pub fn name(&self, id: AttrId) -> Option<&str> {
        self.names.get(id.0 as usize).map(AsRef::as_ref)
    }

    /// Returns the number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
