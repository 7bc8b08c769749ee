//! Value cache for computed attributes and sub-computations.
//!
//! Presence in the cache means valid: invalidation removes entries, which
//! makes repeated invalidation trivially idempotent. Each entry carries the
//! watch set of the node that produced it (shared, not copied), so
//! invalidation by attribute name is a retain pass.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use spindle_foundation::{AttrId, EntityId, Value};

use crate::rule::RuleId;

/// Cache key: a named computed attribute, or an anonymous sub-computation
/// inside a composed rule.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub(crate) enum CacheKey {
    /// A computed attribute, by interned name.
    Attr(AttrId),
    /// A composed sub-rule, by rule instance identity.
    Sub(RuleId),
}

struct CacheEntry {
    value: Value,
    /// Names whose change invalidates this entry. Empty for constants,
    /// which are therefore never invalidated.
    watch: Arc<HashSet<AttrId>>,
}

/// Cache of computed values, keyed per entity instance.
///
/// Entities never share entries, so one rule instance attached to many
/// entity types still evaluates independently per instance.
#[derive(Default)]
pub(crate) struct ComputeCache {
    entries: HashMap<(EntityId, CacheKey), CacheEntry>,
}

impl ComputeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a cached value, if present (presence means valid).
    pub fn get(&self, entity: EntityId, key: CacheKey) -> Option<&Value> {
        self.entries.get(&(entity, key)).map(|entry| &entry.value)
    }

    /// Stores a computed value with the watch set of its node.
    pub fn insert(
        &mut self,
        entity: EntityId,
        key: CacheKey,
        value: Value,
        watch: Arc<HashSet<AttrId>>,
    ) {
        self.entries
            .insert((entity, key), CacheEntry { value, watch });
    }

    /// Invalidates every entry watching the given attribute name.
    /// Returns the number of entries removed.
    pub fn invalidate_name(&mut self, attr: AttrId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.watch.contains(&attr));
        before - self.entries.len()
    }

    /// Drops all entries for an entity. Returns the number removed.
    pub fn forget_entity(&mut self, entity: EntityId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(owner, _), _| *owner != entity);
        before - self.entries.len()
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
