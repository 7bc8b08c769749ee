//! Observer registration and change notification.
//!
//! Observers register on a `(entity, attribute)` pair and fire when the
//! settled value of that attribute differs from the last value they saw.
//! Each registration keeps its own last-seen baseline, so one settlement
//! pass fires each observer at most once no matter how many underlying
//! writes fed into it.

use std::collections::HashMap;
use std::sync::Arc;

use spindle_foundation::{AttrId, EntityId, Value};

/// Handle returned by registration, used to unregister.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ObserverId(u64);

/// A settled change delivered to an observer.
#[derive(Clone, Debug)]
pub struct Change {
    /// The entity whose attribute changed.
    pub entity: EntityId,
    /// The attribute name.
    pub attribute: Arc<str>,
    /// The settled value.
    pub value: Value,
}

/// Observer callback. Receives each settled change for its registration.
pub type ObserverFn = Box<dyn FnMut(&Change)>;

struct Registration {
    id: ObserverId,
    /// Value as of the last notification (or registration), compared
    /// against the settled value to suppress no-op firings.
    last_seen: Value,
    callback: ObserverFn,
}

/// Registry of observers keyed by watched `(entity, attribute)` pair.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: HashMap<(EntityId, AttrId), Vec<Registration>>,
    next_id: u64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer with its current-value baseline.
    pub fn add(
        &mut self,
        entity: EntityId,
        attr: AttrId,
        baseline: Value,
        callback: ObserverFn,
    ) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers
            .entry((entity, attr))
            .or_default()
            .push(Registration {
                id,
                last_seen: baseline,
                callback,
            });
        id
    }

    /// Unregisters an observer. Returns true if it was registered.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let mut removed = false;
        self.observers.retain(|_, regs| {
            let before = regs.len();
            regs.retain(|reg| reg.id != id);
            removed |= regs.len() < before;
            !regs.is_empty()
        });
        removed
    }

    /// Returns every watched `(entity, attribute)` pair.
    pub fn watched(&self) -> Vec<(EntityId, AttrId)> {
        self.observers.keys().copied().collect()
    }

    /// Returns true if anything observes the given pair.
    pub fn observes(&self, entity: EntityId, attr: AttrId) -> bool {
        self.observers.contains_key(&(entity, attr))
    }

    /// Delivers a settled value to the pair's observers.
    ///
    /// Each observer fires only if the value differs from its last-seen
    /// baseline, and the baseline advances either way. Returns the number
    /// of callbacks fired.
    pub fn notify(&mut self, entity: EntityId, attr: AttrId, change: &Change) -> usize {
        let mut fired = 0;
        if let Some(regs) = self.observers.get_mut(&(entity, attr)) {
            for reg in regs {
                if reg.last_seen != change.value {
                    reg.last_seen = change.value.clone();
                    (reg.callback)(change);
                    fired += 1;
                }
            }
        }
        fired
    }

    /// Drops every registration watching the given entity.
    pub fn forget_entity(&mut self, entity: EntityId) {
        self.observers.retain(|(owner, _), _| *owner != entity);
    }

    /// Returns the number of registrations.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.observers.values().map(Vec::len).sum()
    }
}
