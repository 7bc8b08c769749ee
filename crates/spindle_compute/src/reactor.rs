//! The reactive front door: a world plus registered types, computed
//! evaluation, observers, and batched settlement.
//!
//! All reads and writes go through the [`Reactor`]. Reads are lazy: a
//! computed attribute evaluates on first access and is cached until a
//! watched name changes. Writes invalidate eagerly and settle observers
//! either immediately (outside a batch) or once at the end of the
//! outermost [`Reactor::batch`] scope.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use spindle_foundation::{
    AttrId, AttrMap, AttrPath, EntityId, Error, ErrorKind, Result, Value,
};
use spindle_store::World;

use crate::evaluate::{DefScope, Evaluator};
use crate::graph::{self, DepSet};
use crate::observe::{Change, ObserverId, ObserverRegistry};
use crate::rule::ComputedRule;
use crate::typedef::{compile_computed, compile_type, watch_closure, CompiledComputed, TypeDef};

/// Handle to a registered entity type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeId(u32);

struct RegisteredType {
    def: TypeDef,
    computed: Vec<CompiledComputed>,
}

/// A world with reactive computed attributes.
pub struct Reactor {
    world: World,
    types: Vec<RegisteredType>,
    /// Which registered type each typed entity was spawned as.
    entity_types: HashMap<EntityId, TypeId>,
    /// Per-entity computed definitions, shadowing the entity's type.
    overrides: HashMap<EntityId, Vec<CompiledComputed>>,
    evaluator: Evaluator,
    observers: ObserverRegistry,
    /// Stored writes since the last settlement.
    pending: HashSet<(EntityId, AttrId)>,
    batch_depth: usize,
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor {
    /// Creates an empty reactor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: World::new(),
            types: Vec::new(),
            entity_types: HashMap::new(),
            overrides: HashMap::new(),
            evaluator: Evaluator::new(),
            observers: ObserverRegistry::new(),
            pending: HashSet::new(),
            batch_depth: 0,
        }
    }

    /// Read-only access to the underlying world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    // =========================================================================
    // Types and entities
    // =========================================================================

    /// Registers an entity type, compiling its computed attributes.
    ///
    /// # Errors
    /// Returns [`ErrorKind::CyclicDependency`] if the type's computed
    /// attributes depend on each other in a cycle.
    pub fn register_type(&mut self, def: TypeDef) -> Result<TypeId> {
        let computed = compile_type(&def, &mut self.world)?;
        let id = TypeId(u32::try_from(self.types.len()).map_err(|_| {
            Error::new(ErrorKind::Internal("too many registered types".into()))
        })?);
        self.types.push(RegisteredType { def, computed });
        Ok(id)
    }

    /// Looks up a registered type by name.
    #[must_use]
    pub fn type_named(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|ty| ty.def.name() == name)
            .and_then(|i| u32::try_from(i).ok())
            .map(TypeId)
    }

    /// Spawns an entity of a registered type with initial stored attributes.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownType`] if the type handle is not one this
    /// reactor issued.
    pub fn spawn<N, I>(&mut self, ty: TypeId, attrs: I) -> Result<EntityId>
    where
        N: AsRef<str>,
        I: IntoIterator<Item = (N, Value)>,
    {
        if self.types.get(ty.0 as usize).is_none() {
            return Err(Error::unknown_type(format!("type #{}", ty.0)));
        }
        let entity = self.world.spawn_with(attrs);
        self.entity_types.insert(entity, ty);
        Ok(entity)
    }

    /// Spawns an untyped entity with initial stored attributes.
    ///
    /// Computed attributes can still be attached per entity via
    /// [`Reactor::define_computed`].
    pub fn spawn_plain<N, I>(&mut self, attrs: I) -> EntityId
    where
        N: AsRef<str>,
        I: IntoIterator<Item = (N, Value)>,
    {
        self.world.spawn_with(attrs)
    }

    /// Destroys an entity and drops its caches, observers, and overrides.
    ///
    /// # Errors
    /// Returns an error if the entity is already destroyed or unknown.
    pub fn despawn(&mut self, entity: EntityId) -> Result<()> {
        self.world.despawn(entity)?;
        self.evaluator.forget_entity(entity);
        self.observers.forget_entity(entity);
        self.entity_types.remove(&entity);
        self.overrides.remove(&entity);
        self.pending.retain(|(owner, _)| *owner != entity);
        Ok(())
    }

    /// Attaches a computed attribute to a single entity, shadowing any
    /// definition its type carries for the same name.
    ///
    /// # Errors
    /// Returns an error if the entity is dead, or
    /// [`ErrorKind::CyclicDependency`] if the rule closes a cycle through
    /// the entity's computed attributes.
    pub fn define_computed(
        &mut self,
        entity: EntityId,
        name: &str,
        rule: impl Into<Arc<ComputedRule>>,
    ) -> Result<()> {
        if !self.world.exists(entity) {
            return Err(Error::stale_entity(entity));
        }
        let rule = rule.into();
        graph::check_self_cycle(name, &graph::flatten(&rule))?;

        // Recompile all of the entity's overrides together, so watch
        // expansion and cycle checking see the full set of definitions in
        // effect for this entity.
        let mut defs: Vec<(Arc<str>, Arc<ComputedRule>)> = Vec::new();
        if let Some(existing) = self.overrides.get(&entity) {
            for def in existing {
                if let Some(existing_name) = self.world.attr_name(def.name) {
                    if existing_name != name {
                        defs.push((Arc::from(existing_name), Arc::clone(&def.rule)));
                    }
                }
            }
        }
        defs.push((Arc::from(name), Arc::clone(&rule)));

        let mut flat: Vec<(Arc<str>, DepSet)> = defs
            .iter()
            .map(|(attr, rule)| (attr.clone(), graph::flatten(rule)))
            .collect();
        if let Some(ty) = self.entity_types.get(&entity) {
            if let Some(registered) = self.types.get(ty.0 as usize) {
                for (attr, _, deps) in registered.def.entries() {
                    // A shadowed type definition is not in effect; watch
                    // expansion and cycle edges must use the override.
                    if defs.iter().any(|(name, _)| name == attr) {
                        continue;
                    }
                    flat.push((attr.clone(), deps.clone()));
                }
            }
        }
        graph::check_type_cycles(&flat)?;

        let closure = watch_closure(&flat);
        let mut compiled = Vec::with_capacity(defs.len());
        for (attr, rule) in &defs {
            compiled.push(compile_computed(attr, rule, &closure, &mut self.world)?);
        }
        self.overrides.insert(entity, compiled);

        // Anything this entity had cached may now be stale.
        self.evaluator.forget_entity(entity);
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an attribute value, evaluating it if computed.
    ///
    /// # Errors
    /// Returns an error if the entity is dead or a rule function fails.
    pub fn get(&mut self, entity: EntityId, name: &str) -> Result<Value> {
        if let Some(attr) = self.world.resolve(name) {
            let scope = scope_of(&self.types, &self.overrides, &self.entity_types, entity);
            if let Some(def) = scope.find(attr) {
                return self.evaluator.get(entity, def, scope, &self.world);
            }
        }
        self.world.get(entity, name)
    }

    /// Resolves a dotted path, evaluating computed attributes along the way.
    ///
    /// Traversal crosses live entity references and string-keyed maps; any
    /// missing or non-traversable intermediate resolves to `Nil`.
    ///
    /// # Errors
    /// Returns an error if the root entity is dead or a rule function fails.
    pub fn get_path(&mut self, entity: EntityId, path: &AttrPath) -> Result<Value> {
        let segments = path.segments();
        let mut current = self.get(entity, &segments[0])?;

        for segment in &segments[1..] {
            current = match current {
                Value::EntityRef(nested) if self.world.exists(nested) => {
                    self.get(nested, segment)?
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

    // =========================================================================
    // Writes and settlement
    // =========================================================================

    /// Sets a stored attribute, returning whether the value changed.
    ///
    /// A real change invalidates every cached computation watching the
    /// name. Outside a batch the write settles immediately; inside one it
    /// settles when the outermost batch ends.
    ///
    /// # Errors
    /// Returns an error if the entity is dead or unknown.
    pub fn set(&mut self, entity: EntityId, name: &str, value: Value) -> Result<bool> {
        let changed = self.world.set(entity, name, value)?;
        if changed {
            let attr = self.world.attr_id(name);
            self.evaluator.on_attr_change(attr);
            self.pending.insert((entity, attr));
            if self.batch_depth == 0 {
                self.settle();
            }
        }
        Ok(changed)
    }

    /// Sets a value through a dotted path.
    ///
    /// Entity-reference intermediates redirect the write to the nested
    /// entity, so invalidation happens under the final attribute's name.
    /// Map intermediates are rebuilt and the owning attribute rewritten.
    ///
    /// # Errors
    /// Returns an error if an entity on the path is dead, or if an
    /// intermediate is a non-traversable value.
    pub fn set_path(&mut self, entity: EntityId, path: &AttrPath, value: Value) -> Result<bool> {
        let segments = path.segments();
        let last = segments.len() - 1;
        if last == 0 {
            return self.set(entity, &segments[0], value);
        }

        let mut owner = entity;
        for (i, segment) in segments[..last].iter().enumerate() {
            match self.world.get(owner, segment)? {
                Value::EntityRef(nested) if self.world.exists(nested) => owner = nested,
                Value::Map(map) => {
                    let rebuilt = set_in_map(map, &segments[i + 1..], value)?;
                    return self.set(owner, segment, Value::Map(rebuilt));
                }
                other => {
                    return Err(Error::new(ErrorKind::Internal(format!(
                        "cannot set through '{segment}': {other:?} is not traversable"
                    ))));
                }
            }
        }
        self.set(owner, &segments[last], value)
    }

    /// Runs writes as a batch: observers settle once, after `f` returns.
    ///
    /// Batches nest; only the outermost settles.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.settle();
        }
        result
    }

    /// Delivers pending changes to observers.
    ///
    /// Each observed `(entity, attribute)` pair is re-read once if a pending
    /// write could have affected it, and its observers fire only if the
    /// settled value differs from what they last saw. A rule failure during
    /// settlement skips notification; the cache entry stays invalid and the
    /// next direct read surfaces the error.
    fn settle(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending: HashSet<(EntityId, AttrId)> = self.pending.drain().collect();
        let changed_names: HashSet<AttrId> = pending.iter().map(|&(_, attr)| attr).collect();

        for (entity, attr) in self.observers.watched() {
            if !self.world.exists(entity) {
                continue;
            }

            let scope = scope_of(&self.types, &self.overrides, &self.entity_types, entity);
            let def = scope.find(attr);
            let affected = pending.contains(&(entity, attr))
                || def.is_some_and(|d| !d.node.watch.is_disjoint(&changed_names));
            if !affected {
                continue;
            }

            let value = match def {
                Some(def) => match self.evaluator.get(entity, def, scope, &self.world) {
                    Ok(value) => value,
                    Err(_) => continue,
                },
                None => match self.world.get_id(entity, attr) {
                    Ok(value) => value,
                    Err(_) => continue,
                },
            };

            let attribute: Arc<str> = self.world.attr_name(attr).unwrap_or_default().into();
            let change = Change {
                entity,
                attribute,
                value,
            };
            self.observers.notify(entity, attr, &change);
        }
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Observes an attribute of an entity.
    ///
    /// The observer's baseline is the attribute's current value, so it only
    /// fires for changes after registration.
    ///
    /// # Errors
    /// Returns an error if the entity is dead or the baseline read fails.
    pub fn observe(
        &mut self,
        entity: EntityId,
        name: &str,
        callback: impl FnMut(&Change) + 'static,
    ) -> Result<ObserverId> {
        let baseline = self.get(entity, name)?;
        let attr = self.world.attr_id(name);
        Ok(self.observers.add(entity, attr, baseline, Box::new(callback)))
    }

    /// Removes an observer. Returns true if it was registered.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }
}

/// Builds the definition scope for one entity: its overrides plus its
/// type's computed attributes. A free function so callers can keep
/// disjoint borrows on the reactor's other fields.
fn scope_of<'a>(
    types: &'a [RegisteredType],
    overrides: &'a HashMap<EntityId, Vec<CompiledComputed>>,
    entity_types: &'a HashMap<EntityId, TypeId>,
    entity: EntityId,
) -> DefScope<'a> {
    DefScope {
        overrides: overrides.get(&entity).map_or(&[], Vec::as_slice),
        typed: entity_types
            .get(&entity)
            .and_then(|ty| types.get(ty.0 as usize))
            .map_or(&[], |registered| registered.computed.as_slice()),
    }
}

fn set_in_map(
    map: AttrMap<Value, Value>,
    segments: &[Arc<str>],
    value: Value,
) -> Result<AttrMap<Value, Value>> {
    let key = Value::String(segments[0].clone());
    if segments.len() == 1 {
        return Ok(if value.is_nil() {
            map.remove(&key)
        } else {
            map.insert(key, value)
        });
    }

    let inner = match map.get(&key).cloned() {
        Some(Value::Map(inner)) => inner,
        None => AttrMap::new(),
        Some(other) => {
            return Err(Error::new(ErrorKind::Internal(format!(
                "cannot set through '{}': {other:?} is not traversable",
                segments[0]
            ))));
        }
    };
    let rebuilt = set_in_map(inner, &segments[1..], value)?;
    Ok(map.insert(key, Value::Map(rebuilt)))
}
