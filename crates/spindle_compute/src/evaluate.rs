//! Lazy evaluation of compiled computed attributes.
//!
//! The evaluator resolves a compiled rule tree against an entity: cache
//! hits return without recomputation; misses resolve each declared
//! dependency in order (paths via the world, literals by clone, nested
//! rules recursively through their own cache slots), invoke the rule
//! function, and cache the result. A path whose head names another
//! computed attribute in scope evaluates that attribute instead of
//! reading storage. A rule-function error leaves the entry absent so the
//! next read retries.

use std::sync::Arc;

use spindle_foundation::{AttrId, EntityId, Error, Result, Value};
use spindle_store::World;

use crate::cache::{CacheKey, ComputeCache};
use crate::rule::EvalCtx;
use crate::typedef::{CompiledComputed, CompiledDep, CompiledNode};

/// Default recursion limit. Per-type composition is statically acyclic, so
/// this is a backstop against pathological nesting, not a correctness
/// mechanism.
const DEFAULT_MAX_DEPTH: usize = 100;

/// The computed definitions visible while evaluating one entity:
/// per-entity overrides shadow the entity's type.
#[derive(Copy, Clone)]
pub(crate) struct DefScope<'a> {
    pub overrides: &'a [CompiledComputed],
    pub typed: &'a [CompiledComputed],
}

impl<'a> DefScope<'a> {
    pub const EMPTY: DefScope<'static> = DefScope {
        overrides: &[],
        typed: &[],
    };

    /// Finds the definition in effect for an attribute, if any.
    pub fn find(&self, attr: AttrId) -> Option<&'a CompiledComputed> {
        self.overrides
            .iter()
            .find(|def| def.name == attr)
            .or_else(|| self.typed.iter().find(|def| def.name == attr))
    }
}

/// Evaluates compiled computed attributes with per-entity caching.
pub(crate) struct Evaluator {
    cache: ComputeCache,
    max_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Creates a new evaluator with an empty cache.
    pub fn new() -> Self {
        Self {
            cache: ComputeCache::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the max evaluation depth.
    #[cfg(test)]
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Gets the value of a computed attribute for an entity.
    ///
    /// Cached values are returned without recomputation.
    pub fn get(
        &mut self,
        entity: EntityId,
        def: &CompiledComputed,
        scope: DefScope<'_>,
        world: &World,
    ) -> Result<Value> {
        self.eval_node(entity, &def.node, CacheKey::Attr(def.name), scope, world, 0)
    }

    fn eval_node(
        &mut self,
        entity: EntityId,
        node: &CompiledNode,
        key: CacheKey,
        scope: DefScope<'_>,
        world: &World,
        depth: usize,
    ) -> Result<Value> {
        if depth > self.max_depth {
            return Err(frame(Error::depth_exceeded(self.max_depth), node.label));
        }

        if let Some(value) = self.cache.get(entity, key) {
            return Ok(value.clone());
        }

        let mut args = Vec::with_capacity(node.deps.len());
        for dep in &node.deps {
            args.push(match dep {
                CompiledDep::Path(path) => {
                    // A path leading with a computed attribute evaluates
                    // it; anything else reads storage.
                    let head_def = world.resolve(path.head()).and_then(|attr| scope.find(attr));
                    match head_def {
                        Some(def) => {
                            let head = self.eval_node(
                                entity,
                                &def.node,
                                CacheKey::Attr(def.name),
                                scope,
                                world,
                                depth + 1,
                            )?;
                            walk_tail(world, head, &path.segments()[1..])
                        }
                        None => world.get_path(entity, path)?,
                    }
                }
                CompiledDep::Literal(value) => value.clone(),
                CompiledDep::Node(sub) => {
                    self.eval_node(entity, sub, CacheKey::Sub(sub.id), scope, world, depth + 1)?
                }
            });
        }

        let ctx = EvalCtx::new(world);
        let value = (node.func)(&ctx, &args).map_err(|err| frame(err, node.label))?;

        self.cache
            .insert(entity, key, value.clone(), node.watch.clone());
        Ok(value)
    }

    /// Invalidates every cached value watching the given attribute name.
    /// Returns the number of entries invalidated.
    pub fn on_attr_change(&mut self, attr: AttrId) -> usize {
        self.cache.invalidate_name(attr)
    }

    /// Drops all cached values for an entity.
    pub fn forget_entity(&mut self, entity: EntityId) -> usize {
        self.cache.forget_entity(entity)
    }

    /// Returns the number of live cache entries.
    #[cfg(test)]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Resolves the remaining segments of a dotted path over an evaluated head
/// value. Any missing or non-traversable hop is `Nil`.
fn walk_tail(world: &World, mut current: Value, segments: &[Arc<str>]) -> Value {
    for segment in segments {
        current = match current {
            Value::EntityRef(nested) if world.exists(nested) => {
                world.get(nested, segment).unwrap_or(Value::Nil)
            }
            Value::Map(map) => map
                .get(&Value::String(segment.clone()))
                .cloned()
                .unwrap_or(Value::Nil),
            _ => Value::Nil,
        };
    }
    current
}

fn frame(mut err: Error, label: &str) -> Error {
    let ctx = err.context.take().unwrap_or_default().with_frame(label);
    err.with_context(ctx)
}
