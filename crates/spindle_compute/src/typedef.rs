//! Entity type definitions and rule compilation.
//!
//! A [`TypeDef`] names the computed attributes of an entity type. Rules are
//! validated at definition time (direct self-cycles) and compiled at
//! registration time into an evaluation tree with interned watch sets,
//! ready for the evaluator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use spindle_foundation::{AttrId, AttrPath, Result, Value};
use spindle_store::World;

use crate::graph::{self, DepSet};
use crate::rule::{ComputedRule, DepArg, RuleFn, RuleId};

/// Transitive watch expansion: computed attribute name to every attribute
/// name whose change can invalidate it through sibling computed attributes.
pub(crate) type WatchClosure = HashMap<Arc<str>, HashSet<Arc<str>>>;

/// Definition of an entity type: an ordered set of computed attributes.
///
/// Stored attributes need no declaration; any attribute not named here is
/// plain storage. Rule definitions are shared and immutable: attaching the
/// same `Arc<ComputedRule>` to several types is supported and cheap.
#[derive(Clone, Debug)]
pub struct TypeDef {
    name: String,
    computed: Vec<(Arc<str>, Arc<ComputedRule>, DepSet)>,
}

impl TypeDef {
    /// Creates an empty type definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            computed: Vec::new(),
        }
    }

    /// Declares a computed attribute.
    ///
    /// The rule's dependencies are flattened here, once; dependency
    /// structure is static after composition.
    ///
    /// # Errors
    /// Returns [`spindle_foundation::ErrorKind::CyclicDependency`] if the
    /// rule's flattened dependencies lead with `attr` itself.
    pub fn computed(
        mut self,
        attr: impl Into<Arc<str>>,
        rule: impl Into<Arc<ComputedRule>>,
    ) -> Result<Self> {
        let attr = attr.into();
        let rule = rule.into();
        let deps = graph::flatten(&rule);
        graph::check_self_cycle(&attr, &deps)?;
        self.computed.push((attr, rule, deps));
        Ok(self)
    }

    /// Returns the type's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared computed attribute names.
    pub fn attrs(&self) -> impl Iterator<Item = &str> {
        self.computed.iter().map(|(name, _, _)| name.as_ref())
    }

    pub(crate) fn entries(&self) -> &[(Arc<str>, Arc<ComputedRule>, DepSet)] {
        &self.computed
    }

    /// Rejects indirect cycles among this type's computed attributes.
    pub(crate) fn check_cycles(&self) -> Result<()> {
        let flat: Vec<(Arc<str>, DepSet)> = self
            .computed
            .iter()
            .map(|(name, _, deps)| (name.clone(), deps.clone()))
            .collect();
        graph::check_type_cycles(&flat)
    }
}

/// A compiled dependency of an evaluation node.
pub(crate) enum CompiledDep {
    /// Literal path, resolved via the world at evaluation time.
    Path(AttrPath),
    /// Literal value.
    Literal(Value),
    /// Nested sub-computation with its own cache slot.
    Node(CompiledNode),
}

/// One node of a compiled rule tree.
pub(crate) struct CompiledNode {
    /// Identity of the source rule instance, for sub-computation caching.
    pub id: RuleId,
    /// Rule label, for error context.
    pub label: &'static str,
    /// Compiled dependencies in declaration order.
    pub deps: Vec<CompiledDep>,
    /// Interned names whose change invalidates this node's cache entry.
    /// Shared across every cache entry the node produces.
    pub watch: Arc<HashSet<AttrId>>,
    /// The rule function.
    pub func: RuleFn,
}

/// A computed attribute compiled against a world's interner.
pub(crate) struct CompiledComputed {
    /// Interned attribute name.
    pub name: AttrId,
    /// Root of the compiled rule tree. Keeps the source rule `Arc`s alive,
    /// which keeps [`RuleId`]s stable.
    pub node: CompiledNode,
    /// The shared rule definition. Held so [`RuleId`]s stay stable, and
    /// re-flattened when per-entity definitions are recompiled.
    pub rule: Arc<ComputedRule>,
}

/// Computes the transitive watch expansion over a set of computed
/// attributes.
///
/// A rule naming a sibling computed attribute is invalidated by anything
/// that invalidates the sibling, so the sibling's flattened names (and
/// theirs, recursively) fold into the watcher's set. The walk is guarded
/// against revisits, so it terminates even on input the cycle checks
/// would reject.
pub(crate) fn watch_closure(entries: &[(Arc<str>, DepSet)]) -> WatchClosure {
    let base: HashMap<&str, &DepSet> = entries
        .iter()
        .map(|(name, deps)| (name.as_ref(), deps))
        .collect();

    let mut closure = WatchClosure::new();
    for (name, _) in entries {
        let mut out = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![name.clone()];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(deps) = base.get(current.as_ref()) {
                for dep in &deps.names {
                    out.insert(dep.clone());
                    stack.push(dep.clone());
                }
            }
        }
        closure.insert(name.clone(), out);
    }
    closure
}

/// Compiles a type's computed attributes against a world.
///
/// Interns every attribute name the rules mention so later invalidation is
/// a set lookup on `AttrId`s. Watch sets are expanded transitively across
/// the type's own computed attributes.
pub(crate) fn compile_type(def: &TypeDef, world: &mut World) -> Result<Vec<CompiledComputed>> {
    def.check_cycles()?;

    let flat: Vec<(Arc<str>, DepSet)> = def
        .entries()
        .iter()
        .map(|(name, _, deps)| (name.clone(), deps.clone()))
        .collect();
    let closure = watch_closure(&flat);

    def.entries()
        .iter()
        .map(|(name, rule, _)| compile_computed(name, rule, &closure, world))
        .collect()
}

/// Compiles a single computed attribute.
pub(crate) fn compile_computed(
    name: &str,
    rule: &Arc<ComputedRule>,
    closure: &WatchClosure,
    world: &mut World,
) -> Result<CompiledComputed> {
    Ok(CompiledComputed {
        name: world.attr_id(name),
        node: compile_node(rule, closure, world),
        rule: Arc::clone(rule),
    })
}

fn compile_node(
    rule: &Arc<ComputedRule>,
    closure: &WatchClosure,
    world: &mut World,
) -> CompiledNode {
    let mut names: HashSet<Arc<str>> = HashSet::new();
    for name in graph::flatten(rule).names {
        if let Some(expanded) = closure.get(&name) {
            names.extend(expanded.iter().cloned());
        }
        names.insert(name);
    }
    let watch: HashSet<AttrId> = names.iter().map(|name| world.attr_id(name)).collect();

    let deps = rule
        .deps()
        .iter()
        .map(|dep| match dep {
            DepArg::Path(path) => {
                for segment in path.segments() {
                    world.attr_id(segment);
                }
                CompiledDep::Path(path.clone())
            }
            DepArg::Literal(value) => CompiledDep::Literal(value.clone()),
            DepArg::Rule(nested) => CompiledDep::Node(compile_node(nested, closure, world)),
        })
        .collect();

    CompiledNode {
        id: RuleId::of(rule),
        label: rule.label(),
        deps,
        watch: Arc::new(watch),
        func: rule.func(),
    }
}
