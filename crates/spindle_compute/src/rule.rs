//! Computed rules and their dependency arguments.
//!
//! A [`ComputedRule`] is a pure function of one or more dependency inputs,
//! tagged with its declared dependency list. Rules are immutable and shared:
//! a type definition owns `Arc`s to them, and the same rule instance may be
//! attached to many entity types. All per-evaluation state lives in the
//! per-entity cache, so instances never share mutable evaluation state.

use std::fmt;
use std::sync::Arc;

use spindle_foundation::{AttrPath, EntityId, Result, Value};
use spindle_store::World;

/// Read-only evaluation context handed to rule functions.
///
/// Most rules only look at their resolved dependency values; collection
/// rules additionally reach through sequence members (entities or maps)
/// for a keyed attribute.
pub struct EvalCtx<'a> {
    world: &'a World,
}

impl<'a> EvalCtx<'a> {
    /// Creates a context over the given world.
    #[must_use]
    pub fn new(world: &'a World) -> Self {
        Self { world }
    }

    /// Reads a stored attribute off an entity, `Nil` when absent or dead.
    #[must_use]
    pub fn attr(&self, entity: EntityId, name: &str) -> Value {
        self.world.get(entity, name).unwrap_or(Value::Nil)
    }

    /// Reads the `key` attribute of a sequence member.
    ///
    /// Members may be entity references or string-keyed maps; anything
    /// else has no attributes and yields `Nil`.
    #[must_use]
    pub fn member_attr(&self, member: &Value, key: &str) -> Value {
        match member {
            Value::EntityRef(id) => self.attr(*id, key),
            Value::Map(map) => map
                .get(&Value::String(key.into()))
                .cloned()
                .unwrap_or(Value::Nil),
            _ => Value::Nil,
        }
    }
}

/// Rule function: dependency values in declaration order to a result.
pub type RuleFn = Arc<dyn Fn(&EvalCtx<'_>, &[Value]) -> Result<Value> + Send + Sync>;

/// A declared dependency of a computed rule.
///
/// The three argument shapes macros accept are distinguished here, at
/// composition time, rather than by runtime type inspection: a literal
/// attribute path, a literal value (contributing no dependency), or
/// another rule (composition).
#[derive(Clone)]
pub enum DepArg {
    /// A literal attribute path, resolved against the evaluating entity.
    Path(AttrPath),
    /// A literal value, passed through unchanged.
    Literal(Value),
    /// A nested rule, evaluated as an anonymous sub-computation bound to
    /// the same entity.
    Rule(Arc<ComputedRule>),
}

impl fmt::Debug for DepArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "Path({p})"),
            Self::Literal(v) => write!(f, "Literal({v:?})"),
            Self::Rule(r) => write!(f, "Rule({})", r.label()),
        }
    }
}

/// Conversion into a [`DepArg`], used by macro factories.
pub trait IntoDepArg {
    /// Performs the conversion.
    fn into_dep_arg(self) -> DepArg;
}

impl IntoDepArg for DepArg {
    fn into_dep_arg(self) -> DepArg {
        self
    }
}

impl IntoDepArg for &str {
    fn into_dep_arg(self) -> DepArg {
        DepArg::Path(AttrPath::parse(self))
    }
}

impl IntoDepArg for String {
    fn into_dep_arg(self) -> DepArg {
        DepArg::Path(AttrPath::parse(&self))
    }
}

impl IntoDepArg for AttrPath {
    fn into_dep_arg(self) -> DepArg {
        DepArg::Path(self)
    }
}

impl IntoDepArg for ComputedRule {
    fn into_dep_arg(self) -> DepArg {
        DepArg::Rule(Arc::new(self))
    }
}

impl IntoDepArg for Arc<ComputedRule> {
    fn into_dep_arg(self) -> DepArg {
        DepArg::Rule(self)
    }
}

impl IntoDepArg for &Arc<ComputedRule> {
    fn into_dep_arg(self) -> DepArg {
        DepArg::Rule(Arc::clone(self))
    }
}

/// Wraps a literal value as a dependency argument.
///
/// Literals contribute no dependency; they are handed to the rule function
/// verbatim in declaration order.
pub fn lit(value: impl Into<Value>) -> DepArg {
    DepArg::Literal(value.into())
}

/// Converts a rule into a dependency argument.
///
/// Convenience for building heterogeneous dependency lists, where plain
/// `&str` paths and composed rules need a common type.
pub fn dep(arg: impl IntoDepArg) -> DepArg {
    arg.into_dep_arg()
}

/// A composable computed rule.
///
/// Built by the macro factories in [`crate::macros`], or directly via
/// [`ComputedRule::new`] for custom rule functions. Dependency structure is
/// static: it is fixed at composition time and never changes at runtime.
#[derive(Clone)]
pub struct ComputedRule {
    /// Short label for diagnostics (`"not"`, `"equal"`, ...).
    label: &'static str,
    /// Declared dependencies, in declaration order.
    deps: Vec<DepArg>,
    /// Attribute names that invalidate this rule without being evaluator
    /// inputs (e.g. the member key of `map_by`).
    also_watch: Vec<Arc<str>>,
    /// The rule function.
    func: RuleFn,
}

impl ComputedRule {
    /// Creates a rule from a label, dependency list, and rule function.
    pub fn new(
        label: &'static str,
        deps: Vec<DepArg>,
        func: impl Fn(&EvalCtx<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label,
            deps,
            also_watch: Vec::new(),
            func: Arc::new(func),
        }
    }

    /// Adds attribute names that invalidate this rule without being inputs.
    #[must_use]
    pub fn with_watch(mut self, names: impl IntoIterator<Item = Arc<str>>) -> Self {
        self.also_watch.extend(names);
        self
    }

    /// Returns the rule's label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Returns the declared dependencies in declaration order.
    #[must_use]
    pub fn deps(&self) -> &[DepArg] {
        &self.deps
    }

    /// Returns the extra watched attribute names.
    #[must_use]
    pub fn also_watch(&self) -> &[Arc<str>] {
        &self.also_watch
    }

    /// Returns a clone of the rule function.
    #[must_use]
    pub fn func(&self) -> RuleFn {
        Arc::clone(&self.func)
    }

    /// Invokes the rule function with resolved dependency values.
    ///
    /// # Errors
    /// Propagates any error from the rule function.
    pub fn invoke(&self, ctx: &EvalCtx<'_>, args: &[Value]) -> Result<Value> {
        (self.func)(ctx, args)
    }
}

impl fmt::Debug for ComputedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedRule")
            .field("label", &self.label)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// Identity of a shared rule instance, used for sub-computation cache keys.
///
/// Derived from the `Arc` allocation, so the same shared instance evaluates
/// into the same cache slot while distinct compositions stay distinct. The
/// registry holds the `Arc`s alive for as long as the id is in use.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct RuleId(usize);

impl RuleId {
    /// Returns the identity of a shared rule instance.
    #[must_use]
    pub fn of(rule: &Arc<ComputedRule>) -> Self {
        Self(Arc::as_ptr(rule) as usize)
    }
}
