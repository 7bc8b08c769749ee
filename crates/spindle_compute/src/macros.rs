//! Macro composer: factories for composable computed rules.
//!
//! Each macro accepts arguments that are literal attribute paths, literal
//! values, or other rules, and returns a new [`ComputedRule`] whose
//! dependency list is the union of all argument dependencies. Composition
//! needs no named intermediate attributes: `not(equal("state", "sleepy"))`
//! is a single rule.
//!
//! Boolean macros fold truthiness (only `Nil` and `false` are falsy) to a
//! `Bool`. Short-circuiting in `and`/`or` applies to the computed value
//! only; every declared dependency stays registered for invalidation.

use std::cmp::Ordering;
use std::sync::Arc;

use spindle_foundation::{AttrPath, AttrVec, Result, Value};

use crate::rule::{ComputedRule, DepArg, EvalCtx, IntoDepArg};

/// Pass-through rule: depends solely on `path`, returns its current value.
///
/// Lets other macros treat "a plain path" and "a composed rule" uniformly,
/// including dotted paths through nested entities.
pub fn alias(path: impl Into<AttrPath>) -> ComputedRule {
    ComputedRule::new("alias", vec![DepArg::Path(path.into())], |_, args| {
        Ok(first(args))
    })
}

/// Logical negation of the input's truthiness.
///
/// `not` of an absent attribute (`Nil`) is `true`.
pub fn not(arg: impl IntoDepArg) -> ComputedRule {
    ComputedRule::new("not", vec![arg.into_dep_arg()], |_, args| {
        Ok(Value::Bool(!first(args).is_truthy()))
    })
}

/// Strict equality against a literal value.
///
/// `Nil` never equals a non-`Nil` literal, so a missing attribute compares
/// `false` rather than erroring.
pub fn equal(arg: impl IntoDepArg, value: impl Into<Value>) -> ComputedRule {
    let expected = value.into();
    ComputedRule::new("equal", vec![arg.into_dep_arg()], move |_, args| {
        Ok(Value::Bool(first(args) == expected))
    })
}

/// True when every input is truthy, in declaration order.
pub fn and(args: Vec<DepArg>) -> ComputedRule {
    ComputedRule::new("and", args, |_, values| {
        Ok(Value::Bool(values.iter().all(Value::is_truthy)))
    })
}

/// True when any input is truthy, in declaration order.
pub fn or(args: Vec<DepArg>) -> ComputedRule {
    ComputedRule::new("or", args, |_, values| {
        Ok(Value::Bool(values.iter().any(Value::is_truthy)))
    })
}

/// Zero-dependency rule producing a fixed value.
///
/// With no dependencies there is nothing to invalidate it: the value is
/// computed once per entity instance and cached forever.
pub fn constant(value: impl Into<Value>) -> ComputedRule {
    let value = value.into();
    ComputedRule::new("constant", vec![], move |_, _| Ok(value.clone()))
}

/// General-purpose rule from an explicit dependency list and function.
///
/// The escape hatch for custom derivations that the named macros don't
/// cover; the function receives resolved dependency values in declaration
/// order.
pub fn computed(
    label: &'static str,
    deps: Vec<DepArg>,
    func: impl Fn(&EvalCtx<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
) -> ComputedRule {
    ComputedRule::new(label, deps, func)
}

/// Sequence of each member's `key` attribute.
///
/// The input must resolve to an ordered sequence of entities or maps;
/// members without the key contribute `Nil`. The key name is watched, so
/// mutating it on any member invalidates the result, as does replacing the
/// collection itself.
pub fn map_by(arg: impl IntoDepArg, key: &str) -> ComputedRule {
    let key: Arc<str> = key.into();
    let watched = key.clone();
    ComputedRule::new("map_by", vec![arg.into_dep_arg()], move |ctx, args| {
        let mut out = AttrVec::new();
        if let Value::Vec(seq) = first(args) {
            for member in seq.iter() {
                out = out.push_back(ctx.member_attr(member, &key));
            }
        }
        Ok(Value::Vec(out))
    })
    .with_watch([watched])
}

/// Concatenation of sequence-valued inputs, de-duplicated by value
/// equality, first-seen order preserved.
///
/// `Nil` inputs contribute nothing; a scalar input contributes itself as a
/// single element.
pub fn union(args: Vec<DepArg>) -> ComputedRule {
    ComputedRule::new("union", args, |_, values| {
        let mut seen = std::collections::HashSet::new();
        let mut out = AttrVec::new();
        for value in values {
            match value {
                Value::Nil => {}
                Value::Vec(seq) => {
                    for item in seq.iter() {
                        if seen.insert(item.clone()) {
                            out = out.push_back(item.clone());
                        }
                    }
                }
                other => {
                    if seen.insert(other.clone()) {
                        out = out.push_back(other.clone());
                    }
                }
            }
        }
        Ok(Value::Vec(out))
    })
}

/// Stable sort of a sequence with a caller-supplied comparator.
///
/// The comparator is fallible; its error propagates to the caller of the
/// read and the result stays uncached, so the next read retries.
pub fn sort(
    arg: impl IntoDepArg,
    comparator: impl Fn(&Value, &Value) -> Result<Ordering> + Send + Sync + 'static,
) -> ComputedRule {
    ComputedRule::new("sort", vec![arg.into_dep_arg()], move |_, args| {
        let mut items: Vec<Value> = match first(args) {
            Value::Vec(seq) => seq.iter().cloned().collect(),
            Value::Nil => Vec::new(),
            other => vec![other],
        };

        // sort_by has no error channel; capture the first failure and
        // treat the pair as equal so the sort terminates, then report.
        let mut failed = None;
        items.sort_by(|a, b| match comparator(a, b) {
            Ok(ordering) => ordering,
            Err(err) => {
                failed.get_or_insert(err);
                Ordering::Equal
            }
        });
        if let Some(err) = failed {
            return Err(err);
        }

        Ok(Value::Vec(items.into_iter().collect()))
    })
}

/// Stable sort of a sequence in the default order (see [`compare`]).
pub fn sorted(arg: impl IntoDepArg) -> ComputedRule {
    sort(arg, |a, b| Ok(compare(a, b)))
}

/// Default total order over values.
///
/// `Nil` sorts first, then values of the same (or cross-numeric) type by
/// their natural order, then remaining type pairs by a fixed type rank.
/// Incomparable values of the same rank compare equal, which a stable sort
/// leaves in first-seen order.
#[must_use]
pub fn compare(a: &Value, b: &Value) -> Ordering {
    if let Some(ordering) = a.partial_cmp(b) {
        return ordering;
    }
    type_rank(a).cmp(&type_rank(b))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Nil => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::String(_) => 3,
        Value::EntityRef(_) => 4,
        Value::Vec(_) => 5,
        Value::Map(_) => 6,
    }
}

/// First resolved dependency value, `Nil` for a zero-dependency rule.
fn first(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or(Value::Nil)
}
