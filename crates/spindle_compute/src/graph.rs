//! Dependency flattening and cycle detection.
//!
//! A rule's declared dependency list mixes literal paths and nested rules.
//! Flattening resolves that to the set of literal attribute paths reachable
//! through composition: a nested rule contributes the flattened paths of
//! its own dependencies, never itself. Dependency structure is static
//! (fixed at composition time), so cycle detection runs at definition and
//! registration time, never at runtime.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use spindle_foundation::{AttrPath, Error, Result};

use crate::rule::{ComputedRule, DepArg};

/// Flattened dependencies of a rule.
#[derive(Clone, Debug, Default)]
pub struct DepSet {
    /// Literal attribute paths, in declaration order, duplicates removed.
    pub paths: Vec<AttrPath>,
    /// Every attribute name that should invalidate the rule: all path
    /// segments plus extra watched names (e.g. `map_by` member keys).
    pub names: HashSet<Arc<str>>,
}

impl DepSet {
    /// Returns true if the set names the given attribute.
    #[must_use]
    pub fn watches(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Flattens a rule's declared dependencies to literal paths and watch names.
#[must_use]
pub fn flatten(rule: &ComputedRule) -> DepSet {
    let mut set = DepSet::default();
    let mut seen = HashSet::new();
    collect(rule, &mut set, &mut seen);
    set
}

fn collect(rule: &ComputedRule, set: &mut DepSet, seen: &mut HashSet<AttrPath>) {
    for dep in rule.deps() {
        match dep {
            DepArg::Path(path) => {
                for segment in path.segments() {
                    set.names.insert(segment.clone());
                }
                if seen.insert(path.clone()) {
                    set.paths.push(path.clone());
                }
            }
            DepArg::Literal(_) => {}
            DepArg::Rule(nested) => collect(nested, set, seen),
        }
    }
    for name in rule.also_watch() {
        set.names.insert(name.clone());
    }
}

/// Rejects a computed attribute whose flattened dependencies lead with its
/// own name.
///
/// This is the direct self-cycle check performed at definition time
/// (`TypeDef::computed`).
///
/// # Errors
/// Returns [`spindle_foundation::ErrorKind::CyclicDependency`] naming the
/// offending attribute.
pub fn check_self_cycle(attribute: &str, deps: &DepSet) -> Result<()> {
    for path in &deps.paths {
        if path.head() == attribute {
            return Err(Error::cyclic_dependency(
                attribute,
                vec![attribute.to_string(), path.to_string()],
            ));
        }
    }
    Ok(())
}

/// Rejects indirect cycles among a type's computed attributes.
///
/// Builds edges `a -> b` where computed attribute `a` has a flattened path
/// whose head segment is another computed attribute `b` of the same type,
/// then walks each node depth-first. Runs at type-registration time.
///
/// # Errors
/// Returns [`spindle_foundation::ErrorKind::CyclicDependency`] with the
/// chain that closes the cycle.
pub fn check_type_cycles(computed: &[(Arc<str>, DepSet)]) -> Result<()> {
    let index: HashMap<&str, usize> = computed
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (name.as_ref(), i))
        .collect();

    // Edges by index: attr -> computed attrs its paths lead with.
    let edges: Vec<Vec<usize>> = computed
        .iter()
        .map(|(_, deps)| {
            deps.paths
                .iter()
                .filter_map(|path| index.get(path.head()).copied())
                .collect()
        })
        .collect();

    #[derive(Copy, Clone, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    fn visit(
        node: usize,
        edges: &[Vec<usize>],
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        match marks[node] {
            Mark::Done => return None,
            Mark::InProgress => {
                // Found the cycle: the suffix of the stack from this node.
                let start = stack.iter().position(|&n| n == node).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(node);
                return Some(cycle);
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::InProgress;
        stack.push(node);
        for &next in &edges[node] {
            if let Some(cycle) = visit(next, edges, marks, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        marks[node] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; computed.len()];
    for start in 0..computed.len() {
        let mut stack = Vec::new();
        if let Some(cycle) = visit(start, &edges, &mut marks, &mut stack) {
            let chain: Vec<String> = cycle
                .iter()
                .map(|&i| computed[i].0.to_string())
                .collect();
            let attribute = chain.first().cloned().unwrap_or_default();
            return Err(Error::cyclic_dependency(attribute, chain));
        }
    }

    Ok(())
}
