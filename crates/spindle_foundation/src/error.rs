//! Error types for the Spindle system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Spindle operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a cyclic dependency error.
    ///
    /// `cycle` is the chain of attribute names that closes back on
    /// `attribute`, in discovery order.
    #[must_use]
    pub fn cyclic_dependency(attribute: impl Into<String>, cycle: Vec<String>) -> Self {
        Self::new(ErrorKind::CyclicDependency {
            attribute: attribute.into(),
            cycle,
        })
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates a stale entity reference error.
    #[must_use]
    pub fn stale_entity(id: EntityId) -> Self {
        Self::new(ErrorKind::StaleEntity(id))
    }

    /// Creates an unknown entity type error.
    #[must_use]
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownType(name.into()))
    }

    /// Creates an evaluation depth exceeded error.
    #[must_use]
    pub fn depth_exceeded(limit: usize) -> Self {
        Self::new(ErrorKind::DepthExceeded { limit })
    }

    /// Creates a rule function failure error.
    #[must_use]
    pub fn rule_failed(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RuleFailed {
            rule: rule.into(),
            message: message.into(),
        })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A computed attribute's flattened dependency set includes its own
    /// name. Detected at definition time; rule graphs are static, so this
    /// can never be resolved at runtime.
    #[error("cyclic dependency on '{attribute}': {}", format_cycle(cycle))]
    CyclicDependency {
        /// The computed attribute whose definition closes the cycle.
        attribute: String,
        /// The dependency chain that closes the cycle, in discovery order.
        cycle: Vec<String>,
    },

    /// Entity was not found in storage.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// Entity reference is stale (generation mismatch).
    #[error("stale entity reference: {0:?}")]
    StaleEntity(EntityId),

    /// Entity type was never registered.
    #[error("unknown entity type: {0}")]
    UnknownType(String),

    /// Evaluation recursion exceeded the configured depth limit.
    #[error("evaluation depth exceeded (limit {limit})")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// A rule function failed at evaluation time (for example a custom
    /// comparator rejecting its inputs). Propagates to the caller of the
    /// read; the cache entry stays invalid so the next read retries.
    #[error("rule '{rule}' failed: {message}")]
    RuleFailed {
        /// Label of the failing rule.
        rule: String,
        /// Description of the failure.
        message: String,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

fn format_cycle(cycle: &[String]) -> String {
    cycle.join(" -> ")
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Entity type or rule label the error originated in.
    pub source: Option<String>,
    /// Stack of rule labels being evaluated.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source label.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
