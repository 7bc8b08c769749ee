//! Dotted attribute paths.
//!
//! A dependency key like `"indirection.p"` names an attribute reached
//! through nested entities. Paths are parsed exactly once at definition
//! time into an immutable segment list; resolution never re-parses the
//! string.

use std::fmt;
use std::sync::Arc;

/// A dotted attribute path, parsed into immutable segments.
///
/// Parsing never fails: a path with no dots is a single segment, and odd
/// inputs (empty segments from `"a..b"` and the like) are preserved
/// verbatim; they simply never resolve to anything, which the Nil-tolerant
/// traversal contract already covers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AttrPath {
    segments: Vec<Arc<str>>,
}

impl AttrPath {
    /// Parses a dotted path such as `"indirection.p"`.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split('.').map(Arc::from).collect(),
        }
    }

    /// Creates a single-segment path from an attribute name.
    #[must_use]
    pub fn single(name: impl Into<Arc<str>>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// Returns the path segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Arc<str>] {
        &self.segments
    }

    /// Returns the first segment (the attribute resolved on the root entity).
    #[must_use]
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the path traverses nested attributes.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// A path is never empty; `split` always yields at least one segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Debug for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttrPath({self})")
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for AttrPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for AttrPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}
