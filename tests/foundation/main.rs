//! Integration tests for Layer 0: Foundation
//!
//! Tests for values, attribute paths, persistent collections, and errors.
