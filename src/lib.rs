//! Spindle - Composable dependency-tracked computed attributes
//!
//! This crate re-exports all layers of the Spindle system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: spindle_compute    — Rules, macro composition, evaluation, observers
//! Layer 1: spindle_store      — Entity lifecycle, attribute rows, path traversal
//! Layer 0: spindle_foundation — Core types (Value, EntityId, AttrPath, Error)
//! ```

pub use spindle_compute as compute;
pub use spindle_foundation as foundation;
pub use spindle_store as store;
