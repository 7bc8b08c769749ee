//! Entity lifecycle and attribute storage for Spindle.
//!
//! This crate provides:
//! - [`EntityStore`] - Entity allocation with generational stale detection
//! - [`World`] - The attribute store: get/set with change detection and
//!   Nil-tolerant dotted-path traversal

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod world;

pub use entity::EntityStore;
pub use world::World;
