//! Core types, values, and persistent collections for Spindle.
//!
//! This crate provides:
//! - [`Value`] - The dynamic value type held by attributes
//! - [`EntityId`] - Generational entity identifiers
//! - [`AttrId`] / [`Interner`] - Interned attribute names
//! - [`AttrPath`] - Dotted dependency keys, parsed once
//! - [`Error`] - Rich error types with context
//! - Persistent collections ([`AttrVec`], [`AttrSet`], [`AttrMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod entity;
pub mod error;
pub mod intern;
pub mod path;
pub mod value;

pub use collections::{AttrMap, AttrSet, AttrVec};
pub use entity::EntityId;
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use intern::{AttrId, Interner};
pub use path::AttrPath;
pub use value::Value;
