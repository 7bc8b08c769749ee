//! Composable computed attributes for Spindle.
//!
//! This crate provides:
//! - [`ComputedRule`] and the macro composer in [`macros`] - rules built
//!   from other rules, literal paths, and literal values
//! - [`TypeDef`] - entity type definitions with cycle checking
//! - [`Reactor`] - the reactive front door: lazy cached evaluation,
//!   observers, and batched settlement over a world
//!
//! Composition needs no named intermediate attributes:
//!
//! ```
//! use spindle_compute::macros::{equal, not};
//! use spindle_compute::{Reactor, TypeDef};
//! use spindle_foundation::Value;
//!
//! let mut reactor = Reactor::new();
//! let person = reactor
//!     .register_type(
//!         TypeDef::new("person")
//!             .computed("napTime", not(equal("state", "sleepy")))
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let alex = reactor
//!     .spawn(person, [("state", Value::from("sleepy"))])
//!     .unwrap();
//! assert_eq!(reactor.get(alex, "napTime").unwrap(), Value::Bool(false));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cache;
mod evaluate;

pub mod graph;
pub mod macros;
pub mod observe;
pub mod reactor;
pub mod rule;
pub mod typedef;

pub use graph::DepSet;
pub use observe::{Change, ObserverFn, ObserverId};
pub use reactor::{Reactor, TypeId};
pub use rule::{dep, lit, ComputedRule, DepArg, EvalCtx, IntoDepArg, RuleFn, RuleId};
pub use typedef::TypeDef;
