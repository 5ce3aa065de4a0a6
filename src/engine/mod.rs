//! The match engine: pattern grammar, match specifications, the unit
//! builder DSL, dispatch, and the help surface.
//!
//! Units compile their declarative match tables once, at build time; the
//! dispatch loop then evaluates every inbound message against the compiled
//! representation.

pub(crate) mod help;
pub mod pattern;
pub mod spec;
pub mod unit;

pub use pattern::{Captures, Pattern, Template, DEFAULT_MATCH_GROUP};
pub use spec::{MatchSpec, OverridePolicy, Uniqueness, Validator};
pub use unit::{CommandScope, HandlerUnit, SpecOptions, UnitBuilder};
