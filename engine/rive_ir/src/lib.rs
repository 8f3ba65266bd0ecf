//! Rive IR - data model shared by every stage of the reply engine.
//!
//! This crate contains:
//! - Compiled trigger patterns (`Pattern`, `Segment`, `WildcardKind`)
//! - Compiled response templates (`Template`, `Piece`, `Tag`)
//! - The script document shape handed over by a parser (`ScriptDocument`)
//!
//! # Design Philosophy
//!
//! - **Immutable once built**: patterns and templates are constructed by the
//!   compilers in `rive_patterns` and never mutated afterwards, so they can
//!   be shared across threads behind an `Arc` without locking.
//! - **No behaviour here**: matching, rendering and dispatch live in the
//!   crates that own those concerns. This crate only defines shapes and the
//!   few invariants that follow directly from them (wildcard numbering,
//!   specificity ordering, canonical display).

mod pattern;
mod script;
mod template;

pub use pattern::{Alternative, Pattern, Segment, Specificity, WildcardKind};
pub use script::{ObjectDef, ScriptDocument, TopicDef, TriggerDef, DEFAULT_TOPIC};
pub use template::{CaseFormat, MathOp, Piece, Tag, Template};
