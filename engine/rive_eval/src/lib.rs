//! Rive Eval - reply selection, template interpolation and the engine.
//!
//! This crate provides:
//! - `Topic`/`Trigger`: compiled triggers, ranked most specific first
//! - `Condition`: `* left op right => reply` lines of a trigger
//! - `Selector`: first matching trigger plus a (weighted) random response
//! - `Interpolator`: renders a response template, invoking object macros
//! - `Engine`: the public `reply(session, utterance)` entry point
//!
//! # Reply Pipeline
//!
//! ```text
//! utterance -> normalize -> substitute -> select trigger
//!           -> redirect | first true condition | weighted response -> render
//! ```
//!
//! Redirects, trigger-level and inline, answer their target text with the
//! same pipeline one level deeper. Past `EngineConfig::max_depth` levels the
//! reply is the deep recursion message.
//!
//! A reply never fails outward. No match, render errors and macro failures
//! all resolve to configurable fallback text (see [`Messages`]), with a
//! `tracing` event recording what went wrong.
//!
//! # Ordering
//!
//! All work for one utterance, including every macro call in the chosen
//! response, runs under that session's turn lock. The next utterance of the
//! same session waits; other sessions proceed in parallel.

mod condition;
mod config;
mod engine;
mod errors;
mod interpolate;
mod selector;
mod topic;

pub use condition::{Comparison, Condition};
pub use config::{EngineConfig, Messages};
pub use engine::{Engine, LoadReport};
pub use errors::{LoadError, RenderError};
pub use interpolate::{Interpolator, MacroFailurePolicy, RedirectHook, SharedRng};
pub use selector::{choose_response, MatchResult, Selector};
pub use topic::{Topic, Trigger};
