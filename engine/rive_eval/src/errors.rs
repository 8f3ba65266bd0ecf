//! Errors raised while loading scripts and rendering responses.

use rive_macros::MacroError;
use rive_patterns::PatternSyntaxError;

/// A problem found while loading a script document.
///
/// Load errors are collected in a [`LoadReport`](crate::LoadReport); the
/// offending item is skipped and the rest of the document still loads.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("topic `{topic}`: invalid trigger `{trigger}`: {source}")]
    Pattern {
        topic: String,
        trigger: String,
        source: PatternSyntaxError,
    },

    #[error("topic `{topic}`: trigger `{trigger}` has no responses")]
    NoResponses { topic: String, trigger: String },

    #[error("topic `{topic}`: trigger `{trigger}` has a malformed condition `{condition}`")]
    Condition {
        topic: String,
        trigger: String,
        condition: String,
    },

    #[error("object macro `{name}` was rejected: {source}")]
    Macro { name: String, source: MacroError },
}

/// Why a response template could not be rendered.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("unknown tag `<{0}>`")]
    UnknownTag(String),

    #[error("malformed tag `{0}`")]
    MalformedTag(String),

    #[error("capture {index} requested but only {available} captured")]
    CaptureIndex { index: usize, available: usize },

    #[error("cannot redirect to `{0}` outside of a reply")]
    RedirectUnavailable(String),

    #[error(transparent)]
    MacroInvocation(#[from] MacroError),
}
