//! Macro invocation errors.

use std::time::Duration;

/// Why a `<call>` could not produce a result.
///
/// Always reported to the caller as a value; dispatch never panics outward.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MacroError {
    #[error("object macro `{0}` is not registered")]
    NotRegistered(String),

    #[error("no handler for language `{language}` (object macro `{name}`)")]
    RuntimeUnavailable { name: String, language: String },

    #[error("object macro `{name}` failed: {detail}")]
    ExecutionFailed { name: String, detail: String },

    #[error("object macro `{name}` timed out after {limit:?}")]
    Timeout { name: String, limit: Duration },

    #[error("object macro `{name}` was cancelled")]
    Cancelled { name: String },
}

impl MacroError {
    /// Shorthand for [`MacroError::ExecutionFailed`].
    pub fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        MacroError::ExecutionFailed {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// Name of the macro the error is about.
    pub fn macro_name(&self) -> &str {
        match self {
            MacroError::NotRegistered(name)
            | MacroError::RuntimeUnavailable { name, .. }
            | MacroError::ExecutionFailed { name, .. }
            | MacroError::Timeout { name, .. }
            | MacroError::Cancelled { name } => name,
        }
    }
}
