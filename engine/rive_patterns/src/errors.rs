//! Pattern compilation errors.

/// A trigger that cannot be compiled.
///
/// Fatal for that trigger only: the loader reports it and skips the trigger.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatternSyntaxError {
    #[error("trigger is empty")]
    Empty,

    #[error("unbalanced '{delimiter}' in trigger `{pattern}`")]
    Unbalanced { pattern: String, delimiter: char },

    #[error("group opened with '{open}' cannot contain another group in trigger `{pattern}`")]
    NestedGroup { pattern: String, open: char },

    #[error("empty alternative in group of trigger `{pattern}`")]
    EmptyAlternative { pattern: String },

    #[error("invalid weight `{value}` in trigger `{pattern}`")]
    InvalidWeight { pattern: String, value: String },

    #[error("unknown array `@{name}` in trigger `{pattern}`")]
    UnknownArray { pattern: String, name: String },
}
