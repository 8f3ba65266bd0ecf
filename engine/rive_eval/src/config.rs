//! Engine configuration.

use std::time::Duration;

use rive_ir::DEFAULT_TOPIC;
use rive_macros::MacroError;
use rive_patterns::DEFAULT_PUNCTUATION;

/// Fallback texts used when a reply cannot be produced normally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Messages {
    /// No trigger in the session's topic matched.
    pub reply_not_matched: String,
    /// A trigger matched but its response rendered to nothing.
    pub reply_not_found: String,
    /// `<call>` of an unregistered macro, or one whose language has no handler.
    pub object_not_found: String,
    /// The macro ran and failed.
    pub object_failed: String,
    /// The macro exceeded its deadline.
    pub object_timeout: String,
    /// Redirects nested deeper than [`EngineConfig::max_depth`].
    pub deep_recursion: String,
    /// `<div name=0>`
    pub cannot_divide_by_zero: String,
    /// Math on a variable that does not hold an integer.
    pub cannot_math_variable: String,
    /// Math with a value that is not an integer, or that overflows.
    pub cannot_math_value: String,
}

impl Default for Messages {
    fn default() -> Self {
        Messages {
            reply_not_matched: "ERR: No Reply Matched".to_string(),
            reply_not_found: "ERR: No Reply Found".to_string(),
            object_not_found: "[ERR: Object Not Found]".to_string(),
            object_failed: "[ERR: Object Failed]".to_string(),
            object_timeout: "[ERR: Object Timed Out]".to_string(),
            deep_recursion: "ERR: Deep Recursion Detected".to_string(),
            cannot_divide_by_zero: "[ERR: Can't Divide By Zero]".to_string(),
            cannot_math_variable: "[ERR: Can't perform math operation on non-numeric variable]"
                .to_string(),
            cannot_math_value: "[ERR: Can't perform math operation on non-numeric value]"
                .to_string(),
        }
    }
}

impl Messages {
    /// Text substituted for a `<call>` that failed with `error`.
    pub fn for_macro_error(&self, error: &MacroError) -> &str {
        match error {
            MacroError::NotRegistered(_) | MacroError::RuntimeUnavailable { .. } => {
                &self.object_not_found
            }
            MacroError::Timeout { .. } => &self.object_timeout,
            MacroError::ExecutionFailed { .. } | MacroError::Cancelled { .. } => {
                &self.object_failed
            }
        }
    }
}

const DEFAULT_MAX_DEPTH: usize = 50;

/// Settings of an [`Engine`](crate::Engine).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Topic used when a session's `topic` variable is unset or unknown.
    pub default_topic: String,
    /// Deadline for each macro call. `None` waits indefinitely.
    pub macro_timeout: Option<Duration>,
    /// Report unknown tags and bad capture indices instead of rendering
    /// them as empty text.
    pub strict_tags: bool,
    /// Characters removed from utterances before matching.
    pub punctuation: String,
    /// How many redirects one reply may follow before giving up.
    pub max_depth: usize,
    pub messages: Messages,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_topic: DEFAULT_TOPIC.to_string(),
            macro_timeout: Some(Duration::from_secs(5)),
            strict_tags: false,
            punctuation: DEFAULT_PUNCTUATION.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            messages: Messages::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_default_topic(mut self, topic: impl Into<String>) -> Self {
        self.default_topic = topic.into();
        self
    }

    #[must_use]
    pub fn with_macro_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.macro_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_strict_tags(mut self, strict: bool) -> Self {
        self.strict_tags = strict;
        self
    }

    #[must_use]
    pub fn with_punctuation(mut self, punctuation: impl Into<String>) -> Self {
        self.punctuation = punctuation.into();
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }
}
