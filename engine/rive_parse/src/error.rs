//! Parse error types.

use std::fmt;
use std::ops::Range;

/// What went wrong on a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The line starts with a character that is not a command.
    UnknownCommand(char),
    /// A command is missing its argument, e.g. a bare `+`.
    MissingArgument { command: char, expected: &'static str },
    /// `-` before any `+` in the current topic.
    ResponseWithoutTrigger,
    /// `^` with nothing to continue.
    DanglingContinuation,
    /// `>` with a label other than `topic` or `object`.
    UnknownLabel(String),
    /// `<` closing something that is not open.
    UnexpectedClose(String),
    /// `!` line without `name = value`.
    MalformedDefinition,
    /// `*` line without `left op right => reply`.
    MalformedCondition,
    /// End of input inside `> object`.
    UnterminatedObject(String),
}

impl ParseErrorKind {
    /// Short headline for reports.
    pub fn title(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "UNKNOWN COMMAND",
            Self::MissingArgument { .. } => "MISSING ARGUMENT",
            Self::ResponseWithoutTrigger => "RESPONSE WITHOUT TRIGGER",
            Self::DanglingContinuation => "DANGLING CONTINUATION",
            Self::UnknownLabel(_) => "UNKNOWN LABEL",
            Self::UnexpectedClose(_) => "UNEXPECTED CLOSE",
            Self::MalformedDefinition => "MALFORMED DEFINITION",
            Self::MalformedCondition => "MALFORMED CONDITION",
            Self::UnterminatedObject(_) => "UNTERMINATED OBJECT",
        }
    }

    /// A suggestion for fixing the line, if there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ResponseWithoutTrigger => Some("add a `+ trigger` line above this response"),
            Self::DanglingContinuation => Some("`^` continues the previous command line"),
            Self::UnterminatedObject(_) => Some("close the object with `< object`"),
            Self::MalformedDefinition => Some("write definitions as `! var name = value`"),
            Self::MalformedCondition => Some("write conditions as `* <get x> == y => reply`"),
            _ => None,
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(c) => write!(f, "unknown command `{c}`"),
            Self::MissingArgument { command, expected } => {
                write!(f, "`{command}` needs {expected}")
            }
            Self::ResponseWithoutTrigger => write!(f, "response has no trigger"),
            Self::DanglingContinuation => write!(f, "continuation has nothing to continue"),
            Self::UnknownLabel(label) => write!(f, "unknown label `{label}`"),
            Self::UnexpectedClose(label) => write!(f, "`< {label}` without a matching `>`"),
            Self::MalformedDefinition => write!(f, "malformed definition"),
            Self::MalformedCondition => write!(f, "condition has no `=>` reply"),
            Self::UnterminatedObject(name) => write!(f, "object `{name}` is never closed"),
        }
    }
}

/// A parse failure with its location.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based line number.
    pub line: usize,
    /// Byte range of the offending line in the source.
    pub span: Range<usize>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, span: Range<usize>) -> Self {
        ParseError { kind, line, span }
    }
}
