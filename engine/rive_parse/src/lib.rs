//! Rive Parse - script text to [`ScriptDocument`].
//!
//! Scripts are line oriented. The first non-blank character of a line is its
//! command:
//!
//! | Command | Meaning |
//! |---|---|
//! | `// text` | comment |
//! | `+ pattern` | start a trigger |
//! | `- template` | add a response to the last trigger |
//! | `@ text` | answer the last trigger with the reply to `text` |
//! | `* left op right => template` | conditional response of the last trigger |
//! | `^ text` | continue the previous line |
//! | `> topic name` / `< topic` | open / close a topic |
//! | `> object name language` / `< object` | object macro; the body is kept verbatim |
//! | `! var name = value` | bot variable |
//! | `! global name = value` | global, read with `<env name>` |
//! | `! sub from = to` | input substitution |
//! | `! person from = to` | pronoun swap for `{person}` |
//! | `! array name = a b` or `a\|b c` | word list for `@name` in triggers |
//!
//! `! version` is accepted and ignored. Other definition types are skipped
//! with a warning.
//!
//! Triggers and templates are kept as source text; the engine compiles them
//! at load time.
//!
//! [`ScriptDocument`]: rive_ir::ScriptDocument

mod error;
mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use parser::parse_script;
