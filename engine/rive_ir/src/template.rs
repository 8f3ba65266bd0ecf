//! Compiled response templates.
//!
//! A [`Template`] is literal text interleaved with [`Tag`]s that the
//! interpolator resolves at reply time, e.g.
//! `"<star>" in MD5 is: <call>md5 <star></call>`.

/// Case transformation applied to a capture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CaseFormat {
    /// `<star>`: the capture as matched.
    Verbatim,
    /// `<formal>`: every word capitalized.
    Formal,
    /// `<uppercase>`
    Uppercase,
    /// `<lowercase>`
    Lowercase,
    /// `<sentence>`: first letter capitalized.
    Sentence,
}

impl CaseFormat {
    /// Apply this transformation to `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            CaseFormat::Verbatim => text.to_string(),
            CaseFormat::Uppercase => text.to_uppercase(),
            CaseFormat::Lowercase => text.to_lowercase(),
            CaseFormat::Sentence => capitalize(text),
            CaseFormat::Formal => text
                .split(' ')
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Arithmetic on a session variable: `<add>`, `<sub>`, `<mult>`, `<div>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MathOp {
    Add,
    Sub,
    Mult,
    Div,
}

impl MathOp {
    /// The operation named by a tag, e.g. `add`.
    pub fn from_tag(name: &str) -> Option<Self> {
        match name {
            "add" => Some(MathOp::Add),
            "sub" => Some(MathOp::Sub),
            "mult" => Some(MathOp::Mult),
            "div" => Some(MathOp::Div),
            _ => None,
        }
    }
}

/// A placeholder resolved at render time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `<star>`, `<starN>`, `<formal>`, ...: capture `index` (1-based).
    Star { index: usize, case: CaseFormat },
    /// `<id>`: the session id.
    Id,
    /// `<get name>`: a session variable.
    Get(String),
    /// `<bot name>`: an engine-level bot variable.
    Bot(String),
    /// `<env name>`: an engine-level global.
    Env(String),
    /// `<set name=value>`: assign a session variable; renders nothing.
    Set { name: String, value: Vec<Piece> },
    /// `<add name=value>` and friends: integer arithmetic on a session
    /// variable; renders nothing unless the operation fails.
    Math {
        op: MathOp,
        name: String,
        value: Vec<Piece>,
    },
    /// `{formal}...{/formal}` and the other case blocks.
    Format { case: CaseFormat, body: Vec<Piece> },
    /// `{person}...{/person}`, and `<person>` for the first capture.
    Person(Vec<Piece>),
    /// `{random}a|b{/random}`: one alternative, chosen at render time.
    Random(Vec<Vec<Piece>>),
    /// `{@text}`, and `<@>` for the first capture: the reply to `text`.
    Redirect(Vec<Piece>),
    /// `<call>name arg...</call>`: invoke an object macro.
    ///
    /// Each argument is its own template and never contains another call.
    Call { name: String, args: Vec<Vec<Piece>> },
    /// A tag the engine does not know, stored as its raw inner text.
    Unknown(String),
    /// A recognized tag written incorrectly (unterminated or nested call).
    Malformed(String),
}

/// One piece of a template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Piece {
    Text(String),
    Tag(Tag),
}

/// A compiled response template with its selection weight.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Template {
    source: String,
    pieces: Vec<Piece>,
    weight: u32,
}

impl Template {
    pub fn new(source: impl Into<String>, pieces: Vec<Piece>, weight: u32) -> Self {
        Template {
            source: source.into(),
            pieces,
            weight: weight.max(1),
        }
    }

    /// The template as the author wrote it.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Relative selection weight, at least 1.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Returns `true` if rendering this template may invoke a macro.
    pub fn has_calls(&self) -> bool {
        any_calls(&self.pieces)
    }
}

fn any_calls(pieces: &[Piece]) -> bool {
    pieces.iter().any(|piece| match piece {
        Piece::Text(_) => false,
        Piece::Tag(tag) => match tag {
            // A redirect answers with another trigger's reply.
            Tag::Call { .. } | Tag::Redirect(_) => true,
            Tag::Set { value, .. } | Tag::Math { value, .. } => any_calls(value),
            Tag::Format { body, .. } => any_calls(body),
            Tag::Person(body) => any_calls(body),
            Tag::Random(choices) => choices.iter().any(|c| any_calls(c)),
            _ => false,
        },
    })
}
