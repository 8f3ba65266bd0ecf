//! Compiled trigger patterns.
//!
//! A [`Pattern`] is the immutable result of compiling a trigger such as
//! `encode * in [md5|sha1] (please)`. Wildcards are numbered left to right
//! starting at 1; that number is the capture index used by `<star1>`.

use std::cmp::Ordering;
use std::fmt;

/// The word class a wildcard accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `*`: any word.
    Any,
    /// `#`: words made of ASCII digits only.
    Numeric,
    /// `_`: words made of alphabetic characters only.
    Alpha,
}

impl WildcardKind {
    /// Map a marker character to its wildcard kind.
    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            '*' => Some(Self::Any),
            '#' => Some(Self::Numeric),
            '_' => Some(Self::Alpha),
            _ => None,
        }
    }

    /// The marker character written in trigger source.
    pub fn marker(self) -> char {
        match self {
            Self::Any => '*',
            Self::Numeric => '#',
            Self::Alpha => '_',
        }
    }

    /// Returns `true` if `word` may be consumed by this wildcard.
    pub fn accepts(self, word: &str) -> bool {
        match self {
            Self::Any => !word.is_empty(),
            Self::Numeric => !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit()),
            Self::Alpha => !word.is_empty() && word.chars().all(char::is_alphabetic),
        }
    }
}

/// One alternative inside an alternation or optional group.
///
/// Usually a single word, but `[good morning|hi]` yields a two-word
/// alternative followed by a one-word one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Alternative {
    words: Vec<String>,
}

impl Alternative {
    /// Create an alternative from already-normalized words.
    pub fn new(words: Vec<String>) -> Self {
        Alternative { words }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words.join(" "))
    }
}

/// A single element of a compiled pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A word that must appear verbatim (after normalization).
    Literal(String),
    /// A greedy capture of one or more words.
    Wildcard(WildcardKind),
    /// `[a|b]`: exactly one of the alternatives must appear.
    Alternation(Vec<Alternative>),
    /// `(a|b)`: zero or one of the alternatives may appear.
    Optional(Vec<Alternative>),
}

impl Segment {
    /// Fewest input words this segment can consume.
    pub fn min_words(&self) -> usize {
        match self {
            Segment::Literal(_) | Segment::Wildcard(_) => 1,
            Segment::Alternation(alts) => alts.iter().map(Alternative::len).min().unwrap_or(0),
            Segment::Optional(_) => 0,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Segment::Literal(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(word) => f.write_str(word),
            Segment::Wildcard(kind) => write!(f, "{}", kind.marker()),
            Segment::Alternation(alts) => write_group(f, '[', ']', alts),
            Segment::Optional(alts) => write_group(f, '(', ')', alts),
        }
    }
}

fn write_group(
    f: &mut fmt::Formatter<'_>,
    open: char,
    close: char,
    alts: &[Alternative],
) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, alt) in alts.iter().enumerate() {
        if i > 0 {
            f.write_str("|")?;
        }
        write!(f, "{alt}")?;
    }
    write!(f, "{close}")
}

/// Ranking key for trigger selection.
///
/// Orders the *most specific* pattern first: higher priority, then fewer
/// non-literal segments, then more literal words. Equal keys compare equal so
/// a stable sort keeps declaration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Specificity {
    pub priority: i32,
    pub variable_segments: usize,
    pub literal_words: usize,
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then(self.variable_segments.cmp(&other.variable_segments))
            .then(other.literal_words.cmp(&self.literal_words))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A compiled trigger pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    segments: Box<[Segment]>,
    priority: i32,
    /// `min_tail[i]` is the fewest words `segments[i..]` can consume.
    min_tail: Box<[usize]>,
    wildcards: usize,
}

impl Pattern {
    /// Build a pattern from compiled segments and a `{weight=N}` priority.
    pub fn new(segments: Vec<Segment>, priority: i32) -> Self {
        let mut min_tail = vec![0; segments.len() + 1];
        for (i, segment) in segments.iter().enumerate().rev() {
            min_tail[i] = min_tail[i + 1] + segment.min_words();
        }
        let wildcards = segments
            .iter()
            .filter(|s| matches!(s, Segment::Wildcard(_)))
            .count();
        Pattern {
            segments: segments.into_boxed_slice(),
            priority,
            min_tail: min_tail.into_boxed_slice(),
            wildcards,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Number of wildcard segments, i.e. the highest valid `<starN>`.
    pub fn wildcard_count(&self) -> usize {
        self.wildcards
    }

    /// Fewest input words the segments from `index` onwards can consume.
    pub fn min_words_from(&self, index: usize) -> usize {
        self.min_tail.get(index).copied().unwrap_or(0)
    }

    pub fn specificity(&self) -> Specificity {
        let literal_words = self.segments.iter().filter(|s| s.is_literal()).count();
        Specificity {
            priority: self.priority,
            variable_segments: self.segments.len() - literal_words,
            literal_words,
        }
    }
}

/// Canonical source form. Recompiling it yields an equal `Pattern`.
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{segment}")?;
        }
        if self.priority != 0 {
            write!(f, " {{weight={}}}", self.priority)?;
        }
        Ok(())
    }
}
