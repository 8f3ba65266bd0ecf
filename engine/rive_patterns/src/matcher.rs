//! Trigger matcher: decides whether an utterance matches a [`Pattern`] and
//! extracts the wildcard captures.
//!
//! Matching is a plain recursive backtracking walk over the segments. The
//! recursion depth is bounded by the number of segments. Wildcards try the
//! longest run first and shorten one word at a time, so a capture only gives
//! up words a later segment actually needs.

use std::ops::Range;

use rive_ir::{Alternative, Pattern, Segment};
use smallvec::SmallVec;

use crate::Normalizer;

/// Captured wildcard text in declaration order, words joined by one space.
pub type Captures = Vec<String>;

/// Matches raw utterances against compiled patterns.
#[derive(Clone, Debug, Default)]
pub struct Matcher {
    normalizer: Normalizer,
}

impl Matcher {
    pub fn new(normalizer: Normalizer) -> Self {
        Matcher { normalizer }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Normalize `utterance` and match it against `pattern`.
    pub fn match_utterance(&self, pattern: &Pattern, utterance: &str) -> Option<Captures> {
        let words = self.normalizer.words(utterance);
        match_words(pattern, &words)
    }
}

/// Match already-normalized words against `pattern`.
///
/// Returns `None` when the pattern does not match; otherwise one capture per
/// wildcard. Identical inputs always produce identical captures.
pub fn match_words<S: AsRef<str>>(pattern: &Pattern, words: &[S]) -> Option<Captures> {
    let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
    let mut walk = Backtrack {
        pattern,
        words: &words,
        spans: SmallVec::new(),
    };
    if !walk.step(0, 0) {
        return None;
    }
    Some(
        walk.spans
            .iter()
            .map(|span| words[span.clone()].join(" "))
            .collect(),
    )
}

struct Backtrack<'a> {
    pattern: &'a Pattern,
    words: &'a [&'a str],
    /// Word ranges claimed by the wildcards matched so far.
    spans: SmallVec<[Range<usize>; 4]>,
}

impl Backtrack<'_> {
    /// Try to match `segments[seg..]` against `words[pos..]`.
    fn step(&mut self, seg: usize, pos: usize) -> bool {
        let pattern = self.pattern;
        let Some(segment) = pattern.segments().get(seg) else {
            return pos == self.words.len();
        };
        if self.words.len() - pos < pattern.min_words_from(seg) {
            return false;
        }

        match segment {
            Segment::Literal(word) => {
                self.words[pos] == word.as_str() && self.step(seg + 1, pos + 1)
            }
            Segment::Wildcard(kind) => {
                // Leave room for whatever the rest of the pattern must consume.
                let limit = self.words.len() - pattern.min_words_from(seg + 1);
                let mut end = pos;
                while end < limit && kind.accepts(self.words[end]) {
                    end += 1;
                }
                while end > pos {
                    self.spans.push(pos..end);
                    if self.step(seg + 1, end) {
                        return true;
                    }
                    self.spans.pop();
                    end -= 1;
                    tracing::trace!(seg, pos, end, "wildcard backtrack");
                }
                false
            }
            Segment::Alternation(alts) => alts.iter().any(|alt| self.take(alt, seg, pos)),
            Segment::Optional(alts) => {
                alts.iter().any(|alt| self.take(alt, seg, pos)) || self.step(seg + 1, pos)
            }
        }
    }

    /// Consume `alt` at `pos`, then continue with the next segment.
    fn take(&mut self, alt: &Alternative, seg: usize, pos: usize) -> bool {
        let words = self.words;
        let rest = &words[pos..];
        rest.len() >= alt.len()
            && alt.words().iter().zip(rest).all(|(a, w)| a == w)
            && self.step(seg + 1, pos + alt.len())
    }
}
