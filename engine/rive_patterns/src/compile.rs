//! Pattern compiler: trigger source text to [`Pattern`].
//!
//! Grammar, whitespace separated:
//! - `word`: literal, lowercased
//! - `*`, `#`, `_` (or a repeated run of one marker, e.g. `**`): wildcard
//! - `[a|b c]`: alternation, exactly one alternative
//! - `(a|b)`: optional group, zero or one alternative
//! - `{weight=N}` anywhere: trigger priority, may be negative
//!
//! Groups do not nest.

use rive_ir::{Alternative, Pattern, Segment, WildcardKind};

use crate::{take_weight, PatternSyntaxError};

/// Compile a trigger into a [`Pattern`].
pub fn compile_pattern(source: &str) -> Result<Pattern, PatternSyntaxError> {
    let (text, weight) =
        take_weight(source).map_err(|value| PatternSyntaxError::InvalidWeight {
            pattern: source.to_string(),
            value,
        })?;
    // Negative weights rank below unweighted triggers.
    let priority = weight.map_or(0, |w| {
        i32::try_from(w.clamp(i64::from(i32::MIN), i64::from(i32::MAX))).unwrap_or_default()
    });

    let mut segments = Vec::new();
    let mut word = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '[' | '(' => {
                flush_word(&mut word, &mut segments);
                let close = if c == '[' { ']' } else { ')' };
                let mut body = String::new();
                loop {
                    match chars.next() {
                        None => return Err(unbalanced(source, c)),
                        Some(d) if d == close => break,
                        Some(d @ ('[' | '(')) => {
                            return Err(PatternSyntaxError::NestedGroup {
                                pattern: source.to_string(),
                                open: d,
                            })
                        }
                        Some(d @ (']' | ')')) => return Err(unbalanced(source, d)),
                        Some(d) => body.push(d),
                    }
                }
                let alternatives = parse_alternatives(&body, source)?;
                segments.push(if c == '[' {
                    Segment::Alternation(alternatives)
                } else {
                    Segment::Optional(alternatives)
                });
            }
            ']' | ')' => return Err(unbalanced(source, c)),
            c if c.is_whitespace() => flush_word(&mut word, &mut segments),
            c => word.push(c),
        }
    }
    flush_word(&mut word, &mut segments);

    if segments.is_empty() {
        return Err(PatternSyntaxError::Empty);
    }

    tracing::trace!(pattern = source, segments = segments.len(), "compiled trigger");
    Ok(Pattern::new(segments, priority))
}

fn unbalanced(source: &str, delimiter: char) -> PatternSyntaxError {
    PatternSyntaxError::Unbalanced {
        pattern: source.to_string(),
        delimiter,
    }
}

fn flush_word(word: &mut String, segments: &mut Vec<Segment>) {
    if word.is_empty() {
        return;
    }
    let token = std::mem::take(word);
    segments.push(word_segment(&token));
}

/// A token made solely of one repeated marker is a wildcard.
fn word_segment(token: &str) -> Segment {
    let mut chars = token.chars();
    if let Some(first) = chars.next() {
        if let Some(kind) = WildcardKind::from_marker(first) {
            if chars.all(|c| c == first) {
                return Segment::Wildcard(kind);
            }
        }
    }
    Segment::Literal(token.to_lowercase())
}

fn parse_alternatives(body: &str, source: &str) -> Result<Vec<Alternative>, PatternSyntaxError> {
    body.split('|')
        .map(|alt| {
            let words: Vec<String> = alt.split_whitespace().map(str::to_lowercase).collect();
            if words.is_empty() {
                Err(PatternSyntaxError::EmptyAlternative {
                    pattern: source.to_string(),
                })
            } else {
                Ok(Alternative::new(words))
            }
        })
        .collect()
}
