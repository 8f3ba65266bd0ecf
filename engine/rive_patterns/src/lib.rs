//! Rive Patterns - trigger and template compilation plus matching.
//!
//! This crate provides:
//! - The pattern compiler (`compile_pattern`): trigger source to [`Pattern`]
//! - Input normalization (`Normalizer`): case folding and punctuation stripping
//! - The trigger matcher (`Matcher`, `match_words`): backtracking wildcard
//!   matching with deterministic captures
//! - The response template compiler (`compile_template`)
//! - Word substitutions (`Substitutions`) and `@array` expansion
//!   (`expand_arrays`)
//!
//! # Matching Rules
//!
//! - Utterances are lowercased, stripped of `.,!?;:` and split on whitespace,
//!   then rewritten by the script's `! sub` substitutions.
//! - A wildcard consumes one or more words. The longest capture is tried
//!   first and shortened only when a later segment fails.
//! - Alternatives are tried in declaration order; an optional group tries
//!   its alternatives before being skipped.
//!
//! All functions here are pure and may be called from any thread.
//!
//! [`Pattern`]: rive_ir::Pattern

mod arrays;
mod compile;
mod errors;
mod matcher;
mod normalize;
mod substitute;
mod template;

pub use arrays::{expand_arrays, Arrays};
pub use compile::compile_pattern;
pub use errors::PatternSyntaxError;
pub use matcher::{match_words, Captures, Matcher};
pub use normalize::{Normalizer, DEFAULT_PUNCTUATION};
pub use substitute::Substitutions;
pub use template::compile_template;

/// Strip a `{weight=N}` tag from `source`.
///
/// Returns the remaining text and the weight (`None` when there is no tag).
/// The weight may be negative; callers decide how to clamp it. A malformed
/// value is returned as the error.
pub(crate) fn take_weight(source: &str) -> Result<(String, Option<i64>), String> {
    const OPEN: &str = "{weight=";
    let Some(start) = source.find(OPEN) else {
        return Ok((source.to_string(), None));
    };
    let rest = &source[start + OPEN.len()..];
    let Some(end) = rest.find('}') else {
        return Err(rest.to_string());
    };
    let digits = rest[..end].trim();
    let weight = digits.parse::<i64>().map_err(|_| digits.to_string())?;
    let mut stripped = String::with_capacity(source.len());
    stripped.push_str(source[..start].trim_end());
    let tail = rest[end + 1..].trim_start();
    if !stripped.is_empty() && !tail.is_empty() {
        stripped.push(' ');
    }
    stripped.push_str(tail);
    Ok((stripped, Some(weight)))
}

#[cfg(test)]
mod tests {
    use super::take_weight;

    #[test]
    fn weight_tag_is_removed() {
        assert_eq!(
            take_weight("hello * {weight=10}"),
            Ok(("hello *".to_string(), Some(10)))
        );
        assert_eq!(
            take_weight("{weight=2} hi there"),
            Ok(("hi there".to_string(), Some(2)))
        );
        assert_eq!(
            take_weight("a {weight=3} b"),
            Ok(("a b".to_string(), Some(3)))
        );
    }

    #[test]
    fn negative_weights_parse() {
        assert_eq!(
            take_weight("hi there {weight=-2}"),
            Ok(("hi there".to_string(), Some(-2)))
        );
    }

    #[test]
    fn missing_weight_tag_is_passthrough() {
        assert_eq!(take_weight("hello"), Ok(("hello".to_string(), None)));
    }

    #[test]
    fn bad_weight_value_is_reported() {
        assert_eq!(take_weight("hi {weight=lots}"), Err("lots".to_string()));
        assert_eq!(take_weight("hi {weight=4"), Err("4".to_string()));
    }
}
