//! `@name` array references in triggers.
//!
//! `@colors` outside a group becomes the alternation `[red|blue]`; inside a
//! group it contributes its entries as alternatives, so `(@colors)` is an
//! optional group. Expansion runs before pattern compilation.

use rustc_hash::FxHashMap;

use crate::PatternSyntaxError;

/// Arrays by name, as defined with `! array`.
pub type Arrays = FxHashMap<String, Vec<String>>;

/// Replace every `@name` in `source` with the entries of that array.
pub fn expand_arrays(source: &str, arrays: &Arrays) -> Result<String, PatternSyntaxError> {
    if !source.contains('@') {
        return Ok(source.to_string());
    }
    let mut out = String::with_capacity(source.len());
    let mut in_group = false;
    let mut chars = source.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '[' | '(' => in_group = true,
            ']' | ')' => in_group = false,
            '@' => {
                let start = i + 1;
                let mut end = start;
                while let Some(&(j, d)) = chars.peek() {
                    if !(d.is_alphanumeric() || d == '_') {
                        break;
                    }
                    end = j + d.len_utf8();
                    chars.next();
                }
                let name = &source[start..end];
                if name.is_empty() {
                    out.push('@');
                    continue;
                }
                let entries = arrays
                    .get(&name.to_lowercase())
                    .map(|entries| alternatives(entries))
                    .filter(|entries| !entries.is_empty())
                    .ok_or_else(|| PatternSyntaxError::UnknownArray {
                        pattern: source.to_string(),
                        name: name.to_string(),
                    })?;
                if in_group {
                    out.push_str(&entries.join("|"));
                } else {
                    out.push('[');
                    out.push_str(&entries.join("|"));
                    out.push(']');
                }
                continue;
            }
            _ => {}
        }
        out.push(c);
    }
    Ok(out)
}

/// Array entries with group syntax removed, blanks dropped.
fn alternatives(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let cleaned: String = entry
                .chars()
                .filter(|c| !matches!(c, '[' | ']' | '(' | ')' | '|' | '@'))
                .collect();
            cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|entry| !entry.is_empty())
        .collect()
}
