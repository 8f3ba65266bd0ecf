//! Response template compiler.
//!
//! Compilation never fails. Tags the engine does not know become
//! [`Tag::Unknown`] and badly formed calls become [`Tag::Malformed`]; the
//! interpolator decides what to do with them. A `<` not followed by a letter,
//! or without a closing `>`, is plain text, and so is a `{` that does not
//! open one of the blocks below.
//!
//! Curly blocks: `{random}a|b{/random}`, `{person}..{/person}`,
//! `{formal}..{/formal}` (also `sentence`, `uppercase`, `lowercase`),
//! `{@redirect}` and `{topic=name}`.

use rive_ir::{CaseFormat, MathOp, Piece, Tag, Template};

use crate::take_weight;

const CALL_OPEN: &str = "<call>";
const CALL_CLOSE: &str = "</call>";

/// Compile a response into a [`Template`].
///
/// A `{weight=N}` tag sets the selection weight, with `N <= 0` counting as
/// 1; a malformed weight tag is left in the text.
pub fn compile_template(source: &str) -> Template {
    let (text, weight) = match take_weight(source) {
        Ok((text, weight)) => {
            let weight = weight.map_or(1, |w| u32::try_from(w.max(1)).unwrap_or(u32::MAX));
            (text, weight)
        }
        Err(_) => (source.to_string(), 1),
    };
    Template::new(source, parse_pieces(&text, true), weight)
}

fn parse_pieces(src: &str, allow_calls: bool) -> Vec<Piece> {
    let mut out = Pieces::default();
    let mut rest = src;

    while let Some(open) = rest.find(['<', '{']) {
        out.text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let parsed = if rest[open..].starts_with('<') {
            angle_tag(after, allow_calls)
        } else {
            curly_tag(after, allow_calls)
        };
        match parsed {
            Some((tag, remaining)) => {
                out.tag(tag);
                rest = remaining;
            }
            None => {
                out.text.push_str(&rest[open..=open]);
                rest = after;
            }
        }
    }
    out.text.push_str(rest);
    out.finish()
}

/// A `<...>` tag whose `<` was just consumed, or `None` if it is plain text.
fn angle_tag(after: &str, allow_calls: bool) -> Option<(Tag, &str)> {
    if let Some(rest) = after.strip_prefix("@>") {
        return Some((Tag::Redirect(vec![first_capture()]), rest));
    }
    if !after.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let close = find_tag_end(after)?;
    let inner = &after[..close];
    let rest = &after[close + 1..];

    let (name, arg) = split_name(inner);
    if name == "call" && arg.is_empty() {
        return Some(parse_call(rest, allow_calls));
    }
    Some((simple_tag(inner, &name, arg), rest))
}

/// A `{...}` tag whose `{` was just consumed, or `None` if it is plain text.
fn curly_tag(after: &str, allow_calls: bool) -> Option<(Tag, &str)> {
    if let Some(body) = after.strip_prefix('@') {
        let end = body.find('}')?;
        let target = parse_pieces(body[..end].trim(), false);
        return Some((Tag::Redirect(target), &body[end + 1..]));
    }
    if let Some(value) = after.strip_prefix("topic=") {
        let end = value.find('}')?;
        let tag = Tag::Set {
            name: "topic".to_string(),
            value: parse_pieces(value[..end].trim(), false),
        };
        return Some((tag, &value[end + 1..]));
    }

    let end = after.find('}')?;
    let name = &after[..end];
    if !(name == "random" || name == "person" || case_shorthand(name).is_some()) {
        return None;
    }
    let opened = &after[end + 1..];
    let closer = format!("{{/{name}}}");
    let Some(close) = opened.find(&closer) else {
        return Some((Tag::Malformed(format!("{{{after}")), ""));
    };
    let body = &opened[..close];
    let rest = &opened[close + closer.len()..];

    let tag = match (name, case_shorthand(name)) {
        ("random", _) => Tag::Random(
            random_choices(body)
                .map(|choice| parse_pieces(choice, allow_calls))
                .collect(),
        ),
        (_, Some(case)) => Tag::Format {
            case,
            body: parse_pieces(body, allow_calls),
        },
        _ => Tag::Person(parse_pieces(body, allow_calls)),
    };
    Some((tag, rest))
}

/// `{random}` separates choices with `|`, or with spaces when there is none.
fn random_choices(body: &str) -> Box<dyn Iterator<Item = &str> + '_> {
    if body.contains('|') {
        Box::new(body.split('|').map(str::trim))
    } else {
        Box::new(body.split_whitespace())
    }
}

fn first_capture() -> Piece {
    Piece::Tag(Tag::Star {
        index: 1,
        case: CaseFormat::Verbatim,
    })
}

#[derive(Default)]
struct Pieces {
    pieces: Vec<Piece>,
    text: String,
}

impl Pieces {
    fn tag(&mut self, tag: Tag) {
        self.flush();
        self.pieces.push(Piece::Tag(tag));
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            self.pieces.push(Piece::Text(std::mem::take(&mut self.text)));
        }
    }

    fn finish(mut self) -> Vec<Piece> {
        self.flush();
        self.pieces
    }
}

/// Index of the `>` closing a tag whose `<` was just consumed.
fn find_tag_end(after: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in after.char_indices() {
        match c {
            '<' => depth += 1,
            '>' if depth == 0 => return Some(i),
            '>' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn split_name(inner: &str) -> (String, &str) {
    let end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(inner.len());
    (inner[..end].to_ascii_lowercase(), inner[end..].trim())
}

fn simple_tag(inner: &str, name: &str, arg: &str) -> Tag {
    if arg.is_empty() {
        if let Some(case) = case_shorthand(name) {
            return Tag::Star { index: 1, case };
        }
        if name == "id" {
            return Tag::Id;
        }
        if name == "person" {
            return Tag::Person(vec![first_capture()]);
        }
        return match star_index(name) {
            Some(index) => Tag::Star {
                index,
                case: CaseFormat::Verbatim,
            },
            None => Tag::Unknown(inner.to_string()),
        };
    }
    if let Some(op) = MathOp::from_tag(name) {
        return match assignment(arg) {
            Some((var, value)) => Tag::Math {
                op,
                name: var,
                value,
            },
            None => Tag::Malformed(inner.to_string()),
        };
    }
    match name {
        "get" => Tag::Get(arg.to_string()),
        "bot" => Tag::Bot(arg.to_string()),
        "env" => Tag::Env(arg.to_string()),
        "set" => match assignment(arg) {
            Some((var, value)) => Tag::Set { name: var, value },
            None => Tag::Malformed(inner.to_string()),
        },
        _ => Tag::Unknown(inner.to_string()),
    }
}

/// `name=value` with a non-empty name; the value is a call-free template.
fn assignment(arg: &str) -> Option<(String, Vec<Piece>)> {
    let (var, value) = arg.split_once('=')?;
    let var = var.trim();
    if var.is_empty() {
        return None;
    }
    Some((var.to_string(), parse_pieces(value.trim(), false)))
}

/// `<formal>` and friends are shorthand for a formatted `<star1>`.
fn case_shorthand(name: &str) -> Option<CaseFormat> {
    match name {
        "formal" => Some(CaseFormat::Formal),
        "uppercase" => Some(CaseFormat::Uppercase),
        "lowercase" => Some(CaseFormat::Lowercase),
        "sentence" => Some(CaseFormat::Sentence),
        _ => None,
    }
}

/// `star` is capture 1, `starN` is capture N.
fn star_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix("star")?;
    if digits.is_empty() {
        return Some(1);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse the body of a `<call>` whose opening tag was just consumed.
///
/// Returns the tag and the text after the matching `</call>`.
fn parse_call(rest: &str, allow_calls: bool) -> (Tag, &str) {
    let Some((body, after, nested)) = find_call_close(rest) else {
        return (Tag::Malformed(format!("{CALL_OPEN}{rest}")), "");
    };
    if nested || !allow_calls {
        return (Tag::Malformed(format!("{CALL_OPEN}{body}{CALL_CLOSE}")), after);
    }

    let mut tokens = split_args(body).into_iter();
    let Some(name) = tokens.next().filter(|n| !n.is_empty()) else {
        return (Tag::Malformed(format!("{CALL_OPEN}{body}{CALL_CLOSE}")), after);
    };
    let args = tokens.map(|arg| parse_pieces(&arg, false)).collect();
    (Tag::Call { name, args }, after)
}

/// Find the `</call>` balancing an already-open `<call>`.
///
/// Returns the body, the remaining text and whether another call was nested
/// inside the body.
fn find_call_close(rest: &str) -> Option<(&str, &str, bool)> {
    let mut depth = 1usize;
    let mut nested = false;
    let mut i = 0;
    while i < rest.len() {
        let tail = &rest[i..];
        if tail.starts_with(CALL_OPEN) {
            depth += 1;
            nested = true;
            i += CALL_OPEN.len();
        } else if tail.starts_with(CALL_CLOSE) {
            depth -= 1;
            if depth == 0 {
                return Some((&rest[..i], &rest[i + CALL_CLOSE.len()..], nested));
            }
            i += CALL_CLOSE.len();
        } else {
            i += tail.chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}

/// Split a call body on whitespace, keeping `"quoted runs"` and tags whole.
fn split_args(body: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut depth = 0usize;

    for c in body.trim().chars() {
        match c {
            '"' if depth == 0 => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 && !in_quotes => {
                if !current.is_empty() || quoted {
                    args.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        args.push(current);
    }
    args
}

#[cfg(test)]
mod tests;
