//! Conditional responses: `* <get name> == undefined => What is your name?`

use rive_ir::Template;
use rive_patterns::compile_template;

/// How a condition compares its rendered operands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// `==` or `eq`
    Eq,
    /// `!=`, `ne` or `<>`
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" | "eq" => Some(Comparison::Eq),
            "!=" | "ne" | "<>" => Some(Comparison::Ne),
            "<" => Some(Comparison::Lt),
            "<=" => Some(Comparison::Le),
            ">" => Some(Comparison::Gt),
            ">=" => Some(Comparison::Ge),
            _ => None,
        }
    }

    /// Compare two rendered operands.
    ///
    /// Equality is textual. The ordering operators need an integer on both
    /// sides and are false otherwise.
    pub fn holds(self, left: &str, right: &str) -> bool {
        let numbers = || {
            let parsed = left
                .trim()
                .parse::<i64>()
                .and_then(|l| right.trim().parse::<i64>().map(|r| (l, r)));
            if parsed.is_err() {
                tracing::warn!(left, right, "numeric condition on non-numeric values");
            }
            parsed.ok()
        };
        match self {
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
            Comparison::Lt => numbers().is_some_and(|(l, r)| l < r),
            Comparison::Le => numbers().is_some_and(|(l, r)| l <= r),
            Comparison::Gt => numbers().is_some_and(|(l, r)| l > r),
            Comparison::Ge => numbers().is_some_and(|(l, r)| l >= r),
        }
    }
}

/// A compiled `left op right => reply` line.
#[derive(Debug)]
pub struct Condition {
    source: String,
    left: Template,
    comparison: Comparison,
    right: Template,
    reply: Template,
}

impl Condition {
    /// Compile a condition. Returns `None` without `=>`, an operator
    /// surrounded by spaces, a left operand or a reply.
    pub fn parse(source: &str) -> Option<Self> {
        let (test, reply) = source.split_once("=>")?;
        let reply = reply.trim();
        let tokens: Vec<&str> = test.split_whitespace().collect();
        let (at, comparison) = tokens
            .iter()
            .enumerate()
            .skip(1)
            .find_map(|(i, token)| Comparison::from_token(token).map(|c| (i, c)))?;
        if reply.is_empty() {
            return None;
        }
        Some(Condition {
            source: source.to_string(),
            left: compile_template(&tokens[..at].join(" ")),
            comparison,
            right: compile_template(&tokens[at + 1..].join(" ")),
            reply: compile_template(reply),
        })
    }

    /// The condition as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn left(&self) -> &Template {
        &self.left
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    pub fn right(&self) -> &Template {
        &self.right
    }

    /// Rendered when the condition holds.
    pub fn reply(&self) -> &Template {
        &self.reply
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "test code uses unwrap for concise assertions"
    )]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_operands_and_reply() {
        let condition = Condition::parse("<get name> != undefined => Hi, <get name>.").unwrap();
        assert_eq!(condition.left().source(), "<get name>");
        assert_eq!(condition.comparison(), Comparison::Ne);
        assert_eq!(condition.right().source(), "undefined");
        assert_eq!(condition.reply().source(), "Hi, <get name>.");
    }

    #[test]
    fn word_operators() {
        let condition = Condition::parse("<get mood> eq happy => Yay").unwrap();
        assert_eq!(condition.comparison(), Comparison::Eq);
        assert_eq!(
            Condition::parse("<get age> >= 18 => ok").unwrap().comparison(),
            Comparison::Ge
        );
    }

    #[test]
    fn malformed_conditions() {
        assert!(Condition::parse("<get name> == bob").is_none());
        assert!(Condition::parse("<get name> bob => hi").is_none());
        assert!(Condition::parse("== bob => hi").is_none());
        assert!(Condition::parse("<get name> == bob =>   ").is_none());
    }

    #[test]
    fn comparisons() {
        assert!(Comparison::Eq.holds("a", "a"));
        assert!(Comparison::Ne.holds("a", "b"));
        assert!(Comparison::Lt.holds("2", "10"));
        assert!(Comparison::Ge.holds("10", "10"));
        assert!(!Comparison::Gt.holds("ten", "2"));
        assert!(!Comparison::Le.holds("1", "undefined"));
    }
}
