//! The script document shape produced by a parser and consumed by the engine.
//!
//! Everything here is raw source text. Compilation into [`Pattern`]s and
//! [`Template`]s happens when the engine loads the document.
//!
//! [`Pattern`]: crate::Pattern
//! [`Template`]: crate::Template

/// Topic that triggers belong to when a script does not name one.
pub const DEFAULT_TOPIC: &str = "random";

/// A whole script: topics, object macros and definitions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptDocument {
    pub topics: Vec<TopicDef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub objects: Vec<ObjectDef>,
    /// `! var name = value`
    #[cfg_attr(feature = "serde", serde(default))]
    pub bot_vars: Vec<(String, String)>,
    /// `! global name = value`, read back with `<env name>`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub globals: Vec<(String, String)>,
    /// `! sub what's = what is`, applied to user input before matching.
    #[cfg_attr(feature = "serde", serde(default))]
    pub substitutions: Vec<(String, String)>,
    /// `! person i am = you are`, applied by `{person}` and `<person>`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub person: Vec<(String, String)>,
    /// `! array colors = red blue`, referenced as `@colors` in triggers.
    #[cfg_attr(feature = "serde", serde(default))]
    pub arrays: Vec<(String, Vec<String>)>,
}

impl ScriptDocument {
    /// Find a topic by name, creating it at the end if missing.
    pub fn topic_mut(&mut self, name: &str) -> &mut TopicDef {
        let index = match self.topics.iter().position(|t| t.name == name) {
            Some(index) => index,
            None => {
                self.topics.push(TopicDef::new(name));
                self.topics.len() - 1
            }
        };
        &mut self.topics[index]
    }

    /// Total number of triggers across all topics.
    pub fn trigger_count(&self) -> usize {
        self.topics.iter().map(|t| t.triggers.len()).sum()
    }
}

/// A named group of triggers, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopicDef {
    pub name: String,
    pub triggers: Vec<TriggerDef>,
}

impl TopicDef {
    pub fn new(name: impl Into<String>) -> Self {
        TopicDef {
            name: name.into(),
            triggers: Vec::new(),
        }
    }
}

/// A trigger pattern with its candidate responses.
///
/// A redirect wins over everything else; otherwise the first condition that
/// holds picks the reply, and the responses are the fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggerDef {
    pub pattern: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub responses: Vec<String>,
    /// `@ text`: answer as if the user had said `text`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub redirect: Option<String>,
    /// `* left op right => reply`, in declaration order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub conditions: Vec<String>,
}

impl TriggerDef {
    pub fn new(pattern: impl Into<String>) -> Self {
        TriggerDef {
            pattern: pattern.into(),
            responses: Vec::new(),
            redirect: None,
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.responses.push(response.into());
        self
    }

    #[must_use]
    pub fn with_redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }
}

/// An object macro: `> object name language` ... `< object`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectDef {
    pub name: String,
    pub language: String,
    pub body: String,
}

impl ObjectDef {
    pub fn new(
        name: impl Into<String>,
        language: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        ObjectDef {
            name: name.into(),
            language: language.into(),
            body: body.into(),
        }
    }
}
