//! Compiled triggers and topics.

use std::sync::Arc;

use rive_ir::{Pattern, Specificity, Template, TriggerDef};
use rive_patterns::{compile_pattern, compile_template, expand_arrays, Arrays};

use crate::{Condition, LoadError};

/// A compiled trigger with its redirect, conditions and candidate responses.
#[derive(Debug)]
pub struct Trigger {
    source: String,
    pattern: Pattern,
    redirect: Option<Template>,
    conditions: Vec<Condition>,
    responses: Vec<Template>,
}

impl Trigger {
    /// Compile a trigger of `topic` that references no arrays.
    pub fn compile(topic: &str, def: &TriggerDef) -> Result<Self, LoadError> {
        Self::compile_with(topic, def, &Arrays::default())
    }

    /// Compile a trigger of `topic`, expanding `@name` array references first.
    pub fn compile_with(topic: &str, def: &TriggerDef, arrays: &Arrays) -> Result<Self, LoadError> {
        let pattern_error = |source| LoadError::Pattern {
            topic: topic.to_string(),
            trigger: def.pattern.clone(),
            source,
        };
        let expanded = expand_arrays(&def.pattern, arrays).map_err(pattern_error)?;
        let pattern = compile_pattern(&expanded).map_err(pattern_error)?;
        if def.responses.is_empty() && def.conditions.is_empty() && def.redirect.is_none() {
            return Err(LoadError::NoResponses {
                topic: topic.to_string(),
                trigger: def.pattern.clone(),
            });
        }
        let conditions = def
            .conditions
            .iter()
            .map(|line| {
                Condition::parse(line).ok_or_else(|| LoadError::Condition {
                    topic: topic.to_string(),
                    trigger: def.pattern.clone(),
                    condition: line.clone(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Trigger {
            source: def.pattern.clone(),
            pattern,
            redirect: def.redirect.as_deref().map(compile_template),
            conditions,
            responses: def.responses.iter().map(|r| compile_template(r)).collect(),
        })
    }

    /// The trigger as written in the script.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Where the reply is taken from instead, when set.
    pub fn redirect(&self) -> Option<&Template> {
        self.redirect.as_ref()
    }

    /// Conditions in declaration order; the first that holds answers.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Candidate responses. Empty only when the trigger redirects or has
    /// conditions.
    pub fn responses(&self) -> &[Template] {
        &self.responses
    }

    pub fn specificity(&self) -> Specificity {
        self.pattern.specificity()
    }
}

/// A named set of triggers, ranked most specific first.
#[derive(Debug)]
pub struct Topic {
    name: String,
    triggers: Vec<Arc<Trigger>>,
}

impl Topic {
    /// Build a topic from triggers in declaration order.
    ///
    /// The sort is stable, so equally specific triggers keep their
    /// declaration order and the first declared wins.
    pub fn new(name: impl Into<String>, triggers: Vec<Trigger>) -> Self {
        let mut triggers: Vec<Arc<Trigger>> = triggers.into_iter().map(Arc::new).collect();
        triggers.sort_by_key(|t| t.specificity());
        Topic {
            name: name.into(),
            triggers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Triggers in match order.
    pub fn triggers(&self) -> &[Arc<Trigger>] {
        &self.triggers
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}
