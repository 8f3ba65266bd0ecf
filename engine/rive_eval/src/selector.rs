//! Reply selection: which trigger answers, and with which response.

use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rive_ir::Template;
use rive_patterns::{match_words, Captures, Normalizer, Substitutions};

use crate::{Topic, Trigger};

/// The winning trigger for one utterance.
#[derive(Clone, Debug)]
pub struct MatchResult {
    pub trigger: Arc<Trigger>,
    /// Wildcard captures in declaration order.
    pub captures: Captures,
    /// Index of the chosen response in `trigger.responses()`, `None` when
    /// the trigger has no responses.
    pub response: Option<usize>,
}

impl MatchResult {
    pub fn template(&self) -> Option<&Template> {
        self.response.map(|i| &self.trigger.responses()[i])
    }
}

/// Finds the first matching trigger of a topic.
#[derive(Clone, Debug, Default)]
pub struct Selector {
    normalizer: Normalizer,
    substitutions: Substitutions,
}

impl Selector {
    pub fn new(normalizer: Normalizer) -> Self {
        Selector {
            normalizer,
            substitutions: Substitutions::default(),
        }
    }

    /// Rewrite normalized input with `substitutions` before matching.
    #[must_use]
    pub fn with_substitutions(mut self, substitutions: Substitutions) -> Self {
        self.substitutions = substitutions;
        self
    }

    /// The words triggers are matched against.
    pub fn words(&self, utterance: &str) -> Vec<String> {
        self.substitutions.apply(&self.normalizer.words(utterance))
    }

    /// The most specific trigger of `topic` matching `utterance`.
    ///
    /// Pure and deterministic: no response is chosen here.
    pub fn find(&self, topic: &Topic, utterance: &str) -> Option<(Arc<Trigger>, Captures)> {
        let words = self.words(utterance);
        for trigger in topic.triggers() {
            if let Some(captures) = match_words(trigger.pattern(), &words) {
                tracing::debug!(
                    topic = topic.name(),
                    trigger = trigger.source(),
                    ?captures,
                    "matched trigger"
                );
                return Some((Arc::clone(trigger), captures));
            }
        }
        tracing::debug!(topic = topic.name(), ?words, "no trigger matched");
        None
    }

    /// Match `utterance` against `topic` and pick a response with `rng`.
    pub fn select<R: Rng + ?Sized>(
        &self,
        topic: &Topic,
        utterance: &str,
        rng: &mut R,
    ) -> Option<MatchResult> {
        let (trigger, captures) = self.find(topic, utterance)?;
        let response =
            (!trigger.responses().is_empty()).then(|| choose_response(trigger.responses(), rng));
        Some(MatchResult {
            trigger,
            captures,
            response,
        })
    }
}

/// Weighted random choice among `responses`.
///
/// Weights default to 1, so without `{weight=N}` tags the choice is uniform.
/// A single response is returned without consulting `rng`.
pub fn choose_response<R: Rng + ?Sized>(responses: &[Template], rng: &mut R) -> usize {
    if responses.len() <= 1 {
        return 0;
    }
    match WeightedIndex::new(responses.iter().map(Template::weight)) {
        Ok(distribution) => distribution.sample(rng),
        // Unreachable with weights >= 1; fall back to the first response.
        Err(_) => 0,
    }
}
