//! The reply engine.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rive_ir::{ScriptDocument, Template};
use rive_macros::{CancelToken, Dispatcher, MacroHandler, MacroRegistry, ObjectMacro};
use rive_patterns::{Arrays, Normalizer, Substitutions};
use rive_session::{VariableStore, Vars};
use rustc_hash::FxHashMap;

use crate::interpolate::UNDEFINED;
use crate::{
    choose_response, EngineConfig, Interpolator, LoadError, MacroFailurePolicy, RenderError,
    Selector, SharedRng, Topic, Trigger,
};

/// Session variable holding the current topic.
const TOPIC_VAR: &str = "topic";

type Topics = FxHashMap<String, Arc<Topic>>;
type BotVars = FxHashMap<String, String>;

/// Outcome of [`Engine::load`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub topics: usize,
    pub triggers: usize,
    pub objects: usize,
    /// Everything skipped, in document order.
    pub errors: Vec<LoadError>,
}

impl LoadReport {
    /// Returns `true` if nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Everything compiled from one script document.
#[derive(Debug, Default)]
struct Brain {
    topics: Topics,
    /// Carries the document's `! sub` substitutions.
    selector: Selector,
    /// The document's `! person` substitutions.
    person: Substitutions,
}

/// A loaded chatbot, shareable across threads.
///
/// The compiled script and the variable maps are swapped wholesale on write,
/// so replies in progress keep the snapshot they started with.
pub struct Engine {
    config: EngineConfig,
    brain: RwLock<Arc<Brain>>,
    bot_vars: RwLock<Arc<BotVars>>,
    globals: RwLock<Arc<BotVars>>,
    store: Arc<VariableStore>,
    dispatcher: Dispatcher,
    rng: SharedRng,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let store = Arc::new(VariableStore::new());
        let dispatcher = Dispatcher::new(Arc::new(MacroRegistry::new()), Arc::clone(&store));
        let brain = Brain {
            selector: Selector::new(Normalizer::new(&config.punctuation)),
            ..Brain::default()
        };
        Engine {
            config,
            brain: RwLock::new(Arc::new(brain)),
            bot_vars: RwLock::default(),
            globals: RwLock::default(),
            store,
            dispatcher,
            rng: Mutex::new(Box::new(StdRng::from_entropy())),
        }
    }

    /// Replace the random source used to pick among responses and
    /// `{random}` alternatives.
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        *self.rng.get_mut() = Box::new(rng);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn store(&self) -> &Arc<VariableStore> {
        &self.store
    }

    /// Compile and install a script document.
    ///
    /// Topics and substitutions replace those of any earlier load; macros
    /// and variables are added or overwritten by name. Bad triggers and
    /// rejected macros are skipped and listed in the report.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn load(&self, document: &ScriptDocument) -> LoadReport {
        let mut report = LoadReport::default();

        let arrays: Arrays = document
            .arrays
            .iter()
            .map(|(name, entries)| (name.to_lowercase(), entries.clone()))
            .collect();
        let pairs = |table: &[(String, String)]| {
            Substitutions::new(table.iter().map(|(from, to)| (from.as_str(), to.as_str())))
        };

        let mut compiled: FxHashMap<&str, Vec<Trigger>> = FxHashMap::default();
        let mut order: Vec<&str> = Vec::new();
        for topic in &document.topics {
            let triggers = compiled.entry(topic.name.as_str()).or_insert_with(|| {
                order.push(topic.name.as_str());
                Vec::new()
            });
            for def in &topic.triggers {
                match Trigger::compile_with(&topic.name, def, &arrays) {
                    Ok(trigger) => triggers.push(trigger),
                    Err(error) => {
                        tracing::warn!(%error, "skipping trigger");
                        report.errors.push(error);
                    }
                }
            }
        }

        let mut topics = Topics::default();
        for name in order {
            let triggers = compiled.remove(name).unwrap_or_default();
            report.triggers += triggers.len();
            topics.insert(name.to_string(), Arc::new(Topic::new(name, triggers)));
        }
        report.topics = topics.len();
        *self.brain.write() = Arc::new(Brain {
            topics,
            selector: Selector::new(Normalizer::new(&self.config.punctuation))
                .with_substitutions(pairs(&document.substitutions)),
            person: pairs(&document.person),
        });

        for object in &document.objects {
            let definition = ObjectMacro::new(&object.name, &object.language, &object.body);
            match self.dispatcher.define(definition) {
                Ok(()) => report.objects += 1,
                Err(source) => {
                    let error = LoadError::Macro {
                        name: object.name.clone(),
                        source,
                    };
                    tracing::warn!(%error, "skipping object macro");
                    report.errors.push(error);
                }
            }
        }

        for (name, value) in &document.bot_vars {
            self.set_bot_variable(name, value);
        }
        for (name, value) in &document.globals {
            self.set_global(name, value);
        }

        tracing::debug!(
            topics = report.topics,
            triggers = report.triggers,
            objects = report.objects,
            skipped = report.errors.len(),
            "loaded script"
        );
        report
    }

    /// Install the macro runtime for `language`.
    pub fn register_handler(
        &self,
        language: &str,
        handler: Arc<dyn MacroHandler>,
    ) -> Option<Arc<dyn MacroHandler>> {
        self.dispatcher.register_handler(language, handler)
    }

    /// Reply to `utterance` from `session_id`.
    ///
    /// Never fails: every failure resolves to one of the configured
    /// [`Messages`](crate::Messages).
    pub fn reply(&self, session_id: &str, utterance: &str) -> String {
        self.reply_with_cancel(session_id, utterance, &CancelToken::new())
    }

    /// [`reply`](Self::reply) with a token that aborts pending macro calls.
    #[tracing::instrument(
        level = "debug",
        skip(self, session_id, cancel),
        fields(session = session_id)
    )]
    pub fn reply_with_cancel(&self, session_id: &str, utterance: &str, cancel: &CancelToken) -> String {
        self.store
            .with_turn(session_id, || self.respond(session_id, utterance, cancel, 0))
    }

    /// Answer `utterance` at redirect `depth`. Runs under the session's
    /// turn lock, which redirects must not take again.
    fn respond(&self, session_id: &str, utterance: &str, cancel: &CancelToken, depth: usize) -> String {
        let messages = &self.config.messages;
        if depth > self.config.max_depth {
            tracing::warn!(depth, utterance, "too many nested redirects");
            return messages.deep_recursion.clone();
        }
        let brain = Arc::clone(&*self.brain.read());
        let Some(topic) = self.current_topic(&brain, session_id) else {
            tracing::debug!("no topic to match against");
            return messages.reply_not_matched.clone();
        };
        let Some((trigger, captures)) = brain.selector.find(&topic, utterance) else {
            return messages.reply_not_matched.clone();
        };

        let bot_vars = Arc::clone(&*self.bot_vars.read());
        let globals = Arc::clone(&*self.globals.read());
        let redirect = |text: &str| self.respond(session_id, text, cancel, depth + 1);
        let interpolator =
            Interpolator::new(&self.store, &self.dispatcher, &bot_vars, messages)
                .strict(self.config.strict_tags)
                .policy(MacroFailurePolicy::Substitute)
                .macro_timeout(self.config.macro_timeout)
                .cancel(cancel.clone())
                .globals(&globals)
                .person(&brain.person)
                .redirect(&redirect)
                .rng(&self.rng);

        let rendered = match trigger.redirect() {
            Some(target) => interpolator
                .render(target, &captures, session_id)
                .map(|target| {
                    tracing::debug!(to = target.trim(), depth, "redirecting");
                    redirect(target.trim())
                }),
            None => self.answer(&interpolator, &trigger, &captures, session_id),
        };
        match rendered {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => messages.reply_not_found.clone(),
            Err(error) => {
                tracing::warn!(%error, trigger = trigger.source(), "reply could not be rendered");
                messages.reply_not_found.clone()
            }
        }
    }

    /// The reply of the first condition that holds, else of a weighted
    /// random response. Empty when neither exists.
    fn answer(
        &self,
        interpolator: &Interpolator<'_>,
        trigger: &Trigger,
        captures: &[String],
        session_id: &str,
    ) -> Result<String, RenderError> {
        let operand = |template: &Template| -> Result<String, RenderError> {
            let text = interpolator.render(template, captures, session_id)?;
            let text = text.trim();
            Ok(if text.is_empty() { UNDEFINED } else { text }.to_string())
        };
        for condition in trigger.conditions() {
            let left = operand(condition.left())?;
            let right = operand(condition.right())?;
            if condition.comparison().holds(&left, &right) {
                tracing::debug!(condition = condition.source(), "condition holds");
                return interpolator.render(condition.reply(), captures, session_id);
            }
        }
        if trigger.responses().is_empty() {
            return Ok(String::new());
        }
        let index = choose_response(trigger.responses(), &mut **self.rng.lock());
        interpolator.render(&trigger.responses()[index], captures, session_id)
    }

    /// The session's topic, falling back to the default topic.
    fn current_topic(&self, brain: &Brain, session_id: &str) -> Option<Arc<Topic>> {
        let topics = &brain.topics;
        if let Some(name) = self.store.get(session_id, TOPIC_VAR) {
            if let Some(topic) = topics.get(&name) {
                return Some(Arc::clone(topic));
            }
            tracing::debug!(topic = %name, "unknown topic; using the default");
        }
        topics.get(&self.config.default_topic).cloned()
    }

    /// Loaded topic names, sorted.
    pub fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.brain.read().topics.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn trigger_count(&self) -> usize {
        self.brain.read().topics.values().map(|t| t.len()).sum()
    }

    pub fn set_uservar(&self, session_id: &str, key: &str, value: &str) {
        self.store.set(session_id, key, value);
    }

    pub fn get_uservar(&self, session_id: &str, key: &str) -> Option<String> {
        self.store.get(session_id, key)
    }

    pub fn get_uservars(&self, session_id: &str) -> Option<Vars> {
        self.store.snapshot(session_id)
    }

    /// Forget everything about a session. Returns `true` if it existed.
    pub fn purge_session(&self, session_id: &str) -> bool {
        self.store.purge(session_id)
    }

    pub fn set_bot_variable(&self, name: &str, value: &str) {
        let mut bot_vars = self.bot_vars.write();
        Arc::make_mut(&mut *bot_vars).insert(name.to_string(), value.to_string());
    }

    pub fn bot_variable(&self, name: &str) -> Option<String> {
        self.bot_vars.read().get(name).cloned()
    }

    /// Set a global, read in replies with `<env name>`.
    pub fn set_global(&self, name: &str, value: &str) {
        let mut globals = self.globals.write();
        Arc::make_mut(&mut *globals).insert(name.to_string(), value.to_string());
    }

    pub fn global(&self, name: &str) -> Option<String> {
        self.globals.read().get(name).cloned()
    }
}
