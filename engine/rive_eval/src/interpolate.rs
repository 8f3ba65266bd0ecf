//! Template interpolation.
//!
//! Rendering walks a [`Template`] left to right. Macro calls run
//! synchronously in template order, so a macro sees every variable written
//! by `<set>` tags and macros earlier in the same response.

use std::time::Duration;

use parking_lot::Mutex;
use rand::{Rng, RngCore};
use rive_ir::{MathOp, Piece, Tag, Template};
use rive_macros::{CancelToken, Dispatcher, InvokeOptions};
use rive_patterns::Substitutions;
use rive_session::VariableStore;
use rustc_hash::FxHashMap;

use crate::{Messages, RenderError};

/// Rendered for `<get>`, `<bot>` and `<env>` of an unset variable.
pub(crate) const UNDEFINED: &str = "undefined";

/// A random source shared by every reply of an engine.
pub type SharedRng = Mutex<Box<dyn RngCore + Send>>;

/// Answers `text` as if the user had said it; used by `{@text}`.
pub type RedirectHook<'a> = &'a dyn Fn(&str) -> String;

/// What to do when a `<call>` fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MacroFailurePolicy {
    /// Return [`RenderError::MacroInvocation`] from `render`.
    #[default]
    Propagate,
    /// Substitute the matching fallback message and keep rendering.
    Substitute,
}

/// Renders response templates for one session.
pub struct Interpolator<'a> {
    store: &'a VariableStore,
    dispatcher: &'a Dispatcher,
    bot_vars: &'a FxHashMap<String, String>,
    messages: &'a Messages,
    globals: Option<&'a FxHashMap<String, String>>,
    person: Option<&'a Substitutions>,
    redirect: Option<RedirectHook<'a>>,
    rng: Option<&'a SharedRng>,
    options: InvokeOptions,
    strict: bool,
    policy: MacroFailurePolicy,
}

impl<'a> Interpolator<'a> {
    /// A lenient interpolator that propagates macro failures.
    pub fn new(
        store: &'a VariableStore,
        dispatcher: &'a Dispatcher,
        bot_vars: &'a FxHashMap<String, String>,
        messages: &'a Messages,
    ) -> Self {
        Interpolator {
            store,
            dispatcher,
            bot_vars,
            messages,
            globals: None,
            person: None,
            redirect: None,
            rng: None,
            options: InvokeOptions::default(),
            strict: false,
            policy: MacroFailurePolicy::default(),
        }
    }

    /// Fail on unknown tags and bad capture indices instead of rendering
    /// them as empty text.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: MacroFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Values for `<env name>`.
    #[must_use]
    pub fn globals(mut self, globals: &'a FxHashMap<String, String>) -> Self {
        self.globals = Some(globals);
        self
    }

    /// Pronoun swaps for `<person>` and `{person}` blocks. Without them the
    /// text is kept as is.
    #[must_use]
    pub fn person(mut self, person: &'a Substitutions) -> Self {
        self.person = Some(person);
        self
    }

    /// Resolves `{@text}`. Without a hook inline redirects are broken tags.
    #[must_use]
    pub fn redirect(mut self, hook: RedirectHook<'a>) -> Self {
        self.redirect = Some(hook);
        self
    }

    /// Source for `{random}` blocks; the thread's generator otherwise.
    #[must_use]
    pub fn rng(mut self, rng: &'a SharedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    #[must_use]
    pub fn macro_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.timeout = timeout;
        self
    }

    #[must_use]
    pub fn cancel(mut self, cancel: CancelToken) -> Self {
        self.options.cancel = cancel;
        self
    }

    /// Render `template` with wildcard `captures` for `session_id`.
    pub fn render(
        &self,
        template: &Template,
        captures: &[String],
        session_id: &str,
    ) -> Result<String, RenderError> {
        let scope = Scope {
            captures,
            session_id,
        };
        let mut out = String::new();
        self.render_pieces(template.pieces(), &scope, &mut out)?;
        Ok(out)
    }

    fn render_pieces(
        &self,
        pieces: &[Piece],
        scope: &Scope<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for piece in pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Tag(tag) => self.render_tag(tag, scope, out)?,
            }
        }
        Ok(())
    }

    fn render_tag(&self, tag: &Tag, scope: &Scope<'_>, out: &mut String) -> Result<(), RenderError> {
        match tag {
            Tag::Star { index, case } => {
                match index.checked_sub(1).and_then(|i| scope.captures.get(i)) {
                    Some(capture) => out.push_str(&case.apply(capture)),
                    None => self.degrade(RenderError::CaptureIndex {
                        index: *index,
                        available: scope.captures.len(),
                    })?,
                }
            }
            Tag::Id => out.push_str(scope.session_id),
            Tag::Get(name) => match self.store.get(scope.session_id, name) {
                Some(value) => out.push_str(&value),
                None => out.push_str(UNDEFINED),
            },
            Tag::Bot(name) => out.push_str(self.bot_vars.get(name).map_or(UNDEFINED, String::as_str)),
            Tag::Env(name) => out.push_str(
                self.globals
                    .and_then(|globals| globals.get(name))
                    .map_or(UNDEFINED, String::as_str),
            ),
            Tag::Set { name, value } => {
                let value = self.render_to_string(value, scope)?;
                self.store.set(scope.session_id, name, value.trim());
            }
            Tag::Math { op, name, value } => {
                let value = self.render_to_string(value, scope)?;
                if let Err(message) = self.math(*op, name, value.trim(), scope.session_id) {
                    out.push_str(message);
                }
            }
            Tag::Format { case, body } => {
                out.push_str(&case.apply(&self.render_to_string(body, scope)?));
            }
            Tag::Person(body) => {
                let text = self.render_to_string(body, scope)?;
                match self.person {
                    Some(person) => out.push_str(&person.apply_text(&text)),
                    None => out.push_str(&text),
                }
            }
            Tag::Random(choices) => {
                if !choices.is_empty() {
                    let index = self.pick(choices.len());
                    self.render_pieces(&choices[index], scope, out)?;
                }
            }
            Tag::Redirect(body) => {
                let target = self.render_to_string(body, scope)?;
                match self.redirect {
                    Some(hook) => out.push_str(&hook(target.trim())),
                    None => self.degrade(RenderError::RedirectUnavailable(target.trim().to_string()))?,
                }
            }
            Tag::Call { name, args } => {
                let mut rendered = Vec::with_capacity(args.len());
                for arg in args {
                    rendered.push(self.render_to_string(arg, scope)?);
                }
                out.push_str(&self.call(name, rendered, scope.session_id)?);
            }
            Tag::Unknown(raw) => self.degrade(RenderError::UnknownTag(raw.clone()))?,
            Tag::Malformed(raw) => self.degrade(RenderError::MalformedTag(raw.clone()))?,
        }
        Ok(())
    }

    fn render_to_string(&self, pieces: &[Piece], scope: &Scope<'_>) -> Result<String, RenderError> {
        let mut out = String::new();
        self.render_pieces(pieces, scope, &mut out)?;
        Ok(out)
    }

    /// Apply `op` to the session variable `name`, which counts as 0 while
    /// unset. On failure the variable is left alone and the error message is
    /// returned for the reply.
    fn math(&self, op: MathOp, name: &str, value: &str, session_id: &str) -> Result<(), &'a str> {
        let messages = self.messages;
        let current = self
            .store
            .get(session_id, name)
            .unwrap_or_else(|| "0".to_string());
        let Ok(current) = current.trim().parse::<i64>() else {
            tracing::warn!(variable = name, "math on a non-numeric variable");
            return Err(messages.cannot_math_variable.as_str());
        };
        let Ok(operand) = value.parse::<i64>() else {
            tracing::warn!(variable = name, value, "math with a non-numeric value");
            return Err(messages.cannot_math_value.as_str());
        };
        let result = match op {
            MathOp::Add => current.checked_add(operand),
            MathOp::Sub => current.checked_sub(operand),
            MathOp::Mult => current.checked_mul(operand),
            MathOp::Div if operand == 0 => return Err(messages.cannot_divide_by_zero.as_str()),
            MathOp::Div => current.checked_div(operand),
        };
        let result = result.ok_or(messages.cannot_math_value.as_str())?;
        self.store.set(session_id, name, &result.to_string());
        Ok(())
    }

    /// An index below `len`. The shared lock is released before the chosen
    /// alternative renders.
    fn pick(&self, len: usize) -> usize {
        match self.rng {
            Some(rng) => rng.lock().gen_range(0..len),
            None => rand::thread_rng().gen_range(0..len),
        }
    }

    fn call(&self, name: &str, args: Vec<String>, session_id: &str) -> Result<String, RenderError> {
        match self.dispatcher.invoke(name, session_id, args, &self.options) {
            Ok(reply) => Ok(reply),
            Err(error) => match self.policy {
                MacroFailurePolicy::Propagate => Err(error.into()),
                MacroFailurePolicy::Substitute => {
                    tracing::warn!(
                        session = session_id,
                        macro_name = name,
                        %error,
                        "object macro failed; substituting fallback text"
                    );
                    Ok(self.messages.for_macro_error(&error).to_string())
                }
            },
        }
    }

    /// Lenient mode renders nothing in place of a broken tag.
    fn degrade(&self, error: RenderError) -> Result<(), RenderError> {
        if self.strict {
            return Err(error);
        }
        tracing::debug!(%error, "rendering broken tag as empty text");
        Ok(())
    }
}

struct Scope<'s> {
    captures: &'s [String],
    session_id: &'s str,
}

#[cfg(test)]
mod tests;
