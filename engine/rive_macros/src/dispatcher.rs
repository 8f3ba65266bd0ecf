//! Macro dispatcher: routes `<call>` invocations to language handlers.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};
use parking_lot::RwLock;
use rive_session::VariableStore;
use rustc_hash::FxHashMap;

use crate::{CancelToken, MacroContext, MacroError, MacroHandler, MacroRegistry, ObjectMacro};

/// How often a waiting caller re-checks its cancellation token.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Per-call limits supplied by the caller.
#[derive(Clone, Debug, Default)]
pub struct InvokeOptions {
    /// Give up after this long. `None` runs the handler inline, unbounded.
    pub timeout: Option<Duration>,
    /// Cancelling this token aborts the call (and any other using it).
    pub cancel: CancelToken,
}

impl InvokeOptions {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Looks up macros and executes them through their language's handler.
pub struct Dispatcher {
    registry: Arc<MacroRegistry>,
    store: Arc<VariableStore>,
    handlers: RwLock<FxHashMap<String, Arc<dyn MacroHandler>>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<MacroRegistry>, store: Arc<VariableStore>) -> Self {
        Dispatcher {
            registry,
            store,
            handlers: RwLock::default(),
        }
    }

    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    /// Install the handler for `language`, replacing any previous one.
    ///
    /// Macros of that language registered earlier are loaded into the new
    /// handler; load failures are logged and leave the macro registered.
    /// The handler table stays write-locked until loading is done, so a
    /// concurrent [`define`](Self::define) is seen by exactly one of the two.
    pub fn register_handler(
        &self,
        language: &str,
        handler: Arc<dyn MacroHandler>,
    ) -> Option<Arc<dyn MacroHandler>> {
        let mut handlers = self.handlers.write();
        let previous = handlers.insert(language.to_string(), Arc::clone(&handler));
        for name in self.registry.names() {
            let Some(object) = self.registry.lookup(&name) else {
                continue;
            };
            if object.language() == language {
                if let Err(error) = handler.load(&object) {
                    tracing::warn!(%error, language, "object macro failed to load");
                }
            }
        }
        tracing::debug!(language, "registered macro handler");
        previous
    }

    pub fn has_handler(&self, language: &str) -> bool {
        self.handlers.read().contains_key(language)
    }

    /// Registered language tags, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.handlers.read().keys().cloned().collect();
        languages.sort();
        languages
    }

    fn handler(&self, language: &str) -> Option<Arc<dyn MacroHandler>> {
        self.handlers.read().get(language).cloned()
    }

    /// Register a macro and hand it to its language's handler.
    ///
    /// A macro whose language has no handler yet is still registered, so a
    /// handler installed later can serve it. If the handler rejects the body
    /// the macro is not registered.
    pub fn define(&self, object: ObjectMacro) -> Result<(), MacroError> {
        let handlers = self.handlers.read();
        match handlers.get(object.language()) {
            Some(handler) => handler.load(&object)?,
            None => tracing::warn!(
                name = object.name(),
                language = object.language(),
                "no handler for object macro language"
            ),
        }
        self.registry.register(object);
        Ok(())
    }

    /// Invoke macro `name` for `session_id` with rendered `args`.
    ///
    /// The `(language, body)` pair is snapshotted before the handler runs.
    /// Every failure, including a handler panic, is returned as a
    /// [`MacroError`].
    #[tracing::instrument(
        level = "debug",
        skip(self, session_id, args, options),
        fields(session = session_id)
    )]
    pub fn invoke(
        &self,
        name: &str,
        session_id: &str,
        args: Vec<String>,
        options: &InvokeOptions,
    ) -> Result<String, MacroError> {
        let object = self
            .registry
            .lookup(name)
            .ok_or_else(|| MacroError::NotRegistered(name.to_string()))?;
        let handler =
            self.handler(object.language())
                .ok_or_else(|| MacroError::RuntimeUnavailable {
                    name: name.to_string(),
                    language: object.language().to_string(),
                })?;
        if options.cancel.is_cancelled() {
            return Err(MacroError::Cancelled {
                name: name.to_string(),
            });
        }

        let cancel = options.cancel.child();
        let ctx = MacroContext::new(
            name,
            session_id,
            args,
            Arc::clone(&self.store),
            cancel.clone(),
        );
        let result = match options.timeout {
            None => run_guarded(handler.as_ref(), &object, &ctx),
            Some(limit) => run_with_deadline(handler, object, ctx, limit, &cancel),
        };
        if let Err(error) = &result {
            tracing::debug!(%error, "macro call failed");
        }
        result
    }
}

/// Run a handler, turning a panic into [`MacroError::ExecutionFailed`].
fn run_guarded(
    handler: &dyn MacroHandler,
    object: &ObjectMacro,
    ctx: &MacroContext,
) -> Result<String, MacroError> {
    catch_unwind(AssertUnwindSafe(|| handler.call(object, ctx)))
        .unwrap_or_else(|payload| Err(MacroError::failed(object.name(), panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return format!("handler panicked: {message}");
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return format!("handler panicked: {message}");
    }
    "handler panicked".to_string()
}

/// Run a handler on a worker thread and wait at most `limit` for it.
///
/// On timeout or caller cancellation the call's token is cancelled and the
/// worker is left to wind down on its own; its result, if any, is dropped.
fn run_with_deadline(
    handler: Arc<dyn MacroHandler>,
    object: Arc<ObjectMacro>,
    ctx: MacroContext,
    limit: Duration,
    cancel: &CancelToken,
) -> Result<String, MacroError> {
    let name = object.name().to_string();
    let (tx, rx) = channel::bounded(1);

    thread::Builder::new()
        .name(format!("macro:{name}"))
        .spawn(move || {
            let result = run_guarded(handler.as_ref(), &object, &ctx);
            // The receiver is gone if the caller already gave up.
            let _ = tx.send(result);
        })
        .map_err(|e| MacroError::failed(&name, format!("cannot start worker thread: {e}")))?;

    let start = Instant::now();
    loop {
        let remaining = limit.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            cancel.cancel();
            return Err(MacroError::Timeout { name, limit });
        }
        match rx.recv_timeout(remaining.min(POLL_INTERVAL)) {
            Ok(result) => return result,
            Err(RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    return Err(MacroError::Cancelled { name });
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(MacroError::failed(
                    name,
                    "worker thread exited without a result",
                ));
            }
        }
    }
}
