//! What a macro sees while it runs.

use std::sync::Arc;

use rive_session::{VariableStore, Vars};

use crate::{CancelToken, MacroError};

/// Per-call context handed to a [`MacroHandler`](crate::MacroHandler).
///
/// Session state is reachable only through `get_uservar`/`set_uservar`,
/// which go through the store's own locking. Once the call is cancelled
/// (timeout or caller request) writes are refused, so a late macro can never
/// change state after its reply was already produced.
#[derive(Clone)]
pub struct MacroContext {
    name: String,
    session_id: String,
    args: Vec<String>,
    store: Arc<VariableStore>,
    cancel: CancelToken,
}

impl MacroContext {
    pub fn new(
        name: impl Into<String>,
        session_id: impl Into<String>,
        args: Vec<String>,
        store: Arc<VariableStore>,
        cancel: CancelToken,
    ) -> Self {
        MacroContext {
            name: name.into(),
            session_id: session_id.into(),
            args,
            store,
            cancel,
        }
    }

    /// Name of the macro being called.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The user whose reply is being rendered.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Positional arguments, already rendered.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments joined by single spaces.
    pub fn message(&self) -> String {
        self.args.join(" ")
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn get_uservar(&self, user: &str, key: &str) -> Option<String> {
        self.store.get(user, key)
    }

    pub fn get_uservars(&self, user: &str) -> Option<Vars> {
        self.store.snapshot(user)
    }

    /// Set a variable of any session.
    pub fn set_uservar(&self, user: &str, key: &str, value: &str) -> Result<(), MacroError> {
        if self.is_cancelled() {
            tracing::debug!(macro_name = %self.name, user, key, "dropped write from cancelled macro");
            return Err(MacroError::Cancelled {
                name: self.name.clone(),
            });
        }
        self.store.set(user, key, value);
        Ok(())
    }
}
