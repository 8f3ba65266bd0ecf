//! Variable store implementation.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::{FxBuildHasher, FxHashMap};

/// A snapshot of one session's variables.
pub type Vars = FxHashMap<String, String>;

#[derive(Default)]
struct Session {
    vars: Mutex<Vars>,
}

type TurnLock = Arc<Mutex<()>>;

/// Thread-safe mapping of user id to that user's variables.
///
/// Share it behind an `Arc`; every method takes `&self`.
#[derive(Default)]
pub struct VariableStore {
    sessions: DashMap<String, Arc<Session>, FxBuildHasher>,
    /// Kept apart from `sessions` so a purge never hands a second turn lock
    /// to a user whose reply is still in progress.
    turns: DashMap<String, TurnLock, FxBuildHasher>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    fn session_or_create(&self, id: &str) -> Arc<Session> {
        if let Some(session) = self.session(id) {
            return session;
        }
        let entry = self.sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!(session = id, "created session");
            Arc::default()
        });
        Arc::clone(entry.value())
    }

    /// Read one variable. Unknown sessions and unset keys both yield `None`.
    pub fn get(&self, id: &str, key: &str) -> Option<String> {
        let session = self.session(id)?;
        let vars = session.vars.lock();
        vars.get(key).cloned()
    }

    /// Write one variable, creating the session if needed.
    pub fn set(&self, id: &str, key: &str, value: &str) {
        let session = self.session_or_create(id);
        session.vars.lock().insert(key.to_string(), value.to_string());
        tracing::trace!(session = id, key, value, "set user variable");
    }

    /// Remove one variable, returning its previous value.
    pub fn remove(&self, id: &str, key: &str) -> Option<String> {
        let session = self.session(id)?;
        let mut vars = session.vars.lock();
        vars.remove(key)
    }

    /// Copy of every variable of a session.
    pub fn snapshot(&self, id: &str) -> Option<Vars> {
        let session = self.session(id)?;
        let vars = session.vars.lock();
        Some(vars.clone())
    }

    /// Drop a session and all its variables. Returns `true` if it existed.
    ///
    /// A reply already in progress for that user finishes normally and keeps
    /// the session's turn lock. Any write made after the purge starts a
    /// fresh session.
    pub fn purge(&self, id: &str) -> bool {
        let existed = self.sessions.remove(id).is_some();
        // Every holder or waiter owns a clone, so a count of one means idle.
        self.turns
            .remove_if(id, |_, turn| Arc::strong_count(turn) == 1);
        if existed {
            tracing::debug!(session = id, "purged session");
        }
        existed
    }

    pub fn has_session(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Run `f` while holding the turn lock of session `id`.
    ///
    /// Turns of the same session are serialized; turns of different
    /// sessions run concurrently. The variable lock is not held, so `f` may
    /// freely call [`get`](Self::get) and [`set`](Self::set) for any session.
    /// Re-entering `with_turn` for the same session from inside `f` deadlocks.
    /// A purge during the turn does not let a later turn of the same
    /// session start before this one ends.
    pub fn with_turn<R>(&self, id: &str, f: impl FnOnce() -> R) -> R {
        let turn = self.turn_lock(id);
        let _turn = turn.lock();
        f()
    }

    fn turn_lock(&self, id: &str) -> TurnLock {
        if let Some(turn) = self.turns.get(id) {
            return Arc::clone(turn.value());
        }
        let entry = self.turns.entry(id.to_string()).or_default();
        Arc::clone(entry.value())
    }
}

#[cfg(test)]
mod tests;
