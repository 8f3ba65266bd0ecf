//! Macros implemented as Rust closures.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{MacroContext, MacroError, MacroHandler, ObjectMacro};

/// A native macro implementation.
pub type NativeFn = dyn Fn(&MacroContext) -> Result<String, MacroError> + Send + Sync;

/// Handler dispatching to closures registered by macro name.
///
/// The script body is ignored; the closure is the implementation. Register
/// it under any language tag (e.g. `rust`, or `perl` to stand in for a Perl
/// runtime in tests).
#[derive(Default)]
pub struct NativeHandler {
    functions: RwLock<FxHashMap<String, Arc<NativeFn>>>,
}

impl NativeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide the implementation of macro `name`.
    pub fn define<F>(&self, name: &str, function: F)
    where
        F: Fn(&MacroContext) -> Result<String, MacroError> + Send + Sync + 'static,
    {
        self.functions
            .write()
            .insert(name.to_string(), Arc::new(function));
    }

    /// Builder form of [`define`](Self::define).
    #[must_use]
    pub fn with<F>(self, name: &str, function: F) -> Self
    where
        F: Fn(&MacroContext) -> Result<String, MacroError> + Send + Sync + 'static,
    {
        self.define(name, function);
        self
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }
}

impl MacroHandler for NativeHandler {
    fn call(&self, object: &ObjectMacro, ctx: &MacroContext) -> Result<String, MacroError> {
        let function = self
            .functions
            .read()
            .get(object.name())
            .cloned()
            .ok_or_else(|| MacroError::failed(object.name(), "no native implementation"))?;
        function(ctx)
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        reason = "test code uses unwrap for concise assertions"
    )]

    use super::*;
    use crate::CancelToken;
    use rive_session::VariableStore;

    fn ctx(name: &str, args: &[&str]) -> MacroContext {
        MacroContext::new(
            name,
            "alice",
            args.iter().map(|a| (*a).to_string()).collect(),
            Arc::new(VariableStore::new()),
            CancelToken::new(),
        )
    }

    #[test]
    fn calls_the_registered_closure() {
        let handler = NativeHandler::new().with("shout", |ctx| Ok(ctx.message().to_uppercase()));
        assert!(handler.is_defined("shout"));
        let object = ObjectMacro::new("shout", "rust", "");
        assert_eq!(
            handler.call(&object, &ctx("shout", &["hi", "there"])).unwrap(),
            "HI THERE"
        );
    }

    #[test]
    fn missing_closure_is_an_execution_failure() {
        let handler = NativeHandler::new();
        let object = ObjectMacro::new("ghost", "rust", "");
        assert_eq!(
            handler.call(&object, &ctx("ghost", &[])),
            Err(MacroError::failed("ghost", "no native implementation"))
        );
    }

    #[test]
    fn closures_can_be_replaced() {
        let handler = NativeHandler::new();
        handler.define("v", |_| Ok("1".into()));
        handler.define("v", |_| Ok("2".into()));
        let object = ObjectMacro::new("v", "rust", "");
        assert_eq!(handler.call(&object, &ctx("v", &[])).unwrap(), "2");
    }
}
