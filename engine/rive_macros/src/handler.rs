//! The capability contract of an embedded-language runtime.

use crate::{MacroContext, MacroError, ObjectMacro};

/// Executes object macros written in one language.
///
/// One handler is registered per language tag. Implementations may run an
/// interpreter in-process, spawn a subprocess, or call through FFI; the
/// dispatcher only relies on this trait. Calls can arrive from many threads
/// at once, and with a deadline set they run on a worker thread.
pub trait MacroHandler: Send + Sync {
    /// Called when a macro in this handler's language is registered.
    ///
    /// Lets a handler pre-compile the body. The default does nothing.
    fn load(&self, object: &ObjectMacro) -> Result<(), MacroError> {
        let _ = object;
        Ok(())
    }

    /// Execute `object` and return the text substituted for the `<call>`.
    fn call(&self, object: &ObjectMacro, ctx: &MacroContext) -> Result<String, MacroError>;
}
