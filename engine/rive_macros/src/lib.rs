//! Rive Macros - object macro registry and dispatch.
//!
//! This crate provides:
//! - `MacroRegistry`: name to (language, body), read-mostly behind an `RwLock`
//! - `MacroHandler`: the capability an embedded-language runtime implements
//! - `Dispatcher`: routes a call to the handler for the macro's language,
//!   with an optional deadline and a caller-supplied cancellation token
//! - Built-in handlers: `NativeHandler` (Rust closures) and
//!   `SubprocessHandler` (an external interpreter speaking JSON on stdio)
//!
//! # Architecture
//!
//! Handlers are plugins registered per language tag. The core never knows how
//! a language is executed; it only hands over a [`MacroContext`] carrying the
//! session id, the rendered arguments and a narrow handle on the variable
//! store. That handle is the only way a macro can touch session state.

mod cancel;
mod context;
mod dispatcher;
mod error;
mod handler;
mod native;
mod registry;
mod subprocess;

pub use cancel::CancelToken;
pub use context::MacroContext;
pub use dispatcher::{Dispatcher, InvokeOptions};
pub use error::MacroError;
pub use handler::MacroHandler;
pub use native::{NativeFn, NativeHandler};
pub use registry::{MacroRegistry, ObjectMacro};
pub use subprocess::SubprocessHandler;
