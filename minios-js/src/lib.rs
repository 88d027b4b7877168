//! MiniOS JavaScript Engine
//!
//! A small JavaScript-subset interpreter embedded in the MiniOS browser. It
//! runs `<script>` bodies and `onclick` handlers against a page-scoped
//! context and reaches the browser only through a handful of host callbacks.
//!
//! # Architecture
//!
//! - `scanner`: Source cursor; whitespace, comments, literals and skipping
//! - `interpreter`: Single-pass statement and expression evaluation
//! - `value`: Script value representation and coercions
//! - `env`: Variable scopes and the user function table
//! - `builtin`: Built-in functions
//! - `host`: Host bridge (alert, console, elements, audio)
//! - `context`: Execution context and public entry points
//! - `config`: Engine limits, scoping and conversion modes
//! - `error`: Script errors
//!
//! There is no syntax tree. Statements and expressions are evaluated as they
//! are read, loops re-read their own source text, and user functions keep
//! their body as text.
//!
//! # Usage
//!
//! ```
//! use minios_js::{Context, Value};
//!
//! let mut ctx = Context::new();
//! ctx.execute("var x = 1 + 2 * 3;");
//! assert_eq!(ctx.get_variable("x"), Some(Value::Number(7.0)));
//! ```

#![no_std]

extern crate alloc;

pub mod builtin;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod scanner;
pub mod value;

#[cfg(test)]
mod tests;

pub use config::{Coercion, EngineConfig, Scoping};
pub use context::Context;
pub use error::ScriptError;
pub use host::{Callbacks, ElementSnapshot, Host};
pub use value::{JsString, Value, MAX_STRING_LEN};

/// The engine as embedded by the browser.
pub type Engine = Context;

/// Engine version.
pub const VERSION: &str = "0.1.0";

/// Create a context with the default configuration.
pub fn init() -> Context {
    Context::new()
}

/// Run a statement sequence in a fresh context and return the value of the
/// last statement.
pub fn eval(source: &str) -> Value {
    let mut ctx = Context::new();
    ctx.execute(source)
}
