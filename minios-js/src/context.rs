//! Execution context.
//!
//! A [`Context`] is the engine instance a page owns: one variable table, one
//! function table, one error slot, the call-depth counter and the host
//! bridge. It is created on page load, [`reset`](Context::reset) between
//! pages, and dropped when the page goes away.

use alloc::boxed::Box;
use core::fmt;

use crate::config::EngineConfig;
use crate::env::{Environment, FunctionLimits};
use crate::error::ScriptError;
use crate::host::{Callbacks, Host};
use crate::scanner::Cursor;
use crate::value::Value;

/// Script execution context.
pub struct Context {
    /// Variables and functions.
    pub(crate) env: Environment,
    /// Browser capabilities.
    pub(crate) host: Box<dyn Host>,
    /// First error raised since the last clear.
    pub(crate) error: Option<ScriptError>,
    /// Nested user-function calls in progress.
    pub(crate) call_depth: usize,
    /// Nested statements and expressions in progress.
    pub(crate) nesting: usize,
    /// `Math.random` generator state.
    pub(crate) rng_state: u32,
    /// Limits and scoping mode.
    pub(crate) config: EngineConfig,
}

impl Context {
    /// Create a context with the default configuration and no host.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a context with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        log::debug!("[JS] creating context ({:?} scoping)", config.scoping);
        Context {
            env: new_environment(&config),
            host: Box::new(Callbacks::default()),
            error: None,
            call_depth: 0,
            nesting: 0,
            rng_state: config.random_seed,
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Install the host bridge.
    pub fn set_host(&mut self, host: impl Host + 'static) {
        self.host = Box::new(host);
    }

    /// Install a closure-based host bridge.
    pub fn set_callbacks(&mut self, callbacks: Callbacks) {
        self.set_host(callbacks);
    }

    /// Run a statement sequence and return the value of the last statement.
    ///
    /// Nothing runs while an error is pending; errors are reported through
    /// [`has_error`](Self::has_error), not through the returned value.
    pub fn execute(&mut self, source: &str) -> Value {
        let mut cur = Cursor::new(source);
        self.run_program(&mut cur)
    }

    /// Evaluate a single expression.
    pub fn evaluate_expression(&mut self, source: &str) -> Value {
        if self.has_error() {
            return Value::Undefined;
        }
        let mut cur = Cursor::new(source);
        self.eval_expression(&mut cur)
    }

    /// Run a `<script>` body or event handler the way the browser does:
    /// start from a clean error slot, execute, and send any error message to
    /// the console before clearing it again. Returns whether it ran cleanly.
    pub fn run_handler(&mut self, source: &str) -> bool {
        self.clear_error();
        if source.is_empty() {
            return true;
        }
        self.execute(source);
        match self.error.take() {
            Some(err) => {
                self.host.console_log(err.message());
                false
            }
            None => true,
        }
    }

    /// Read a variable.
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.env.lookup(name).cloned()
    }

    /// Create or overwrite a global variable.
    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.env.set_global(name, value);
    }

    /// Check for a pending error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Message of the pending error, or an empty string.
    pub fn get_error(&self) -> &str {
        self.error.map(|e| e.message()).unwrap_or("")
    }

    /// The pending error.
    pub fn last_error(&self) -> Option<&ScriptError> {
        self.error.as_ref()
    }

    /// Clear the pending error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Drop all variables, functions and error state. The host bridge,
    /// configuration and random generator state are kept.
    pub fn reset(&mut self) {
        log::debug!("[JS] resetting context");
        self.env.clear();
        self.error = None;
        self.call_depth = 0;
        self.nesting = 0;
    }

    /// Global variables in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.env.global().iter().map(|v| (v.name.as_str(), &v.value))
    }

    /// Number of global variables.
    pub fn variable_count(&self) -> usize {
        self.env.variable_count()
    }

    /// Number of user functions.
    pub fn function_count(&self) -> usize {
        self.env.function_count()
    }

    /// Nested user-function calls in progress.
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// Record an error; the first one wins until cleared.
    pub(crate) fn set_error(&mut self, err: ScriptError) {
        if self.error.is_none() {
            log::warn!("[JS] {}", err);
            self.error = Some(err);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("variables", &self.env.variable_count())
            .field("functions", &self.env.function_count())
            .field("error", &self.error)
            .field("call_depth", &self.call_depth)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn new_environment(config: &EngineConfig) -> Environment {
    Environment::new(
        config.scoping,
        config.max_variables,
        FunctionLimits {
            max_functions: config.max_functions,
            max_params_len: config.max_params_len,
            max_body_len: config.max_body_len,
        },
    )
}
