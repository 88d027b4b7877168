//! Script error types.
//!
//! The engine never raises language-level exceptions. Resource exhaustion is
//! recorded in the context's error slot as one of these variants, and the
//! host reads it back through `Context::has_error`/`Context::get_error`.

use core::fmt;

/// Errors raised while executing a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptError {
    /// A user function call would exceed the configured call depth.
    CallStackExceeded,
    /// A `while` or `for` loop ran for the configured number of iterations.
    IterationLimit,
    /// Statements or expressions are nested deeper than the configured limit.
    NestingTooDeep,
}

impl ScriptError {
    /// Get error name.
    pub fn name(&self) -> &'static str {
        match self {
            ScriptError::CallStackExceeded => "RangeError",
            ScriptError::IterationLimit => "RangeError",
            ScriptError::NestingTooDeep => "InternalError",
        }
    }

    /// Get the fixed error message.
    pub fn message(&self) -> &'static str {
        match self {
            ScriptError::CallStackExceeded => "Maximum call stack exceeded",
            ScriptError::IterationLimit => "Maximum iterations exceeded",
            ScriptError::NestingTooDeep => "Maximum nesting depth exceeded",
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
