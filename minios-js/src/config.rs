//! Engine configuration.

/// How names are resolved across user-function calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scoping {
    /// One table shared by every statement, including function bodies.
    /// Declared parameters are captured but never bound to arguments.
    #[default]
    Flat,
    /// Each call gets its own frame with parameters bound to the arguments.
    /// Lookups fall back to the global table.
    Lexical,
}

/// How values convert between numbers and strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coercion {
    /// Strings read as a leading integer (`"1.5"` is `1`) and numbers print
    /// as their truncated integer (`1.5` prints `1`). `+=` is numeric only
    /// and `Math.floor` truncates toward zero.
    #[default]
    Integer,
    /// Strings read their full decimal prefix and numbers print in script
    /// form (`1.5`, `NaN`, `Infinity`). `+=` concatenates like `+` and
    /// `Math.floor` rounds down.
    Standard,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of variables per scope.
    pub max_variables: usize,
    /// Maximum number of user functions.
    pub max_functions: usize,
    /// Maximum nested user-function calls.
    pub max_call_depth: usize,
    /// Maximum iterations of a single loop statement.
    pub max_iterations: usize,
    /// Maximum arguments kept per call.
    pub max_arguments: usize,
    /// Maximum bytes of each argument's string form.
    pub max_argument_len: usize,
    /// Maximum bytes of a captured parameter list.
    pub max_params_len: usize,
    /// Maximum bytes of a captured function body.
    pub max_body_len: usize,
    /// Maximum nesting of statements and expressions.
    pub max_nesting: usize,
    /// Initial state of the `Math.random` generator.
    pub random_seed: u32,
    /// Name resolution mode.
    pub scoping: Scoping,
    /// Number and string conversion mode.
    pub coercion: Coercion,
}

impl EngineConfig {
    /// Configuration with parameter binding and call frames enabled.
    pub fn lexical() -> Self {
        EngineConfig {
            scoping: Scoping::Lexical,
            ..Self::default()
        }
    }

    /// Configuration with script-style decimal conversions.
    pub fn standard() -> Self {
        EngineConfig {
            coercion: Coercion::Standard,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_variables: 64,
            max_functions: 32,
            max_call_depth: 16,
            max_iterations: 1000,
            max_arguments: 8,
            max_argument_len: 127,
            max_params_len: 127,
            max_body_len: 511,
            max_nesting: 128,
            random_seed: 12345,
            scoping: Scoping::Flat,
            coercion: Coercion::Integer,
        }
    }
}
