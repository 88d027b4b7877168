//! Variable and function tables.
//!
//! A [`Scope`] is a bounded, insertion-ordered name→value table. Under
//! [`Scoping::Flat`] the environment has exactly one scope, shared by every
//! statement including function bodies. Under [`Scoping::Lexical`] each
//! user-function call pushes a frame on top of the global scope.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::config::Scoping;
use crate::value::{truncate_str, Value};

/// A named variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Variable name.
    pub name: String,
    /// Current value.
    pub value: Value,
}

/// Bounded table of variables.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Variables in declaration order.
    variables: Vec<Variable>,
    /// Maximum number of variables.
    capacity: usize,
}

impl Scope {
    /// Create an empty scope.
    pub fn new(capacity: usize) -> Self {
        Scope {
            variables: Vec::new(),
            capacity,
        }
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| &v.value)
    }

    /// Check if a variable exists.
    pub fn contains(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v.name == name)
    }

    /// Overwrite an existing variable or append a new one. Appending to a
    /// full scope does nothing.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(var) = self.variables.iter_mut().find(|v| v.name == name) {
            var.value = value;
            return;
        }
        if self.variables.len() < self.capacity {
            self.variables.push(Variable {
                name: name.into(),
                value,
            });
        }
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Check if the scope is empty.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    /// Remove every variable.
    pub fn clear(&mut self) {
        self.variables.clear();
    }
}

/// A user function, captured verbatim from source.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Function name.
    pub name: String,
    /// Raw parameter list text, e.g. `"a, b"`.
    pub params: String,
    /// Raw body text between the braces.
    pub body: Rc<str>,
}

impl Function {
    /// Parameter names split out of the raw list.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Limits applied when capturing functions.
#[derive(Debug, Clone, Copy)]
pub struct FunctionLimits {
    /// Maximum number of functions.
    pub max_functions: usize,
    /// Maximum bytes of parameter text.
    pub max_params_len: usize,
    /// Maximum bytes of body text.
    pub max_body_len: usize,
}

/// Variables, call frames and functions of one execution context.
#[derive(Debug)]
pub struct Environment {
    /// Global variables.
    global: Scope,
    /// Call frames, innermost last. Always empty under flat scoping.
    frames: Vec<Scope>,
    /// User functions by name.
    functions: HashMap<String, Function>,
    /// Function capture limits.
    limits: FunctionLimits,
    /// Per-scope variable capacity.
    max_variables: usize,
    /// Name resolution mode.
    scoping: Scoping,
}

impl Environment {
    /// Create an empty environment.
    pub fn new(scoping: Scoping, max_variables: usize, limits: FunctionLimits) -> Self {
        Environment {
            global: Scope::new(max_variables),
            frames: Vec::new(),
            functions: HashMap::new(),
            limits,
            max_variables,
            scoping,
        }
    }

    /// Name resolution mode.
    pub fn scoping(&self) -> Scoping {
        self.scoping
    }

    /// The global scope.
    pub fn global(&self) -> &Scope {
        &self.global
    }

    /// Resolve a name: innermost frame first, then globals.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames
            .last()
            .and_then(|frame| frame.get(name))
            .or_else(|| self.global.get(name))
    }

    /// Declare a variable in the innermost scope.
    pub fn declare(&mut self, name: &str, value: Value) {
        self.current_scope_mut().set(name, value);
    }

    /// Assign to a variable: the innermost frame if it has the name,
    /// otherwise the global scope.
    pub fn assign(&mut self, name: &str, value: Value) {
        match self.frames.last_mut() {
            Some(frame) if frame.contains(name) => frame.set(name, value),
            _ => self.global.set(name, value),
        }
    }

    /// Set a global variable directly.
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.global.set(name, value);
    }

    /// Push a call frame. Does nothing under flat scoping.
    pub fn push_frame(&mut self) {
        if self.scoping == Scoping::Lexical {
            self.frames.push(Scope::new(self.max_variables));
        }
    }

    /// Pop the innermost call frame.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Current call-frame depth.
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Store a function, replacing any previous definition with the same
    /// name. New names beyond the table capacity are dropped.
    pub fn define_function(&mut self, name: &str, params: &str, body: &str) {
        if !self.functions.contains_key(name) && self.functions.len() >= self.limits.max_functions
        {
            log::debug!("[JS] function table full, dropping '{}'", name);
            return;
        }
        let function = Function {
            name: name.into(),
            params: truncate_str(params, self.limits.max_params_len).into(),
            body: truncate_str(body, self.limits.max_body_len).into(),
        };
        self.functions.insert(name.into(), function);
    }

    /// Look up a function.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Number of stored functions.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Number of global variables.
    pub fn variable_count(&self) -> usize {
        self.global.len()
    }

    /// Drop all variables, frames and functions.
    pub fn clear(&mut self) {
        self.global.clear();
        self.frames.clear();
        self.functions.clear();
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.global,
        }
    }
}
