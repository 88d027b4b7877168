//! Statement and expression evaluation.
//!
//! Parsing and execution are interleaved: every evaluator reads from a
//! shared [`Cursor`] and leaves it just past what it consumed. Loops keep
//! source offsets rather than parsed nodes and re-read their condition and
//! body text on every pass. A function body is stored as text and run as a
//! fresh program on each call.
//!
//! Expression precedence, loosest first:
//!
//! | Level | Operators |
//! |---|---|
//! | logical | `&&` `\|\|` (both sides always evaluated) |
//! | comparison | `===` `!==` `==` `!=` `<=` `>=` `<` `>` (at most one) |
//! | additive | `+` `-` |
//! | term | `*` `/` `%` |
//! | factor | literals, `( )`, names, calls |

use alloc::string::String;
use alloc::vec::Vec;
use libm::trunc;

use crate::builtin;
use crate::config::{Coercion, Scoping};
use crate::context::Context;
use crate::error::ScriptError;
use crate::scanner::{Cursor, MAX_IDENTIFIER_LEN};
use crate::value::{truncate_str, JsString, Value};

/// Comparison operators in matching priority.
const COMPARISON_OPS: [&str; 8] = ["===", "!==", "==", "!=", "<=", ">=", "<", ">"];

/// Compound assignment operators.
const COMPOUND_OPS: [&str; 4] = ["+=", "-=", "*=", "/="];

impl Context {
    /// Run statements until the source is exhausted or an error is raised.
    pub(crate) fn run_program(&mut self, cur: &mut Cursor<'_>) -> Value {
        let mut last = Value::Undefined;
        loop {
            cur.skip_trivia();
            if cur.is_eof() || self.has_error() {
                break;
            }
            let before = cur.offset();
            last = self.eval_statement(cur);
            if cur.offset() == before {
                // Nothing recognisable here; drop one character and go on.
                cur.bump();
            }
        }
        last
    }

    /// Evaluate one statement.
    pub(crate) fn eval_statement(&mut self, cur: &mut Cursor<'_>) -> Value {
        if !self.enter() {
            return Value::Undefined;
        }
        let value = self.dispatch_statement(cur);
        self.nesting -= 1;
        value
    }

    /// Evaluate one expression.
    pub(crate) fn eval_expression(&mut self, cur: &mut Cursor<'_>) -> Value {
        if !self.enter() {
            return Value::Undefined;
        }
        let value = self.eval_logical(cur);
        self.nesting -= 1;
        value
    }

    fn enter(&mut self) -> bool {
        if self.nesting >= self.config.max_nesting {
            self.set_error(ScriptError::NestingTooDeep);
            return false;
        }
        self.nesting += 1;
        true
    }

    fn dispatch_statement(&mut self, cur: &mut Cursor<'_>) -> Value {
        cur.skip_trivia();
        match cur.peek() {
            None => return Value::Undefined,
            Some(';') => {
                cur.bump();
                return Value::Undefined;
            }
            Some('{') => return self.eval_block(cur),
            _ => {}
        }

        if ["var", "let", "const"].iter().any(|kw| cur.eat_keyword(kw)) {
            return self.eval_declaration(cur);
        }
        if cur.eat_keyword("function") {
            return self.eval_function_declaration(cur);
        }
        if cur.eat_keyword("if") {
            return self.eval_if(cur);
        }
        if cur.eat_keyword("while") {
            return self.eval_while(cur);
        }
        if cur.eat_keyword("for") {
            return self.eval_for(cur);
        }
        if cur.eat_keyword("return") {
            return self.eval_return(cur);
        }

        self.eval_simple_statement(cur)
    }

    /// `{ ... }`: the value of the last statement inside.
    fn eval_block(&mut self, cur: &mut Cursor<'_>) -> Value {
        cur.bump();
        let mut result = Value::Undefined;
        loop {
            cur.skip_trivia();
            match cur.peek() {
                None => break,
                Some('}') => {
                    cur.bump();
                    break;
                }
                _ => {}
            }
            let before = cur.offset();
            result = self.eval_statement(cur);
            if self.has_error() {
                return Value::Undefined;
            }
            if cur.offset() == before {
                cur.bump();
            }
        }
        result
    }

    /// `var`/`let`/`const name [= expr];`
    fn eval_declaration(&mut self, cur: &mut Cursor<'_>) -> Value {
        let name = cur.read_identifier();
        cur.skip_trivia();

        let value = if cur.at('=') && cur.peek_nth(1) != Some('=') {
            cur.bump();
            self.eval_expression(cur)
        } else {
            Value::Undefined
        };

        if !name.is_empty() {
            self.env.declare(name, value.clone());
        }

        finish_statement(cur);
        value
    }

    /// `function name(params) { body }`, captured as text and not parsed.
    fn eval_function_declaration(&mut self, cur: &mut Cursor<'_>) -> Value {
        let name = cur.read_identifier();
        cur.skip_trivia();

        let params = if cur.eat("(") { cur.capture_parens() } else { "" };
        cur.skip_trivia();
        let body = cur.capture_block();

        if !name.is_empty() {
            log::debug!("[JS] declared function '{}'", name);
            self.env.define_function(name, params, body);
        }
        Value::Undefined
    }

    /// `if (cond) stmt [else stmt]`. The branch not taken is skipped
    /// without being evaluated.
    fn eval_if(&mut self, cur: &mut Cursor<'_>) -> Value {
        cur.skip_trivia();
        if !cur.eat("(") {
            return Value::Undefined;
        }
        let cond = self.eval_expression(cur);
        cur.skip_trivia();
        cur.eat(")");
        if self.has_error() {
            return Value::Undefined;
        }

        if cond.to_boolean() {
            let result = self.eval_statement(cur);
            if self.has_error() {
                return Value::Undefined;
            }
            cur.skip_trivia();
            if cur.eat_keyword("else") {
                cur.skip_statement();
            }
            result
        } else {
            cur.skip_statement();
            cur.skip_trivia();
            if cur.eat_keyword("else") {
                return self.eval_statement(cur);
            }
            Value::Undefined
        }
    }

    /// `while (cond) stmt`
    fn eval_while(&mut self, cur: &mut Cursor<'_>) -> Value {
        cur.skip_trivia();
        if !cur.at('(') {
            return Value::Undefined;
        }
        let loop_start = cur.offset();
        let mut iterations = 0;

        loop {
            cur.seek(loop_start);
            cur.bump();
            let cond = self.eval_expression(cur);
            cur.skip_trivia();
            cur.eat(")");
            if self.has_error() {
                return Value::Undefined;
            }

            if !cond.to_boolean() {
                cur.skip_statement();
                return Value::Undefined;
            }
            if iterations >= self.config.max_iterations {
                self.set_error(ScriptError::IterationLimit);
                return Value::Undefined;
            }

            self.eval_statement(cur);
            if self.has_error() {
                return Value::Undefined;
            }
            iterations += 1;
        }
    }

    /// `for (init; cond; incr) stmt`
    fn eval_for(&mut self, cur: &mut Cursor<'_>) -> Value {
        cur.skip_trivia();
        if !cur.eat("(") {
            return Value::Undefined;
        }

        self.eval_statement(cur);
        if self.has_error() {
            return Value::Undefined;
        }

        let cond_start = cur.offset();
        let mut body_start = None;
        let mut iterations = 0;

        loop {
            cur.seek(cond_start);
            cur.skip_trivia();
            let cond = if cur.at(';') {
                Value::Boolean(true)
            } else {
                self.eval_expression(cur)
            };
            cur.skip_trivia();
            cur.eat(";");
            if self.has_error() {
                return Value::Undefined;
            }

            let incr_start = cur.offset();
            // The body is located once, on the first pass.
            let body = match body_start {
                Some(offset) => offset,
                None => {
                    cur.capture_parens();
                    let offset = cur.offset();
                    body_start = Some(offset);
                    offset
                }
            };

            if !cond.to_boolean() {
                cur.seek(body);
                cur.skip_statement();
                return Value::Undefined;
            }
            if iterations >= self.config.max_iterations {
                self.set_error(ScriptError::IterationLimit);
                return Value::Undefined;
            }

            cur.seek(body);
            self.eval_statement(cur);
            if self.has_error() {
                return Value::Undefined;
            }

            cur.seek(incr_start);
            cur.skip_trivia();
            if !cur.at(')') {
                self.eval_simple_statement(cur);
                if self.has_error() {
                    return Value::Undefined;
                }
            }
            iterations += 1;
        }
    }

    /// `return [expr];` yields a value but does not leave enclosing
    /// blocks or loops.
    fn eval_return(&mut self, cur: &mut Cursor<'_>) -> Value {
        cur.skip_trivia();
        let result = match cur.peek() {
            None | Some(';') | Some('}') => Value::Undefined,
            _ => self.eval_expression(cur),
        };
        finish_statement(cur);
        result
    }

    /// Assignment, compound assignment, `++`/`--`, or a bare expression.
    fn eval_simple_statement(&mut self, cur: &mut Cursor<'_>) -> Value {
        let start = cur.offset();
        let name = cur.read_identifier();

        if !name.is_empty() {
            cur.skip_trivia();

            if cur.at('=') && cur.peek_nth(1) != Some('=') {
                cur.bump();
                let value = self.eval_expression(cur);
                self.env.assign(name, value.clone());
                finish_statement(cur);
                return value;
            }

            if let Some(op) = COMPOUND_OPS.iter().find(|op| cur.starts_with(op)) {
                cur.eat(op);
                let current = self.env.lookup(name).cloned().unwrap_or_default();
                let rhs = self.eval_expression(cur);
                let mode = self.config.coercion;
                let (l, r) = (current.to_number_as(mode), rhs.to_number_as(mode));
                let value = match *op {
                    "+=" if mode == Coercion::Standard => add(&current, &rhs, mode),
                    "+=" => Value::Number(l + r),
                    "-=" => Value::Number(l - r),
                    "*=" => Value::Number(l * r),
                    _ => Value::Number(divide(l, r)),
                };
                self.env.assign(name, value.clone());
                finish_statement(cur);
                return value;
            }

            if cur.starts_with("++") || cur.starts_with("--") {
                let step = if cur.eat("++") {
                    1.0
                } else {
                    cur.eat("--");
                    -1.0
                };
                let mode = self.config.coercion;
                let current = self.env.lookup(name).map_or(0.0, |v| v.to_number_as(mode));
                let value = Value::Number(current + step);
                self.env.assign(name, value.clone());
                finish_statement(cur);
                return value;
            }
        }

        cur.seek(start);
        let value = self.eval_expression(cur);
        finish_statement(cur);
        value
    }

    fn eval_logical(&mut self, cur: &mut Cursor<'_>) -> Value {
        let mut left = self.eval_comparison(cur);
        loop {
            cur.skip_trivia();
            if cur.eat("&&") {
                let right = self.eval_comparison(cur);
                left = Value::Boolean(left.to_boolean() && right.to_boolean());
            } else if cur.eat("||") {
                let right = self.eval_comparison(cur);
                left = Value::Boolean(left.to_boolean() || right.to_boolean());
            } else {
                break;
            }
        }
        left
    }

    fn eval_comparison(&mut self, cur: &mut Cursor<'_>) -> Value {
        let left = self.eval_additive(cur);
        cur.skip_trivia();

        let Some(op) = COMPARISON_OPS.iter().find(|op| cur.starts_with(op)) else {
            return left;
        };
        cur.eat(op);
        let right = self.eval_additive(cur);
        let mode = self.config.coercion;
        let (l, r) = (left.to_number_as(mode), right.to_number_as(mode));

        let result = match *op {
            "===" => left.strict_equals(&right),
            "!==" => !left.strict_equals(&right),
            "==" => l == r,
            "!=" => l != r,
            "<=" => l <= r,
            ">=" => l >= r,
            "<" => l < r,
            _ => l > r,
        };
        Value::Boolean(result)
    }

    fn eval_additive(&mut self, cur: &mut Cursor<'_>) -> Value {
        let mut left = self.eval_term(cur);
        loop {
            cur.skip_trivia();
            let op = match cur.peek() {
                Some(op @ ('+' | '-')) => op,
                _ => break,
            };
            cur.bump();
            let right = self.eval_term(cur);
            let mode = self.config.coercion;
            left = if op == '+' {
                add(&left, &right, mode)
            } else {
                Value::Number(left.to_number_as(mode) - right.to_number_as(mode))
            };
        }
        left
    }

    fn eval_term(&mut self, cur: &mut Cursor<'_>) -> Value {
        let mut left = self.eval_factor(cur);
        loop {
            cur.skip_trivia();
            let op = match cur.peek() {
                Some(op @ ('*' | '/' | '%')) => op,
                _ => break,
            };
            cur.bump();
            let right = self.eval_factor(cur);
            let mode = self.config.coercion;
            let (l, r) = (left.to_number_as(mode), right.to_number_as(mode));
            left = Value::Number(match op {
                '*' => l * r,
                '/' => divide(l, r),
                _ => modulo(l, r),
            });
        }
        left
    }

    fn eval_factor(&mut self, cur: &mut Cursor<'_>) -> Value {
        cur.skip_trivia();
        match cur.peek() {
            Some('(') => {
                cur.bump();
                let value = self.eval_expression(cur);
                cur.skip_trivia();
                cur.eat(")");
                return value;
            }
            Some('"' | '\'' | '`') => {
                let text = cur.read_string_literal().unwrap_or_default();
                return Value::String(JsString::from(text));
            }
            Some(ch) if ch.is_ascii_digit() => {
                return Value::Number(cur.read_number_literal());
            }
            Some('-') if cur.peek_nth(1).is_some_and(|ch| ch.is_ascii_digit()) => {
                return Value::Number(cur.read_number_literal());
            }
            _ => {}
        }

        if cur.eat_keyword("true") {
            return Value::Boolean(true);
        }
        if cur.eat_keyword("false") {
            return Value::Boolean(false);
        }
        if cur.eat_keyword("null") {
            return Value::Null;
        }
        if cur.eat_keyword("undefined") {
            return Value::Undefined;
        }

        let ident = cur.read_identifier();
        if ident.is_empty() {
            return Value::Undefined;
        }

        // `a.b.c` is a single flat name, not a property lookup.
        let mut name = String::from(ident);
        loop {
            cur.skip_trivia();
            if !cur.eat(".") {
                break;
            }
            name.push('.');
            name.push_str(cur.read_identifier());
        }
        let name = truncate_str(&name, MAX_IDENTIFIER_LEN);

        cur.skip_trivia();
        if cur.eat("(") {
            let args = self.eval_arguments(cur);
            if self.has_error() {
                return Value::Undefined;
            }
            return self.call_function(name, args);
        }

        self.env.lookup(name).cloned().unwrap_or_default()
    }

    /// Evaluate call arguments up to and including the closing `)`.
    fn eval_arguments(&mut self, cur: &mut Cursor<'_>) -> Vec<Value> {
        let mut args = Vec::new();
        loop {
            cur.skip_trivia();
            match cur.peek() {
                None => break,
                Some(')') => {
                    cur.bump();
                    break;
                }
                _ => {}
            }

            let before = cur.offset();
            let value = self.eval_expression(cur);
            if self.has_error() {
                break;
            }
            if args.len() < self.config.max_arguments {
                args.push(value);
            }

            cur.skip_trivia();
            if !cur.eat(",") && cur.offset() == before {
                cur.bump();
            }
        }
        args
    }

    /// Call a built-in or user function by name. Unknown names yield
    /// `undefined`.
    pub(crate) fn call_function(&mut self, name: &str, args: Vec<Value>) -> Value {
        if let Some(value) = builtin::call(self, name, &args) {
            return value;
        }

        let Some(function) = self.env.function(name).cloned() else {
            log::trace!("[JS] call to undefined function '{}'", name);
            return Value::Undefined;
        };

        if self.call_depth >= self.config.max_call_depth {
            self.set_error(ScriptError::CallStackExceeded);
            return Value::Undefined;
        }

        self.call_depth += 1;
        log::debug!("[JS] calling '{}' at depth {}", name, self.call_depth);

        self.env.push_frame();
        if self.env.scoping() == Scoping::Lexical {
            let mut args = args.into_iter();
            for param in function.param_names() {
                self.env.declare(param, args.next().unwrap_or_default());
            }
        }

        // Each frame gets its own nesting budget; frames are bounded by the
        // call depth.
        let outer_nesting = core::mem::replace(&mut self.nesting, 0);
        let mut cur = Cursor::new(&function.body);
        let result = self.run_program(&mut cur);
        self.nesting = outer_nesting;

        self.env.pop_frame();
        self.call_depth -= 1;
        result
    }
}

/// Consume the optional `;` ending a statement.
fn finish_statement(cur: &mut Cursor<'_>) {
    cur.skip_trivia();
    cur.eat(";");
}

/// `+`: concatenation if either side is a string, otherwise addition.
pub(crate) fn add(left: &Value, right: &Value, mode: Coercion) -> Value {
    if left.is_string() || right.is_string() {
        let mut text = left.to_js_string_as(mode);
        text.push_str(&right.to_js_string_as(mode));
        Value::String(text)
    } else {
        Value::Number(left.to_number_as(mode) + right.to_number_as(mode))
    }
}

/// Division where a zero divisor yields zero.
fn divide(l: f64, r: f64) -> f64 {
    if r != 0.0 {
        l / r
    } else {
        0.0
    }
}

/// Integer remainder of the truncated operands; a zero divisor yields zero.
fn modulo(l: f64, r: f64) -> f64 {
    let divisor = trunc(r) as i64;
    if divisor == 0 {
        return 0.0;
    }
    (trunc(l) as i64).wrapping_rem(divisor) as f64
}
