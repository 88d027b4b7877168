//! Script value types.
//!
//! Values are plain data: they are copied on assignment and on return, and
//! there is no reference identity between two values.

use alloc::format;
use alloc::string::String;
use core::fmt;
use core::ops::Deref;
use libm::{fabs, trunc};

use crate::config::Coercion;

/// Capacity of a string value in bytes, including the terminator slot of
/// the host's fixed buffers. A string holds at most `MAX_STRING_LEN - 1` bytes.
pub const MAX_STRING_LEN: usize = 256;

/// Bounded string payload.
///
/// Anything that would grow past the capacity is silently cut at the last
/// character boundary that fits.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct JsString(String);

impl JsString {
    /// Maximum number of bytes a string value can hold.
    pub const CAPACITY: usize = MAX_STRING_LEN - 1;

    /// Create a string, truncating to capacity.
    pub fn new(s: &str) -> Self {
        JsString(String::from(truncate_str(s, Self::CAPACITY)))
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append text, dropping whatever does not fit.
    pub fn push_str(&mut self, s: &str) {
        let room = Self::CAPACITY - self.0.len();
        self.0.push_str(truncate_str(s, room));
    }
}

impl Deref for JsString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString::new(s)
    }
}

impl From<String> for JsString {
    fn from(mut s: String) -> Self {
        let end = truncate_str(&s, Self::CAPACITY).len();
        s.truncate(end);
        JsString(s)
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A script value.
#[derive(Clone, Default, PartialEq)]
pub enum Value {
    /// The undefined value.
    #[default]
    Undefined,
    /// The null value.
    Null,
    /// A boolean value.
    Boolean(bool),
    /// A numeric value.
    Number(f64),
    /// A string value.
    String(JsString),
}

impl Value {
    /// Create a number.
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    /// Create a string, truncated to [`JsString::CAPACITY`].
    pub fn string(s: &str) -> Self {
        Value::String(JsString::new(s))
    }

    /// Check if value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is a string.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Get the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the type of value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    /// Convert to boolean.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    /// Convert to number.
    ///
    /// Strings convert through their leading numeric prefix, so `"12px"` is
    /// `12` and `"abc"` is `0`. `undefined` and `null` are `0`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined | Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_number_prefix(s),
        }
    }

    /// Convert to a string value.
    pub fn to_js_string(&self) -> JsString {
        match self {
            Value::String(s) => s.clone(),
            other => JsString::from(format!("{}", other)),
        }
    }

    /// Strict equality (`===`): tags must match, then payloads.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    /// Convert to number under the given conversion mode.
    pub fn to_number_as(&self, mode: Coercion) -> f64 {
        match (mode, self) {
            (Coercion::Integer, Value::String(s)) => parse_int_prefix(s),
            _ => self.to_number(),
        }
    }

    /// Convert to a string value under the given conversion mode.
    pub fn to_js_string_as(&self, mode: Coercion) -> JsString {
        match (mode, self) {
            (Coercion::Integer, Value::Number(n)) => JsString::from(format!("{}", *n as i32)),
            _ => self.to_js_string(),
        }
    }

    /// Loose equality (`==`): both sides compared as numbers.
    pub fn loose_equals_as(&self, other: &Value, mode: Coercion) -> bool {
        self.to_number_as(mode) == other.to_number_as(mode)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            Value::String(s) => f.write_str(s),
        }
    }
}

/// Cut `s` to at most `max` bytes on a character boundary.
pub(crate) fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Parse an optionally signed decimal literal (`-12`, `3.25`, `+7.`) at the
/// start of `s`. Returns the value and the number of bytes consumed; zero
/// bytes consumed means there was no number.
pub(crate) fn scan_decimal(s: &str) -> (f64, usize) {
    let bytes = s.as_bytes();
    let mut pos = 0;
    let mut negative = false;

    match bytes.first() {
        Some(b'-') => {
            negative = true;
            pos += 1;
        }
        Some(b'+') => pos += 1,
        _ => {}
    }

    let digits_start = pos;
    let mut result = 0.0;
    while let Some(&b) = bytes.get(pos) {
        if !b.is_ascii_digit() {
            break;
        }
        result = result * 10.0 + f64::from(b - b'0');
        pos += 1;
    }

    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        let mut fraction = 0.0;
        let mut divisor = 1.0;
        let mut kept = 0;
        while let Some(&b) = bytes.get(pos) {
            if !b.is_ascii_digit() {
                break;
            }
            // Digits past f64 precision only inflate the divisor.
            if kept < 17 {
                fraction = fraction * 10.0 + f64::from(b - b'0');
                divisor *= 10.0;
                kept += 1;
            }
            pos += 1;
        }
        result += fraction / divisor;
    } else if pos == digits_start {
        return (0.0, 0);
    }

    (if negative { -result } else { result }, pos)
}

/// Leading numeric prefix of a string, ignoring leading whitespace.
pub(crate) fn parse_number_prefix(s: &str) -> f64 {
    scan_decimal(s.trim_start()).0
}

/// Leading integer prefix of a string, ignoring leading whitespace.
pub(crate) fn parse_int_prefix(s: &str) -> f64 {
    trunc(parse_number_prefix(s))
}

/// Convert number to string.
pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        if n > 0.0 {
            return "Infinity".into();
        } else {
            return "-Infinity".into();
        }
    }
    if n == 0.0 {
        return "0".into();
    }

    if trunc(n) == n && fabs(n) < 1e15 {
        return format!("{}", n as i64);
    }

    format!("{}", n)
}
