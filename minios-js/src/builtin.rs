//! Built-in functions.
//!
//! Built-ins are recognised by exact name before the user function table is
//! consulted, so a script cannot shadow them. Each one receives its
//! arguments in string form, cut to the configured argument length.

use alloc::string::String;
use alloc::vec::Vec;
use libm::floor;

use crate::config::Coercion;
use crate::context::Context;
use crate::value::{parse_int_prefix, parse_number_prefix, truncate_str, JsString, Value};

/// A built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `alert(message)`
    Alert,
    /// `console.log(...)` / `log(...)`
    ConsoleLog,
    /// `parseInt(text)`
    ParseInt,
    /// `String(value)`
    String,
    /// `Math.floor(x)`
    MathFloor,
    /// `Math.random()`
    MathRandom,
    /// `playAudio(src)` / `play(src)`
    PlayAudio,
    /// `getElement(id[, property])` / `document.getElementById(id)`
    GetElement,
    /// `setElement(id, property, value)`
    SetElement,
}

impl Builtin {
    /// Resolve a call name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "alert" => Builtin::Alert,
            "console.log" | "log" => Builtin::ConsoleLog,
            "parseInt" => Builtin::ParseInt,
            "String" => Builtin::String,
            "Math.floor" => Builtin::MathFloor,
            "Math.random" => Builtin::MathRandom,
            "playAudio" | "play" => Builtin::PlayAudio,
            "getElement" | "document.getElementById" => Builtin::GetElement,
            "setElement" => Builtin::SetElement,
            _ => return None,
        })
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Alert => "alert",
            Builtin::ConsoleLog => "console.log",
            Builtin::ParseInt => "parseInt",
            Builtin::String => "String",
            Builtin::MathFloor => "Math.floor",
            Builtin::MathRandom => "Math.random",
            Builtin::PlayAudio => "playAudio",
            Builtin::GetElement => "getElement",
            Builtin::SetElement => "setElement",
        }
    }
}

/// Run the built-in called `name`, if there is one.
pub(crate) fn call(ctx: &mut Context, name: &str, args: &[Value]) -> Option<Value> {
    let builtin = Builtin::from_name(name)?;
    let max_len = ctx.config.max_argument_len;
    let mode = ctx.config.coercion;
    let args: Vec<JsString> = args
        .iter()
        .map(|arg| JsString::new(truncate_str(&arg.to_js_string_as(mode), max_len)))
        .collect();
    let first = args.first().map(|s| s.as_str());

    log::trace!("[JS] builtin {} ({} args)", builtin.name(), args.len());

    let result = match builtin {
        Builtin::Alert => {
            if let Some(message) = first {
                ctx.host.alert(message);
            }
            Value::Undefined
        }
        Builtin::ConsoleLog => {
            if !args.is_empty() {
                let line = args.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ");
                ctx.host.console_log(&line);
            }
            Value::Undefined
        }
        Builtin::ParseInt => Value::Number(first.map_or(0.0, parse_int_prefix)),
        Builtin::String => Value::string(first.unwrap_or("")),
        Builtin::MathFloor => Value::Number(first.map_or(0.0, |s| match mode {
            Coercion::Integer => parse_int_prefix(s),
            Coercion::Standard => floor(parse_number_prefix(s)),
        })),
        Builtin::MathRandom => Value::Number(next_random(&mut ctx.rng_state)),
        Builtin::PlayAudio => {
            if let Some(src) = first {
                ctx.host.play_audio(src);
            }
            Value::Undefined
        }
        Builtin::GetElement => match first {
            Some(id) => {
                let property = args.get(1).map_or("innerText", |s| s.as_str());
                element_property(ctx, id, property)
            }
            None => Value::Null,
        },
        Builtin::SetElement => {
            if let [id, property, value, ..] = args.as_slice() {
                ctx.host.set_element_property(id, property, value);
            }
            Value::Undefined
        }
    };
    Some(result)
}

/// Read one property of a host element. Missing elements are `null`,
/// unknown properties `undefined`.
fn element_property(ctx: &mut Context, id: &str, property: &str) -> Value {
    let Some(element) = ctx.host.get_element(id) else {
        return Value::Null;
    };
    if property == "visible" {
        return Value::Boolean(element.visible);
    }
    match element.text_property(property) {
        Some(text) => Value::String(JsString::from(String::from(text))),
        None => Value::Undefined,
    }
}

/// Advance the linear congruential generator and map it onto `[0, 1)` in
/// steps of 0.001.
fn next_random(state: &mut u32) -> f64 {
    *state = state.wrapping_mul(1103515245).wrapping_add(12345);
    f64::from(*state % 1000) / 1000.0
}
