//! Script Engine Fuzzing
//!
//! Runs inputs as page scripts in a fresh engine and checks the engine's
//! invariants afterwards. Malformed scripts are never a failure: the engine
//! is expected to swallow anything without panicking, hanging, or leaving
//! itself in an unusable state.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;

use minios_js::scanner::MAX_IDENTIFIER_LEN;
use minios_js::{Callbacks, Context, ElementSnapshot, EngineConfig, JsString, ScriptError, Value};

use crate::{FuzzResult, FuzzTarget};

/// Observable state of a context after running one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Pending error, if any.
    pub error: Option<ScriptError>,
    /// Globals as `(name, type, rendered value)`.
    pub variables: Vec<(String, &'static str, String)>,
    /// Number of user functions.
    pub functions: usize,
    /// Host callbacks fired.
    pub host_calls: u64,
}

impl Outcome {
    /// Coarse signature used to decide whether an input is new.
    pub fn signature(&self) -> u64 {
        let mut hash = Fnv::new();
        hash.write(&[match self.error {
            None => 0,
            Some(ScriptError::CallStackExceeded) => 1,
            Some(ScriptError::IterationLimit) => 2,
            Some(ScriptError::NestingTooDeep) => 3,
        }]);
        hash.write(&(self.variables.len() as u64).to_le_bytes());
        for (_, ty, _) in &self.variables {
            hash.write(ty.as_bytes());
        }
        hash.write(&(self.functions as u64).to_le_bytes());
        hash.write(&self.host_calls.min(16).to_le_bytes());
        hash.finish()
    }
}

/// Script engine fuzzer
pub struct ScriptFuzzer {
    /// Maximum script size
    max_size: usize,
    /// Engine configuration under test
    config: EngineConfig,
}

impl ScriptFuzzer {
    /// Create a fuzzer for the default engine configuration
    pub fn new() -> Self {
        Self {
            max_size: 4096,
            config: EngineConfig::default(),
        }
    }

    /// Fuzz with parameter binding and call frames enabled
    pub fn lexical(mut self) -> Self {
        self.config = EngineConfig::lexical();
        self
    }

    /// Fuzz a custom configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Limit input size
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Execute `source` in a fresh context, check the invariants and
    /// describe the result.
    pub fn run(&self, source: &str) -> Result<Outcome, String> {
        let calls = Rc::new(Cell::new(0u64));
        let mut ctx = Context::with_config(self.config.clone());
        ctx.set_callbacks(counting_host(&calls));

        ctx.execute(source);
        check_invariants(&ctx, &self.config)?;

        let outcome = Outcome {
            error: ctx.last_error().copied(),
            variables: ctx
                .variables()
                .map(|(name, value)| (String::from(name), value.type_of(), format!("{}", value)))
                .collect(),
            functions: ctx.function_count(),
            host_calls: calls.get(),
        };

        ctx.clear_error();
        let probe = ctx.evaluate_expression("(1 + 2) * 3");
        if probe != Value::Number(9.0) || ctx.has_error() {
            return Err(format!("context unusable after run: probe gave {:?}", probe));
        }

        Ok(outcome)
    }
}

impl Default for ScriptFuzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzTarget for ScriptFuzzer {
    fn name(&self) -> &str {
        match self.config.scoping {
            minios_js::Scoping::Flat => "script_flat",
            minios_js::Scoping::Lexical => "script_lexical",
        }
    }

    fn fuzz(&mut self, input: &[u8]) -> FuzzResult {
        if input.len() > self.max_size {
            return FuzzResult::Rejected(String::from("input too large"));
        }
        let text = match core::str::from_utf8(input) {
            Ok(s) => s,
            Err(_) => return FuzzResult::Rejected(String::from("invalid utf8")),
        };

        let first = match self.run(text) {
            Ok(outcome) => outcome,
            Err(msg) => return FuzzResult::Violation(msg),
        };
        // Contexts share nothing, so a second run must agree exactly.
        match self.run(text) {
            Ok(second) if second == first => {}
            Ok(_) => return FuzzResult::Violation(String::from("non-deterministic outcome")),
            Err(msg) => return FuzzResult::Violation(msg),
        }

        log::trace!("[FUZZ] {} -> {:?}", self.name(), first.error);
        FuzzResult::Interesting(first.signature())
    }

    fn reset(&mut self) {}
}

/// Check everything that must hold after any `execute`, whatever the input.
pub fn check_invariants(ctx: &Context, config: &EngineConfig) -> Result<(), String> {
    if ctx.call_depth() != 0 {
        return Err(format!("call depth left at {}", ctx.call_depth()));
    }
    if ctx.variable_count() > config.max_variables {
        return Err(format!("{} variables stored", ctx.variable_count()));
    }
    if ctx.function_count() > config.max_functions {
        return Err(format!("{} functions stored", ctx.function_count()));
    }

    let message = ctx.get_error();
    match ctx.last_error() {
        Some(err) if err.message() != message => {
            return Err(format!("error message mismatch: {:?}", message));
        }
        None if !message.is_empty() => {
            return Err(format!("message without error: {:?}", message));
        }
        _ => {}
    }
    if ctx.has_error() != ctx.last_error().is_some() {
        return Err(String::from("error flag out of sync"));
    }

    for (name, value) in ctx.variables() {
        if name.is_empty() || name.len() > MAX_IDENTIFIER_LEN {
            return Err(format!("bad variable name {:?}", name));
        }
        if let Value::String(s) = value {
            if s.len() > JsString::CAPACITY {
                return Err(format!("string of {} bytes in {}", s.len(), name));
            }
        }
    }
    Ok(())
}

fn counting_host(calls: &Rc<Cell<u64>>) -> Callbacks {
    let bump = |calls: &Rc<Cell<u64>>| {
        let calls = Rc::clone(calls);
        move || calls.set(calls.get() + 1)
    };
    let alert = bump(calls);
    let console = bump(calls);
    let get = bump(calls);
    let set = bump(calls);
    let play = bump(calls);
    Callbacks::new()
        .on_alert(move |_| alert())
        .on_console(move |_| console())
        .on_get_element(move |id| {
            get();
            (id == "title").then(|| ElementSnapshot::new("h1", "title").with_text("Fuzz"))
        })
        .on_set_element(move |_, _, _| set())
        .on_play_audio(move |_| play())
}

/// 64-bit FNV-1a.
struct Fnv(u64);

impl Fnv {
    fn new() -> Self {
        Fnv(0xcbf2_9ce4_8422_2325)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// Create script dictionary for fuzzing
pub fn script_dictionary() -> Vec<Vec<u8>> {
    let entries: &[&[u8]] = &[
        // Keywords
        b"var ",
        b"let ",
        b"const ",
        b"function ",
        b"return ",
        b"if ",
        b"else ",
        b"while ",
        b"for ",
        b"true",
        b"false",
        b"null",
        b"undefined",
        // Operators
        b"===",
        b"!==",
        b"==",
        b"!=",
        b"<=",
        b">=",
        b"&&",
        b"||",
        b"+=",
        b"-=",
        b"*=",
        b"/=",
        b"++",
        b"--",
        b"%",
        // Built-ins
        b"alert(",
        b"console.log(",
        b"log(",
        b"parseInt(",
        b"String(",
        b"Math.floor(",
        b"Math.random()",
        b"playAudio(",
        b"play(",
        b"getElement(",
        b"document.getElementById(",
        b"setElement(",
        // Structure
        b"(",
        b")",
        b"{",
        b"}",
        b";",
        b",",
        b"while(true){}",
        b"for(;;){}",
        b"function f(){f();}",
        b"f()",
        // Literals
        b"\"",
        b"'",
        b"`",
        b"\\",
        b"-1",
        b"0.5",
        b"1e308",
        // Comments
        b"//",
        b"/*",
        b"*/",
    ];

    entries.iter().map(|e| e.to_vec()).collect()
}

/// Generate seed scripts
pub fn generate_script_corpus() -> Vec<Vec<u8>> {
    let mut corpus = Vec::new();

    // Expressions
    corpus.push(b"1 + 2 * 3;".to_vec());
    corpus.push(b"\"a\" + 1;".to_vec());
    corpus.push(b"1 === \"1\" || 1 == \"1\";".to_vec());
    corpus.push(b"var m = 7 % 0; var d = 1 / 0;".to_vec());

    // Empty
    corpus.push(Vec::new());

    // Statements
    corpus.push(b"var x = 1; if (x > 0) { x = 2; } else { x = 3; }".to_vec());
    corpus.push(b"var i = 0; while (i < 10) { i++; }".to_vec());
    corpus.push(b"var s = ''; for (var i = 0; i < 5; i += 1) { s += i; }".to_vec());

    // Functions
    corpus.push(b"function f(a) { return a + 1; } var r = f(5);".to_vec());
    corpus.push(b"var n = 0; function g() { n++; if (n < 20) { g(); } } g();".to_vec());

    // Host
    corpus.push(b"alert('hi'); console.log('a', 1); playAudio('beep');".to_vec());
    corpus.push(b"var t = getElement('title'); setElement('title', 'innerText', t + '!');".to_vec());

    // Limits
    corpus.push(b"while (true) {}".to_vec());
    corpus.push(b"var s = 'x'; for (;;) { s = s + s; }".to_vec());

    // Deep nesting
    let mut deep = Vec::new();
    for _ in 0..40 {
        deep.extend_from_slice(b"if(true){");
    }
    for _ in 0..40 {
        deep.extend_from_slice(b"}");
    }
    corpus.push(deep);

    let mut parens = b"var p = ".to_vec();
    parens.extend(core::iter::repeat(b'(').take(300));
    parens.push(b'1');
    parens.extend(core::iter::repeat(b')').take(300));
    corpus.push(parens);

    // Many variables
    let mut many = Vec::new();
    for i in 0..80 {
        many.extend_from_slice(format!("var v{} = {};", i, i).as_bytes());
    }
    corpus.push(many);

    // Malformed
    corpus.push(b"function { }".to_vec());
    corpus.push(b"if then else".to_vec());
    corpus.push(b"{{{{}}}}".to_vec());
    corpus.push(b"var s = \"unterminated".to_vec());
    corpus.push(b"/* open comment".to_vec());
    corpus.push(b"@#$%^&".to_vec());

    // Unicode
    corpus.push("var s = 'ಠ_ಠ'; alert(s);".as_bytes().to_vec());

    corpus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_corpus_holds_invariants() {
        let standard = ScriptFuzzer::new().with_config(EngineConfig::standard());
        for mut fuzzer in [ScriptFuzzer::new(), ScriptFuzzer::new().lexical(), standard] {
            for input in generate_script_corpus() {
                let result = fuzzer.fuzz(&input);
                assert!(
                    !result.is_violation(),
                    "{}: {:?} on {:?}",
                    fuzzer.name(),
                    result,
                    String::from_utf8_lossy(&input)
                );
            }
        }
    }

    #[test]
    fn rejects_unusable_input() {
        let mut fuzzer = ScriptFuzzer::new().max_size(8);
        assert!(matches!(fuzzer.fuzz(&[0xFF, 0xFE]), FuzzResult::Rejected(_)));
        assert!(matches!(
            fuzzer.fuzz(b"var a = 1; var b = 2;"),
            FuzzResult::Rejected(_)
        ));
    }

    #[test]
    fn signature_separates_error_kinds() {
        let fuzzer = ScriptFuzzer::new();
        let ok = fuzzer.run("var a = 1;").map(|o| o.signature());
        let looped = fuzzer.run("var a = 1; while (true) {}").map(|o| o.signature());
        assert!(ok.is_ok() && looped.is_ok());
        assert_ne!(ok, looped);
    }

    #[test]
    fn outcome_records_host_calls() {
        let fuzzer = ScriptFuzzer::new();
        let outcome = fuzzer.run("alert(1); log(2); getElement('title');");
        assert_eq!(outcome.map(|o| o.host_calls), Ok(3));
    }

    #[test]
    fn dictionary_has_every_builtin() {
        let dict = script_dictionary();
        for name in ["alert(", "Math.random()", "setElement("] {
            assert!(dict.iter().any(|e| e == name.as_bytes()), "{}", name);
        }
    }
}
