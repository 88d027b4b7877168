//! Engine Unit Tests
//!
//! Scripts run end to end through a [`Context`](crate::Context), grouped by
//! the part of the language they exercise.

#[cfg(test)]
mod expression_tests {
    use crate::{Context, EngineConfig, Value};

    fn eval(source: &str) -> Value {
        Context::new().evaluate_expression(source)
    }

    fn eval_standard(source: &str) -> Value {
        Context::with_config(EngineConfig::standard()).evaluate_expression(source)
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval("10 - 4 - 3"), Value::Number(3.0));
        assert_eq!(eval("2 * 3 + 4 * 5"), Value::Number(26.0));
        assert_eq!(eval("7 % 3"), Value::Number(1.0));
    }

    #[test]
    fn test_negative_literals() {
        assert_eq!(eval("-5 + 2"), Value::Number(-3.0));
        assert_eq!(eval("2 * -3"), Value::Number(-6.0));
        assert_eq!(eval("4 -1"), Value::Number(3.0));
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        assert_eq!(eval("1 / 0"), Value::Number(0.0));
        assert_eq!(eval("5 % 0"), Value::Number(0.0));
    }

    #[test]
    fn test_plus_concatenates_with_strings() {
        assert_eq!(eval("\"a\" + 1"), Value::string("a1"));
        assert_eq!(eval("1 + \"a\""), Value::string("1a"));
        assert_eq!(eval("1 + 2"), Value::Number(3.0));
        assert_eq!(eval("'it' + \"'s\""), Value::string("it's"));
    }

    #[test]
    fn test_integer_coercion_by_default() {
        assert_eq!(eval("\"x\" + 1.5"), Value::string("x1"));
        assert_eq!(eval("'1.5' == 1.5"), Value::Boolean(false));
        assert_eq!(eval("'1.5' == 1"), Value::Boolean(true));
        assert_eq!(eval("'2.9' * 2"), Value::Number(4.0));
        assert_eq!(eval("1.5 + 1.5"), Value::Number(3.0));
    }

    #[test]
    fn test_standard_coercion() {
        assert_eq!(eval_standard("\"x\" + 1.5"), Value::string("x1.5"));
        assert_eq!(eval_standard("'1.5' == 1.5"), Value::Boolean(true));
        assert_eq!(eval_standard("'2.5' * 2"), Value::Number(5.0));
        assert_eq!(eval_standard("'x' + 10 / 4"), Value::string("x2.5"));
    }

    #[test]
    fn test_strict_and_loose_equality() {
        assert_eq!(eval("1 === \"1\""), Value::Boolean(false));
        assert_eq!(eval("1 == \"1\""), Value::Boolean(true));
        assert_eq!(eval("1 !== \"1\""), Value::Boolean(true));
        assert_eq!(eval("1 != \"1\""), Value::Boolean(false));
        assert_eq!(eval("\"ab\" === \"ab\""), Value::Boolean(true));
        assert_eq!(eval("null == 0"), Value::Boolean(true));
    }

    #[test]
    fn test_relational_operators() {
        assert_eq!(eval("2 < 10"), Value::Boolean(true));
        assert_eq!(eval("2 >= 10"), Value::Boolean(false));
        assert_eq!(eval("3 <= 3"), Value::Boolean(true));
        assert_eq!(eval("\"12px\" > 11"), Value::Boolean(true));
    }

    #[test]
    fn test_logical_operators_yield_booleans() {
        assert_eq!(eval("true && false"), Value::Boolean(false));
        assert_eq!(eval("0 || \"x\""), Value::Boolean(true));
        assert_eq!(eval("1 < 2 && 3 > 2"), Value::Boolean(true));
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("null"), Value::Null);
        assert_eq!(eval("undefined"), Value::Undefined);
        assert_eq!(eval("3.25"), Value::Number(3.25));
        assert_eq!(eval("\"a\\nb\""), Value::string("a\nb"));
        assert_eq!(eval("`tpl`"), Value::string("tpl"));
    }

    #[test]
    fn test_unknown_identifier_is_undefined() {
        let mut ctx = Context::new();
        assert_eq!(ctx.evaluate_expression("missing"), Value::Undefined);
        assert!(!ctx.has_error());
    }

    #[test]
    fn test_number_builtins() {
        assert_eq!(eval("Math.floor(3.7)"), Value::Number(3.0));
        assert_eq!(eval("Math.floor(-1.5)"), Value::Number(-1.0), "truncates toward zero");
        assert_eq!(eval("Math.floor('8.9kg')"), Value::Number(8.0));
        assert_eq!(eval("parseInt(\"42px\")"), Value::Number(42.0));
        assert_eq!(eval("parseInt(\"abc\")"), Value::Number(0.0));
        assert_eq!(eval("parseInt()"), Value::Number(0.0));
    }

    #[test]
    fn test_standard_number_builtins() {
        assert_eq!(eval_standard("Math.floor(-1.5)"), Value::Number(-2.0));
        assert_eq!(eval_standard("Math.floor('8.9kg')"), Value::Number(8.0));
        assert_eq!(eval_standard("parseInt('-7.9')"), Value::Number(-7.0));
    }

    #[test]
    fn test_string_builtin_formats_numbers() {
        assert_eq!(eval("String(1.5)"), Value::string("1"));
        assert_eq!(eval("String(10 / 2)"), Value::string("5"));
        assert_eq!(eval("String(true)"), Value::string("true"));
        assert_eq!(eval("String()"), Value::string(""));

        assert_eq!(eval_standard("String(1.5)"), Value::string("1.5"));
        assert_eq!(eval_standard("String(1 / 3 > 0)"), Value::string("true"));
    }

    #[test]
    fn test_math_random_is_seeded_per_context() {
        let a = eval("Math.random()");
        let b = eval("Math.random()");
        assert_eq!(a, b, "fresh contexts start from the same seed");

        let n = a.to_number();
        assert!((0.0..1.0).contains(&n));

        let mut ctx = Context::new();
        ctx.execute("var r1 = Math.random(); var r2 = Math.random();");
        assert_ne!(ctx.get_variable("r1"), ctx.get_variable("r2"));
    }
}

#[cfg(test)]
mod statement_tests {
    use crate::{Context, EngineConfig, Value};

    fn run(source: &str) -> Context {
        let mut ctx = Context::new();
        ctx.execute(source);
        assert!(!ctx.has_error(), "unexpected error: {}", ctx.get_error());
        ctx
    }

    fn number(ctx: &Context, name: &str) -> f64 {
        ctx.get_variable(name).map_or(f64::NAN, |v| v.to_number())
    }

    #[test]
    fn test_execute_returns_last_value() {
        let mut ctx = Context::new();
        assert_eq!(ctx.execute("var y = 3; y;"), Value::Number(3.0));
        assert_eq!(ctx.get_variable("y"), Some(Value::Number(3.0)));
    }

    #[test]
    fn test_declarations() {
        let ctx = run("var a = 1; let b = 'two'; const c = true; var d;");
        assert_eq!(ctx.get_variable("a"), Some(Value::Number(1.0)));
        assert_eq!(ctx.get_variable("b"), Some(Value::string("two")));
        assert_eq!(ctx.get_variable("c"), Some(Value::Boolean(true)));
        assert_eq!(ctx.get_variable("d"), Some(Value::Undefined));
    }

    #[test]
    fn test_redeclaration_overwrites() {
        let ctx = run("var a = 1; var a = 2;");
        assert_eq!(ctx.get_variable("a"), Some(Value::Number(2.0)));
        assert_eq!(ctx.variable_count(), 1);
    }

    #[test]
    fn test_assignment_creates_global() {
        let ctx = run("z = 5; n++;");
        assert_eq!(number(&ctx, "z"), 5.0);
        assert_eq!(number(&ctx, "n"), 1.0);
    }

    #[test]
    fn test_compound_assignment() {
        let ctx = run(
            "var a = 10; a += 5; a -= 3; a *= 2; var s = 'n'; s += 1; var q = 10; q /= 0; a--;",
        );
        assert_eq!(number(&ctx, "a"), 23.0);
        assert_eq!(ctx.get_variable("s"), Some(Value::Number(1.0)), "+= is numeric");
        assert_eq!(number(&ctx, "q"), 0.0);
    }

    #[test]
    fn test_standard_compound_assignment_concatenates() {
        let mut ctx = Context::with_config(EngineConfig::standard());
        ctx.execute("var s = 'a'; s += 'b'; var n = 1; n += 0.5;");
        assert_eq!(ctx.get_variable("s"), Some(Value::string("ab")));
        assert_eq!(ctx.get_variable("n"), Some(Value::Number(1.5)));

        let mut ctx = Context::new();
        ctx.execute("var s = 'a'; s += 'b';");
        assert_eq!(ctx.get_variable("s"), Some(Value::Number(0.0)));
    }

    #[test]
    fn test_if_else() {
        let ctx = run("var r = 0; if (1 < 2) { r = 1; } else { r = 2; }");
        assert_eq!(number(&ctx, "r"), 1.0);

        let ctx = run("var r = 0; if (1 > 2) { r = 1; } else { r = 2; }");
        assert_eq!(number(&ctx, "r"), 2.0);

        let ctx = run("var r = 0; if (0) r = 1; var after = 1;");
        assert_eq!(number(&ctx, "r"), 0.0);
        assert_eq!(number(&ctx, "after"), 1.0);
    }

    #[test]
    fn test_else_if_chain() {
        let source = "var r = 0; \
            if (x == 1) { r = 1; } else if (x == 2) { r = 2; } else { r = 3; } \
            var done = true;";
        for (x, expected) in [(1.0, 1.0), (2.0, 2.0), (7.0, 3.0)] {
            let mut ctx = Context::new();
            ctx.set_variable("x", Value::Number(x));
            ctx.execute(source);
            assert_eq!(number(&ctx, "r"), expected, "x = {}", x);
            assert_eq!(ctx.get_variable("done"), Some(Value::Boolean(true)));
        }
    }

    #[test]
    fn test_while_loop() {
        let ctx = run("var i = 0; var s = 0; while (i < 5) { s = s + i; i++; } var after = 1;");
        assert_eq!(number(&ctx, "s"), 10.0);
        assert_eq!(number(&ctx, "i"), 5.0);
        assert_eq!(number(&ctx, "after"), 1.0);
    }

    #[test]
    fn test_while_false_skips_body() {
        let ctx = run("var hit = 0; while (false) { hit = 1; } var after = 2;");
        assert_eq!(number(&ctx, "hit"), 0.0);
        assert_eq!(number(&ctx, "after"), 2.0);
    }

    #[test]
    fn test_for_loop() {
        let ctx = run("var s = 0; for (var i = 0; i < 4; i++) { s += i; } var done = true;");
        assert_eq!(number(&ctx, "s"), 6.0);
        assert_eq!(number(&ctx, "i"), 4.0);
        assert_eq!(ctx.get_variable("done"), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_for_increment_forms() {
        let ctx = run("var c = 0; for (var i = 0; i < 10; i += 2) { c++; }");
        assert_eq!(number(&ctx, "c"), 5.0);

        let ctx = run("var c = 0; for (var i = 0; i < 3; i = i + 1) c = c + 10;");
        assert_eq!(number(&ctx, "c"), 30.0);
    }

    #[test]
    fn test_nested_loops() {
        let ctx = run(
            "var n = 0; for (var i = 0; i < 3; i++) { for (var j = 0; j < 4; j++) { n++; } }",
        );
        assert_eq!(number(&ctx, "n"), 12.0);
    }

    #[test]
    fn test_comments_are_skipped() {
        let ctx = run("// line\nvar a = 1; /* block\n comment */ var b = 2; // trailing");
        assert_eq!(number(&ctx, "a"), 1.0);
        assert_eq!(number(&ctx, "b"), 2.0);
    }

    #[test]
    fn test_unrecognised_characters_are_skipped() {
        let ctx = run("var a = 1; @ # var b = 2;");
        assert_eq!(number(&ctx, "a"), 1.0);
        assert_eq!(number(&ctx, "b"), 2.0);
    }

    #[test]
    fn test_unterminated_input_runs_to_end() {
        let ctx = run("var s = \"abc");
        assert_eq!(ctx.get_variable("s"), Some(Value::string("abc")));

        let ctx = run("var a = 1; /* never closed");
        assert_eq!(number(&ctx, "a"), 1.0);
    }

    #[test]
    fn test_braces_inside_strings_do_not_close_blocks() {
        let ctx = run("var t = ''; if (false) { t = '}'; } var after = 1;");
        assert_eq!(ctx.get_variable("t"), Some(Value::string("")));
        assert_eq!(number(&ctx, "after"), 1.0);
    }

    #[test]
    fn test_keyword_prefixed_identifiers() {
        let ctx = run("var iffy = 1; var format = 2; var returned = iffy + format;");
        assert_eq!(number(&ctx, "returned"), 3.0);
    }
}

#[cfg(test)]
mod function_tests {
    use crate::{Context, EngineConfig, Value};

    #[test]
    fn test_function_reads_globals() {
        let mut ctx = Context::new();
        ctx.execute("function add() { return x + 1; } var x = 2; var r = add();");
        assert_eq!(ctx.get_variable("r"), Some(Value::Number(3.0)));
        assert_eq!(ctx.function_count(), 1);
    }

    #[test]
    fn test_flat_scoping_ignores_parameters() {
        let mut ctx = Context::new();
        ctx.execute("function f(a) { return a + 1; } var r = f(5);");
        // `a` is never bound, so the body sees undefined + 1.
        assert_eq!(ctx.get_variable("r"), Some(Value::Number(1.0)));
        assert_eq!(ctx.get_variable("a"), None);
    }

    #[test]
    fn test_lexical_scoping_binds_parameters() {
        let mut ctx = Context::with_config(EngineConfig::lexical());
        ctx.execute("function f(a) { return a + 1; } var r = f(5);");
        assert_eq!(ctx.get_variable("r"), Some(Value::Number(6.0)));
        assert_eq!(ctx.get_variable("a"), None, "parameters stay in the frame");
    }

    #[test]
    fn test_lexical_locals_do_not_leak() {
        let mut ctx = Context::with_config(EngineConfig::lexical());
        ctx.execute("function f() { var t = 1; g = 2; } f();");
        assert_eq!(ctx.get_variable("t"), None);
        assert_eq!(ctx.get_variable("g"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_lexical_missing_arguments_are_undefined() {
        let mut ctx = Context::with_config(EngineConfig::lexical());
        ctx.execute("function f(a, b) { return b; } var r = f(1);");
        assert_eq!(ctx.get_variable("r"), Some(Value::Undefined));
    }

    #[test]
    fn test_lexical_recursion() {
        let mut ctx = Context::with_config(EngineConfig::lexical());
        ctx.execute(
            "function fact(n) { if (n <= 1) { return 1; } else { return n * fact(n - 1); } } \
             var r = fact(5);",
        );
        assert!(!ctx.has_error());
        assert_eq!(ctx.get_variable("r"), Some(Value::Number(120.0)));
    }

    #[test]
    fn test_return_does_not_stop_the_body() {
        let mut ctx = Context::new();
        ctx.execute("function f() { return 1; 2; } var r = f();");
        assert_eq!(ctx.get_variable("r"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_return_inside_loop_does_not_unwind() {
        let mut ctx = Context::new();
        ctx.execute(
            "var i = 0; var after = 0; \
             function f() { while (i < 5) { i++; if (i == 2) { return 9; after = after + 1; } } } \
             var r = f();",
        );
        assert!(!ctx.has_error());
        assert_eq!(ctx.get_variable("i"), Some(Value::Number(5.0)));
        assert_eq!(ctx.get_variable("after"), Some(Value::Number(1.0)));
        assert!(ctx.get_variable("r").is_some_and(|r| r.is_undefined()));
    }

    #[test]
    fn test_redeclaration_replaces_function() {
        let mut ctx = Context::new();
        ctx.execute("function f() { return 1; } function f() { return 2; } var r = f();");
        assert_eq!(ctx.get_variable("r"), Some(Value::Number(2.0)));
        assert_eq!(ctx.function_count(), 1);
    }

    #[test]
    fn test_undeclared_call_is_undefined() {
        let mut ctx = Context::new();
        ctx.execute("var r = nope(1, 2);");
        assert!(!ctx.has_error());
        assert_eq!(ctx.get_variable("r"), Some(Value::Undefined));
    }

    #[test]
    fn test_builtins_cannot_be_shadowed() {
        let mut ctx = Context::new();
        ctx.execute("function parseInt() { return 99; } var r = parseInt('7');");
        assert_eq!(ctx.get_variable("r"), Some(Value::Number(7.0)));
    }

    #[test]
    fn test_recursion_within_depth_limit() {
        let mut ctx = Context::new();
        ctx.execute("var n = 0; function f() { n = n + 1; if (n < 16) { f(); } } f();");
        assert!(!ctx.has_error(), "16 nested calls are allowed");
        assert_eq!(ctx.get_variable("n"), Some(Value::Number(16.0)));
        assert_eq!(ctx.call_depth(), 0);
    }

    #[test]
    fn test_recursion_through_nested_blocks() {
        let mut ctx = Context::new();
        ctx.execute(
            "var n = 0; function f() { n = n + 1; \
             if (n < 16) { if (1) { if (1) { if (1) { if (1) { f(); } } } } } } f();",
        );
        assert!(!ctx.has_error(), "unexpected error: {}", ctx.get_error());
        assert_eq!(ctx.get_variable("n"), Some(Value::Number(16.0)));
        assert_eq!(ctx.call_depth(), 0);
    }

    #[test]
    fn test_recursion_through_nested_blocks_past_depth_limit() {
        let mut ctx = Context::new();
        ctx.execute(
            "var n = 0; function f() { n = n + 1; \
             if (n < 17) { if (1) { if (1) { if (1) { if (1) { f(); } } } } } } f();",
        );
        assert_eq!(ctx.get_error(), "Maximum call stack exceeded");
        assert_eq!(ctx.get_variable("n"), Some(Value::Number(16.0)));
    }

    #[test]
    fn test_recursion_past_depth_limit() {
        let mut ctx = Context::new();
        ctx.execute("var n = 0; function f() { n = n + 1; if (n < 17) { f(); } } f();");
        assert!(ctx.has_error());
        assert_eq!(ctx.get_error(), "Maximum call stack exceeded");
        assert_eq!(ctx.get_variable("n"), Some(Value::Number(16.0)));
        assert_eq!(ctx.call_depth(), 0);
    }

    #[test]
    fn test_unbounded_recursion_stops() {
        let mut ctx = Context::new();
        ctx.execute("function f() { f(); } f(); var after = 1;");
        assert_eq!(ctx.get_error(), "Maximum call stack exceeded");
        assert_eq!(ctx.get_variable("after"), None);
    }
}

#[cfg(test)]
mod host_tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::{Callbacks, Context, ElementSnapshot, Host, Value};

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder() -> (Log, impl FnMut(&str) + 'static) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |msg: &str| sink.borrow_mut().push(String::from(msg)))
    }

    fn page() -> impl FnMut(&str) -> Option<ElementSnapshot> + 'static {
        |id: &str| match id {
            "title" => Some(ElementSnapshot::new("h1", "title").with_text("Hello")),
            _ => None,
        }
    }

    #[test]
    fn test_alert_and_console() {
        let (alerts, on_alert) = recorder();
        let (lines, on_console) = recorder();
        let mut ctx = Context::new();
        ctx.set_callbacks(Callbacks::new().on_alert(on_alert).on_console(on_console));

        ctx.execute("alert('hi'); alert(1 + 2); console.log('a', 1); log('x');");

        assert_eq!(*alerts.borrow(), ["hi", "3"]);
        assert_eq!(*lines.borrow(), ["a 1", "x"]);
    }

    #[test]
    fn test_play_audio_aliases() {
        let (played, on_play) = recorder();
        let mut ctx = Context::new();
        ctx.set_callbacks(Callbacks::new().on_play_audio(on_play));
        ctx.execute("playAudio('beep'); play(\"chime\");");
        assert_eq!(*played.borrow(), ["beep", "chime"]);
    }

    #[test]
    fn test_missing_callbacks_are_no_ops() {
        let mut ctx = Context::new();
        ctx.execute("alert('x'); console.log('y'); playAudio('z'); var e = getElement('title');");
        assert!(!ctx.has_error());
        assert_eq!(ctx.get_variable("e"), Some(Value::Null));
    }

    #[test]
    fn test_get_element_properties() {
        let mut ctx = Context::new();
        ctx.set_callbacks(Callbacks::new().on_get_element(page()));

        assert_eq!(ctx.evaluate_expression("getElement('title')"), Value::string("Hello"));
        assert_eq!(
            ctx.evaluate_expression("document.getElementById('title')"),
            Value::string("Hello")
        );
        assert_eq!(ctx.evaluate_expression("getElement('title', 'tag')"), Value::string("h1"));
        assert_eq!(
            ctx.evaluate_expression("getElement('title', 'visible')"),
            Value::Boolean(true)
        );
        assert_eq!(ctx.evaluate_expression("getElement('title', 'bogus')"), Value::Undefined);
        assert_eq!(ctx.evaluate_expression("getElement('missing')"), Value::Null);
    }

    #[test]
    fn test_set_element_forwards_all_arguments() {
        let writes: Rc<RefCell<Vec<(String, String, String)>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&writes);
        let mut ctx = Context::new();
        ctx.set_callbacks(Callbacks::new().on_set_element(move |id, prop, value| {
            sink.borrow_mut()
                .push((String::from(id), String::from(prop), String::from(value)));
        }));

        ctx.execute("setElement('title', 'innerText', 'Bye ' + 2); setElement('title', 'style');");

        let writes = writes.borrow();
        assert_eq!(writes.len(), 1, "incomplete calls are ignored");
        assert_eq!(writes[0].0, "title");
        assert_eq!(writes[0].1, "innerText");
        assert_eq!(writes[0].2, "Bye 2");
    }

    struct Console {
        lines: Log,
    }

    impl Host for Console {
        fn console_log(&mut self, message: &str) {
            self.lines.borrow_mut().push(String::from(message));
        }
    }

    #[test]
    fn test_custom_host() {
        let lines: Log = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = Context::new();
        ctx.set_host(Console {
            lines: Rc::clone(&lines),
        });
        ctx.execute("console.log('hello'); alert('ignored');");
        assert_eq!(*lines.borrow(), ["hello"]);
    }

    #[test]
    fn test_run_handler_reports_errors_to_console() {
        let (lines, on_console) = recorder();
        let mut ctx = Context::new();
        ctx.set_callbacks(Callbacks::new().on_console(on_console));

        assert!(ctx.run_handler("console.log('ok');"));
        assert!(!ctx.run_handler("while (true) {}"));
        assert!(!ctx.has_error(), "the handler clears the error");
        assert!(ctx.run_handler("var after = 1;"));

        assert_eq!(*lines.borrow(), ["ok", "Maximum iterations exceeded"]);
        assert_eq!(ctx.get_variable("after"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_empty_handler_clears_pending_error() {
        let mut ctx = Context::new();
        ctx.execute("while (true) {}");
        assert!(ctx.has_error());

        assert!(ctx.run_handler(""));
        assert!(!ctx.has_error());
        assert_eq!(ctx.get_error(), "");
    }

    #[test]
    fn test_reset_keeps_callbacks() {
        let (alerts, on_alert) = recorder();
        let mut ctx = Context::new();
        ctx.set_callbacks(Callbacks::new().on_alert(on_alert));

        ctx.execute("var a = 1; function f() { alert('f'); } f();");
        ctx.reset();

        assert_eq!(ctx.variable_count(), 0);
        assert_eq!(ctx.function_count(), 0);
        ctx.execute("f(); alert('after reset');");
        assert_eq!(*alerts.borrow(), ["f", "after reset"]);
    }
}

#[cfg(test)]
mod limit_tests {
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::string::String;
    use core::cell::RefCell;

    use crate::{Callbacks, Context, EngineConfig, ScriptError, Value, MAX_STRING_LEN};

    #[test]
    fn test_infinite_loop_stops_after_cap() {
        let mut ctx = Context::new();
        ctx.execute("var i = 0; while (true) { i++; }");
        assert!(ctx.has_error());
        assert_eq!(ctx.get_error(), "Maximum iterations exceeded");
        assert_eq!(ctx.last_error(), Some(&ScriptError::IterationLimit));
        assert_eq!(ctx.get_variable("i"), Some(Value::Number(1000.0)));
    }

    #[test]
    fn test_empty_for_condition_hits_cap() {
        let mut ctx = Context::new();
        ctx.execute("var c = 0; for (;;) { c++; }");
        assert_eq!(ctx.last_error(), Some(&ScriptError::IterationLimit));
        assert_eq!(ctx.get_variable("c"), Some(Value::Number(1000.0)));
    }

    #[test]
    fn test_cap_is_per_loop_statement() {
        let mut ctx = Context::new();
        ctx.execute("var i = 0; while (i < 1000) { i++; }");
        assert!(!ctx.has_error(), "a loop ending on its own at the cap is fine");

        ctx.execute("var a = 0; while (a < 600) { a++; } var b = 0; while (b < 600) { b++; }");
        assert!(!ctx.has_error());
        assert_eq!(ctx.get_variable("b"), Some(Value::Number(600.0)));
    }

    #[test]
    fn test_error_stops_execution() {
        let mut ctx = Context::new();
        ctx.execute("while (true) {} var after = 1;");
        assert_eq!(ctx.get_variable("after"), None);

        ctx.execute("var blocked = 1;");
        assert_eq!(ctx.get_variable("blocked"), None, "nothing runs while an error is pending");
        assert_eq!(ctx.evaluate_expression("1 + 1"), Value::Undefined);

        ctx.clear_error();
        assert_eq!(ctx.get_error(), "");
        ctx.execute("var resumed = 1;");
        assert_eq!(ctx.get_variable("resumed"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_custom_iteration_limit() {
        let mut ctx = Context::with_config(EngineConfig {
            max_iterations: 10,
            ..EngineConfig::default()
        });
        ctx.execute("var i = 0; while (true) { i++; }");
        assert_eq!(ctx.get_variable("i"), Some(Value::Number(10.0)));
    }

    #[test]
    fn test_variable_capacity() {
        let mut ctx = Context::new();
        for i in 0..70 {
            ctx.set_variable(&format!("v{}", i), Value::Number(f64::from(i)));
        }
        assert_eq!(ctx.variable_count(), 64);
        assert_eq!(ctx.get_variable("v64"), None);

        ctx.execute("v0 = 99;");
        assert_eq!(ctx.get_variable("v0"), Some(Value::Number(99.0)));
    }

    #[test]
    fn test_function_capacity() {
        let mut source = String::new();
        for i in 0..40 {
            source.push_str(&format!("function f{}() {{ return {}; }} ", i, i));
        }
        let mut ctx = Context::new();
        ctx.execute(&source);
        assert_eq!(ctx.function_count(), 32);
        assert_eq!(ctx.evaluate_expression("f31()"), Value::Number(31.0));
        assert_eq!(ctx.evaluate_expression("f32()"), Value::Undefined);
    }

    #[test]
    fn test_string_truncation() {
        let mut ctx = Context::new();
        ctx.execute("var s = 'x'; for (var i = 0; i < 300; i++) { s = s + 'y'; }");
        let s = ctx.get_variable("s").unwrap_or_default();
        assert_eq!(s.as_str().map(str::len), Some(MAX_STRING_LEN - 1));

        let literal = format!("var t = '{}';", "a".repeat(300));
        ctx.execute(&literal);
        let t = ctx.get_variable("t").unwrap_or_default();
        assert_eq!(t.as_str().map(str::len), Some(MAX_STRING_LEN - 1));
    }

    #[test]
    fn test_identifier_truncation() {
        let mut ctx = Context::new();
        ctx.execute(&format!("var {} = 1;", "a".repeat(100)));
        assert_eq!(ctx.get_variable(&"a".repeat(63)), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_arguments_are_capped() {
        let lines = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&lines);
        let mut ctx = Context::new();
        ctx.set_callbacks(Callbacks::new().on_console(move |msg| {
            sink.borrow_mut().push_str(msg);
        }));

        ctx.execute("console.log(1, 2, 3, 4, 5, 6, 7, 8, 9, 10);");
        assert_eq!(*lines.borrow(), "1 2 3 4 5 6 7 8");

        lines.borrow_mut().clear();
        ctx.execute(&format!("console.log('{}');", "z".repeat(200)));
        assert_eq!(lines.borrow().len(), 127);
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let mut ctx = Context::new();
        let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(ctx.evaluate_expression(&source), Value::Undefined);
        assert_eq!(ctx.last_error(), Some(&ScriptError::NestingTooDeep));

        ctx.clear_error();
        assert_eq!(ctx.evaluate_expression("(((1 + 1)))"), Value::Number(2.0));
    }
}
