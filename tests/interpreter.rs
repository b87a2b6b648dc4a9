#[cfg(test)]
mod interpreter_tests {
    use veery::error::VeeryError;
    use veery::interpreter::Interpreter;
    use veery::value::Value;

    /// Run a program expected to succeed and return everything it printed.
    fn run_ok(source: &str) -> String {
        let mut interpreter = Interpreter::with_capture();

        veery::run(source.as_bytes(), &mut interpreter).expect("program should run cleanly");

        interpreter.take_captured()
    }

    /// Run a program expected to fail; returns the output produced before the
    /// failure and the reported errors.
    fn run_err(source: &str) -> (String, Vec<VeeryError>) {
        let mut interpreter = Interpreter::with_capture();

        let errors = veery::run(source.as_bytes(), &mut interpreter)
            .expect_err("program should report errors");

        (interpreter.take_captured(), errors)
    }

    fn runtime_message(source: &str) -> String {
        let (_, errors) = run_err(source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_runtime(), "expected a runtime error");

        format!("{}", errors[0])
    }

    // ───────────────────────── expressions ─────────────────────────

    #[test]
    fn arithmetic_and_grouping() {
        assert_eq!(run_ok("print (1 + 2) * 3;"), "9\n");
        assert_eq!(run_ok("print 10 - 4 / 2;"), "8\n");
        assert_eq!(run_ok("print -3 + 1;"), "-2\n");
        assert_eq!(run_ok("print 2.5 + 0.25;"), "2.75\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run_ok("var a = \"x\" + \"y\"; print a;"), "xy\n");
    }

    #[test]
    fn adding_number_and_string_is_a_type_error() {
        let message = runtime_message("print 1 + \"y\";");

        assert!(message.contains("Operands must be two numbers or two strings."));
    }

    #[test]
    fn comparisons_require_numbers() {
        assert_eq!(run_ok("print 1 < 2; print 2 <= 2; print 3 > 4;"), "true\ntrue\nfalse\n");

        let message = runtime_message("print 1 < \"2\";");
        assert!(message.contains("Operands must be numbers."));
    }

    #[test]
    fn equality_never_raises() {
        assert_eq!(
            run_ok("print 1 == 1; print \"a\" == \"a\"; print nil == nil;"),
            "true\ntrue\ntrue\n"
        );

        // Different runtime types are simply unequal.
        assert_eq!(
            run_ok("print 1 == \"1\"; print nil == false; print true != false;"),
            "false\nfalse\ntrue\n"
        );
    }

    #[test]
    fn unary_minus_requires_a_number() {
        let message = runtime_message("print -\"x\";");

        assert!(message.contains("Operand must be a number."));
    }

    #[test]
    fn bang_negates_truthiness() {
        assert_eq!(run_ok("print !nil; print !false; print !0; print !\"\";"), "true\ntrue\nfalse\nfalse\n");
    }

    #[test]
    fn truthiness_in_conditions() {
        // Zero and the empty string are truthy; only nil and false are not.
        let source = "
            if (0) print \"zero\";
            if (\"\") print \"empty\";
            if (nil) print \"nil\"; else print \"no-nil\";
            if (false) print \"false\"; else print \"no-false\";
        ";

        assert_eq!(run_ok(source), "zero\nempty\nno-nil\nno-false\n");
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let message = runtime_message("print 1 / 0;");

        assert!(message.contains("Division by zero."));
    }

    #[test]
    fn assignment_is_an_expression_yielding_the_value() {
        assert_eq!(run_ok("var a; var b; print a = b = 5; print a; print b;"), "5\n5\n5\n");
    }

    #[test]
    fn integral_numbers_print_without_a_fraction() {
        assert_eq!(run_ok("print 2; print 2.5; print 7 / 2;"), "2\n2.5\n3.5\n");
    }

    // ───────────────────────── short-circuit ─────────────────────────

    #[test]
    fn logical_operators_short_circuit() {
        let source = "
            fun boom() { print \"boom\"; return true; }
            print false and boom();
            print true or boom();
        ";

        // boom() is never evaluated; the result is the deciding operand.
        assert_eq!(run_ok(source), "false\ntrue\n");
    }

    #[test]
    fn logical_operators_yield_operand_values() {
        assert_eq!(run_ok("print nil or \"fallback\"; print 1 and 2;"), "fallback\n2\n");
    }

    // ───────────────────────── variables & scope ─────────────────────────

    #[test]
    fn redeclaration_overwrites_without_error() {
        assert_eq!(run_ok("var x = 1; var x = 2; print x;"), "2\n");
        assert_eq!(run_ok("{ var x = 1; var x = 2; print x; }"), "2\n");
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let message = runtime_message("print missing;");

        assert!(message.contains("Undefined variable 'missing'."));
    }

    #[test]
    fn blocks_shadow_and_restore() {
        let source = "
            var a = \"outer\";
            {
                var a = \"inner\";
                print a;
            }
            print a;
        ";

        assert_eq!(run_ok(source), "inner\nouter\n");
    }

    #[test]
    fn resolved_references_are_frozen_at_function_definition() {
        // The closure captured the scope where `a` was still the global, so
        // a later shadowing declaration in the block must not change what
        // showA prints.
        let source = "
            var a = \"global\";
            {
                fun showA() { print a; }
                showA();
                var a = \"block\";
                showA();
                print a;
            }
        ";

        assert_eq!(run_ok(source), "global\nglobal\nblock\n");
    }

    #[test]
    fn top_level_functions_may_forward_reference() {
        let source = "
            fun a() { return b(); }
            fun b() { return 3; }
            print a();
        ";

        assert_eq!(run_ok(source), "3\n");
    }

    // ───────────────────────── functions & closures ─────────────────────────

    #[test]
    fn counter_closure_retains_and_mutates_its_frame() {
        let source = "
            fun makeCounter() {
                var i = 0;
                fun inc() { i = i + 1; return i; }
                return inc;
            }
            var c = makeCounter();
            print c();
            print c();
        ";

        assert_eq!(run_ok(source), "1\n2\n");
    }

    #[test]
    fn separate_calls_produce_independent_closures() {
        let source = "
            fun makeCounter() {
                var i = 0;
                fun inc() { i = i + 1; return i; }
                return inc;
            }
            var c1 = makeCounter();
            var c2 = makeCounter();
            print c1();
            print c1();
            print c2();
        ";

        assert_eq!(run_ok(source), "1\n2\n1\n");
    }

    #[test]
    fn closures_from_one_block_share_one_frame() {
        let source = "
            var bump;
            var read;
            {
                var n = 10;
                fun b() { n = n + 1; }
                fun r() { return n; }
                bump = b;
                read = r;
            }
            bump();
            bump();
            print read();
        ";

        // Both closures alias the block's frame after the block has exited.
        assert_eq!(run_ok(source), "12\n");
    }

    #[test]
    fn return_unwinds_through_nested_control_flow() {
        let source = "
            fun find() {
                var i = 0;
                while (true) {
                    if (i >= 3) {
                        { return i; }
                    }
                    i = i + 1;
                }
            }
            print find();
            print \"after\";
        ";

        assert_eq!(run_ok(source), "3\nafter\n");
    }

    #[test]
    fn falling_off_a_body_yields_nil() {
        assert_eq!(run_ok("fun noop() {} print noop();"), "nil\n");
        assert_eq!(run_ok("fun bare() { return; } print bare();"), "nil\n");
    }

    #[test]
    fn recursion() {
        let source = "
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
        ";

        assert_eq!(run_ok(source), "55\n");
    }

    #[test]
    fn wrong_arity_is_a_runtime_error() {
        let message = runtime_message("fun f(a, b) { return a; } f(1);");
        assert!(message.contains("Expected 2 arguments but got 1"));

        let message = runtime_message("fun g() { return 1; } g(1, 2, 3);");
        assert!(message.contains("Expected 0 arguments but got 3"));
    }

    #[test]
    fn calling_a_non_callable_is_a_runtime_error() {
        let message = runtime_message("\"text\"();");

        assert!(message.contains("Can only call functions and classes."));
    }

    #[test]
    fn functions_print_with_their_name() {
        assert_eq!(run_ok("fun greet() {} print greet;"), "<fn greet>\n");
    }

    // ───────────────────────── loops ─────────────────────────

    #[test]
    fn while_loop() {
        assert_eq!(
            run_ok("var i = 0; while (i < 3) { print i; i = i + 1; }"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn for_loop_desugars_and_runs() {
        assert_eq!(
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    // ───────────────────────── classes ─────────────────────────

    #[test]
    fn instances_hold_fields_and_methods_bind_this() {
        let source = "
            class Counter {
                init(start) { this.count = start; }
                bump() {
                    this.count = this.count + 1;
                    return this.count;
                }
            }
            var c = Counter(10);
            print c.bump();
            print c.bump();
            print c.count;
        ";

        assert_eq!(run_ok(source), "11\n12\n12\n");
    }

    #[test]
    fn classes_and_instances_display_by_name() {
        assert_eq!(
            run_ok("class A {} print A; print A();"),
            "A\nA instance\n"
        );
    }

    #[test]
    fn a_detached_method_stays_bound_to_its_instance() {
        let source = "
            class Cell {
                init() { this.v = 1; }
                get() { return this.v; }
            }
            var cell = Cell();
            var m = cell.get;
            cell.v = 42;
            print m();
        ";

        assert_eq!(run_ok(source), "42\n");
    }

    #[test]
    fn init_always_returns_the_instance() {
        let source = "
            class A { init() {} }
            var a = A();
            print a.init() == a;
        ";

        assert_eq!(run_ok(source), "true\n");
    }

    #[test]
    fn constructor_arity_follows_init() {
        let message = runtime_message("class A { init(x) {} } A();");
        assert!(message.contains("Expected 1 arguments but got 0"));

        let message = runtime_message("class B {} B(1);");
        assert!(message.contains("Expected 0 arguments but got 1"));
    }

    #[test]
    fn duplicate_methods_are_last_write_wins() {
        let source = "
            class A {
                m() { return \"first\"; }
                m() { return \"second\"; }
            }
            print A().m();
        ";

        assert_eq!(run_ok(source), "second\n");
    }

    #[test]
    fn unknown_property_is_a_runtime_error() {
        let message = runtime_message("class A {} A().missing;");

        assert!(message.contains("Undefined property 'missing'."));
    }

    #[test]
    fn properties_require_an_instance() {
        let message = runtime_message("var x = 1; print x.y;");
        assert!(message.contains("Only instances have properties."));

        let message = runtime_message("var x = 1; x.y = 2;");
        assert!(message.contains("Only instances have fields."));
    }

    // ───────────────────────── natives ─────────────────────────

    #[test]
    fn clock_is_predefined() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
    }

    #[test]
    fn native_arity_is_enforced() {
        let message = runtime_message("clock(1);");

        assert!(message.contains("Expected 0 arguments but got 1"));
    }

    fn double_native(args: &[Value]) -> Result<Value, String> {
        match args {
            [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
            _ => Err("expected a number".to_string()),
        }
    }

    #[test]
    fn host_registered_natives_are_callable() {
        let mut interpreter = Interpreter::with_capture();
        interpreter.define_native("double", 1, double_native);

        veery::run(b"print double(21);", &mut interpreter).unwrap();

        assert_eq!(interpreter.take_captured(), "42\n");
    }

    #[test]
    fn native_failures_surface_as_runtime_errors() {
        let mut interpreter = Interpreter::with_capture();
        interpreter.define_native("double", 1, double_native);

        let errors = veery::run(b"double(\"nope\");", &mut interpreter).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_runtime());
        assert!(format!("{}", errors[0]).contains("expected a number"));
    }

    // ───────────────────────── pipeline behavior ─────────────────────────

    #[test]
    fn runtime_error_halts_the_remaining_statements() {
        let (output, errors) = run_err("print \"a\"; nil + 1; print \"b\";");

        assert_eq!(output, "a\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_runtime());
    }

    #[test]
    fn static_errors_prevent_any_execution() {
        // Unterminated string: one lex error, nothing runs.
        let (output, errors) = run_err("print \"ok\"; var s = \"abc");

        assert_eq!(output, "");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], VeeryError::Lex { .. }));

        // Resolve error: nothing runs either.
        let (output, errors) = run_err("print \"ok\"; return 1;");

        assert_eq!(output, "");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], VeeryError::Resolve { .. }));
    }

    #[test]
    fn globals_persist_across_runs_but_errors_do_not() {
        let mut interpreter = Interpreter::with_capture();

        // First run fails at runtime; the interpreter stays usable.
        assert!(veery::run(b"print missing;", &mut interpreter).is_err());

        veery::run(b"var x = 1;", &mut interpreter).unwrap();
        veery::run(b"x = x + 1;", &mut interpreter).unwrap();
        veery::run(b"print x;", &mut interpreter).unwrap();

        assert_eq!(interpreter.take_captured(), "2\n");
    }

    #[test]
    fn closures_survive_across_runs() {
        let mut interpreter = Interpreter::with_capture();

        veery::run(
            b"fun makeCounter() { var i = 0; fun inc() { i = i + 1; return i; } return inc; }
              var c = makeCounter();",
            &mut interpreter,
        )
        .unwrap();

        veery::run(b"print c(); print c();", &mut interpreter).unwrap();

        assert_eq!(interpreter.take_captured(), "1\n2\n");
    }
}
