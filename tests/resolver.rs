#[cfg(test)]
mod resolver_tests {
    use veery::error::VeeryError;
    use veery::parser::Parser;
    use veery::resolver::Resolver;
    use veery::scanner::Scanner;

    /// Lex + parse + resolve, returning the resolver verdict.
    fn resolve(source: &str) -> Result<(), Vec<VeeryError>> {
        let tokens = Scanner::new(source.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .expect("source should lex cleanly");

        let statements = Parser::new(&tokens)
            .parse()
            .expect("source should parse cleanly");

        Resolver::new().resolve(&statements)
    }

    fn single_error(source: &str) -> VeeryError {
        let mut errors = resolve(source).unwrap_err();

        assert_eq!(errors.len(), 1, "expected exactly one resolve error");
        errors.remove(0)
    }

    #[test]
    fn reading_a_local_in_its_own_initializer_is_an_error() {
        let error = single_error("var a = 1; { var a = a; }");

        assert!(matches!(error, VeeryError::Resolve { .. }));
        assert!(format!("{error}").contains("its own initializer"));
    }

    #[test]
    fn global_initializer_may_reference_an_outer_global() {
        // At top level there is no local scope, so `var a = a;` is late-bound
        // and only fails (if at all) at runtime.
        assert!(resolve("var a = a;").is_ok());
    }

    #[test]
    fn top_level_return_is_an_error() {
        let error = single_error("return 1;");

        assert!(format!("{error}").contains("'return' used outside of function"));
    }

    #[test]
    fn return_inside_a_function_is_fine() {
        assert!(resolve("fun f() { return 1; }").is_ok());
        assert!(resolve("fun f() { while (true) { if (true) { return; } } }").is_ok());
    }

    #[test]
    fn returning_a_value_from_init_is_an_error() {
        let error = single_error("class A { init() { return 1; } }");

        assert!(format!("{error}").contains("Cannot return a value from an initializer"));
    }

    #[test]
    fn bare_return_inside_init_is_fine() {
        assert!(resolve("class A { init() { return; } }").is_ok());
    }

    #[test]
    fn this_outside_a_class_is_an_error() {
        let error = single_error("print this;");

        assert!(format!("{error}").contains("outside of a class"));
    }

    #[test]
    fn this_inside_a_method_is_fine() {
        assert!(resolve("class A { m() { return this; } }").is_ok());
    }

    #[test]
    fn redeclaration_in_the_same_scope_is_permitted() {
        assert!(resolve("var x = 1; var x = 2;").is_ok());
        assert!(resolve("{ var x = 1; var x = 2; }").is_ok());
        assert!(resolve("fun f(a) { var a = 0; return a; }").is_ok());
    }

    #[test]
    fn parameters_shadow_outer_names() {
        assert!(resolve("var x = 1; fun f(x) { return x; }").is_ok());
    }

    #[test]
    fn errors_accumulate_across_the_pass() {
        let errors = resolve("return 1;\n{ var a = a; }\nprint this;").unwrap_err();

        assert_eq!(errors.len(), 3);

        for error in &errors {
            assert!(matches!(error, VeeryError::Resolve { .. }));
        }
    }
}
