#[cfg(test)]
mod parser_tests {
    use veery::ast_printer::AstPrinter;
    use veery::error::VeeryError;
    use veery::parser::{Parser, Stmt};
    use veery::scanner::Scanner;
    use veery::token::Token;

    fn tokens(source: &str) -> Vec<Token> {
        Scanner::new(source.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .expect("source should lex cleanly")
    }

    /// Parse a single expression and render it in prefix form.
    fn prefix(source: &str) -> String {
        let tokens = tokens(source);
        let expr = Parser::new(&tokens)
            .parse_expression()
            .expect("expression should parse");

        AstPrinter::print(&expr)
    }

    fn parse_program(source: &str) -> Result<Vec<Stmt>, Vec<VeeryError>> {
        let tokens = tokens(source);
        Parser::new(&tokens).parse()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(prefix("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    }

    #[test]
    fn comparison_binds_tighter_than_equality() {
        assert_eq!(prefix("1 < 2 == true"), "(== (< 1.0 2.0) true)");
    }

    #[test]
    fn unary_operators_nest() {
        assert_eq!(prefix("!!true"), "(! (! true))");
        assert_eq!(prefix("-1 - -2"), "(- (- 1.0) (- 2.0))");
    }

    #[test]
    fn grouping_overrides_precedence() {
        assert_eq!(prefix("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(prefix("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(prefix("a = b = 1"), "(= a (= b 1.0))");
    }

    #[test]
    fn calls_and_property_access_chain_left_to_right() {
        assert_eq!(
            prefix("obj.method(1)(2)"),
            "(call (call (get obj method) 1.0) 2.0)"
        );
    }

    #[test]
    fn property_assignment_parses_as_set() {
        assert_eq!(prefix("obj.field = 1"), "(set obj field 1.0)");
    }

    #[test]
    fn trailing_tokens_after_expression_are_an_error() {
        let tokens = tokens("1 + 2 3");
        let err = Parser::new(&tokens).parse_expression().unwrap_err();

        assert!(format!("{err}").contains("Expected end of expression"));
    }

    #[test]
    fn statement_shapes() {
        let statements = parse_program("print 1; var x; { x = 2; } if (x) x = 3; else x = 4;")
            .expect("program should parse");

        assert_eq!(statements.len(), 4);
        assert!(matches!(statements[0], Stmt::Print(_)));
        assert!(matches!(statements[1], Stmt::Var { .. }));
        assert!(matches!(statements[2], Stmt::Block(_)));
        assert!(matches!(statements[3], Stmt::If { .. }));
    }

    #[test]
    fn function_declaration_captures_params_and_body() {
        let statements = parse_program("fun add(a, b) { return a + b; }").unwrap();

        assert_eq!(statements.len(), 1);

        let Stmt::Function(decl) = &statements[0] else {
            panic!("expected a function declaration");
        };

        assert_eq!(decl.name.lexeme, "add");
        assert_eq!(decl.params.len(), 2);
        assert_eq!(decl.body.len(), 1);
        assert!(matches!(decl.body[0], Stmt::Return { .. }));
    }

    #[test]
    fn class_declaration_collects_methods() {
        let statements = parse_program("class Point { x() { return 1; } y() { return 2; } }")
            .unwrap();

        let Stmt::Class { name, methods } = &statements[0] else {
            panic!("expected a class declaration");
        };

        assert_eq!(name.lexeme, "Point");
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name.lexeme, "x");
        assert_eq!(methods[1].name.lexeme, "y");
    }

    #[test]
    fn for_desugars_to_block_wrapping_while() {
        let statements = parse_program("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();

        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected the initializer block");
        };

        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected the desugared while loop");
        };

        // Body block is the original statement followed by the increment.
        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected the body/increment block");
        };

        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(_)));
    }

    #[test]
    fn for_without_clauses_desugars_to_bare_while() {
        let statements = parse_program("for (;;) print 1;").unwrap();

        assert!(matches!(statements[0], Stmt::While { .. }));
    }

    #[test]
    fn invalid_assignment_target_is_an_error() {
        let errors = parse_program("1 = 2;").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(format!("{}", errors[0]).contains("Invalid assignment target"));
    }

    #[test]
    fn panic_mode_reports_one_error_per_mistake() {
        let errors = parse_program("var 1 = 2;\nprint \"ok\";\nif;").unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(format!("{}", errors[0]).contains("Expected variable name"));
        assert!(matches!(errors[0], VeeryError::Parse { line: 1, .. }));
        assert!(matches!(errors[1], VeeryError::Parse { line: 3, .. }));
    }

    #[test]
    fn missing_semicolon_is_reported_with_line() {
        let errors = parse_program("print 1").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(format!("{}", errors[0]).contains("Expected ';' after value"));
    }
}
