#[cfg(test)]
mod scanner_tests {
    use veery::error::VeeryError;
    use veery::scanner::Scanner;
    use veery::token::{Token, TokenType};

    fn scan(source: &str) -> Vec<Result<Token, VeeryError>> {
        Scanner::new(source.as_bytes()).collect()
    }

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len(), "token count for {source:?}");

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn punctuators() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn operators_greedy_longest_match() {
        assert_token_sequence(
            "! != = == < <= > >= / //ignored",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_token_sequence(
            "var foo while fun return nil furniture _bar",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "foo"),
                (TokenType::WHILE, "while"),
                (TokenType::FUN, "fun"),
                (TokenType::RETURN, "return"),
                (TokenType::NIL, "nil"),
                (TokenType::IDENTIFIER, "furniture"),
                (TokenType::IDENTIFIER, "_bar"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn number_literals() {
        let results = scan("123 3.14 1.");
        let tokens: Vec<Token> = results.into_iter().map(Result::unwrap).collect();

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 123.0));
        assert!(matches!(tokens[1].token_type, TokenType::NUMBER(n) if n == 3.14));

        // A trailing '.' is not part of the number.
        assert!(matches!(tokens[2].token_type, TokenType::NUMBER(n) if n == 1.0));
        assert_eq!(tokens[3].token_type, TokenType::DOT);
        assert_eq!(tokens[4].token_type, TokenType::EOF);
    }

    #[test]
    fn string_literal_keeps_quotes_in_lexeme_but_not_payload() {
        let results = scan("\"hello\"");
        let tokens: Vec<Token> = results.into_iter().map(Result::unwrap).collect();

        assert_eq!(tokens[0].lexeme, "\"hello\"");
        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "hello"));
    }

    #[test]
    fn multiline_string_advances_line_counter() {
        let results = scan("\"a\nb\"\nvar");
        let tokens: Vec<Token> = results.into_iter().map(Result::unwrap).collect();

        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "a\nb"));
        assert_eq!(tokens[0].line, 2);

        assert_eq!(tokens[1].token_type, TokenType::VAR);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn comments_and_whitespace_produce_no_tokens() {
        assert_token_sequence(
            "// a comment\n\t 42 // trailing\n",
            &[(TokenType::NUMBER(0.0), "42"), (TokenType::EOF, "")],
        );
    }

    #[test]
    fn unexpected_characters_are_errors_but_scanning_continues() {
        let results = scan(",.$(#");

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF.
        assert_eq!(results.len(), 6);

        let errors: Vec<&VeeryError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 2);

        for error in &errors {
            assert!(matches!(error, VeeryError::Lex { .. }));
            assert!(format!("{error}").contains("Unexpected character"));
        }

        let tokens: Vec<&Token> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(tokens[0].token_type, TokenType::COMMA);
        assert_eq!(tokens[1].token_type, TokenType::DOT);
        assert_eq!(tokens[2].token_type, TokenType::LEFT_PAREN);
        assert_eq!(tokens[3].token_type, TokenType::EOF);
    }

    #[test]
    fn unterminated_string_reports_exactly_one_error() {
        let results = scan("var s = \"abc");

        let errors: Vec<&VeeryError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert!(format!("{}", errors[0]).contains("Unterminated string."));

        // The EOF token is still emitted after the error.
        assert!(matches!(
            results.last().unwrap().as_ref().unwrap().token_type,
            TokenType::EOF
        ));
    }

    #[test]
    fn error_messages_carry_line_numbers() {
        let results = scan("1;\n@");

        let error = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .next()
            .expect("expected a lex error");

        assert!(matches!(error, VeeryError::Lex { line: 2, .. }));
        assert_eq!(format!("{error}"), "[line 2] Error: Unexpected character: @");
    }

    #[test]
    fn eof_carries_final_line() {
        let results = scan("1\n2\n3\n");
        let last = results.last().unwrap().as_ref().unwrap();

        assert_eq!(last.token_type, TokenType::EOF);
        assert_eq!(last.line, 4);
    }
}
