#[cfg(test)]
mod scanner_tests {
    use rox as lox;

    use lox::scanner::*;
    use lox::token::*;

    fn scan(source: &str) -> Vec<Result<Token, lox::error::LoxError>> {
        Scanner::new(source.as_bytes().to_vec()).collect()
    }

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes().to_vec());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
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
    fn test_scanner_02_keywords_and_identifiers() {
        assert_token_sequence(
            "class Foo < Bar { init() {} }",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Foo"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "Bar"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::IDENTIFIER, "init"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_integer_literal() {
        let tokens: Vec<Token> = Scanner::new(b"42;".to_vec())
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token_type, TokenType::NUMBER(Number::Int(0)));

        match tokens[0].token_type {
            TokenType::NUMBER(Number::Int(n)) => assert_eq!(n, 42),
            ref other => panic!("expected integer literal, got {:?}", other),
        }
    }

    #[test]
    fn test_float_literal() {
        let tokens: Vec<Token> = Scanner::new(b"3.5;".to_vec())
            .filter_map(Result::ok)
            .collect();

        match tokens[0].token_type {
            TokenType::NUMBER(Number::Float(n)) => assert_eq!(n, 3.5),
            ref other => panic!("expected float literal, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_integer_falls_back_to_float() {
        let tokens: Vec<Token> = Scanner::new(b"2147483648;".to_vec())
            .filter_map(Result::ok)
            .collect();

        match tokens[0].token_type {
            TokenType::NUMBER(Number::Float(n)) => assert_eq!(n, 2147483648.0),
            ref other => panic!("expected float literal, got {:?}", other),
        }
    }

    #[test]
    fn test_int_min_is_a_single_token() {
        let tokens: Vec<Token> = Scanner::new(b"print -2147483648;".to_vec())
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token_type, TokenType::PRINT);
        assert_eq!(tokens[1].lexeme, "-2147483648");

        match tokens[1].token_type {
            TokenType::NUMBER(Number::Int(n)) => assert_eq!(n, i32::MIN),
            ref other => panic!("expected integer literal, got {:?}", other),
        }
    }

    #[test]
    fn test_minus_after_operand_stays_binary() {
        assert_token_sequence(
            "3-2",
            &[
                (TokenType::NUMBER(Number::Int(0)), "3"),
                (TokenType::MINUS, "-"),
                (TokenType::NUMBER(Number::Int(0)), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_minus_after_paren_stays_binary() {
        assert_token_sequence(
            "(a)-1",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::IDENTIFIER, "a"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::MINUS, "-"),
                (TokenType::NUMBER(Number::Int(0)), "1"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_string_literal_and_line_count() {
        let tokens: Vec<Token> = Scanner::new(b"\"hi\nthere\"".to_vec())
            .filter_map(Result::ok)
            .collect();

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hi\nthere"),
            other => panic!("expected string literal, got {:?}", other),
        }

        // EOF carries the line the newline inside the string advanced to.
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let results = scan("\"oops");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Unterminated string."));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let results = scan(",.$(#");

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            let message = err.to_string();
            assert!(
                message.contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                message
            );
        }
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_token_sequence(
            "// nothing here\nvar x = 1; // trailing\n",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::NUMBER(Number::Int(0)), "1"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }
}
