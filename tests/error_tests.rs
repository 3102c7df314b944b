// tests/error_tests.rs
// Diagnostics for malformed input, malformed trees and bad configuration

use pyline::tree::{Leaf, Pos, Rule, TokenKind, Tree};
use pyline::{
    splice_comments, unwrap_source, unwrap_tree, ConfigError, FormatConfig, ParseError,
    PylineError, SpliceError, UnwrapError,
};

fn parse_error(code: &str) -> ParseError {
    match unwrap_source(code) {
        Err(PylineError::Parse(err)) => err,
        other => panic!("expected a parse error for {code:?}, got {other:?}"),
    }
}

fn leaf(kind: TokenKind, text: &str, prefix: &str, line: usize) -> Leaf {
    Leaf::new(kind, text, prefix, Pos::new(line, 0), Pos::new(line, 0))
}

#[cfg(test)]
mod parse_error_tests {
    use super::*;

    #[test]
    fn test_dangling_clause() {
        assert_eq!(
            parse_error("else:\n    pass\n"),
            ParseError::DanglingClause {
                keyword: "else".to_string(),
                line: 1
            }
        );
    }

    #[test]
    fn test_missing_colon() {
        assert_eq!(
            parse_error("x = 1\nif a\n    pass\n"),
            ParseError::MissingColon {
                keyword: "if".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn test_expected_indent() {
        assert_eq!(
            parse_error("if a:\npass\n"),
            ParseError::ExpectedIndent { line: 1 }
        );
        assert_eq!(parse_error("if a: \n"), ParseError::ExpectedIndent { line: 1 });
    }

    #[test]
    fn test_unexpected_indent() {
        assert_eq!(
            parse_error("  x = 1\n"),
            ParseError::UnexpectedIndent { line: 1 }
        );
        assert_eq!(
            parse_error("x = 1\n    y = 2\n"),
            ParseError::UnexpectedIndent { line: 2 }
        );
    }

    #[test]
    fn test_decorator_without_definition() {
        assert_eq!(
            parse_error("@dec\nx = 1\n"),
            ParseError::DecoratorTarget { line: 1 }
        );
    }

    #[test]
    fn test_empty_statement() {
        assert_eq!(
            parse_error("x = 1;;\n"),
            ParseError::EmptyStatement { line: 1, column: 6 }
        );
    }

    #[test]
    fn test_unclosed_bracket() {
        assert_eq!(
            parse_error("x = [1,\n     2\n"),
            ParseError::UnclosedBracket {
                ch: '[',
                line: 1,
                column: 4
            }
        );
    }

    #[test]
    fn test_error_reports_line() {
        let err = parse_error("a = 1\nb = 'open\n");
        assert_eq!(err.line(), 2);
        assert!(err.to_string().contains("line 2"));
    }
}

#[cfg(test)]
mod malformed_tree_tests {
    use super::*;

    #[test]
    fn test_comment_without_enclosing_statement() {
        let mut tree = Tree::new();
        let root = tree.push_leaf(Leaf::new(
            TokenKind::Name,
            "x",
            "# stray\n",
            Pos::new(2, 0),
            Pos::new(1, 0),
        ));
        tree.set_root(root);

        assert_eq!(
            splice_comments(&tree),
            Err(SpliceError::NoEnclosingStatement { line: 1, column: 0 })
        );
    }

    #[test]
    fn test_suite_at_module_level_is_unsupported() {
        let mut tree = Tree::new();
        let newline = tree.push_leaf(leaf(TokenKind::Newline, "\n", "", 1));
        let indent = tree.push_leaf(leaf(TokenKind::Indent, "", "", 2));
        let name = tree.push_leaf(leaf(TokenKind::Name, "x", "    ", 2));
        let small = tree.push_internal(Rule::SmallStmt, vec![name]);
        let end = tree.push_leaf(leaf(TokenKind::Newline, "\n", "", 2));
        let simple = tree.push_internal(Rule::SimpleStmt, vec![small, end]);
        let dedent = tree.push_leaf(leaf(TokenKind::Dedent, "", "", 3));
        let suite = tree.push_internal(Rule::Suite, vec![newline, indent, simple, dedent]);
        let root = tree.push_internal(Rule::FileInput, vec![suite]);
        tree.set_root(root);

        assert_eq!(
            unwrap_tree(&tree),
            Err(UnwrapError::Unsupported {
                rule: Rule::Suite,
                parent: Rule::FileInput,
                line: 1
            })
        );
    }

    #[test]
    fn test_statement_root_reports_its_line() {
        let mut tree = Tree::new();
        let name = tree.push_leaf(leaf(TokenKind::Name, "pass", "", 5));
        let small = tree.push_internal(Rule::SmallStmt, vec![name]);
        let end = tree.push_leaf(leaf(TokenKind::Newline, "\n", "", 5));
        let root = tree.push_internal(Rule::SimpleStmt, vec![small, end]);
        tree.set_root(root);

        assert_eq!(
            unwrap_tree(&tree),
            Err(UnwrapError::Malformed {
                what: "root is not a file input",
                line: 5
            })
        );
    }

    #[test]
    fn test_code_outside_a_line_is_malformed() {
        let mut tree = Tree::new();
        let name = tree.push_leaf(leaf(TokenKind::Name, "x", "", 4));
        let root = tree.push_internal(Rule::FileInput, vec![name]);
        tree.set_root(root);

        assert_eq!(
            unwrap_tree(&tree),
            Err(UnwrapError::Malformed {
                what: "code token outside any logical line",
                line: 4
            })
        );
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FormatConfig::default();
        assert_eq!(config.column_limit, None);
        assert_eq!(config.indent_width, 4);
        assert!(config.join_multiple_lines);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = FormatConfig::from_json(r#"{"column_limit": 100}"#).expect("valid config");
        assert_eq!(config.column_limit, Some(100));
        assert_eq!(config.indent_width, 4);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = FormatConfig::from_json(r#"{"colum_limit": 100}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_zero_column_limit_rejected() {
        let err = FormatConfig::from_json(r#"{"column_limit": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "column_limit",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_values_rejected() {
        let err = FormatConfig::from_json(r#"{"indent_width": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "indent_width",
                ..
            }
        ));
    }
}
