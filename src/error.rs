//! Error types for each pipeline stage.
//!
//! Inputs are expected to come from a validated parser, so apart from
//! [`ParseError`] every variant here signals a malformed tree or a construct
//! the unwrapper does not handle. None of them are recoverable.

use miette::Diagnostic;
use thiserror::Error;

use crate::tree::Rule;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ParseError {
    #[error("unexpected character '{ch}' at line {line}, column {column}")]
    #[diagnostic(code(pyline::parse::unexpected_character))]
    UnexpectedCharacter { ch: char, line: usize, column: usize },

    #[error("unterminated string literal starting at line {line}, column {column}")]
    #[diagnostic(code(pyline::parse::unterminated_string))]
    UnterminatedString { line: usize, column: usize },

    #[error("closing '{ch}' at line {line}, column {column} does not match any open bracket")]
    #[diagnostic(code(pyline::parse::unmatched_bracket))]
    UnmatchedBracket { ch: char, line: usize, column: usize },

    #[error("'{ch}' opened at line {line}, column {column} is never closed")]
    #[diagnostic(code(pyline::parse::unclosed_bracket))]
    UnclosedBracket { ch: char, line: usize, column: usize },

    #[error("unindent at line {line} does not match any outer indentation level")]
    #[diagnostic(code(pyline::parse::inconsistent_dedent))]
    InconsistentDedent { line: usize },

    #[error("unexpected indent at line {line}")]
    #[diagnostic(code(pyline::parse::unexpected_indent))]
    UnexpectedIndent { line: usize },

    #[error("expected an indented block after line {line}")]
    #[diagnostic(code(pyline::parse::expected_indent))]
    ExpectedIndent { line: usize },

    #[error("'{keyword}' clause at line {line} is missing its ':'")]
    #[diagnostic(code(pyline::parse::missing_colon))]
    MissingColon { keyword: String, line: usize },

    #[error("clause header at line {line} has no body")]
    #[diagnostic(code(pyline::parse::missing_body))]
    MissingBody { line: usize },

    #[error("'{keyword}' at line {line} does not continue any open statement")]
    #[diagnostic(code(pyline::parse::dangling_clause))]
    DanglingClause { keyword: String, line: usize },

    #[error("empty statement at line {line}, column {column}")]
    #[diagnostic(code(pyline::parse::empty_statement))]
    EmptyStatement { line: usize, column: usize },

    #[error("decorator at line {line} must be followed by a function or class definition")]
    #[diagnostic(code(pyline::parse::decorator_target))]
    DecoratorTarget { line: usize },
}

impl ParseError {
    /// Source line the error points at.
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedCharacter { line, .. }
            | ParseError::UnterminatedString { line, .. }
            | ParseError::UnmatchedBracket { line, .. }
            | ParseError::UnclosedBracket { line, .. }
            | ParseError::InconsistentDedent { line }
            | ParseError::UnexpectedIndent { line }
            | ParseError::ExpectedIndent { line }
            | ParseError::MissingColon { line, .. }
            | ParseError::MissingBody { line }
            | ParseError::DanglingClause { line, .. }
            | ParseError::EmptyStatement { line, .. }
            | ParseError::DecoratorTarget { line } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SpliceError {
    #[error("comment at line {line}, column {column} has no enclosing statement")]
    #[diagnostic(
        code(pyline::splice::no_enclosing_statement),
        help("the syntax tree is malformed; this is a bug in the parser")
    )]
    NoEnclosingStatement { line: usize, column: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum UnwrapError {
    #[error("unwrapping is not implemented for a {rule} inside a {parent} (line {line})")]
    #[diagnostic(code(pyline::unwrap::unsupported))]
    Unsupported { rule: Rule, parent: Rule, line: usize },

    #[error("malformed tree at line {line}: {what}")]
    #[diagnostic(
        code(pyline::unwrap::malformed),
        help("the syntax tree is malformed; this is a bug in the parser or the comment splicer")
    )]
    Malformed { what: &'static str, line: usize },
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid configuration JSON")]
    #[diagnostic(code(pyline::config::json))]
    Json(#[from] serde_json::Error),

    #[error("invalid value for '{field}': {reason}")]
    #[diagnostic(code(pyline::config::invalid))]
    Invalid { field: &'static str, reason: String },
}

/// Any failure of the parse → splice → unwrap pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum PylineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Splice(#[from] SpliceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Unwrap(#[from] UnwrapError),
}
