use serde::Serialize;

use crate::tree::{Placement, Pos, TokenKind};

/// One token of an unwrapped line, carrying the exact source text that
/// preceded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatToken {
    pub kind: TokenKind,
    pub text: String,
    pub prefix: String,
    pub pos: Pos,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<Placement>,
    pub blank_lines_before: usize,
}

impl FormatToken {
    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    /// Column just past the token on its first source line.
    pub fn end_column(&self) -> usize {
        let first_line = self.text.split('\n').next().unwrap_or_default();
        self.pos.column + first_line.chars().count()
    }
}

/// A logical line: one statement, clause header or standalone comment,
/// stripped of block nesting and tagged with its depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnwrappedLine {
    pub tokens: Vec<FormatToken>,
    pub depth: usize,
    pub is_header: bool,
    pub is_comment_only: bool,
    pub lineno: usize,
}

impl UnwrappedLine {
    pub fn first(&self) -> Option<&FormatToken> {
        self.tokens.first()
    }

    pub fn last(&self) -> Option<&FormatToken> {
        self.tokens.last()
    }

    pub fn code_tokens(&self) -> impl Iterator<Item = &FormatToken> {
        self.tokens.iter().filter(|token| !token.is_comment())
    }

    pub fn comments(&self) -> impl Iterator<Item = &FormatToken> {
        self.tokens.iter().filter(|token| token.is_comment())
    }

    pub fn last_code_token(&self) -> Option<&FormatToken> {
        self.code_tokens().last()
    }

    pub fn trailing_comment(&self) -> Option<&FormatToken> {
        self.last()
            .filter(|token| token.comment == Some(Placement::Trailing))
    }

    /// Leading keyword of the line, if it starts with a name.
    pub fn first_keyword(&self) -> Option<&str> {
        self.first()
            .filter(|token| token.kind == TokenKind::Name)
            .map(|token| token.text.as_str())
    }

    /// Blank source lines between this line and the previous one.
    pub fn blank_lines_before(&self) -> usize {
        self.first().map_or(0, |token| token.blank_lines_before)
    }

    /// Tokens joined by single spaces. Meant for diagnostics and logs, not
    /// for rendering.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|token| token.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output of the unwrapper: the lines plus the source text that follows the
/// last emitted token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Unwrapped {
    pub lines: Vec<UnwrappedLine>,
    pub tail: String,
}

impl Unwrapped {
    /// Restores the original source from the lines and their prefixes.
    pub fn reconstruct(&self) -> String {
        let mut out = String::new();
        for token in self.lines.iter().flat_map(|line| &line.tokens) {
            out.push_str(&token.prefix);
            out.push_str(&token.text);
        }
        out.push_str(&self.tail);
        out
    }
}
