use serde::Serialize;
use std::fmt;

/// Index of a node inside a [`super::Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// Source position: 1-based line, 0-based column counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    #[default]
    Name,
    Number,
    String,
    Op,
    Newline,
    Indent,
    Dedent,
    EndMarker,
    Comment,
}

impl TokenKind {
    /// Tokens that shape the tree but never appear in an unwrapped line.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::EndMarker
        )
    }
}

/// A token together with the whitespace and comments that precede it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Leaf {
    pub kind: TokenKind,
    pub text: String,
    pub prefix: String,
    pub pos: Pos,
    pub prefix_pos: Pos,
}

impl Leaf {
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        prefix: impl Into<String>,
        pos: Pos,
        prefix_pos: Pos,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            prefix: prefix.into(),
            pos,
            prefix_pos,
        }
    }

    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokenKind::Name && self.text == name
    }
}

/// Grammar rule tag of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    FileInput,
    SimpleStmt,
    SmallStmt,
    Suite,
    Decorated,
    Decorator,
    IfStmt,
    WhileStmt,
    ForStmt,
    TryStmt,
    WithStmt,
    FuncDef,
    ClassDef,
    MatchStmt,
    CaseBlock,
}

impl Rule {
    /// Statements made of clause headers followed by bodies.
    pub fn is_compound(self) -> bool {
        matches!(
            self,
            Rule::IfStmt
                | Rule::WhileStmt
                | Rule::ForStmt
                | Rule::TryStmt
                | Rule::WithStmt
                | Rule::FuncDef
                | Rule::ClassDef
                | Rule::MatchStmt
                | Rule::CaseBlock
        )
    }

    /// Nodes whose children are whole statements.
    pub fn holds_statements(self) -> bool {
        matches!(self, Rule::FileInput | Rule::Suite | Rule::Decorated)
    }

    pub fn name(self) -> &'static str {
        match self {
            Rule::FileInput => "file-input",
            Rule::SimpleStmt => "simple-statement",
            Rule::SmallStmt => "small-statement",
            Rule::Suite => "suite",
            Rule::Decorated => "decorated",
            Rule::Decorator => "decorator",
            Rule::IfStmt => "if-statement",
            Rule::WhileStmt => "while-statement",
            Rule::ForStmt => "for-statement",
            Rule::TryStmt => "try-statement",
            Rule::WithStmt => "with-statement",
            Rule::FuncDef => "function-definition",
            Rule::ClassDef => "class-definition",
            Rule::MatchStmt => "match-statement",
            Rule::CaseBlock => "case-block",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Internal {
    pub rule: Rule,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Owns its source line.
    Standalone,
    /// Follows code on the same source line.
    Trailing,
}

/// A comment lifted out of a leaf prefix by the splicer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub prefix: String,
    pub pos: Pos,
    pub placement: Placement,
    pub blank_lines_before: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Leaf),
    Internal(Internal),
    Comment(Comment),
}

impl Node {
    pub fn rule(&self) -> Option<Rule> {
        match self {
            Node::Internal(internal) => Some(internal.rule),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }
}

/// Counts the blank source lines contained in a run of prefix text.
///
/// When the text does not begin at the start of a line, its first line break
/// only terminates the preceding code or comment and is not counted.
pub fn count_blank_lines(text: &str, at_line_start: bool) -> usize {
    let mut breaks = 0usize;
    let mut escaped = false;
    let mut in_comment = false;
    for ch in text.chars() {
        match ch {
            '\n' if escaped => escaped = false,
            '\n' => {
                breaks += 1;
                in_comment = false;
            }
            '\r' => {}
            '#' => in_comment = true,
            '\\' if !in_comment => escaped = true,
            _ => escaped = false,
        }
    }
    if at_line_start {
        breaks
    } else {
        breaks.saturating_sub(1)
    }
}
