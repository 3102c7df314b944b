use crate::error::ParseError;
use crate::tree::{Leaf, NodeId, Rule, TokenKind, Tree};

/// Clause keywords that continue a compound statement after its first body.
fn continues(rule: Rule, keyword: &str) -> bool {
    match rule {
        Rule::IfStmt => matches!(keyword, "elif" | "else"),
        Rule::WhileStmt | Rule::ForStmt => keyword == "else",
        Rule::TryStmt => matches!(keyword, "except" | "else" | "finally"),
        _ => false,
    }
}

fn is_continuation_keyword(word: &str) -> bool {
    matches!(word, "elif" | "else" | "except" | "finally")
}

/// Builds a statement-level syntax tree from tokenized leaves.
///
/// Expressions are not parsed; each statement keeps its tokens as a flat run
/// of leaves under a `SmallStmt` node or a compound statement header.
pub struct TreeBuilder {
    leaves: Vec<Leaf>,
    next: usize,
    tree: Tree,
}

impl TreeBuilder {
    pub fn new(leaves: Vec<Leaf>) -> Self {
        Self {
            leaves,
            next: 0,
            tree: Tree::new(),
        }
    }

    pub fn build(mut self) -> Result<Tree, ParseError> {
        let mut children = Vec::new();
        loop {
            match self.peek_kind() {
                None => break,
                Some(TokenKind::EndMarker) => {
                    children.push(self.take());
                    break;
                }
                Some(TokenKind::Indent) => {
                    return Err(ParseError::UnexpectedIndent {
                        line: self.peek_line(),
                    })
                }
                Some(TokenKind::Dedent) => children.push(self.take()),
                Some(_) => children.push(self.statement()?),
            }
        }
        let root = self.tree.push_internal(Rule::FileInput, children);
        self.tree.set_root(root);
        Ok(self.tree)
    }

    fn peek(&self) -> Option<&Leaf> {
        self.leaves.get(self.next)
    }

    fn peek_at(&self, offset: usize) -> Option<&Leaf> {
        self.leaves.get(self.next + offset)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|leaf| leaf.kind)
    }

    fn peek_line(&self) -> usize {
        self.peek()
            .or_else(|| self.leaves.last())
            .map_or(1, |leaf| leaf.pos.line)
    }

    fn take(&mut self) -> NodeId {
        let leaf = self
            .leaves
            .get_mut(self.next)
            .map(std::mem::take)
            .unwrap_or_default();
        self.next += 1;
        self.tree.push_leaf(leaf)
    }

    fn statement(&mut self) -> Result<NodeId, ParseError> {
        let Some(first) = self.peek() else {
            return Err(ParseError::MissingBody {
                line: self.peek_line(),
            });
        };
        if first.kind == TokenKind::Indent {
            return Err(ParseError::UnexpectedIndent {
                line: first.pos.line,
            });
        }
        if first.is_op("@") {
            return self.decorated();
        }
        if first.kind == TokenKind::Name && is_continuation_keyword(&first.text) {
            return Err(ParseError::DanglingClause {
                keyword: first.text.clone(),
                line: first.pos.line,
            });
        }
        match self.compound_rule() {
            Some(rule) => self.compound(rule),
            None => self.simple_statement(),
        }
    }

    /// Decides whether the upcoming line opens a compound statement.
    fn compound_rule(&self) -> Option<Rule> {
        let first = self.peek()?;
        if first.kind != TokenKind::Name {
            return None;
        }
        let keyword = if first.text == "async" {
            self.peek_at(1).map(|leaf| leaf.text.as_str())?
        } else {
            first.text.as_str()
        };
        match keyword {
            "if" => Some(Rule::IfStmt),
            "while" => Some(Rule::WhileStmt),
            "for" => Some(Rule::ForStmt),
            "try" => Some(Rule::TryStmt),
            "with" => Some(Rule::WithStmt),
            "def" => Some(Rule::FuncDef),
            "class" => Some(Rule::ClassDef),
            "match" if self.opens_block() => Some(Rule::MatchStmt),
            "case" if self.opens_block() => Some(Rule::CaseBlock),
            _ => None,
        }
    }

    /// Soft keywords only start a statement when the line ends in `:` and an
    /// indented block follows.
    fn opens_block(&self) -> bool {
        let mut offset = 0;
        while let Some(leaf) = self.peek_at(offset) {
            if leaf.kind == TokenKind::Newline {
                let ends_with_colon = offset > 0
                    && self.peek_at(offset - 1).is_some_and(|prev| prev.is_op(":"));
                let indented = self
                    .peek_at(offset + 1)
                    .is_some_and(|next| next.kind == TokenKind::Indent);
                return ends_with_colon && indented;
            }
            offset += 1;
        }
        false
    }

    fn compound(&mut self, rule: Rule) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        self.clause(&mut children)?;
        while let Some(leaf) = self.peek() {
            if leaf.kind == TokenKind::Name && continues(rule, &leaf.text) {
                self.clause(&mut children)?;
            } else {
                break;
            }
        }
        Ok(self.tree.push_internal(rule, children))
    }

    /// One clause: header tokens through the block-opening colon, then a body.
    fn clause(&mut self, children: &mut Vec<NodeId>) -> Result<(), ParseError> {
        let (keyword, line) = match self.peek() {
            Some(leaf) => (leaf.text.clone(), leaf.pos.line),
            None => return Ok(()),
        };
        let mut depth = 0usize;
        let mut lambdas = 0usize;
        loop {
            let Some(leaf) = self.peek() else {
                return Err(ParseError::MissingColon { keyword, line });
            };
            match leaf.kind {
                TokenKind::Newline | TokenKind::EndMarker => {
                    return Err(ParseError::MissingColon { keyword, line });
                }
                TokenKind::Op if matches!(leaf.text.as_str(), "(" | "[" | "{") => depth += 1,
                TokenKind::Op if matches!(leaf.text.as_str(), ")" | "]" | "}") => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Name if depth == 0 && leaf.text == "lambda" => lambdas += 1,
                TokenKind::Op if depth == 0 && leaf.text == ":" => {
                    if lambdas == 0 {
                        children.push(self.take());
                        break;
                    }
                    lambdas -= 1;
                }
                _ => {}
            }
            children.push(self.take());
        }

        match self.peek_kind() {
            Some(TokenKind::Newline) => children.push(self.suite()?),
            Some(TokenKind::EndMarker) | None => return Err(ParseError::MissingBody { line }),
            Some(_) => children.push(self.simple_statement()?),
        }
        Ok(())
    }

    fn suite(&mut self) -> Result<NodeId, ParseError> {
        let line = self.peek_line();
        let mut children = vec![self.take()];
        if self.peek_kind() != Some(TokenKind::Indent) {
            return Err(ParseError::ExpectedIndent { line });
        }
        children.push(self.take());
        loop {
            match self.peek_kind() {
                Some(TokenKind::Dedent) => {
                    children.push(self.take());
                    break;
                }
                Some(TokenKind::EndMarker) | None => break,
                Some(_) => children.push(self.statement()?),
            }
        }
        Ok(self.tree.push_internal(Rule::Suite, children))
    }

    /// Statements joined by `;` up to and including the closing NEWLINE.
    fn simple_statement(&mut self) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        loop {
            let small = self.small_statement()?;
            children.push(small);
            match self.peek() {
                Some(leaf) if leaf.is_op(";") => {
                    children.push(self.take());
                    if self.peek_kind() == Some(TokenKind::Newline) {
                        children.push(self.take());
                        break;
                    }
                }
                Some(leaf) if leaf.kind == TokenKind::Newline => {
                    children.push(self.take());
                    break;
                }
                _ => break,
            }
        }
        Ok(self.tree.push_internal(Rule::SimpleStmt, children))
    }

    fn small_statement(&mut self) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        let mut depth = 0usize;
        while let Some(leaf) = self.peek() {
            if leaf.kind.is_structural() || (depth == 0 && leaf.is_op(";")) {
                break;
            }
            if leaf.kind == TokenKind::Op {
                match leaf.text.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            children.push(self.take());
        }
        if children.is_empty() {
            let (line, column) = self
                .peek()
                .map_or((self.peek_line(), 0), |leaf| (leaf.pos.line, leaf.pos.column));
            return Err(ParseError::EmptyStatement { line, column });
        }
        Ok(self.tree.push_internal(Rule::SmallStmt, children))
    }

    fn decorated(&mut self) -> Result<NodeId, ParseError> {
        let line = self.peek_line();
        let mut children = Vec::new();
        while self.peek().is_some_and(|leaf| leaf.is_op("@")) {
            let mut decorator = Vec::new();
            while let Some(kind) = self.peek_kind() {
                if kind == TokenKind::EndMarker {
                    break;
                }
                decorator.push(self.take());
                if kind == TokenKind::Newline {
                    break;
                }
            }
            children.push(self.tree.push_internal(Rule::Decorator, decorator));
        }
        match self.compound_rule() {
            Some(rule @ (Rule::FuncDef | Rule::ClassDef)) => children.push(self.compound(rule)?),
            _ => return Err(ParseError::DecoratorTarget { line }),
        }
        Ok(self.tree.push_internal(Rule::Decorated, children))
    }
}
