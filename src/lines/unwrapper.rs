use tracing::{debug, trace};

use super::types::{FormatToken, Unwrapped, UnwrappedLine};
use crate::error::UnwrapError;
use crate::tree::{
    count_blank_lines, Comment, Internal, Leaf, Node, NodeId, Placement, Rule, TokenKind, Tree,
};

/// Pending step of the depth-first walk.
#[derive(Debug, Clone, Copy)]
enum Work {
    Visit(NodeId, usize),
    /// Start a new logical line; `header` marks a clause header.
    Open { depth: usize, header: bool },
}

struct Unwrapper<'t> {
    tree: &'t Tree,
    lines: Vec<UnwrappedLine>,
    current: Option<UnwrappedLine>,
    /// Source text of dropped tokens, owed to the next emitted token.
    pending: String,
    emitted: bool,
}

/// Flattens a comment-spliced tree into depth-annotated logical lines, in
/// document order.
///
/// Walks with an explicit work stack, so nesting depth is bounded only by
/// memory.
pub fn unwrap_tree(tree: &Tree) -> Result<Unwrapped, UnwrapError> {
    let Some(root) = tree.root() else {
        return Ok(Unwrapped::default());
    };

    let mut unwrapper = Unwrapper::new(tree);
    if tree.rule(root) != Some(Rule::FileInput) {
        return Err(UnwrapError::Malformed {
            what: "root is not a file input",
            line: unwrapper.line_of(root),
        });
    }
    let mut stack = vec![Work::Visit(root, 0)];
    while let Some(work) = stack.pop() {
        match work {
            Work::Open { depth, header } => unwrapper.open(depth, header),
            Work::Visit(id, depth) => match tree.node(id) {
                Node::Leaf(leaf) => unwrapper.leaf(leaf)?,
                Node::Comment(comment) => unwrapper.comment(comment, depth)?,
                Node::Internal(internal) => {
                    let steps = unwrapper.expand(internal, depth)?;
                    stack.extend(steps.into_iter().rev());
                }
            },
        }
    }

    let unwrapped = unwrapper.finish();
    debug!(lines = unwrapped.lines.len(), "unwrapped tree");
    Ok(unwrapped)
}

impl<'t> Unwrapper<'t> {
    fn new(tree: &'t Tree) -> Self {
        Self {
            tree,
            lines: Vec::new(),
            current: None,
            pending: String::new(),
            emitted: false,
        }
    }

    /// Child steps of an internal node, in document order.
    fn expand(&self, internal: &Internal, depth: usize) -> Result<Vec<Work>, UnwrapError> {
        let mut steps = Vec::with_capacity(internal.children.len() + 1);
        match internal.rule {
            Rule::FileInput | Rule::Suite | Rule::Decorated => {
                for &child in &internal.children {
                    match self.tree.rule(child) {
                        Some(rule) if is_statement(rule, internal.rule) => {}
                        Some(rule) => return Err(self.unsupported(child, rule, internal.rule)),
                        None => {}
                    }
                    steps.push(Work::Visit(child, depth));
                }
            }
            Rule::SimpleStmt => {
                for &child in &internal.children {
                    match self.tree.rule(child) {
                        Some(Rule::SmallStmt) => steps.push(Work::Open {
                            depth,
                            header: false,
                        }),
                        Some(rule) => return Err(self.unsupported(child, rule, internal.rule)),
                        None => {}
                    }
                    steps.push(Work::Visit(child, depth));
                }
            }
            Rule::SmallStmt | Rule::Decorator => {
                if internal.rule == Rule::Decorator {
                    steps.push(Work::Open {
                        depth,
                        header: false,
                    });
                }
                for &child in &internal.children {
                    if let Some(rule) = self.tree.rule(child) {
                        return Err(self.unsupported(child, rule, internal.rule));
                    }
                    steps.push(Work::Visit(child, depth));
                }
            }
            rule @ (Rule::IfStmt
            | Rule::WhileStmt
            | Rule::ForStmt
            | Rule::TryStmt
            | Rule::WithStmt
            | Rule::FuncDef
            | Rule::ClassDef
            | Rule::MatchStmt
            | Rule::CaseBlock) => {
                let mut clause_start = true;
                for &child in &internal.children {
                    match self.tree.node(child) {
                        Node::Leaf(_) => {
                            if clause_start {
                                steps.push(Work::Open {
                                    depth,
                                    header: true,
                                });
                                clause_start = false;
                            }
                            steps.push(Work::Visit(child, depth));
                        }
                        Node::Comment(_) => steps.push(Work::Visit(child, depth)),
                        Node::Internal(body)
                            if matches!(body.rule, Rule::Suite | Rule::SimpleStmt) =>
                        {
                            steps.push(Work::Visit(child, depth + 1));
                            clause_start = true;
                        }
                        Node::Internal(body) => {
                            return Err(self.unsupported(child, body.rule, rule))
                        }
                    }
                }
            }
        }
        Ok(steps)
    }

    fn unsupported(&self, node: NodeId, rule: Rule, parent: Rule) -> UnwrapError {
        UnwrapError::Unsupported {
            rule,
            parent,
            line: self.line_of(node),
        }
    }

    /// Source line of the first token under `node`.
    fn line_of(&self, node: NodeId) -> usize {
        self.tree
            .first_leaf(node)
            .and_then(|leaf| self.tree.leaf(leaf))
            .map_or(0, |leaf| leaf.pos.line)
    }

    fn open(&mut self, depth: usize, header: bool) {
        self.close();
        self.current = Some(UnwrappedLine {
            tokens: Vec::new(),
            depth,
            is_header: header,
            is_comment_only: false,
            lineno: 0,
        });
    }

    fn close(&mut self) {
        let Some(mut line) = self.current.take() else {
            return;
        };
        let Some(first) = line.tokens.first() else {
            return;
        };
        line.lineno = first.pos.line;
        line.is_comment_only = line.tokens.iter().all(FormatToken::is_comment);
        trace!(
            depth = line.depth,
            header = line.is_header,
            lineno = line.lineno,
            text = %line.text(),
            "line"
        );
        self.lines.push(line);
    }

    fn leaf(&mut self, leaf: &Leaf) -> Result<(), UnwrapError> {
        match leaf.kind {
            TokenKind::Newline => {
                self.owe(leaf);
                self.close();
            }
            TokenKind::Indent | TokenKind::Dedent | TokenKind::EndMarker => self.owe(leaf),
            kind => {
                let prefix = self.take_prefix(&leaf.prefix);
                let token = FormatToken {
                    kind,
                    text: leaf.text.clone(),
                    blank_lines_before: self.blank_lines(&prefix),
                    prefix,
                    pos: leaf.pos,
                    comment: None,
                };
                let Some(line) = self.current.as_mut() else {
                    return Err(UnwrapError::Malformed {
                        what: "code token outside any logical line",
                        line: leaf.pos.line,
                    });
                };
                line.tokens.push(token);
            }
        }
        Ok(())
    }

    fn comment(&mut self, comment: &Comment, depth: usize) -> Result<(), UnwrapError> {
        let prefix = self.take_prefix(&comment.prefix);
        self.emitted = true;
        let token = FormatToken {
            kind: TokenKind::Comment,
            text: comment.text.clone(),
            prefix,
            pos: comment.pos,
            comment: Some(comment.placement),
            blank_lines_before: comment.blank_lines_before,
        };

        if let Some(line) = self.current.as_mut() {
            line.tokens.push(token);
            return Ok(());
        }
        match comment.placement {
            Placement::Trailing => match self.lines.last_mut() {
                Some(line) => line.tokens.push(token),
                None => {
                    return Err(UnwrapError::Malformed {
                        what: "trailing comment with no preceding line",
                        line: comment.pos.line,
                    })
                }
            },
            Placement::Standalone => {
                trace!(depth, lineno = comment.pos.line, "comment line");
                self.lines.push(UnwrappedLine {
                    tokens: vec![token],
                    depth,
                    is_header: false,
                    is_comment_only: true,
                    lineno: comment.pos.line,
                });
            }
        }
        Ok(())
    }

    fn owe(&mut self, leaf: &Leaf) {
        self.pending.push_str(&leaf.prefix);
        self.pending.push_str(&leaf.text);
    }

    fn take_prefix(&mut self, own: &str) -> String {
        let mut prefix = std::mem::take(&mut self.pending);
        prefix.push_str(own);
        prefix
    }

    fn blank_lines(&mut self, prefix: &str) -> usize {
        let at_start = !self.emitted;
        self.emitted = true;
        count_blank_lines(prefix, at_start)
    }

    fn finish(mut self) -> Unwrapped {
        self.close();
        Unwrapped {
            lines: self.lines,
            tail: self.pending,
        }
    }
}

/// Rules that may appear as a statement directly inside `parent`.
fn is_statement(rule: Rule, parent: Rule) -> bool {
    match rule {
        Rule::SimpleStmt | Rule::Decorated => parent != Rule::Decorated,
        Rule::Decorator => parent == Rule::Decorated,
        Rule::FuncDef | Rule::ClassDef => true,
        r => r.is_compound() && parent != Rule::Decorated,
    }
}
