use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::SpliceError;
use crate::tree::{
    count_blank_lines, Comment, Leaf, Node, NodeId, Placement, Pos, Rule, TokenKind, Tree,
};

/// Where a comment node lands in the rebuilt tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Immediately before the child at this index.
    Before(usize),
    /// After the last statement of a suite, ahead of its closing DEDENT.
    End,
}

/// The statement-level position a leaf opens.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    container: NodeId,
    index: usize,
    column: usize,
}

struct Lifted {
    comment: Comment,
    /// Byte offset into the prefix where the comment starts.
    start: usize,
}

/// Moves every comment out of leaf prefixes into explicit comment nodes.
///
/// Returns a new tree; `tree` is left untouched. Rendering the result yields
/// exactly the same text as rendering the input.
pub fn splice_comments(tree: &Tree) -> Result<Tree, SpliceError> {
    let Some(root) = tree.root() else {
        return Ok(Tree::new());
    };

    let anchors = statement_anchors(tree, root);
    let mut parents: HashMap<NodeId, (NodeId, usize)> = HashMap::new();
    let order = tree.preorder(root);
    for &id in &order {
        for (index, &child) in tree.children(id).iter().enumerate() {
            parents.insert(child, (id, index));
        }
    }

    let mut inserts: HashMap<NodeId, Vec<(Slot, Comment)>> = HashMap::new();
    let mut prefixes: HashMap<NodeId, String> = HashMap::new();
    let mut previous: Option<TokenKind> = None;
    let mut spliced = 0usize;

    for &id in &order {
        let Some(leaf) = tree.leaf(id) else {
            continue;
        };
        if leaf.prefix.contains('#') {
            let (lifted, remainder) = lift_comments(leaf, previous);
            spliced += lifted.len();

            if let Some(anchor) = anchors.get(&id) {
                let chain = descent_chain(tree, *anchor);
                let mut limit = chain.len() - 1;
                for Lifted { comment, .. } in lifted {
                    let level = (1..=limit)
                        .rev()
                        .find(|&k| chain[k].1 <= comment.pos.column)
                        .unwrap_or(0);
                    limit = level;
                    let (container, slot) = chain[level].0;
                    trace!(line = comment.pos.line, level, "standalone comment");
                    inserts.entry(container).or_default().push((slot, comment));
                }
            } else {
                let Some(&(parent, index)) = parents.get(&id) else {
                    let first = lifted.first().map_or(leaf.pos, |l| l.comment.pos);
                    return Err(SpliceError::NoEnclosingStatement {
                        line: first.line,
                        column: first.column,
                    });
                };
                for Lifted { comment, start } in lifted {
                    trace!(
                        line = comment.pos.line,
                        offset = start,
                        placement = ?comment.placement,
                        "inline comment"
                    );
                    inserts
                        .entry(parent)
                        .or_default()
                        .push((Slot::Before(index), comment));
                }
            }
            prefixes.insert(id, remainder);
        }
        if !matches!(leaf.kind, TokenKind::Indent | TokenKind::Dedent) {
            previous = Some(leaf.kind);
        }
    }

    debug!(comments = spliced, "spliced comments");
    Ok(rebuild(tree, root, &mut inserts, &mut prefixes))
}

/// Maps the first leaf of every statement (and every continuation clause
/// keyword) to its position in the enclosing statement list.
fn statement_anchors(tree: &Tree, root: NodeId) -> HashMap<NodeId, Anchor> {
    let mut anchors = HashMap::new();
    for id in tree.preorder(root) {
        let Some(rule) = tree.rule(id) else {
            continue;
        };
        for (index, &child) in tree.children(id).iter().enumerate() {
            let head = match tree.node(child) {
                Node::Internal(_) if rule.holds_statements() => tree.first_leaf(child),
                Node::Leaf(leaf)
                    if rule.holds_statements() && leaf.kind == TokenKind::EndMarker =>
                {
                    Some(child)
                }
                Node::Leaf(leaf)
                    if rule.is_compound() && index > 0 && is_clause_keyword(leaf) =>
                {
                    Some(child)
                }
                _ => None,
            };
            let Some(head) = head else {
                continue;
            };
            let column = tree.leaf(head).map_or(0, |leaf| leaf.pos.column);
            anchors.entry(head).or_insert(Anchor {
                container: id,
                index,
                column,
            });
        }
    }
    anchors
}

fn is_clause_keyword(leaf: &Leaf) -> bool {
    leaf.kind == TokenKind::Name
        && matches!(leaf.text.as_str(), "elif" | "else" | "except" | "finally")
}

/// Candidate homes for a standalone comment, outermost first: before the
/// anchored statement, then the end of each trailing suite of the statement
/// that precedes it, skipping token siblings such as DEDENT. The column is
/// the indentation each home sits at.
fn descent_chain(tree: &Tree, anchor: Anchor) -> Vec<((NodeId, Slot), usize)> {
    let mut chain = vec![((anchor.container, Slot::Before(anchor.index)), anchor.column)];
    let mut previous = tree
        .children(anchor.container)
        .get(..anchor.index)
        .unwrap_or(&[])
        .iter()
        .rev()
        .copied()
        .find(|&child| matches!(tree.node(child), Node::Internal(_)));

    while let Some(node) = previous {
        let Some(suite) = last_suite(tree, node) else {
            break;
        };
        let Some(last_statement) = statements(tree, suite).last().copied() else {
            break;
        };
        let column = statements(tree, suite)
            .first()
            .and_then(|&s| tree.first_leaf(s))
            .and_then(|leaf| tree.leaf(leaf))
            .map_or(0, |leaf| leaf.pos.column);
        if column <= chain[chain.len() - 1].1 {
            break;
        }
        chain.push(((suite, Slot::End), column));
        previous = Some(last_statement);
    }
    chain
}

fn last_suite(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let rule = tree.rule(node)?;
    match rule {
        Rule::Suite => Some(node),
        Rule::Decorated => last_suite(tree, *tree.children(node).last()?),
        r if r.is_compound() => {
            let last = *tree.children(node).last()?;
            (tree.rule(last) == Some(Rule::Suite)).then_some(last)
        }
        _ => None,
    }
}

fn statements(tree: &Tree, suite: NodeId) -> Vec<NodeId> {
    tree.children(suite)
        .iter()
        .copied()
        .filter(|&child| matches!(tree.node(child), Node::Internal(_)))
        .collect()
}

/// Cuts the comments out of a leaf prefix. Each comment keeps the text that
/// preceded it as its own prefix; whatever follows the last one is returned
/// as the leaf's new prefix.
fn lift_comments(leaf: &Leaf, previous: Option<TokenKind>) -> (Vec<Lifted>, String) {
    let prefix = leaf.prefix.as_str();
    let after_code = previous.is_some_and(|kind| kind != TokenKind::Newline);
    let mut lifted = Vec::new();
    let mut line = leaf.prefix_pos.line;
    let mut column = leaf.prefix_pos.column;
    let mut segment_start = 0usize;
    let mut chars = prefix.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            '\n' => {
                line += 1;
                column = 0;
            }
            '#' => {
                let pos = Pos::new(line, column);
                let mut end = prefix.len();
                while let Some(&(next_offset, next)) = chars.peek() {
                    if next == '\n' || (next == '\r' && prefix[next_offset..].starts_with("\r\n")) {
                        end = next_offset;
                        break;
                    }
                    column += 1;
                    chars.next();
                }
                column += 1;

                let segment = &prefix[segment_start..offset];
                let first = segment_start == 0;
                let placement = if first && after_code && !segment.contains('\n') {
                    Placement::Trailing
                } else {
                    Placement::Standalone
                };
                let blank_lines_before = match placement {
                    Placement::Trailing => 0,
                    Placement::Standalone => count_blank_lines(segment, first && !after_code),
                };
                lifted.push(Lifted {
                    comment: Comment {
                        text: prefix[offset..end].to_string(),
                        prefix: segment.to_string(),
                        pos,
                        placement,
                        blank_lines_before,
                    },
                    start: offset,
                });
                segment_start = end;
            }
            _ => column += 1,
        }
    }
    (lifted, prefix[segment_start..].to_string())
}

/// Copies `tree` into a fresh arena, adding the comment nodes and trimmed
/// prefixes. Children are always copied before their parent.
fn rebuild(
    tree: &Tree,
    root: NodeId,
    inserts: &mut HashMap<NodeId, Vec<(Slot, Comment)>>,
    prefixes: &mut HashMap<NodeId, String>,
) -> Tree {
    let mut out = Tree::new();
    let mut mapped: HashMap<NodeId, NodeId> = HashMap::new();
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        match tree.node(id) {
            Node::Leaf(leaf) => {
                let mut leaf = leaf.clone();
                if let Some(prefix) = prefixes.remove(&id) {
                    leaf.prefix = prefix;
                }
                mapped.insert(id, out.push_leaf(leaf));
            }
            Node::Comment(comment) => {
                mapped.insert(id, out.push(Node::Comment(comment.clone())));
            }
            Node::Internal(internal) if !expanded => {
                stack.push((id, true));
                stack.extend(internal.children.iter().rev().map(|&child| (child, false)));
            }
            Node::Internal(internal) => {
                let mut pending = inserts.remove(&id).unwrap_or_default();
                let mut children = Vec::with_capacity(internal.children.len() + pending.len());
                for (index, old) in internal.children.iter().enumerate() {
                    for (_, comment) in take_slot(&mut pending, Slot::Before(index)) {
                        children.push(out.push(Node::Comment(comment)));
                    }
                    if let Some(&new) = mapped.get(old) {
                        children.push(new);
                    }
                }
                let closing = internal
                    .children
                    .last()
                    .and_then(|&last| tree.leaf(last))
                    .is_some_and(|leaf| leaf.kind == TokenKind::Dedent);
                let at = if closing {
                    children.len().saturating_sub(1)
                } else {
                    children.len()
                };
                let trailing = take_slot(&mut pending, Slot::End);
                for (offset, (_, comment)) in trailing.into_iter().enumerate() {
                    children.insert(at + offset, out.push(Node::Comment(comment)));
                }

                let new = out.push_internal(internal.rule, children);
                mapped.insert(id, new);
                if id == root {
                    out.set_root(new);
                }
            }
        }
    }
    out
}

fn take_slot(pending: &mut Vec<(Slot, Comment)>, slot: Slot) -> Vec<(Slot, Comment)> {
    let (taken, rest): (Vec<_>, Vec<_>) = pending.drain(..).partition(|(s, _)| *s == slot);
    *pending = rest;
    taken
}
