use super::types::{Internal, Leaf, Node, NodeId, Rule};

/// Syntax tree stored as a flat arena; children refer to nodes by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn push_leaf(&mut self, leaf: Leaf) -> NodeId {
        self.push(Node::Leaf(leaf))
    }

    pub fn push_internal(&mut self, rule: Rule, children: Vec<NodeId>) -> NodeId {
        self.push(Node::Internal(Internal { rule, children }))
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Root node. An empty tree has none.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        self.node(id).as_leaf()
    }

    pub fn rule(&self, id: NodeId) -> Option<Rule> {
        self.node(id).rule()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Internal(internal) => &internal.children,
            _ => &[],
        }
    }

    /// First token leaf under `id`, skipping comment nodes.
    pub fn first_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.node(current) {
                Node::Leaf(_) => return Some(current),
                Node::Comment(_) => {}
                Node::Internal(internal) => stack.extend(internal.children.iter().rev()),
            }
        }
        None
    }

    /// All nodes below `id` (inclusive) in document order.
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Concatenates every prefix and token text in document order.
    pub fn render(&self) -> String {
        let Some(root) = self.root else {
            return String::new();
        };
        let mut out = String::new();
        for id in self.preorder(root) {
            match self.node(id) {
                Node::Leaf(leaf) => {
                    out.push_str(&leaf.prefix);
                    out.push_str(&leaf.text);
                }
                Node::Comment(comment) => {
                    out.push_str(&comment.prefix);
                    out.push_str(&comment.text);
                }
                Node::Internal(_) => {}
            }
        }
        out
    }
}
