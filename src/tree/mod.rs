mod arena;
mod types;

pub use arena::Tree;
pub use types::{
    count_blank_lines, Comment, Internal, Leaf, Node, NodeId, Placement, Pos, Rule, TokenKind,
};
