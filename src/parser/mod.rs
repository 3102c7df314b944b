mod builder;
mod tokenizer;

pub use builder::TreeBuilder;
pub use tokenizer::tokenize;

use crate::error::ParseError;
use crate::tree::Tree;
use tracing::debug;

/// Tokenizes `source` and builds its statement-level syntax tree.
pub fn parse(source: &str) -> Result<Tree, ParseError> {
    let leaves = tokenize(source)?;
    debug!(tokens = leaves.len(), "tokenized source");
    let tree = TreeBuilder::new(leaves).build()?;
    debug!(nodes = tree.len(), "built syntax tree");
    Ok(tree)
}
