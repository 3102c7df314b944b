//! Logical-line construction for a Python pretty-printer.
//!
//! The pipeline parses source into a statement-level [`tree::Tree`], splices
//! comments out of token prefixes into explicit nodes, unwraps the tree into
//! depth-annotated [`lines::UnwrappedLine`]s and decides whether a compound
//! statement may keep its one-line form.

pub mod config;
pub mod error;
pub mod lines;
pub mod parser;
pub mod tree;

pub use config::FormatConfig;
pub use error::{ConfigError, ParseError, PylineError, SpliceError, UnwrapError};
pub use lines::{
    can_merge, can_merge_with, splice_comments, statement_groups, unwrap_tree, FormatToken,
    Unwrapped, UnwrappedLine,
};
pub use parser::parse;

/// Parses, splices and unwraps `source` in one go.
pub fn unwrap_source(source: &str) -> Result<Unwrapped, PylineError> {
    let tree = parse(source)?;
    let spliced = splice_comments(&tree)?;
    Ok(unwrap_tree(&spliced)?)
}
