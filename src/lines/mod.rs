mod joiner;
mod splicer;
mod types;
mod unwrapper;

pub use joiner::{can_merge, can_merge_with, statement_groups};
pub use splicer::splice_comments;
pub use types::{FormatToken, Unwrapped, UnwrappedLine};
pub use unwrapper::unwrap_tree;
