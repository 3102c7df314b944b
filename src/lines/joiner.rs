use tracing::trace;

use super::types::UnwrappedLine;
use crate::config::FormatConfig;

/// Whether `lines`, the unwrapped lines of one statement, may be emitted as
/// a single physical line. Uses the default configuration.
pub fn can_merge(lines: &[UnwrappedLine]) -> bool {
    can_merge_with(lines, &FormatConfig::default())
}

/// Whether a `header: body` pair should keep its one-line form.
///
/// Comment-only lines are ignored wherever they sit. What remains must be a
/// header followed by exactly one simple body statement, written by the
/// author (plus any comment) on one source line. Spacing inside that line is
/// irrelevant. When a column limit is configured the normalized result must
/// also fit within it.
pub fn can_merge_with(lines: &[UnwrappedLine], config: &FormatConfig) -> bool {
    if !config.join_multiple_lines {
        return false;
    }

    let code: Vec<&UnwrappedLine> = lines.iter().filter(|line| !line.is_comment_only).collect();
    let [header, body] = code.as_slice() else {
        trace!(lines = code.len(), "not a header/body pair");
        return false;
    };

    if !header.is_header || body.is_header {
        return false;
    }
    if body.depth != header.depth + 1 {
        return false;
    }
    if header.lineno != body.lineno {
        trace!(header = header.lineno, body = body.lineno, "body on its own line");
        return false;
    }
    let same_line = header
        .comments()
        .chain(body.comments())
        .all(|comment| comment.pos.line == header.lineno);
    if !same_line {
        return false;
    }

    let Some(limit) = config.column_limit else {
        return true;
    };
    let width = joined_width(header, body, config);
    trace!(width, limit, "one-liner width");
    width <= limit
}

/// Width of `header body` rendered with one space between them, at the
/// header's indentation. Comments are not counted.
fn joined_width(header: &UnwrappedLine, body: &UnwrappedLine, config: &FormatConfig) -> usize {
    header.depth * config.indent_width + span(header) + 1 + span(body)
}

fn span(line: &UnwrappedLine) -> usize {
    match (line.code_tokens().next(), line.last_code_token()) {
        (Some(first), Some(last)) => last.end_column().saturating_sub(first.pos.column),
        _ => 0,
    }
}

/// Splits a file's lines into runs that each start at a depth-0 code line.
/// Comment-only lines at depth 0 open the run of the code that follows them.
pub fn statement_groups(lines: &[UnwrappedLine]) -> Vec<&[UnwrappedLine]> {
    let mut groups = Vec::new();
    let mut start = 0usize;
    let mut has_code = false;
    for (index, line) in lines.iter().enumerate() {
        if line.depth == 0 && has_code {
            groups.push(&lines[start..index]);
            start = index;
            has_code = false;
        }
        has_code |= !line.is_comment_only;
    }
    if start < lines.len() {
        groups.push(&lines[start..]);
    }
    groups
}
