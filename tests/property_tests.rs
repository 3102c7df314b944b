//! Property-based tests for the unwrapping pipeline.
//!
//! Programs are generated from a small statement grammar (simple statements,
//! comments, blank lines, one-liners and nested blocks) and checked for:
//!
//! 1. **Round trip**: tokens, comments and prefixes of every line plus the
//!    tail reproduce the source byte-for-byte
//! 2. **Suite depth**: the first line after a header is one level deeper
//! 3. **Merge shape**: a positive merge decision implies one header and one
//!    body on the same source line
//! 4. **Determinism**: the merge decision is a pure function of the lines

use proptest::prelude::*;

use pyline::{can_merge, statement_groups, unwrap_source};

// ============================================================================
// Generators
// ============================================================================

const SIMPLE: &[&str] = &[
    "pass",
    "x = 1",
    "total += value",
    "call(a, b)",
    "items = [1,\n    2]",
    "return",
    "a = 1; b = 2",
    "s = 'quoted # not a comment'",
];

const HEADERS: &[&str] = &[
    "if ready:",
    "while x < 10:",
    "for item in items:",
    "with open(path) as f:",
    "def handler(event):",
    "class Thing(Base):",
];

const COMMENTS: &[&str] = &["# note", "# TODO(someone): tidy", "#"];

#[derive(Debug, Clone)]
enum Stmt {
    Simple(&'static str, Option<&'static str>),
    Comment(&'static str),
    Blank,
    OneLiner(&'static str, &'static str, Option<&'static str>),
    Block(&'static str, Option<&'static str>, &'static str, Vec<Stmt>),
}

fn simple() -> impl Strategy<Value = &'static str> {
    prop::sample::select(SIMPLE)
}

fn header() -> impl Strategy<Value = &'static str> {
    prop::sample::select(HEADERS)
}

fn comment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(COMMENTS)
}

fn stmt() -> impl Strategy<Value = Stmt> {
    let leaf = prop_oneof![
        (simple(), prop::option::of(comment())).prop_map(|(s, c)| Stmt::Simple(s, c)),
        comment().prop_map(Stmt::Comment),
        Just(Stmt::Blank),
        (header(), simple(), prop::option::of(comment()))
            .prop_map(|(h, s, c)| Stmt::OneLiner(h, s, c)),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            header(),
            prop::option::of(comment()),
            simple(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(h, c, first, rest)| Stmt::Block(h, c, first, rest))
    })
}

fn render(stmts: &[Stmt], depth: usize, out: &mut String) {
    let indent = "    ".repeat(depth);
    for stmt in stmts {
        match stmt {
            Stmt::Simple(s, c) => {
                out.push_str(&indent);
                out.push_str(&s.replace('\n', &format!("\n{indent}")));
                if let Some(c) = c {
                    out.push_str("  ");
                    out.push_str(c);
                }
                out.push('\n');
            }
            Stmt::Comment(c) => {
                out.push_str(&indent);
                out.push_str(c);
                out.push('\n');
            }
            Stmt::Blank => out.push('\n'),
            Stmt::OneLiner(h, s, c) => {
                out.push_str(&indent);
                out.push_str(h);
                out.push(' ');
                out.push_str(&s.replace('\n', &format!("\n{indent}")));
                if let Some(c) = c {
                    out.push_str("  ");
                    out.push_str(c);
                }
                out.push('\n');
            }
            Stmt::Block(h, c, first, rest) => {
                out.push_str(&indent);
                out.push_str(h);
                if let Some(c) = c {
                    out.push_str("  ");
                    out.push_str(c);
                }
                out.push('\n');
                let mut body = vec![Stmt::Simple(first, None)];
                body.extend(rest.iter().cloned());
                render(&body, depth + 1, out);
            }
        }
    }
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(stmt(), 0..8).prop_map(|stmts| {
        let mut out = String::new();
        render(&stmts, 0, &mut out);
        out
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn unwrapping_round_trips(source in program()) {
        let unwrapped = unwrap_source(&source).expect("generated source should unwrap");
        prop_assert_eq!(unwrapped.reconstruct(), source);
    }

    #[test]
    fn header_is_followed_by_deeper_line(source in program()) {
        let lines = unwrap_source(&source).expect("generated source should unwrap").lines;
        for (i, line) in lines.iter().enumerate() {
            if !line.is_header {
                continue;
            }
            let next = lines[i + 1..].iter().find(|l| !l.is_comment_only);
            prop_assert!(next.is_some());
            if let Some(next) = next {
                prop_assert_eq!(next.depth, line.depth + 1);
            }
        }
    }

    #[test]
    fn merge_implies_one_header_and_body(source in program()) {
        let lines = unwrap_source(&source).expect("generated source should unwrap").lines;
        for group in statement_groups(&lines) {
            if !can_merge(group) {
                continue;
            }
            let code: Vec<_> = group.iter().filter(|l| !l.is_comment_only).collect();
            prop_assert_eq!(code.len(), 2);
            prop_assert!(code[0].is_header);
            prop_assert!(!code[1].is_header);
            prop_assert_eq!(code[0].lineno, code[1].lineno);
        }
    }

    #[test]
    fn merge_is_deterministic(source in program()) {
        let lines = unwrap_source(&source).expect("generated source should unwrap").lines;
        let copy = lines.clone();
        for (a, b) in statement_groups(&lines).into_iter().zip(statement_groups(&copy)) {
            prop_assert_eq!(can_merge(a), can_merge(b));
        }
    }
}
