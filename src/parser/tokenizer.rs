use crate::error::ParseError;
use crate::tree::{Leaf, Pos, TokenKind};

const THREE_CHAR_OPS: [&str; 5] = ["**=", "//=", ">>=", "<<=", "..."];
const TWO_CHAR_OPS: [&str; 19] = [
    "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "->", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=", "@=", ":=",
];
const ONE_CHAR_OPS: &str = "+-*/%@&|^~<>()[]{},:;.=";
const STRING_PREFIXES: [&str; 8] = ["r", "u", "b", "f", "br", "rb", "fr", "rf"];
const TAB_SIZE: usize = 8;

/// Character cursor over the source that keeps line/column in step.
struct Cursor<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            column: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn at_line_break(&self) -> bool {
        let rest = self.rest();
        rest.starts_with('\n') || rest.starts_with("\r\n")
    }

    fn bump_line_break(&mut self) {
        if self.peek() == Some('\r') {
            self.bump();
        }
        self.bump();
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    /// Width of the indentation of the current line, with tabs expanded.
    fn line_indent_width(&self) -> usize {
        let before = &self.src[..self.offset];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let mut width = 0usize;
        for ch in before[line_start..].chars() {
            match ch {
                '\t' => width = (width / TAB_SIZE + 1) * TAB_SIZE,
                '\x0c' => width = 0,
                _ => width += 1,
            }
        }
        width
    }
}

struct Tokenizer<'a> {
    cursor: Cursor<'a>,
    leaves: Vec<Leaf>,
    indents: Vec<usize>,
    brackets: Vec<(char, Pos)>,
    at_line_start: bool,
}

/// Splits Python source into leaves whose prefixes hold everything between
/// tokens, so that concatenating `prefix + text` restores the input.
pub fn tokenize(source: &str) -> Result<Vec<Leaf>, ParseError> {
    Tokenizer::new(source).run()
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            leaves: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
        }
    }

    fn run(mut self) -> Result<Vec<Leaf>, ParseError> {
        loop {
            let prefix_start = self.cursor.offset;
            let prefix_pos = self.cursor.pos();
            self.skip_prefix();
            let prefix = self.cursor.src[prefix_start..self.cursor.offset].to_string();

            if self.cursor.peek().is_none() {
                self.finish(prefix, prefix_pos)?;
                break;
            }

            if self.cursor.at_line_break() {
                let pos = self.cursor.pos();
                let start = self.cursor.offset;
                self.cursor.bump_line_break();
                let text = &self.cursor.src[start..self.cursor.offset];
                self.leaves.push(Leaf::new(
                    TokenKind::Newline,
                    text,
                    prefix,
                    pos,
                    prefix_pos,
                ));
                self.at_line_start = true;
                continue;
            }

            if self.at_line_start {
                self.indentation()?;
                self.at_line_start = false;
            }
            self.token(prefix, prefix_pos)?;
        }
        Ok(self.leaves)
    }

    /// Consumes whitespace, comments, continuations and blank lines. Stops at
    /// the next token, at a line break that ends a logical line, or at EOF.
    fn skip_prefix(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(' ' | '\t' | '\x0c') => {
                    self.cursor.bump();
                }
                Some('#') => {
                    while self.cursor.peek().is_some() && !self.cursor.at_line_break() {
                        self.cursor.bump();
                    }
                }
                Some('\\') if matches!(self.cursor.peek_nth(1), Some('\n' | '\r')) => {
                    self.cursor.bump();
                    self.cursor.bump_line_break();
                }
                Some(_) if self.cursor.at_line_break() => {
                    if self.at_line_start || !self.brackets.is_empty() {
                        self.cursor.bump_line_break();
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn indentation(&mut self) -> Result<(), ParseError> {
        let width = self.cursor.line_indent_width();
        let pos = self.cursor.pos();
        let top = self.indents.last().copied().unwrap_or(0);

        if width > top {
            self.indents.push(width);
            self.leaves.push(Leaf::new(TokenKind::Indent, "", "", pos, pos));
            return Ok(());
        }

        while width < self.indents.last().copied().unwrap_or(0) {
            self.indents.pop();
            self.leaves.push(Leaf::new(TokenKind::Dedent, "", "", pos, pos));
        }
        if self.indents.last().copied().unwrap_or(0) != width {
            return Err(ParseError::InconsistentDedent { line: pos.line });
        }
        Ok(())
    }

    fn token(&mut self, prefix: String, prefix_pos: Pos) -> Result<(), ParseError> {
        let pos = self.cursor.pos();
        let start = self.cursor.offset;
        let Some(ch) = self.cursor.peek() else {
            return Ok(());
        };

        let kind = if is_ident_start(ch) {
            self.cursor.eat_while(is_ident_continue);
            let word = self.cursor.src[start..self.cursor.offset].to_ascii_lowercase();
            if STRING_PREFIXES.contains(&word.as_str())
                && matches!(self.cursor.peek(), Some('"' | '\''))
            {
                self.string_body(pos)?;
                TokenKind::String
            } else {
                TokenKind::Name
            }
        } else if ch.is_ascii_digit()
            || (ch == '.' && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()))
        {
            self.number();
            TokenKind::Number
        } else if ch == '"' || ch == '\'' {
            self.string_body(pos)?;
            TokenKind::String
        } else {
            self.operator(ch, pos)?;
            TokenKind::Op
        };

        let text = &self.cursor.src[start..self.cursor.offset];
        self.leaves.push(Leaf::new(kind, text, prefix, pos, prefix_pos));
        Ok(())
    }

    fn string_body(&mut self, start: Pos) -> Result<(), ParseError> {
        let unterminated = ParseError::UnterminatedString {
            line: start.line,
            column: start.column,
        };
        let Some(quote) = self.cursor.bump() else {
            return Err(unterminated);
        };
        let closing: String = [quote, quote].iter().collect();
        let triple = self.cursor.rest().starts_with(&closing);
        if triple {
            self.cursor.bump();
            self.cursor.bump();
        }

        loop {
            let Some(c) = self.cursor.bump() else {
                return Err(unterminated);
            };
            if c == '\\' {
                if self.cursor.bump().is_none() {
                    return Err(unterminated);
                }
                continue;
            }
            if triple {
                if c == quote && self.cursor.rest().starts_with(&closing) {
                    self.cursor.bump();
                    self.cursor.bump();
                    return Ok(());
                }
            } else if c == quote {
                return Ok(());
            } else if c == '\n' {
                return Err(unterminated);
            }
        }
    }

    fn number(&mut self) {
        let hex = self.cursor.rest().starts_with("0x") || self.cursor.rest().starts_with("0X");
        let mut last = '\0';
        while let Some(c) = self.cursor.peek() {
            let exponent_sign = (c == '+' || c == '-') && !hex && matches!(last, 'e' | 'E');
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.cursor.bump();
                last = c;
            } else {
                break;
            }
        }
    }

    fn operator(&mut self, ch: char, pos: Pos) -> Result<(), ParseError> {
        let rest = self.cursor.rest();
        let width = if THREE_CHAR_OPS.iter().any(|op| rest.starts_with(op)) {
            3
        } else if TWO_CHAR_OPS.iter().any(|op| rest.starts_with(op)) {
            2
        } else if ONE_CHAR_OPS.contains(ch) {
            1
        } else {
            return Err(ParseError::UnexpectedCharacter {
                ch,
                line: pos.line,
                column: pos.column,
            });
        };

        match ch {
            '(' | '[' | '{' => self.brackets.push((ch, pos)),
            ')' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match self.brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => {
                        return Err(ParseError::UnmatchedBracket {
                            ch,
                            line: pos.line,
                            column: pos.column,
                        })
                    }
                }
            }
            _ => {}
        }

        for _ in 0..width {
            self.cursor.bump();
        }
        Ok(())
    }

    fn finish(&mut self, prefix: String, prefix_pos: Pos) -> Result<(), ParseError> {
        if let Some(&(ch, pos)) = self.brackets.last() {
            return Err(ParseError::UnclosedBracket {
                ch,
                line: pos.line,
                column: pos.column,
            });
        }

        let pos = self.cursor.pos();
        let mut prefix = prefix;
        let mut prefix_pos = prefix_pos;
        if !self.at_line_start {
            self.leaves.push(Leaf::new(
                TokenKind::Newline,
                "",
                std::mem::take(&mut prefix),
                pos,
                prefix_pos,
            ));
            prefix_pos = pos;
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.leaves.push(Leaf::new(TokenKind::Dedent, "", "", pos, pos));
        }
        self.leaves
            .push(Leaf::new(TokenKind::EndMarker, "", prefix, pos, prefix_pos));
        Ok(())
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}
