//! Preprocessor lines
//!
//! A `#` that is the first non-blank character of a logical line starts a
//! directive, unless it sits inside a comment tree-sitter already found.
//! The directive runs to the end of the logical line; backslash-newline
//! splices continue it and comments inside it are dropped.

use super::tree::{Comment, Directive, Span};

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> Scanner<'a> {
    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// Length of a backslash-newline splice at the cursor, if any
    fn splice_len(&self) -> Option<usize> {
        match (self.peek(0), self.peek(1), self.peek(2)) {
            (Some(b'\\'), Some(b'\n'), _) => Some(2),
            (Some(b'\\'), Some(b'\r'), Some(b'\n')) => Some(3),
            _ => None,
        }
    }

    fn step(&mut self) {
        if self.peek(0) == Some(b'\n') {
            self.line += 1;
        }
        self.pos += 1;
    }

    /// Move past the rest of the logical line, stopping on the newline
    fn skip_line(&mut self) {
        while let Some(b) = self.peek(0) {
            if let Some(len) = self.splice_len() {
                self.pos += len;
                self.line += 1;
                continue;
            }
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.bytes.len() {
            if self.peek(0) == Some(b'*') && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            self.step();
        }
    }

    fn push_char(&mut self, text: &mut String) {
        match self.src.get(self.pos..).and_then(|rest| rest.chars().next()) {
            Some(ch) => {
                text.push(ch);
                self.pos += ch.len_utf8();
            }
            None => self.pos += 1,
        }
    }

    /// Read one directive starting at the `#` under the cursor
    fn directive(&mut self) -> Directive {
        let start = self.pos;
        let line = self.line;
        let mut text = String::from("#");
        let mut quote: Option<u8> = None;
        let mut pending_space = false;
        self.pos += 1;

        while let Some(b) = self.peek(0) {
            if b == b'\n' {
                break;
            }
            if let Some(len) = self.splice_len() {
                self.pos += len;
                self.line += 1;
                if quote.is_none() {
                    pending_space = true;
                }
                continue;
            }
            if quote.is_none() {
                if b == b'/' && self.peek(1) == Some(b'/') {
                    self.skip_line();
                    continue;
                }
                if b == b'/' && self.peek(1) == Some(b'*') {
                    self.skip_block_comment();
                    pending_space = true;
                    continue;
                }
                if matches!(b, b' ' | b'\t' | b'\r' | 0x0b | 0x0c) {
                    pending_space = true;
                    self.pos += 1;
                    continue;
                }
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                }
            } else if b == b'\\' && self.pos + 1 < self.bytes.len() {
                text.push('\\');
                self.pos += 1;
                self.push_char(&mut text);
                continue;
            } else if Some(b) == quote {
                quote = None;
            }

            if pending_space {
                text.push(' ');
                pending_space = false;
            }
            self.push_char(&mut text);
        }

        Directive {
            text,
            span: Span::new(start, self.pos),
            line,
            end_line: self.line,
        }
    }
}

fn comment_at(comments: &[Comment], pos: usize) -> Option<&Comment> {
    let index = comments.partition_point(|c| c.span.end <= pos);
    comments
        .get(index)
        .filter(|c| c.span.start <= pos && pos < c.span.end)
}

/// Directive lines of `source` in order; `comments` sorted by position
pub fn scan(source: &str, comments: &[Comment]) -> Vec<Directive> {
    let mut scanner = Scanner {
        src: source,
        bytes: source.as_bytes(),
        pos: 0,
        line: 1,
    };
    let mut found = Vec::new();

    while scanner.pos < scanner.bytes.len() {
        while matches!(scanner.peek(0), Some(b' ' | b'\t' | b'\r' | 0x0b | 0x0c)) {
            scanner.pos += 1;
        }
        if let Some(comment) = comment_at(comments, scanner.pos) {
            // continue scanning on the line where the comment ends
            scanner.line = comment.end_line;
            scanner.pos = comment.span.end;
        } else if scanner.peek(0) == Some(b'#') {
            found.push(scanner.directive());
        }
        scanner.skip_line();
        if scanner.peek(0) == Some(b'\n') {
            scanner.step();
        }
    }
    found
}
