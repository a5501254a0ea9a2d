use crate::{PersistError, Result};
use std::fmt::{self, Display, Write};

/// A region of the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub offset: usize,
    pub length: usize,
}

impl<'a> Span<'a> {
    pub fn new(text: &'a str, offset: usize, length: usize) -> Self {
        Self {
            text,
            offset,
            length,
        }
    }

    pub fn excerpt(&self) -> &'a str {
        let start = self.offset.min(self.text.len());
        let end = (self.offset + self.length).min(self.text.len());
        &self.text[start..end]
    }

    /// The whole text with a marker line under this span.
    pub fn callout(&self) -> String {
        let mut result = String::new();
        let _ = writeln!(result, "  {}", self.text);
        let _ = write!(
            result,
            "  {}{}",
            " ".repeat(self.text[..self.offset.min(self.text.len())].chars().count()),
            "^".repeat(self.excerpt().chars().count().max(1)),
        );
        result
    }

    pub fn error(&self, message: impl Display) -> crate::Error {
        PersistError::Template(format!("{message}\n{}", self.callout())).into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Ident(String),
    Comma,
    Dot,
    Star,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => f.write_str("EOF"),
            TokenKind::Ident(..) => f.write_str("Ident"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::Star => f.write_str("'*'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub span: Span<'a>,
}

/// Splits the content of one `{ ... }` region into tokens.
pub struct Scanner<'a> {
    text: &'a str,
    index: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, index: 0 }
    }

    pub fn scan(&mut self) -> Result<Token<'a>> {
        let rest = &self.text[self.index..];
        let trimmed = rest.trim_start();
        self.index += rest.len() - trimmed.len();
        let start = self.index;
        let Some(c) = trimmed.chars().next() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(self.text, self.text.len(), 0),
            });
        };
        let kind = match c {
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '*' => TokenKind::Star,
            c if c == '_' || c.is_ascii_alphabetic() => {
                let len = trimmed
                    .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
                    .unwrap_or(trimmed.len());
                self.index += len;
                return Ok(Token {
                    kind: TokenKind::Ident(trimmed[..len].to_owned()),
                    span: Span::new(self.text, start, len),
                });
            }
            c => {
                return Err(Span::new(self.text, start, c.len_utf8()).error("Syntax error"));
            }
        };
        self.index += 1;
        Ok(Token {
            kind,
            span: Span::new(self.text, start, 1),
        })
    }
}
