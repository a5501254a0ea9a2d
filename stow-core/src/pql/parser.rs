use super::scanner::{Scanner, Token, TokenKind};
use crate::{PersistError, Result};
use std::{collections::VecDeque, fmt::Write};

/// An identifier or the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub wildcard: bool,
}

impl Ident {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wildcard: false,
        }
    }
}

/// `left` or `left.right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub left: Ident,
    pub right: Option<Ident>,
}

impl Property {
    pub fn is_wildcard(&self) -> bool {
        self.right.as_ref().unwrap_or(&self.left).wildcard
    }

    /// Unqualified name.
    pub fn base(&self) -> &str {
        &self.right.as_ref().unwrap_or(&self.left).name
    }

    fn write_qualified(&self, out: &mut String) {
        out.push_str(&self.left.name);
        if let Some(right) = &self.right {
            let _ = write!(out, ".{}", right.name);
        }
    }
}

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    lookahead: VecDeque<Token<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            scanner: Scanner::new(text),
            lookahead: VecDeque::with_capacity(2),
        }
    }

    fn peek(&mut self) -> Result<&Token<'a>> {
        if self.lookahead.is_empty() {
            let token = self.scanner.scan()?;
            self.lookahead.push_back(token);
        }
        self.lookahead
            .front()
            .ok_or_else(|| PersistError::Template("Look-ahead is empty".into()).into())
    }

    fn next(&mut self) -> Result<Token<'a>> {
        match self.lookahead.pop_front() {
            Some(token) => Ok(token),
            None => self.scanner.scan(),
        }
    }

    /// `property (',' property)*`
    pub fn parse_property_list(&mut self) -> Result<Vec<Property>> {
        let mut result = Vec::new();
        loop {
            result.push(self.parse_property()?);
            let token = self.peek()?.clone();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Comma => {
                    self.next()?;
                }
                _ => return Err(invalid_token(&token, &["','", "EOF"])),
            }
        }
        Ok(result)
    }

    /// `ident | ident '.' ident`
    fn parse_property(&mut self) -> Result<Property> {
        let left = self.parse_ident()?;
        let token = self.peek()?.clone();
        if token.kind != TokenKind::Dot {
            return Ok(Property { left, right: None });
        }
        if left.wildcard {
            return Err(token
                .span
                .error("Cannot dereference wildcard identifier"));
        }
        self.next()?;
        Ok(Property {
            left,
            right: Some(self.parse_ident()?),
        })
    }

    /// `'*' | [A-Za-z_][A-Za-z0-9_]*`
    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Star => Ok(Ident {
                name: "*".into(),
                wildcard: true,
            }),
            TokenKind::Ident(name) => Ok(Ident::named(name)),
            _ => Err(invalid_token(&token, &["Ident", "'*'"])),
        }
    }
}

fn invalid_token(token: &Token, expected: &[&str]) -> crate::Error {
    token.span.error(format!(
        "Invalid token: {} (expected: {})",
        token.kind,
        expected.join(", ")
    ))
}

/// Expand a parsed property list against the available columns.
///
/// Returns the SQL text replacing the region and the unqualified column names.
pub fn emit_property_list(
    properties: Vec<Property>,
    available: &[String],
) -> Result<(String, Vec<String>)> {
    let expansion = match properties.as_slice() {
        [single] if single.is_wildcard() => {
            Some(single.right.as_ref().map(|_| single.left.clone()))
        }
        _ => None,
    };
    let properties = match expansion {
        Some(qualifier) => available
            .iter()
            .map(|name| match &qualifier {
                Some(qualifier) => Property {
                    left: qualifier.clone(),
                    right: Some(Ident::named(name.clone())),
                },
                None => Property {
                    left: Ident::named(name.clone()),
                    right: None,
                },
            })
            .collect(),
        None => properties,
    };
    let mut sql = String::new();
    let mut columns = Vec::with_capacity(properties.len());
    for (i, property) in properties.iter().enumerate() {
        if property.is_wildcard() || property.left.wildcard {
            return Err(PersistError::Template(
                "Invalid property: unexpected wildcard".into(),
            )
            .into());
        }
        if i > 0 {
            sql.push_str(", ");
        }
        property.write_qualified(&mut sql);
        columns.push(property.base().to_owned());
    }
    Ok((sql, columns))
}

#[cfg(test)]
mod tests {
    use super::{Parser, emit_property_list};

    #[test]
    fn qualified_list() {
        let properties = Parser::new("p.id, name").parse_property_list().unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[0].left.name, "p");
        assert_eq!(properties[0].base(), "id");
        assert_eq!(properties[1].base(), "name");
        assert!(properties[1].right.is_none());
    }

    #[test]
    fn missing_comma() {
        let error = Parser::new("a b").parse_property_list().unwrap_err();
        assert!(error.to_string().contains("Invalid token: Ident"), "{error}");
    }

    #[test]
    fn trailing_dot() {
        assert!(Parser::new("p.").parse_property_list().is_err());
        assert!(Parser::new("a,").parse_property_list().is_err());
    }

    #[test]
    fn wildcard_qualifier() {
        let error = Parser::new("*.id").parse_property_list().unwrap_err();
        assert!(error.to_string().contains("Cannot dereference"), "{error}");
    }

    #[test]
    fn expand_empty_available() {
        let properties = Parser::new("*").parse_property_list().unwrap();
        let (sql, columns) = emit_property_list(properties, &[]).unwrap();
        assert_eq!(sql, "");
        assert!(columns.is_empty());
    }
}
