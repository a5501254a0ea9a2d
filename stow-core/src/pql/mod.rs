//! Column list templates embedded in SQL text.
//!
//! A template is SQL containing `{ ... }` regions that expand against the
//! columns of a mapped type:
//!
//! ```rust
//! let available = vec!["id".to_string(), "name".to_string()];
//! let query = stow_core::pql::parse("SELECT {p.*} FROM people p", &available).unwrap();
//! assert_eq!(query.sql, "SELECT p.id, p.name FROM people p");
//! assert_eq!(query.columns, ["id", "name"]);
//! ```
//!
//! Braces inside single or double quoted text, and braces or quotes preceded by
//! an odd number of backslashes, are left alone.
mod parser;
mod scanner;

pub use parser::{Ident, Parser, Property, emit_property_list};
pub use scanner::{Scanner, Span, Token, TokenKind};

use crate::{Result, truncate_long};

/// Expanded SQL and the unqualified names of the columns it selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub sql: String,
    pub columns: Vec<String>,
}

pub fn parse(template: &str, available: &[String]) -> Result<Query> {
    let mut escapes = 0usize;
    let mut quote: Option<char> = None;
    let mut open: Option<usize> = None;
    let mut tail = 0;
    let mut sql = String::with_capacity(template.len());
    let mut columns = Vec::new();
    for (i, c) in template.char_indices() {
        if c == '\\' {
            escapes += 1;
            continue;
        }
        let escaped = escapes % 2 == 1;
        escapes = 0;
        if escaped {
            continue;
        }
        match c {
            '\'' | '"' => match quote {
                None => quote = Some(c),
                Some(q) if q == c => quote = None,
                _ => {}
            },
            '{' if quote.is_none() => {
                if open.is_some() {
                    return Err(Span::new(template, i, 1).error("Meta sequence opened more than once"));
                }
                open = Some(i);
            }
            '}' if quote.is_none() => {
                let Some(start) = open.take() else {
                    return Err(Span::new(template, i, 1).error("Meta sequence closed but never opened"));
                };
                let properties = Parser::new(&template[start + 1..i]).parse_property_list()?;
                let (expansion, names) = emit_property_list(properties, available)?;
                sql.push_str(&template[tail..start]);
                sql.push_str(&expansion);
                columns.extend(names);
                tail = i + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err(Span::new(template, template.len(), 0).error("Quote sequence never closed"));
    }
    if let Some(start) = open {
        return Err(Span::new(template, start, template.len() - start).error("Meta sequence never closed"));
    }
    sql.push_str(&template[tail..]);
    log::trace!("Expanded `{}` into `{}`", truncate_long!(template), truncate_long!(sql));
    Ok(Query { sql, columns })
}
