use crate::{
    Columns, Dest, Destinations, FieldRef, MappingCache, PersistError, Record,
    RecordType, Result, Tag, Value,
};
use anyhow::Context;
use std::{any::TypeId, collections::HashSet, sync::Arc};

/// Location of a field, one declaration index per embedding level.
pub type FieldPath = Vec<usize>;

/// Which columns [`Mapping::values`] collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Every property.
    Read,
    /// Properties that are not read-only.
    Write,
}

/// A mapped scalar or foreign key column of one record type.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub index: usize,
    pub read_only: bool,
    pub foreign_key: bool,
    generate: Option<fn() -> Option<Value>>,
}

/// An anonymous (empty prefix) or inline embedded record.
#[derive(Debug, Clone)]
pub struct EmbedMapping {
    pub index: usize,
    pub prefix: String,
    pub mapping: Arc<Mapping>,
}

/// Derived, immutable mapping of one record type to its columns.
#[derive(Debug)]
pub struct Mapping {
    record: RecordType,
    primary_keys: Vec<Column>,
    properties: Vec<Column>,
    embeds: Vec<EmbedMapping>,
}

impl Mapping {
    pub(crate) fn derive(
        cache: &MappingCache,
        record: RecordType,
        stack: &mut Vec<TypeId>,
    ) -> Result<Self> {
        let mut mapping = Mapping {
            record,
            primary_keys: Vec::new(),
            properties: Vec::new(),
            embeds: Vec::new(),
        };
        let mut names = HashSet::new();
        for (index, field) in record.fields.iter().enumerate() {
            let context = || format!("Field {}.{}", record.name, field.ident);
            let Some(tag) = field.tag else {
                let Some(embed) = field.embed else {
                    return Err(PersistError::configuration(format!(
                        "Field {}.{} has no annotation and is not an embedded record",
                        record.name, field.ident
                    )));
                };
                mapping.embeds.push(EmbedMapping {
                    index,
                    prefix: String::new(),
                    mapping: cache.resolve(embed(), stack)?,
                });
                continue;
            };
            let tag = Tag::parse(tag).with_context(context)?;
            if tag.is_excluded() {
                continue;
            }
            if tag.inline {
                let Some(embed) = field.embed else {
                    return Err(PersistError::configuration(format!(
                        "Field {}.{} is annotated inline but is not a record",
                        record.name, field.ident
                    )));
                };
                if tag.primary_key || tag.read_only || tag.foreign_key {
                    return Err(PersistError::configuration(format!(
                        "Field {}.{} is inline and cannot be flagged pk, ro or fk",
                        record.name, field.ident
                    )));
                }
                mapping.embeds.push(EmbedMapping {
                    index,
                    prefix: tag.name,
                    mapping: cache.resolve(embed(), stack)?,
                });
                continue;
            }
            if field.embed.is_some() {
                return Err(PersistError::configuration(format!(
                    "Field {}.{} is a record and must be annotated inline",
                    record.name, field.ident
                )));
            }
            if tag.name.is_empty() {
                return Err(PersistError::configuration(format!(
                    "Field {}.{} has an empty column name",
                    record.name, field.ident
                )));
            }
            if !names.insert(tag.name.clone()) {
                return Err(PersistError::configuration(format!(
                    "Column `{}` is mapped more than once in {}",
                    tag.name, record.name
                )));
            }
            let column = Column {
                name: tag.name,
                index,
                read_only: tag.read_only,
                foreign_key: tag.foreign_key,
                generate: field.generate,
            };
            if tag.primary_key {
                mapping.primary_keys.push(column);
            } else {
                mapping.properties.push(column);
            }
        }
        Ok(mapping)
    }

    pub fn record_type(&self) -> RecordType {
        self.record
    }

    pub fn name(&self) -> &'static str {
        self.record.name
    }

    pub fn embeds(&self) -> &[EmbedMapping] {
        &self.embeds
    }

    /// Primary key column names, own first then embedded ones.
    pub fn primary_keys(&self) -> Vec<String> {
        let mut result = Vec::new();
        self.collect_names(&mut result, "", true);
        result
    }

    /// Non-primary-key column names, own first then embedded ones.
    pub fn properties(&self) -> Vec<String> {
        let mut result = Vec::new();
        self.collect_names(&mut result, "", false);
        result
    }

    /// Primary keys followed by properties.
    pub fn columns(&self) -> Vec<String> {
        let mut result = self.primary_keys();
        result.extend(self.properties());
        result
    }

    fn collect_names(&self, out: &mut Vec<String>, prefix: &str, primary_keys: bool) {
        let columns = if primary_keys {
            &self.primary_keys
        } else {
            &self.properties
        };
        out.extend(columns.iter().map(|v| format!("{prefix}{}", v.name)));
        for embed in &self.embeds {
            embed
                .mapping
                .collect_names(out, &format!("{prefix}{}", embed.prefix), primary_keys);
        }
    }

    /// Column values of `record`. Embedded values are collected first so own
    /// columns win on name collisions. Unset foreign keys are omitted.
    pub fn values(&self, record: &dyn Record, primary_keys: bool, op: Operation) -> Result<Columns> {
        let mut result = Columns::new();
        self.collect_values(record, primary_keys, op, "", &mut result)?;
        Ok(result)
    }

    fn collect_values(
        &self,
        record: &dyn Record,
        primary_keys: bool,
        op: Operation,
        prefix: &str,
        out: &mut Columns,
    ) -> Result<()> {
        for embed in &self.embeds {
            match record.field(embed.index) {
                FieldRef::Record(Some(nested)) => embed.mapping.collect_values(
                    nested,
                    primary_keys,
                    op,
                    &format!("{prefix}{}", embed.prefix),
                    out,
                )?,
                FieldRef::Record(None) => {}
                _ => return Err(self.accessor_error(embed.index, "an embedded record")),
            }
        }
        let columns = self
            .primary_keys
            .iter()
            .filter(|_| primary_keys)
            .chain(
                self.properties
                    .iter()
                    .filter(|v| op == Operation::Read || !v.read_only),
            );
        for column in columns {
            let value = match record.field(column.index) {
                FieldRef::Value(v) => Some(v),
                FieldRef::Foreign(v) => v,
                _ => return Err(self.accessor_error(column.index, "a column value")),
            };
            if let Some(value) = value {
                out.insert(format!("{prefix}{}", column.name), value);
            }
        }
        Ok(())
    }

    fn id_columns(&self) -> Vec<(FieldPath, &Column)> {
        let mut result: Vec<_> = self
            .primary_keys
            .iter()
            .map(|v| (vec![v.index], v))
            .collect();
        for embed in &self.embeds {
            result.extend(embed.mapping.id_columns().into_iter().map(|(mut path, v)| {
                path.insert(0, embed.index);
                (path, v)
            }));
        }
        result
    }

    fn id_column(&self) -> Result<(FieldPath, &Column)> {
        let mut columns = self.id_columns();
        if columns.len() != 1 {
            return Err(PersistError::configuration(format!(
                "Type {} has {} primary keys, exactly one is required",
                self.name(),
                columns.len()
            )));
        }
        Ok(columns.remove(0))
    }

    /// Value of the single primary key.
    pub fn id(&self, record: &dyn Record) -> Result<Value> {
        let (path, _) = self.id_column()?;
        let Some((last, parents)) = path.split_last() else {
            return Ok(Value::Null);
        };
        let mut current = record;
        for index in parents {
            current = match current.field(*index) {
                FieldRef::Record(Some(nested)) => nested,
                FieldRef::Record(None) => return Ok(Value::Null),
                _ => return Err(self.accessor_error(*index, "an embedded record")),
            };
        }
        match current.field(*last) {
            FieldRef::Value(v) => Ok(v),
            FieldRef::Foreign(v) => Ok(v.unwrap_or_default()),
            _ => Err(self.accessor_error(*last, "a column value")),
        }
    }

    /// Assign the single primary key, converting `id` to the field type.
    pub fn set_id(&self, record: &mut dyn Record, id: Value) -> Result<()> {
        let (path, column) = self.id_column()?;
        let name = column.name.clone();
        Destinations::from_parts(vec![name], vec![Dest::Field(path)])
            .scan(record, vec![id])
            .map(|_| ())
    }

    /// A fresh identifier produced by the primary key type.
    pub fn new_id(&self) -> Result<Value> {
        let (_, column) = self.id_column()?;
        column.generate.and_then(|v| v()).ok_or_else(|| {
            PersistError::configuration(format!(
                "The primary key `{}` of {} cannot generate new identifiers",
                column.name,
                self.name()
            ))
        })
    }

    /// Resolve result column names to destinations of this type.
    ///
    /// Names are tried against embedded records first, with the embed prefix
    /// stripped, then against own columns. Any name left over is an error.
    pub fn dests(&self, names: &[String]) -> Result<Destinations> {
        let mut pending: Vec<(usize, String)> = names.iter().cloned().enumerate().collect();
        let mut resolved = vec![None; names.len()];
        self.collect_dests(&mut pending, &[], &mut resolved);
        if !pending.is_empty() {
            pending.sort_by_key(|(i, _)| *i);
            return Err(PersistError::UnknownColumns {
                type_name: self.name(),
                columns: pending.into_iter().map(|(_, v)| v).collect(),
            }
            .into());
        }
        Ok(Destinations::from_parts(
            names.to_vec(),
            resolved
                .into_iter()
                .map(|v| v.unwrap_or(Dest::Discard))
                .collect(),
        ))
    }

    fn collect_dests(
        &self,
        pending: &mut Vec<(usize, String)>,
        path: &[usize],
        resolved: &mut [Option<Dest>],
    ) {
        for embed in &self.embeds {
            let (mut nested, rest): (Vec<_>, Vec<_>) = pending
                .drain(..)
                .partition(|(_, name)| name.starts_with(&embed.prefix));
            *pending = rest;
            if nested.is_empty() {
                continue;
            }
            for (_, name) in nested.iter_mut() {
                name.replace_range(..embed.prefix.len(), "");
            }
            let mut nested_path = path.to_vec();
            nested_path.push(embed.index);
            embed
                .mapping
                .collect_dests(&mut nested, &nested_path, resolved);
            pending.extend(
                nested
                    .into_iter()
                    .map(|(i, name)| (i, format!("{}{name}", embed.prefix))),
            );
        }
        pending.retain(|(i, name)| {
            let column = self
                .primary_keys
                .iter()
                .chain(self.properties.iter())
                .find(|v| v.name == *name);
            let Some(column) = column else {
                return true;
            };
            resolved[*i] = Some(if column.foreign_key {
                Dest::Foreign
            } else {
                let mut field = path.to_vec();
                field.push(column.index);
                Dest::Field(field)
            });
            false
        });
    }

    fn accessor_error(&self, index: usize, expected: &str) -> crate::Error {
        let field = self
            .record
            .fields
            .get(index)
            .map(|v| v.ident)
            .unwrap_or("?");
        PersistError::configuration(format!(
            "Field {}.{} does not expose {expected}",
            self.name(),
            field
        ))
    }
}
