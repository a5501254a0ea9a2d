use crate::{Columns, FieldMut, FieldPath, PersistError, Placeholder, Record, Result, Value};
use anyhow::Context;

/// Where one result column goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dest {
    /// Assigned into the field at this path.
    Field(FieldPath),
    /// Captured in a placeholder under the column name.
    Foreign,
    /// Read and thrown away.
    Discard,
}

/// Scan plan mapping each result column to a [`Dest`], in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Destinations {
    columns: Vec<String>,
    dests: Vec<Dest>,
}

impl Destinations {
    pub fn from_parts(columns: Vec<String>, dests: Vec<Dest>) -> Self {
        Self { columns, dests }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn dests(&self) -> &[Dest] {
        &self.dests
    }

    pub fn len(&self) -> usize {
        self.dests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dests.is_empty()
    }

    /// Append `count` trailing columns that are read and discarded.
    pub fn push_discard(&mut self, count: usize) {
        for _ in 0..count {
            self.columns.push(String::new());
            self.dests.push(Dest::Discard);
        }
    }

    /// Assign one row into `record`, one value per destination.
    ///
    /// Returns the foreign key placeholders keyed by column name.
    pub fn scan(
        &self,
        record: &mut dyn Record,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Columns<Placeholder>> {
        let values: Vec<Value> = values.into_iter().collect();
        if values.len() != self.dests.len() {
            return Err(PersistError::configuration(format!(
                "Expected {} values to scan into {}, got {}",
                self.dests.len(),
                record.type_info().name,
                values.len()
            )));
        }
        let mut placeholders = Columns::new();
        for ((column, dest), value) in self.columns.iter().zip(&self.dests).zip(values) {
            match dest {
                Dest::Field(path) => {
                    assign(record, path, value).with_context(|| format!("Column `{column}`"))?
                }
                Dest::Foreign => {
                    let mut placeholder = Placeholder::default();
                    placeholder.set(value);
                    placeholders.insert(column.clone(), placeholder);
                }
                Dest::Discard => {}
            }
        }
        Ok(placeholders)
    }
}

fn assign(record: &mut dyn Record, path: &[usize], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };
    let mut current = record;
    for index in parents {
        let name = current.type_info().name;
        current = match current.field_mut(*index) {
            FieldMut::Record(nested) => nested,
            _ => {
                return Err(PersistError::configuration(format!(
                    "Field {index} of {name} is not an embedded record"
                )));
            }
        };
    }
    let name = current.type_info().name;
    match current.field_mut(*last) {
        FieldMut::Value(slot) => slot.assign(value),
        _ => Err(PersistError::configuration(format!(
            "Field {last} of {name} cannot receive a column value"
        ))),
    }
}
