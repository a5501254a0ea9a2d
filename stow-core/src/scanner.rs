use crate::{Columns, Destinations, Mapping, MappingCache, Operation, Placeholder, Record, Result, Value};
use std::sync::Arc;

/// A mapping bound to one entity instance.
pub struct Scanner<'a, T: Record> {
    mapping: Arc<Mapping>,
    value: &'a mut T,
}

impl<'a, T: Record> Scanner<'a, T> {
    pub fn new(cache: &MappingCache, value: &'a mut T) -> Result<Self> {
        Ok(Self {
            mapping: cache.mapping::<T>()?,
            value,
        })
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn primary_keys(&self) -> Vec<String> {
        self.mapping.primary_keys()
    }

    pub fn properties(&self) -> Vec<String> {
        self.mapping.properties()
    }

    pub fn id(&self) -> Result<Value> {
        self.mapping.id(&*self.value)
    }

    pub fn set_id(&mut self, id: impl Into<Value>) -> Result<()> {
        self.mapping.set_id(&mut *self.value, id.into())
    }

    pub fn new_id(&self) -> Result<Value> {
        self.mapping.new_id()
    }

    pub fn values(&self, primary_keys: bool, op: Operation) -> Result<Columns> {
        self.mapping.values(&*self.value, primary_keys, op)
    }

    pub fn dests(&self, names: &[String]) -> Result<Destinations> {
        self.mapping.dests(names)
    }

    pub fn scan(
        &mut self,
        dests: &Destinations,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Columns<Placeholder>> {
        dests.scan(&mut *self.value, values)
    }
}
