use crate::{Columns, Destinations, Mapping, Operation, Record, Result, Value};
use std::{marker::PhantomData, ops::Deref, sync::Arc};

/// How the runtime reads and writes the persistent state of `T`.
///
/// Persisters may provide their own implementation to override the derived
/// one, see [`crate::Persister::persistent_mapping`].
pub trait PersistentMapping<T>: Send + Sync {
    /// Primary key column names.
    fn primary_keys(&self) -> Vec<String>;
    /// Column names, excluding the primary keys.
    fn columns(&self) -> Vec<String>;
    /// Identifier of `entity`, empty when it was never stored.
    fn persistent_id(&self, entity: &T) -> Result<Value>;
    fn set_persistent_id(&self, entity: &mut T, id: Value) -> Result<()>;
    fn new_persistent_id(&self, entity: &T) -> Result<Value>;
    /// Writable column values, excluding the primary key.
    fn persistent_values(&self, entity: &T) -> Result<Columns>;
    /// Scan plan for the given result columns, primary key included.
    fn value_destinations(&self, columns: &[String]) -> Result<Destinations>;
}

/// [`PersistentMapping`] derived from the record type.
pub struct MappingEntity<T> {
    mapping: Arc<Mapping>,
    _type: PhantomData<fn() -> T>,
}

impl<T> MappingEntity<T> {
    pub fn new(mapping: Arc<Mapping>) -> Self {
        Self {
            mapping,
            _type: PhantomData,
        }
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }
}

impl<T: Record> PersistentMapping<T> for MappingEntity<T> {
    fn primary_keys(&self) -> Vec<String> {
        self.mapping.primary_keys()
    }
    fn columns(&self) -> Vec<String> {
        self.mapping.properties()
    }
    fn persistent_id(&self, entity: &T) -> Result<Value> {
        self.mapping.id(entity)
    }
    fn set_persistent_id(&self, entity: &mut T, id: Value) -> Result<()> {
        self.mapping.set_id(entity, id)
    }
    fn new_persistent_id(&self, _entity: &T) -> Result<Value> {
        self.mapping.new_id()
    }
    fn persistent_values(&self, entity: &T) -> Result<Columns> {
        self.mapping.values(entity, false, Operation::Write)
    }
    fn value_destinations(&self, columns: &[String]) -> Result<Destinations> {
        self.mapping.dests(columns)
    }
}

/// The mapping in effect for one operation: the persister override or the
/// derived one.
pub enum EntityMapping<'a, T> {
    Borrowed(&'a dyn PersistentMapping<T>),
    Derived(MappingEntity<T>),
}

impl<'a, T: Record> Deref for EntityMapping<'a, T> {
    type Target = dyn PersistentMapping<T> + 'a;
    fn deref(&self) -> &Self::Target {
        match self {
            EntityMapping::Borrowed(v) => *v,
            EntityMapping::Derived(v) => v,
        }
    }
}
