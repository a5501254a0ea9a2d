use crate::{Mapping, PersistError, Record, RecordType, Result};
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// Concurrency-safe store of derived mappings keyed by record type.
///
/// Derivation runs at most once per type and successful results are kept for
/// the lifetime of the cache. Failures are not cached. Concurrent first uses of
/// the same type may derive it twice, both results are equivalent and the first
/// one inserted is kept.
#[derive(Debug, Default)]
pub struct MappingCache {
    mappings: RwLock<HashMap<TypeId, Arc<Mapping>>>,
}

impl MappingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mapping<T: Record>(&self) -> Result<Arc<Mapping>> {
        self.mapping_for(T::record_type())
    }

    pub fn mapping_for(&self, record: RecordType) -> Result<Arc<Mapping>> {
        self.resolve(record, &mut Vec::new())
    }

    pub(crate) fn resolve(&self, record: RecordType, stack: &mut Vec<TypeId>) -> Result<Arc<Mapping>> {
        if let Some(mapping) = self.get(record.id) {
            return Ok(mapping);
        }
        if stack.contains(&record.id) {
            return Err(PersistError::configuration(format!(
                "Circular type embedding detected at {}",
                record.name
            )));
        }
        stack.push(record.id);
        let mapping = Mapping::derive(self, record, stack);
        stack.pop();
        let mapping = Arc::new(mapping?);
        log::trace!(
            "Derived mapping for {}: {:?}",
            record.name,
            mapping.columns()
        );
        let mut mappings = self
            .mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(mappings.entry(record.id).or_insert(mapping).clone())
    }

    fn get(&self, id: TypeId) -> Option<Arc<Mapping>> {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
