use crate::{
    Columns, Executor, FetchOptions, PersistentMapping, Result, StoreOptions, Value,
    future::BoxFuture,
};

/// Table descriptor of an entity type, with optional capabilities.
///
/// Only [`Persister::table`] is required. Each capability accessor returns
/// `None` by default, a persister opts in by returning itself:
///
/// ```rust,ignore
/// impl Persister<Person> for PersonPersister {
///     fn table(&self) -> &str {
///         "people"
///     }
///     fn stores_related(&self) -> Option<&dyn StoresRelated<Person>> {
///         Some(self)
///     }
/// }
/// ```
pub trait Persister<T>: Send + Sync {
    fn table(&self) -> &str;

    /// Explicit mapping, replaces the one derived from the record type.
    fn persistent_mapping(&self) -> Option<&dyn PersistentMapping<T>> {
        None
    }
    fn generates_identifiers(&self) -> Option<&dyn GeneratesIdentifiers<T>> {
        None
    }
    fn stores_related(&self) -> Option<&dyn StoresRelated<T>> {
        None
    }
    fn stores_references(&self) -> Option<&dyn StoresReferences<T>> {
        None
    }
    fn fetches_related(&self) -> Option<&dyn FetchesRelated<T>> {
        None
    }
    fn fetches_related_extra(&self) -> Option<&dyn FetchesRelatedExtra<T>> {
        None
    }
    fn deletes_related(&self) -> Option<&dyn DeletesRelated<T>> {
        None
    }
    fn deletes_references(&self) -> Option<&dyn DeletesReferences<T>> {
        None
    }
}

/// Persister-level identifier assignment.
pub trait GeneratesIdentifiers<T>: Send + Sync {
    /// Whether `entity` still has to be inserted. Within one store this is
    /// always asked before [`GeneratesIdentifiers::generate_id`].
    fn is_transient<'a>(
        &'a self,
        entity: &'a T,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<bool>>;
    /// A new identifier, asked only when the entity has none yet.
    fn generate_id<'a>(
        &'a self,
        entity: &'a T,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<Value>>;
}

/// Stores the entities `T` depends on, before `T` itself.
pub trait StoresRelated<T>: Send + Sync {
    fn store_related<'a>(
        &'a self,
        entity: &'a mut T,
        options: StoreOptions,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Stores the relationships of `T`, after `T` received its identifier.
pub trait StoresReferences<T>: Send + Sync {
    fn store_references<'a>(
        &'a self,
        entity: &'a mut T,
        options: StoreOptions,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>>;
}

pub trait FetchesRelated<T>: Send + Sync {
    fn fetch_related<'a>(
        &'a self,
        entity: &'a mut T,
        options: FetchOptions,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Like [`FetchesRelated`], also receiving the foreign key columns of the row.
pub trait FetchesRelatedExtra<T>: Send + Sync {
    fn fetch_related_extra<'a>(
        &'a self,
        entity: &'a mut T,
        extra: &'a Columns,
        options: FetchOptions,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Deletes the entities owned only by `T`.
pub trait DeletesRelated<T>: Send + Sync {
    fn delete_related<'a>(
        &'a self,
        entity: &'a T,
        options: StoreOptions,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Deletes the relationships of `T`, not the related entities.
pub trait DeletesReferences<T>: Send + Sync {
    fn delete_references<'a>(
        &'a self,
        entity: &'a T,
        options: StoreOptions,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>>;
}
