use crate::{
    AsValue, Columns, EntityMapping, Error, Executor, FetchOptions, Iter, MappingCache,
    MappingEntity, Metrics, PersistError, Persister, Record, Result, RowsAffected, Statement,
    StoreOptions, Value, pql, separated_by,
    stream::StreamExt,
    write_assignments, write_placeholders,
};
use anyhow::Context;
use std::{any, pin::pin, sync::Arc};

/// Default limit of related fetches running at once in
/// [`Orm::fetch_entities`].
pub const FETCH_CONCURRENCY: usize = 10;

/// Drives the store, fetch and delete lifecycle of mapped entities.
///
/// Cheap to clone, clones share the mapping cache and the metrics.
#[derive(Clone)]
pub struct Orm {
    cache: Arc<MappingCache>,
    metrics: Arc<Metrics>,
    concurrency: usize,
}

impl Default for Orm {
    fn default() -> Self {
        Self::new(Arc::new(MappingCache::new()))
    }
}

impl Orm {
    pub fn new(cache: Arc<MappingCache>) -> Self {
        Self {
            cache,
            metrics: Default::default(),
            concurrency: FETCH_CONCURRENCY,
        }
    }

    /// Change the limit of concurrent related fetches, at least one.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<MappingCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn entity_mapping<'p, T: Record, P: Persister<T> + ?Sized>(
        &self,
        persister: &'p P,
    ) -> Result<EntityMapping<'p, T>> {
        Ok(match persister.persistent_mapping() {
            Some(mapping) => EntityMapping::Borrowed(mapping),
            None => EntityMapping::Derived(MappingEntity::new(self.cache.mapping::<T>()?)),
        })
    }

    async fn execute(&self, executor: &dyn Executor, statement: Statement) -> Result<RowsAffected> {
        log::debug!("{statement}");
        executor
            .execute(statement)
            .await
            .inspect_err(|e| log::error!("{e:#}"))
    }

    /// Insert `entity` when it is transient, update it otherwise.
    ///
    /// Without an identifier generating persister, an entity is transient
    /// when its identifier is empty and receives a new one from the mapping.
    /// The primary key never appears in the `SET` list of an update.
    pub async fn store_entity<T, P>(
        &self,
        persister: &P,
        entity: &mut T,
        options: StoreOptions,
        executor: &dyn Executor,
    ) -> Result<()>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        let _timer = self.metrics.store.start();
        let mapping = self.entity_mapping(persister)?;
        self.store_related(persister, entity, options, executor)
            .await?;

        let current = mapping.persistent_id(entity)?;
        let (transient, id) = match persister.generates_identifiers() {
            Some(generator) => {
                let transient = generator.is_transient(entity, executor).await?;
                let id = if transient && current.is_empty() {
                    generator.generate_id(entity, executor).await?
                } else {
                    current
                };
                (transient, id)
            }
            None if current.is_empty() => (true, mapping.new_persistent_id(entity)?),
            None => (false, current),
        };

        let values = mapping.persistent_values(entity)?;
        let keys = mapping.primary_keys();
        let [key] = keys.as_slice() else {
            return Err(PersistError::configuration(format!(
                "Primary key count is invalid for {}: {} != 1",
                any::type_name::<T>(),
                keys.len()
            )));
        };

        let table = persister.table();
        let (mut columns, mut args) = values.keys_values();
        if transient {
            let _timer = self.metrics.store_insert.start();
            columns.push(key.clone());
            args.push(id.clone());
            let mut sql = format!("INSERT INTO {table} (");
            separated_by(&mut sql, &columns, |out, v| out.push_str(v), ", ");
            sql.push_str(") VALUES (");
            write_placeholders(&mut sql, args.len());
            sql.push(')');
            self.execute(executor, Statement::new(sql, args)).await?;
            mapping.set_persistent_id(entity, id)?;
        } else if columns.is_empty() {
            log::debug!(
                "Nothing to update for {} with {key} = {id}",
                any::type_name::<T>()
            );
        } else {
            let _timer = self.metrics.store_update.start();
            let mut sql = format!("UPDATE {table} SET ");
            write_assignments(&mut sql, &columns);
            sql.push_str(&format!(" WHERE {key} = ${}", columns.len() + 1));
            args.push(id);
            self.execute(executor, Statement::new(sql, args)).await?;
        }

        self.store_references(persister, entity, options, executor)
            .await
    }

    /// Run a counting query and return the first column of its first row.
    pub async fn count_entities(
        &self,
        executor: &dyn Executor,
        sql: &str,
        args: Vec<Value>,
    ) -> Result<i64> {
        let statement = Statement::new(sql, args);
        log::debug!("{statement}");
        let row = executor
            .query_row(statement)
            .await?
            .ok_or(PersistError::NotFound)?;
        let value = row.values.into_vec().into_iter().next().unwrap_or_default();
        i64::try_from_value(value).context("Could not read the count")
    }

    fn open<'e, T, P>(
        &self,
        persister: &'e P,
        options: FetchOptions,
        executor: &'e dyn Executor,
        template: &str,
        args: Vec<Value>,
    ) -> Result<Iter<'e, T, P>>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        let mapping = self.entity_mapping(persister)?;
        let mut available = mapping.primary_keys();
        available.extend(mapping.columns());
        let query = pql::parse(template, &available)?;
        let statement = Statement::new(query.sql.clone(), args);
        log::debug!("{statement}");
        let rows = executor.query(statement);
        Ok(Iter::new(
            rows,
            self.clone(),
            options,
            executor,
            persister,
            mapping,
            query,
        ))
    }

    /// Fetch the first row of `template` into `entity`.
    ///
    /// Fails with [`PersistError::NotFound`] when the query returns no rows.
    pub async fn fetch_entity<T, P>(
        &self,
        persister: &P,
        entity: &mut T,
        options: FetchOptions,
        executor: &dyn Executor,
        template: &str,
        args: Vec<Value>,
    ) -> Result<()>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        let _timer = self.metrics.fetch_one.start();
        let mut iter = self.open(persister, options, executor, template, args)?;
        if !iter.next().await? {
            return Err(PersistError::NotFound.into());
        }
        let result = iter.scan(entity).await;
        iter.close();
        result
    }

    /// Fetch every row of `template`, in result order.
    ///
    /// With [`FetchOptions::CONCURRENT`] the related fetches of different rows
    /// overlap, at most [`Orm::concurrency`] at a time. Rows are still scanned
    /// one after the other. The first failure is returned once every started
    /// fetch completed.
    pub async fn fetch_entities<T, P>(
        &self,
        persister: &P,
        options: FetchOptions,
        executor: &dyn Executor,
        template: &str,
        args: Vec<Value>,
    ) -> Result<Vec<T>>
    where
        T: Record + Default,
        P: Persister<T> + ?Sized,
    {
        let _timer = self.metrics.fetch_many.start();
        let mut iter = self.open(persister, options, executor, template, args)?;
        let concurrent = options.contains(FetchOptions::CONCURRENT)
            && options.contains(FetchOptions::FETCH_RELATED)
            && (persister.fetches_related_extra().is_some()
                || persister.fetches_related().is_some());
        let result = if concurrent {
            self.fetch_concurrent(&mut iter, persister, options, executor)
                .await
        } else {
            let mut result = Vec::new();
            loop {
                match iter.next().await {
                    Ok(true) => {}
                    Ok(false) => break Ok(result),
                    Err(error) => break Err(error),
                }
                let mut entity = T::default();
                if let Err(error) = iter.scan(&mut entity).await {
                    break Err(error);
                }
                result.push(entity);
            }
        };
        iter.close();
        result
    }

    async fn fetch_concurrent<'e, T, P>(
        &self,
        iter: &mut Iter<'e, T, P>,
        persister: &'e P,
        options: FetchOptions,
        executor: &'e dyn Executor,
    ) -> Result<Vec<T>>
    where
        T: Record + Default,
        P: Persister<T> + ?Sized,
    {
        let scanned = async_stream::stream! {
            let mut slot = 0;
            loop {
                match iter.next().await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(error) => {
                        yield Err(error);
                        break;
                    }
                }
                let mut entity = T::default();
                match iter.scan_row(&mut entity) {
                    Ok(extra) => {
                        yield Ok((slot, entity, extra));
                        slot += 1;
                    }
                    Err(error) => {
                        yield Err(error);
                        break;
                    }
                }
            }
        };
        let mut fetched = pin!(
            scanned
                .map(move |item: Result<(usize, T, Columns)>| async move {
                    let (slot, mut entity, extra) = item?;
                    self.fetch_related(persister, &mut entity, &extra, options, executor)
                        .await
                        .with_context(|| format!("Sub-fetch ({})", any::type_name::<T>()))?;
                    Ok::<_, Error>((slot, entity))
                })
                .buffer_unordered(self.concurrency)
        );
        let mut slots: Vec<Option<T>> = Vec::new();
        let mut failure: Option<Error> = None;
        while let Some(result) = fetched.next().await {
            match result {
                Ok((slot, entity)) => {
                    if slots.len() <= slot {
                        slots.resize_with(slot + 1, || None);
                    }
                    slots[slot] = Some(entity);
                }
                Err(error) if failure.is_none() => {
                    log::warn!("{error:#}");
                    failure = Some(error);
                }
                Err(error) => log::debug!("Ignoring a later sub-fetch failure: {error:#}"),
            }
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(slots.into_iter().flatten().collect()),
        }
    }

    /// Open a cursor over the rows of `template`.
    pub fn iter_entities<'e, T, P>(
        &self,
        persister: &'e P,
        options: FetchOptions,
        executor: &'e dyn Executor,
        template: &str,
        args: Vec<Value>,
    ) -> Result<Iter<'e, T, P>>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        let _timer = self.metrics.iter.start();
        self.open(persister, options, executor, template, args)
    }

    /// Delete `entity` by its primary key.
    ///
    /// Fails with [`PersistError::Transient`] before touching the store when
    /// the entity has no identifier.
    pub async fn delete_entity<T, P>(
        &self,
        persister: &P,
        entity: &T,
        options: StoreOptions,
        executor: &dyn Executor,
    ) -> Result<()>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        let _timer = self.metrics.delete.start();
        let mapping = self.entity_mapping(persister)?;
        let id = mapping.persistent_id(entity)?;
        if id.is_empty() {
            return Err(PersistError::Transient.into());
        }
        let keys = mapping.primary_keys();
        let [key] = keys.as_slice() else {
            return Err(PersistError::configuration(format!(
                "Primary key count is invalid for {}: {} != 1",
                any::type_name::<T>(),
                keys.len()
            )));
        };
        self.delete_references(persister, entity, options, executor)
            .await?;
        self.delete_related(persister, entity, options, executor)
            .await?;
        let sql = format!("DELETE FROM {} WHERE {key} = $1", persister.table());
        self.execute(executor, Statement::new(sql, vec![id]))
            .await?;
        Ok(())
    }

    pub async fn store_related<T, P>(
        &self,
        persister: &P,
        entity: &mut T,
        options: StoreOptions,
        executor: &dyn Executor,
    ) -> Result<()>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        match persister.stores_related() {
            Some(v) if options.contains(StoreOptions::STORE_RELATED) => {
                v.store_related(entity, options, executor).await
            }
            _ => Ok(()),
        }
    }

    pub async fn store_references<T, P>(
        &self,
        persister: &P,
        entity: &mut T,
        options: StoreOptions,
        executor: &dyn Executor,
    ) -> Result<()>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        match persister.stores_references() {
            Some(v) if options.contains(StoreOptions::STORE_REFERENCES) => {
                v.store_references(entity, options, executor).await
            }
            _ => Ok(()),
        }
    }

    /// Fetch the related entities of `entity`, preferring the variant that
    /// receives the foreign key columns of the row.
    pub async fn fetch_related<T, P>(
        &self,
        persister: &P,
        entity: &mut T,
        extra: &Columns,
        options: FetchOptions,
        executor: &dyn Executor,
    ) -> Result<()>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        if !options.contains(FetchOptions::FETCH_RELATED) {
            return Ok(());
        }
        if let Some(v) = persister.fetches_related_extra() {
            v.fetch_related_extra(entity, extra, options, executor)
                .await
        } else if let Some(v) = persister.fetches_related() {
            v.fetch_related(entity, options, executor).await
        } else {
            Ok(())
        }
    }

    pub async fn delete_related<T, P>(
        &self,
        persister: &P,
        entity: &T,
        options: StoreOptions,
        executor: &dyn Executor,
    ) -> Result<()>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        match persister.deletes_related() {
            Some(v) if options.contains(StoreOptions::DELETE_ORPHANS) => {
                v.delete_related(entity, options, executor).await
            }
            _ => Ok(()),
        }
    }

    pub async fn delete_references<T, P>(
        &self,
        persister: &P,
        entity: &T,
        options: StoreOptions,
        executor: &dyn Executor,
    ) -> Result<()>
    where
        T: Record,
        P: Persister<T> + ?Sized,
    {
        match persister.deletes_references() {
            Some(v) if options.contains(StoreOptions::DELETE_REFERENCES) => {
                v.delete_references(entity, options, executor).await
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FETCH_CONCURRENCY, Orm};

    #[test]
    fn concurrency_limit() {
        let orm = Orm::default();
        assert_eq!(orm.concurrency(), FETCH_CONCURRENCY);
        assert_eq!(orm.clone().with_concurrency(0).concurrency(), 1);
        assert_eq!(orm.with_concurrency(3).concurrency(), 3);
    }
}
