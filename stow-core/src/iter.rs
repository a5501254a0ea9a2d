use crate::{
    Columns, EntityMapping, Error, Executor, FetchOptions, Orm, Persister, Record, Result,
    RowLabeled, pql,
    stream::{BoxStream, StreamExt},
};
use anyhow::Context;
use std::any;

/// Cursor over the rows of an entity query.
///
/// ```rust,ignore
/// let mut iter = orm.iter_entities(&persister, FetchOptions::NONE, &executor, "SELECT {*} FROM people", vec![])?;
/// while iter.next().await? {
///     let mut person = Person::default();
///     iter.scan(&mut person).await?;
/// }
/// iter.close();
/// ```
pub struct Iter<'e, T: Record, P: Persister<T> + ?Sized> {
    rows: Option<BoxStream<'e, Result<RowLabeled>>>,
    current: Option<RowLabeled>,
    orm: Orm,
    options: FetchOptions,
    executor: &'e dyn Executor,
    persister: &'e P,
    mapping: EntityMapping<'e, T>,
    query: pql::Query,
    count: usize,
    discard: Option<usize>,
}

impl<'e, T: Record, P: Persister<T> + ?Sized> Iter<'e, T, P> {
    pub(crate) fn new(
        rows: BoxStream<'e, Result<RowLabeled>>,
        orm: Orm,
        options: FetchOptions,
        executor: &'e dyn Executor,
        persister: &'e P,
        mapping: EntityMapping<'e, T>,
        query: pql::Query,
    ) -> Self {
        Self {
            rows: Some(rows),
            current: None,
            orm,
            options,
            executor,
            persister,
            mapping,
            query,
            count: 0,
            discard: None,
        }
    }

    /// Advance to the next row, `false` once the rows are exhausted or the
    /// iterator was closed.
    pub async fn next(&mut self) -> Result<bool> {
        let Some(rows) = self.rows.as_mut() else {
            return Ok(false);
        };
        match rows.next().await {
            Some(Ok(row)) => {
                self.current = Some(row);
                Ok(true)
            }
            Some(Err(error)) => {
                self.close();
                Err(error.context(format!(
                    "Could not query rows for {}",
                    any::type_name::<T>()
                )))
            }
            None => {
                self.close();
                Ok(false)
            }
        }
    }

    /// Assign the current row into `entity` without fetching related entities.
    ///
    /// Returns the foreign key columns of the row.
    pub fn scan_row(&mut self, entity: &mut T) -> Result<Columns> {
        let Some(row) = self.current.take() else {
            return Err(Error::msg(format!(
                "No current row to scan into {}, call `next` first",
                any::type_name::<T>()
            )));
        };
        self.count += 1;
        let mut dests = self.mapping.value_destinations(&self.query.columns)?;
        let discard = *self.discard.get_or_insert_with(|| {
            let discard = row.labels.len().saturating_sub(dests.len());
            if discard > 0 {
                log::trace!(
                    "Discarding {discard} unmapped trailing columns of {}",
                    any::type_name::<T>()
                );
            }
            discard
        });
        dests.push_discard(discard);
        let placeholders = dests
            .scan(entity, row.values.into_vec())
            .with_context(|| format!("Could not query rows for {}", any::type_name::<T>()))?;
        Ok(placeholders.deref_values())
    }

    /// Assign the current row into `entity`, then fetch its related entities
    /// when the options ask for it.
    pub async fn scan(&mut self, entity: &mut T) -> Result<()> {
        let extra = self.scan_row(entity)?;
        self.orm
            .fetch_related(self.persister, entity, &extra, self.options, self.executor)
            .await
            .with_context(|| format!("Could not fetch related for {}", any::type_name::<T>()))
    }

    /// Release the underlying rows. Calling it again has no effect.
    pub fn close(&mut self) {
        self.rows = None;
        self.current = None;
    }

    pub fn is_closed(&self) -> bool {
        self.rows.is_none()
    }

    /// Rows scanned so far.
    pub fn count(&self) -> usize {
        self.count
    }
}
