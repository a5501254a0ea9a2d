use std::{
    sync::{
        LazyLock, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use stow::{
    AsValue, Columns, DeletesReferences, DeletesRelated, Error, Executor, FetchOptions,
    FetchesRelated, FetchesRelatedExtra, ForeignEntity, GeneratesIdentifiers, Iter, Orm,
    Persister, Range, Record, Result, StoreOptions, StoresReferences, StoresRelated, Value,
    future::{BoxFuture, FutureExt},
};
use uuid::Uuid;

pub const FOREIGN_TABLE: &str = "persist_test_foreign";
pub const TESTER_TABLE: &str = "persist_test";
pub const NOTE_TABLE: &str = "persist_test_note";
pub const ITEM_TABLE: &str = "persist_test_item";

/// Serializes the scenarios sharing the tester tables.
pub(crate) static TESTER_MUTEX: LazyLock<tokio::sync::Mutex<()>> =
    LazyLock::new(|| tokio::sync::Mutex::new(()));

#[derive(Record, Debug, Default, Clone, PartialEq)]
pub struct Foreign {
    #[stow(column = "id,pk")]
    pub id: Option<Uuid>,
    #[stow(column = "value")]
    pub value: String,
}

impl ForeignEntity for Foreign {
    fn foreign_key(&self) -> Value {
        self.id.as_value()
    }
}

#[derive(Record, Debug, Default, Clone, PartialEq)]
pub struct NamedInline {
    #[stow(column = "named_a")]
    pub a: bool,
    #[stow(column = "named_b")]
    pub b: String,
}

#[derive(Record, Debug, Default, Clone, PartialEq)]
pub struct InlineBlock {
    #[stow(column = "inline_a")]
    pub a: String,
    #[stow(column = "inline_b")]
    pub b: i32,
}

/// Entity with a string key assigned by its persister, a foreign reference and
/// two inline blocks.
#[derive(Record, Debug, Default, Clone, PartialEq)]
pub struct Tester {
    #[stow(column = "id,pk")]
    pub id: String,
    #[stow(column = "name")]
    pub name: String,
    #[stow(column = "foreign_id,fk")]
    pub foreign: Option<Box<Foreign>>,
    #[stow(column = ",inline")]
    pub named: Option<Box<NamedInline>>,
    #[stow(column = ",inline")]
    pub inline: InlineBlock,
}

impl Tester {
    pub fn numbered(i: i32) -> Self {
        Self {
            name: format!("{i:04} This is the name"),
            named: Some(Box::new(NamedInline {
                a: true,
                b: format!("Named inline struct B #{i}"),
            })),
            inline: InlineBlock {
                a: format!("Anonymous inline struct A #{i}"),
                b: i,
            },
            ..Default::default()
        }
    }
}

#[derive(Default)]
pub struct ForeignPersister;

impl Persister<Foreign> for ForeignPersister {
    fn table(&self) -> &str {
        FOREIGN_TABLE
    }
}

pub struct TesterPersister {
    pub orm: Orm,
}

impl TesterPersister {
    pub fn new(orm: Orm) -> Self {
        Self { orm }
    }

    pub async fn store(
        &self,
        entity: &mut Tester,
        options: StoreOptions,
        executor: &dyn Executor,
    ) -> Result<()> {
        self.orm.store_entity(self, entity, options, executor).await
    }

    pub async fn fetch(
        &self,
        id: &str,
        options: FetchOptions,
        executor: &dyn Executor,
    ) -> Result<Tester> {
        let mut entity = Tester::default();
        self.orm
            .fetch_entity(
                self,
                &mut entity,
                options,
                executor,
                "SELECT {*} FROM persist_test WHERE id = $1",
                vec![id.to_string().into()],
            )
            .await?;
        Ok(entity)
    }

    pub async fn fetch_range(
        &self,
        range: Range,
        options: FetchOptions,
        executor: &dyn Executor,
    ) -> Result<Vec<Tester>> {
        self.orm
            .fetch_entities(
                self,
                options,
                executor,
                "SELECT {*} FROM persist_test ORDER BY name OFFSET $1 LIMIT $2",
                range.args().into(),
            )
            .await
    }

    /// Iterates every tester by name. The trailing `name` column maps to no
    /// field and is discarded on scan.
    pub fn iter<'e>(
        &'e self,
        options: FetchOptions,
        executor: &'e dyn Executor,
    ) -> Result<Iter<'e, Tester, Self>> {
        self.orm.iter_entities(
            self,
            options,
            executor,
            "SELECT {*}, name FROM persist_test ORDER BY name",
            vec![],
        )
    }

    pub async fn delete(
        &self,
        entity: &Tester,
        options: StoreOptions,
        executor: &dyn Executor,
    ) -> Result<()> {
        self.orm
            .delete_entity(self, entity, options, executor)
            .await
    }

    pub async fn count(&self, executor: &dyn Executor) -> Result<i64> {
        self.orm
            .count_entities(executor, "SELECT COUNT(*) FROM persist_test", vec![])
            .await
    }
}

impl Persister<Tester> for TesterPersister {
    fn table(&self) -> &str {
        TESTER_TABLE
    }
    fn generates_identifiers(&self) -> Option<&dyn GeneratesIdentifiers<Tester>> {
        Some(self)
    }
    fn stores_related(&self) -> Option<&dyn StoresRelated<Tester>> {
        Some(self)
    }
    fn fetches_related_extra(&self) -> Option<&dyn FetchesRelatedExtra<Tester>> {
        Some(self)
    }
}

impl GeneratesIdentifiers<Tester> for TesterPersister {
    fn is_transient<'a>(
        &'a self,
        entity: &'a Tester,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<bool>> {
        async move {
            if entity.id.is_empty() {
                return Ok(true);
            }
            let count = self
                .orm
                .count_entities(
                    executor,
                    "SELECT COUNT(*) FROM persist_test WHERE id = $1",
                    vec![entity.id.clone().into()],
                )
                .await?;
            Ok(count == 0)
        }
        .boxed()
    }

    fn generate_id<'a>(
        &'a self,
        _entity: &'a Tester,
        _executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<Value>> {
        async move { Ok(Uuid::new_v4().to_string().into()) }.boxed()
    }
}

impl StoresRelated<Tester> for TesterPersister {
    fn store_related<'a>(
        &'a self,
        entity: &'a mut Tester,
        options: StoreOptions,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            if let Some(foreign) = entity.foreign.as_deref_mut() {
                self.orm
                    .store_entity(&ForeignPersister, foreign, options, executor)
                    .await?;
            }
            Ok(())
        }
        .boxed()
    }
}

impl FetchesRelatedExtra<Tester> for TesterPersister {
    fn fetch_related_extra<'a>(
        &'a self,
        entity: &'a mut Tester,
        extra: &'a Columns,
        options: FetchOptions,
        executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let Some(id) = extra.get("foreign_id").filter(|v| !v.is_null()) else {
                return Ok(());
            };
            let mut foreign = Foreign::default();
            self.orm
                .fetch_entity(
                    &ForeignPersister,
                    &mut foreign,
                    options,
                    executor,
                    "SELECT {*} FROM persist_test_foreign WHERE id = $1",
                    vec![id.clone()],
                )
                .await?;
            entity.foreign = Some(Box::new(foreign));
            Ok(())
        }
        .boxed()
    }
}

#[derive(Record, Debug, Default, Clone, PartialEq)]
pub struct Note {
    #[stow(column = "id,pk")]
    pub id: Option<Uuid>,
    #[stow(column = "text")]
    pub text: String,
}

/// Implements every capability and records which ones the runtime invoked.
#[derive(Default)]
pub struct RecordingPersister {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingPersister {
    /// Calls recorded since the last take.
    pub fn take_calls(&self) -> Vec<&'static str> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record(&self, call: &'static str) -> BoxFuture<'_, Result<()>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        async { Ok(()) }.boxed()
    }
}

impl Persister<Note> for RecordingPersister {
    fn table(&self) -> &str {
        NOTE_TABLE
    }
    fn stores_related(&self) -> Option<&dyn StoresRelated<Note>> {
        Some(self)
    }
    fn stores_references(&self) -> Option<&dyn StoresReferences<Note>> {
        Some(self)
    }
    fn fetches_related(&self) -> Option<&dyn FetchesRelated<Note>> {
        Some(self)
    }
    fn fetches_related_extra(&self) -> Option<&dyn FetchesRelatedExtra<Note>> {
        Some(self)
    }
    fn deletes_related(&self) -> Option<&dyn DeletesRelated<Note>> {
        Some(self)
    }
    fn deletes_references(&self) -> Option<&dyn DeletesReferences<Note>> {
        Some(self)
    }
}

impl StoresRelated<Note> for RecordingPersister {
    fn store_related<'a>(
        &'a self,
        _entity: &'a mut Note,
        _options: StoreOptions,
        _executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>> {
        self.record("store_related")
    }
}

impl StoresReferences<Note> for RecordingPersister {
    fn store_references<'a>(
        &'a self,
        _entity: &'a mut Note,
        _options: StoreOptions,
        _executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>> {
        self.record("store_references")
    }
}

impl FetchesRelated<Note> for RecordingPersister {
    fn fetch_related<'a>(
        &'a self,
        _entity: &'a mut Note,
        _options: FetchOptions,
        _executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>> {
        self.record("fetch_related")
    }
}

impl FetchesRelatedExtra<Note> for RecordingPersister {
    fn fetch_related_extra<'a>(
        &'a self,
        _entity: &'a mut Note,
        _extra: &'a Columns,
        _options: FetchOptions,
        _executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>> {
        self.record("fetch_related_extra")
    }
}

impl DeletesRelated<Note> for RecordingPersister {
    fn delete_related<'a>(
        &'a self,
        _entity: &'a Note,
        _options: StoreOptions,
        _executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>> {
        self.record("delete_related")
    }
}

impl DeletesReferences<Note> for RecordingPersister {
    fn delete_references<'a>(
        &'a self,
        _entity: &'a Note,
        _options: StoreOptions,
        _executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>> {
        self.record("delete_references")
    }
}

#[derive(Record, Debug, Default, Clone, PartialEq)]
pub struct Item {
    #[stow(column = "id,pk")]
    pub id: Option<Uuid>,
    #[stow(column = "position")]
    pub position: i32,
    pub fetched: bool,
}

/// Slow related fetch tracking how many run at once.
#[derive(Default)]
pub struct ItemPersister {
    pub fail_at: Option<i32>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

impl ItemPersister {
    pub fn failing_at(position: i32) -> Self {
        Self {
            fail_at: Some(position),
            ..Default::default()
        }
    }

    /// Highest number of related fetches observed running together.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Persister<Item> for ItemPersister {
    fn table(&self) -> &str {
        ITEM_TABLE
    }
    fn fetches_related(&self) -> Option<&dyn FetchesRelated<Item>> {
        Some(self)
    }
}

impl FetchesRelated<Item> for ItemPersister {
    fn fetch_related<'a>(
        &'a self,
        entity: &'a mut Item,
        _options: FetchOptions,
        _executor: &'a dyn Executor,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            // Earlier rows sleep longer so completion order differs from row order
            let delay = 40u64.saturating_sub(entity.position as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(entity.position) {
                return Err(Error::msg(format!(
                    "Item at position {} is broken",
                    entity.position
                )));
            }
            entity.fetched = true;
            Ok(())
        }
        .boxed()
    }
}
