use crate::{Item, ItemPersister, silent_logs};
use std::sync::LazyLock;
use stow::{Executor, FetchOptions, Orm, Result, StoreOptions};
use tokio::sync::Mutex;

const ITEMS: i32 = 25;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

async fn store_items<E: Executor>(orm: &Orm, executor: &E) {
    executor
        .execute("DELETE FROM persist_test_item".into())
        .await
        .expect("Failed to clear persist_test_item");
    let persister = ItemPersister::default();
    for position in 0..ITEMS {
        let mut item = Item {
            position,
            ..Default::default()
        };
        orm.store_entity(&persister, &mut item, StoreOptions::NONE, executor)
            .await
            .expect("Failed to store an item");
    }
}

async fn fetch_items<E: Executor>(
    orm: &Orm,
    persister: &ItemPersister,
    options: FetchOptions,
    executor: &E,
) -> Result<Vec<Item>> {
    orm.fetch_entities(
        persister,
        options,
        executor,
        "SELECT {*} FROM persist_test_item ORDER BY position",
        vec![],
    )
    .await
}

pub async fn concurrent_ordering<E: Executor>(orm: &Orm, executor: &E) {
    let _lock = MUTEX.lock().await;
    store_items(orm, executor).await;
    let options = FetchOptions::FETCH_RELATED | FetchOptions::CONCURRENT;

    for limit in [orm.concurrency(), 3, 1] {
        let orm = orm.clone().with_concurrency(limit);
        let persister = ItemPersister::default();
        let items = fetch_items(&orm, &persister, options, executor)
            .await
            .expect("Failed to fetch the items concurrently");
        let positions: Vec<i32> = items.iter().map(|v| v.position).collect();
        assert_eq!(positions, (0..ITEMS).collect::<Vec<_>>());
        assert!(items.iter().all(|v| v.fetched));
        assert!(persister.peak() <= limit, "{} > {limit}", persister.peak());
        if limit > 1 {
            assert!(persister.peak() > 1, "Related fetches did not overlap");
        }
    }

    // Without the concurrent option related fetches run one at a time
    let persister = ItemPersister::default();
    let items = fetch_items(orm, &persister, FetchOptions::FETCH_RELATED, executor)
        .await
        .expect("Failed to fetch the items");
    assert_eq!(items.len(), ITEMS as usize);
    assert_eq!(persister.peak(), 1);

    let persister = ItemPersister::default();
    let items = fetch_items(orm, &persister, FetchOptions::CONCURRENT, executor)
        .await
        .expect("Failed to fetch the items");
    assert!(items.iter().all(|v| !v.fetched));
    assert_eq!(persister.finished(), 0);
}

pub async fn concurrent_failure<E: Executor>(orm: &Orm, executor: &E) {
    let _lock = MUTEX.lock().await;
    store_items(orm, executor).await;
    let persister = ItemPersister::failing_at(3);
    silent_logs! {
        let error = fetch_items(
            orm,
            &persister,
            FetchOptions::FETCH_RELATED | FetchOptions::CONCURRENT,
            executor,
        )
        .await
        .expect_err("A failing related fetch should fail the whole fetch");
        let message = format!("{error:#}");
        assert!(message.contains("Sub-fetch"), "{message}");
        assert!(message.contains("Item at position 3 is broken"), "{message}");
    }
    // Every started fetch ran to completion before the failure was reported
    assert_eq!(persister.finished(), ITEMS as usize);
}
