use crate::{Tester, TesterPersister, entities::TESTER_MUTEX};
use stow::{Executor, FetchOptions, Orm, Range, StoreOptions};

async fn store_numbered<E: Executor>(
    testers: &TesterPersister,
    executor: &E,
    n: i32,
) -> Vec<Tester> {
    executor
        .execute("DELETE FROM persist_test".into())
        .await
        .expect("Failed to clear persist_test");
    let mut result = Vec::with_capacity(n as usize);
    for i in 0..n {
        let mut entity = Tester::numbered(i);
        testers
            .store(&mut entity, StoreOptions::CASCADE, executor)
            .await
            .expect("Failed to store a numbered tester");
        assert!(!entity.id.is_empty());
        result.push(entity);
    }
    result
}

pub async fn fetch_one<E: Executor>(orm: &Orm, executor: &E) {
    let _lock = TESTER_MUTEX.lock().await;
    let testers = TesterPersister::new(orm.clone());
    executor
        .execute("DELETE FROM persist_test".into())
        .await
        .expect("Failed to clear persist_test");
    for i in 0..100 {
        let mut entity = Tester::numbered(i);
        testers
            .store(&mut entity, StoreOptions::CASCADE, executor)
            .await
            .expect("Failed to store a numbered tester");
        let fetched = testers
            .fetch(&entity.id, FetchOptions::CASCADE, executor)
            .await
            .expect("Failed to fetch a numbered tester");
        assert_eq!(fetched, entity);
    }
}

pub async fn fetch_many<E: Executor>(orm: &Orm, executor: &E) {
    let _lock = TESTER_MUTEX.lock().await;
    let testers = TesterPersister::new(orm.clone());
    let stored = store_numbered(&testers, executor, 100).await;

    let all = testers
        .fetch_range(Range::new(0, 100), FetchOptions::CASCADE, executor)
        .await
        .expect("Failed to fetch the testers");
    assert_eq!(all, stored);

    let window = testers
        .fetch_range(Range::new(20, 10), FetchOptions::CASCADE, executor)
        .await
        .expect("Failed to fetch a window of testers");
    assert_eq!(window, &stored[20..30]);

    let concurrent = testers
        .fetch_range(
            Range::new(0, 100),
            FetchOptions::CASCADE | FetchOptions::CONCURRENT,
            executor,
        )
        .await
        .expect("Failed to fetch the testers concurrently");
    assert_eq!(concurrent, stored);

    let past_the_end = testers
        .fetch_range(Range::new(100, 10), FetchOptions::CASCADE, executor)
        .await
        .expect("Failed to fetch past the last tester");
    assert!(past_the_end.is_empty());
}

pub async fn iterate<E: Executor>(orm: &Orm, executor: &E) {
    let _lock = TESTER_MUTEX.lock().await;
    let testers = TesterPersister::new(orm.clone());
    let stored = store_numbered(&testers, executor, 1000).await;

    let mut iter = testers
        .iter(FetchOptions::CASCADE, executor)
        .expect("Failed to open the tester iterator");
    let mut i = 0;
    while iter.next().await.expect("Failed to advance the iterator") {
        let mut entity = Tester::default();
        iter.scan(&mut entity)
            .await
            .expect("Failed to scan a tester");
        assert_eq!(entity, stored[i]);
        i += 1;
    }
    assert_eq!(i, stored.len());
    assert_eq!(iter.count(), stored.len());
    assert!(iter.is_closed());
    iter.close();
    iter.close();
    assert!(!iter.next().await.expect("A closed iterator should not fail"));

    // Scanning requires a current row
    let mut iter = testers
        .iter(FetchOptions::NONE, executor)
        .expect("Failed to open the tester iterator");
    let mut entity = Tester::default();
    assert!(iter.scan(&mut entity).await.is_err());
    assert!(iter.next().await.expect("Failed to advance the iterator"));
    iter.scan(&mut entity)
        .await
        .expect("Failed to scan the first tester");
    assert_eq!(entity, stored[0]);
    iter.close();
    assert!(iter.is_closed());
}
