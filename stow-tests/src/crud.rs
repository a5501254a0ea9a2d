use crate::{
    Foreign, ForeignPersister, InlineBlock, NamedInline, Tester, TesterPersister,
    entities::TESTER_MUTEX, silent_logs,
};
use stow::{
    Executor, FetchOptions, GeneratesIdentifiers, Orm, Range, StoreOptions, is_not_found,
    is_transient,
};
use uuid::Uuid;

pub async fn crud<E: Executor>(orm: &Orm, executor: &E) {
    let _lock = TESTER_MUTEX.lock().await;
    executor
        .execute("DELETE FROM persist_test".into())
        .await
        .expect("Failed to clear persist_test");
    let testers = TesterPersister::new(orm.clone());

    let mut foreign = Foreign {
        id: None,
        value: "Foreign value".into(),
    };
    orm.store_entity(&ForeignPersister, &mut foreign, StoreOptions::NONE, executor)
        .await
        .expect("Failed to store the foreign entity");
    assert!(foreign.id.is_some());

    let mut entity = Tester {
        name: "This is the name".into(),
        foreign: Some(Box::new(foreign.clone())),
        named: Some(Box::new(NamedInline {
            a: true,
            b: "Named inline struct B".into(),
        })),
        inline: InlineBlock {
            a: "Anonymous inline struct A".into(),
            b: 998877,
        },
        ..Default::default()
    };

    let transient = testers
        .is_transient(&entity, executor)
        .await
        .expect("Failed to check a tester without id");
    assert!(transient);

    // An assigned id that was never stored is still transient
    entity.id = Uuid::new_v4().to_string();
    let transient = testers
        .is_transient(&entity, executor)
        .await
        .expect("Failed to check a tester with a new id");
    assert!(transient);

    testers
        .store(&mut entity, StoreOptions::CASCADE, executor)
        .await
        .expect("Failed to store the tester");

    let fetched = testers
        .fetch(&entity.id, FetchOptions::CASCADE, executor)
        .await
        .expect("Failed to fetch the tester");
    assert_eq!(fetched, entity);
    assert_eq!(fetched.foreign.as_deref(), Some(&foreign));

    let transient = testers
        .is_transient(&entity, executor)
        .await
        .expect("Failed to check a stored tester");
    assert!(!transient);

    let all = testers
        .fetch_range(Range::new(0, 100), FetchOptions::CASCADE, executor)
        .await
        .expect("Failed to fetch all the testers");
    assert_eq!(all, [entity.clone()]);

    // Update keeps the identifier
    let id = entity.id.clone();
    entity.name = "This is another name".into();
    entity.inline.b = -1;
    testers
        .store(&mut entity, StoreOptions::CASCADE, executor)
        .await
        .expect("Failed to update the tester");
    assert_eq!(entity.id, id);
    let fetched = testers
        .fetch(&id, FetchOptions::NONE, executor)
        .await
        .expect("Failed to fetch the updated tester");
    assert_eq!(fetched.name, "This is another name");
    assert_eq!(fetched.inline.b, -1);
    assert_eq!(fetched.foreign, None);
    assert_eq!(testers.count(executor).await.expect("Failed to count"), 1);

    testers
        .delete(&entity, StoreOptions::NONE, executor)
        .await
        .expect("Failed to delete the tester");
    let transient = testers
        .is_transient(&entity, executor)
        .await
        .expect("Failed to check a deleted tester");
    assert!(transient);
    assert_eq!(testers.count(executor).await.expect("Failed to count"), 0);
}

pub async fn missing_and_transient<E: Executor>(orm: &Orm, executor: &E) {
    let _lock = TESTER_MUTEX.lock().await;
    executor
        .execute("DELETE FROM persist_test".into())
        .await
        .expect("Failed to clear persist_test");
    let testers = TesterPersister::new(orm.clone());

    let error = testers
        .fetch("no such tester", FetchOptions::CASCADE, executor)
        .await
        .expect_err("Should not find a tester that was never stored");
    assert!(is_not_found(&error), "{error:#}");

    let entity = Tester::numbered(1);
    silent_logs! {
        let error = testers
            .delete(&entity, StoreOptions::CASCADE, executor)
            .await
            .expect_err("Should not delete a tester without id");
        assert!(is_transient(&error), "{error:#}");
    }
}
