#[cfg(test)]
mod tests {
    use stow::{FetchOptions, Orm, PersistError, StoreOptions, Value, is_unknown_columns};
    use stow_tests::{
        Foreign, MemoryExecutor, Tester, TesterPersister, execute_tests, init_logs, silent_logs,
    };
    use uuid::Uuid;

    #[tokio::test]
    async fn suite() {
        init_logs();
        let executor = MemoryExecutor::new();
        execute_tests(&executor).await;
    }

    #[tokio::test]
    async fn generated_statements() {
        init_logs();
        let executor = MemoryExecutor::new();
        let testers = TesterPersister::new(Orm::default());
        let foreign_id = Uuid::new_v4();
        let mut entity = Tester {
            foreign: Some(Box::new(Foreign {
                id: Some(foreign_id),
                value: "Foreign value".into(),
            })),
            ..Tester::numbered(7)
        };

        testers
            .store(&mut entity, StoreOptions::NONE, &executor)
            .await
            .expect("Failed to insert");
        let statements = executor.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].sql,
            "INSERT INTO persist_test (foreign_id, inline_a, inline_b, name, named_a, named_b, id) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );
        assert_eq!(
            statements[0].args,
            [
                Value::Uuid(Some(foreign_id)),
                Value::Varchar(Some("Anonymous inline struct A #7".into())),
                Value::Int32(Some(7)),
                Value::Varchar(Some("0007 This is the name".into())),
                Value::Boolean(Some(true)),
                Value::Varchar(Some("Named inline struct B #7".into())),
                Value::Varchar(Some(entity.id.clone())),
            ]
        );

        executor.clear_statements();
        entity.name = "Renamed".into();
        testers
            .store(&mut entity, StoreOptions::NONE, &executor)
            .await
            .expect("Failed to update");
        let statements = executor.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].sql,
            "SELECT COUNT(*) FROM persist_test WHERE id = $1"
        );
        assert_eq!(
            statements[1].sql,
            "UPDATE persist_test SET foreign_id = $1, inline_a = $2, inline_b = $3, name = $4, named_a = $5, named_b = $6 WHERE id = $7"
        );
        assert_eq!(statements[1].args[3], Value::Varchar(Some("Renamed".into())));

        executor.clear_statements();
        testers
            .delete(&entity, StoreOptions::CASCADE, &executor)
            .await
            .expect("Failed to delete");
        let statements = executor.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sql, "DELETE FROM persist_test WHERE id = $1");
        assert!(executor.rows("persist_test").is_empty());
    }

    #[tokio::test]
    async fn transient_delete_touches_nothing() {
        init_logs();
        let executor = MemoryExecutor::new();
        let testers = TesterPersister::new(Orm::default());
        let entity = Tester::numbered(1);
        let error = testers
            .delete(&entity, StoreOptions::CASCADE, &executor)
            .await
            .expect_err("A transient tester cannot be deleted");
        assert_eq!(PersistError::kind_of(&error), Some(&PersistError::Transient));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn unknown_columns() {
        init_logs();
        let executor = MemoryExecutor::new();
        let orm = Orm::default();
        let testers = TesterPersister::new(orm.clone());
        let mut entity = Tester::numbered(1);
        testers
            .store(&mut entity, StoreOptions::NONE, &executor)
            .await
            .expect("Failed to store");
        let mut fetched = Tester::default();
        let error = orm
            .fetch_entity(
                &testers,
                &mut fetched,
                FetchOptions::NONE,
                &executor,
                "SELECT {id, nickname} FROM persist_test",
                vec![],
            )
            .await
            .expect_err("An unmapped column inside a region should fail");
        assert!(is_unknown_columns(&error));
        let Some(PersistError::UnknownColumns { columns, .. }) = PersistError::kind_of(&error)
        else {
            panic!("Unexpected error: {error:#}");
        };
        assert_eq!(columns, &["nickname"]);

        // Trailing columns outside of any region are discarded
        orm.fetch_entity(
            &testers,
            &mut fetched,
            FetchOptions::NONE,
            &executor,
            "SELECT {*}, name, id FROM persist_test",
            vec![],
        )
        .await
        .expect("Failed to fetch with trailing columns");
        assert_eq!(fetched, entity);
    }

    #[tokio::test]
    async fn executor_failures() {
        init_logs();
        let executor = MemoryExecutor::new();
        let testers = TesterPersister::new(Orm::default());
        let mut entity = Tester::numbered(2);
        testers
            .store(&mut entity, StoreOptions::NONE, &executor)
            .await
            .expect("Failed to store");

        executor.fail_when("UPDATE");
        silent_logs! {
            let error = testers
                .store(&mut entity, StoreOptions::NONE, &executor)
                .await
                .expect_err("The update should fail");
            assert!(format!("{error:#}").contains("Injected failure"));
        }

        executor.fail_when("ORDER BY");
        let mut iter = testers
            .iter(FetchOptions::NONE, &executor)
            .expect("Failed to open the iterator");
        let error = iter
            .next()
            .await
            .expect_err("The query should fail");
        assert!(format!("{error:#}").contains("Could not query rows"));
        assert!(iter.is_closed());
        executor.clear_failure();

        let fetched = testers
            .fetch(&entity.id, FetchOptions::NONE, &executor)
            .await
            .expect("Failed to fetch after clearing the failure");
        assert_eq!(fetched, entity);
    }

    #[tokio::test]
    async fn metrics() {
        init_logs();
        let executor = MemoryExecutor::new();
        let orm = Orm::default();
        let testers = TesterPersister::new(orm.clone());
        for i in 0..3 {
            let mut entity = Tester::numbered(i);
            testers
                .store(&mut entity, StoreOptions::NONE, &executor)
                .await
                .expect("Failed to store");
        }
        testers
            .fetch_range(stow::Range::new(0, 10), FetchOptions::NONE, &executor)
            .await
            .expect("Failed to fetch");
        let count = |name: &str| {
            orm.metrics()
                .get(name)
                .unwrap_or_else(|| panic!("Missing timer {name}"))
                .count
        };
        assert_eq!(count("persist.store"), 3);
        assert_eq!(count("persist.store.insert"), 3);
        assert_eq!(count("persist.store.update"), 0);
        assert_eq!(count("persist.fetch.many"), 1);
        assert_eq!(count("persist.delete"), 0);
        assert_eq!(testers.count(&executor).await.expect("Failed to count"), 3);
    }
}
