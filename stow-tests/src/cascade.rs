use crate::{Note, RecordingPersister};
use std::sync::LazyLock;
use stow::{Executor, FetchOptions, Orm, StoreOptions};
use tokio::sync::Mutex;

pub async fn cascade_options<E: Executor>(orm: &Orm, executor: &E) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;
    executor
        .execute("DELETE FROM persist_test_note".into())
        .await
        .expect("Failed to clear persist_test_note");
    let persister = RecordingPersister::default();

    let mut note = Note {
        id: None,
        text: "first".into(),
    };
    orm.store_entity(&persister, &mut note, StoreOptions::NONE, executor)
        .await
        .expect("Failed to store the note");
    assert!(note.id.is_some());
    assert!(persister.take_calls().is_empty());

    let cases = [
        (StoreOptions::STORE_REFERENCES, vec!["store_references"]),
        (
            StoreOptions::STORE_RELATED,
            vec!["store_related", "store_references"],
        ),
        (
            StoreOptions::CASCADE,
            vec!["store_related", "store_references"],
        ),
        (StoreOptions::DELETE_ORPHANS, vec![]),
        (StoreOptions::user(1), vec![]),
    ];
    for (options, expected) in cases {
        orm.store_entity(&persister, &mut note, options, executor)
            .await
            .expect("Failed to store the note");
        assert_eq!(persister.take_calls(), expected, "{options:?}");
    }

    // The variant receiving the foreign key columns wins
    let template = "SELECT {*} FROM persist_test_note WHERE id = $1";
    let id = vec![note.id.into()];
    let cases = [
        (FetchOptions::NONE, vec![]),
        (FetchOptions::CONCURRENT, vec![]),
        (FetchOptions::FETCH_RELATED, vec!["fetch_related_extra"]),
    ];
    for (options, expected) in cases {
        let mut fetched = Note::default();
        orm.fetch_entity(&persister, &mut fetched, options, executor, template, id.clone())
            .await
            .expect("Failed to fetch the note");
        assert_eq!(fetched, note);
        assert_eq!(persister.take_calls(), expected, "{options:?}");
    }
    let all: Vec<Note> = orm
        .fetch_entities(
            &persister,
            FetchOptions::CASCADE | FetchOptions::CONCURRENT,
            executor,
            "SELECT {*} FROM persist_test_note",
            vec![],
        )
        .await
        .expect("Failed to fetch the notes");
    assert_eq!(all, [note.clone()]);
    assert_eq!(persister.take_calls(), ["fetch_related_extra"]);

    let cases = [
        (StoreOptions::STORE_RELATED, vec![]),
        (StoreOptions::DELETE_REFERENCES, vec!["delete_references"]),
        (
            StoreOptions::DELETE_ORPHANS,
            vec!["delete_references", "delete_related"],
        ),
    ];
    for (options, expected) in cases {
        let mut note = Note {
            id: None,
            text: format!("{options:?}"),
        };
        orm.store_entity(&persister, &mut note, StoreOptions::NONE, executor)
            .await
            .expect("Failed to store the note");
        orm.delete_entity(&persister, &note, options, executor)
            .await
            .expect("Failed to delete the note");
        assert_eq!(persister.take_calls(), expected, "{options:?}");
    }
}
