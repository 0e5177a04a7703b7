use std::collections::HashSet;
use todo_core::{NewTodo, StoreError, TodoPatch, TodoStore};
use uuid::Uuid;

#[tokio::test]
async fn open_in_memory_seeds_two_todos() {
    let store = TodoStore::open_in_memory().await.unwrap();

    let todos = store.list(None).await.unwrap();
    assert_eq!(todos.len(), 2);
    let titles: HashSet<_> = todos.iter().map(|todo| todo.title.as_str()).collect();
    assert!(titles.contains("Learn TypeScript"));
    assert!(titles.contains("Build a REST API"));
    assert_eq!(todos.iter().filter(|todo| todo.done).count(), 1);
}

#[tokio::test]
async fn reopening_populated_file_store_does_not_reseed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.sqlite");

    let store = TodoStore::open(&path).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
    store.close().await.unwrap();

    let store = TodoStore::open(&path).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
    store.close().await.unwrap();
}

#[tokio::test]
async fn reopening_store_emptied_by_user_seeds_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.sqlite");

    let store = TodoStore::open(&path).await.unwrap();
    for todo in store.list(None).await.unwrap() {
        assert!(store.delete(todo.id).await.unwrap());
    }
    store.close().await.unwrap();

    let store = TodoStore::open(&path).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn create_then_get_returns_identical_record() {
    let store = TodoStore::open_in_memory().await.unwrap();

    let created = store
        .create(NewTodo::new("Write report").with_description("quarterly numbers"))
        .await
        .unwrap();
    let loaded = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(loaded, created);

    let bare = store.create(NewTodo::new("No description")).await.unwrap();
    assert!(bare.description.is_none());
    assert!(store.get(bare.id).await.unwrap().unwrap().description.is_none());
}

#[tokio::test]
async fn list_puts_latest_creation_first() {
    let store = TodoStore::open_in_memory().await.unwrap();

    let a = store.create(NewTodo::new("todo A")).await.unwrap();
    let b = store.create(NewTodo::new("todo B")).await.unwrap();

    let filtered = store.list(Some("todo ".to_string())).await.unwrap();
    let ids: Vec<_> = filtered.iter().map(|todo| todo.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);

    let all = store.list(None).await.unwrap();
    assert_eq!(all[0].id, b.id);
    assert_eq!(all[1].id, a.id);
}

#[tokio::test]
async fn update_and_delete_report_missing_ids() {
    let store = TodoStore::open_in_memory().await.unwrap();
    let missing = Uuid::new_v4();

    let err = store
        .update(
            missing,
            TodoPatch {
                done: Some(true),
                ..TodoPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert!(store.get(missing).await.unwrap().is_none());
    assert!(!store.delete(missing).await.unwrap());
}

#[tokio::test]
async fn update_changes_only_requested_fields() {
    let store = TodoStore::open_in_memory().await.unwrap();
    let created = store
        .create(NewTodo::new("Mow lawn").with_description("front and back"))
        .await
        .unwrap();

    let updated = store
        .update(
            created.id,
            TodoPatch {
                done: Some(true),
                ..TodoPatch::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.done);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn delete_then_get_reports_absence() {
    let store = TodoStore::open_in_memory().await.unwrap();
    let created = store.create(NewTodo::new("short lived")).await.unwrap();

    assert!(store.delete(created.id).await.unwrap());
    assert!(store.get(created.id).await.unwrap().is_none());
    assert!(!store.delete(created.id).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_from_clones_all_persist() {
    let store = TodoStore::open_in_memory().await.unwrap();

    let mut handles = Vec::new();
    for index in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .create(NewTodo::new(format!("parallel {index}")))
                .await
                .unwrap()
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().id);
    }
    assert_eq!(ids.len(), 16);
    assert_eq!(store.list(Some("parallel".to_string())).await.unwrap().len(), 16);
}

#[tokio::test]
async fn operations_after_close_fail_and_second_close_is_noop() {
    let store = TodoStore::open_in_memory().await.unwrap();
    let handle = store.clone();

    store.close().await.unwrap();
    store.close().await.unwrap();

    let err = handle.list(None).await.unwrap_err();
    assert!(matches!(err, StoreError::Closed));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn store_reads_and_writes_database_with_legacy_table_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.sqlite");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS todos (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            done INTEGER DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        INSERT INTO todos (id, title, description, done)
        VALUES ('00000000-0000-4000-8000-0000000000aa', 'Legacy', NULL, NULL);",
    )
    .unwrap();
    drop(conn);

    let store = TodoStore::open(&path).await.unwrap();
    let todos = store.list(None).await.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Legacy");
    assert!(!todos[0].done);
    assert!(todos[0].created_at > 0);

    let created = store.create(NewTodo::new("new")).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
    assert_eq!(store.list(None).await.unwrap()[0].id, created.id);
    store.close().await.unwrap();
}
