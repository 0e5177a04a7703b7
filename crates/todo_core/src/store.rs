//! Async todo store over one shared SQLite connection.
//!
//! # Responsibility
//! - Own the connection lifecycle: `open` → operations → `close`.
//! - Run every operation on tokio's blocking pool so request handling is
//!   never parked on SQLite I/O.
//!
//! # Invariants
//! - A `TodoStore` value exists only after migrations and seeding finished,
//!   so no operation can observe an unready schema.
//! - Only `close()` releases the connection; later operations fail with
//!   `StoreError::Closed`.
//! - Each operation is one repository call under the connection lock.
//! - A panic inside an operation does not wedge the store: every statement
//!   commits or rolls back on its own, so a poisoned lock is recovered.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::todo::{NewTodo, Todo, TodoId, TodoPatch};
use crate::repo::todo_repo::{RepoError, SqliteTodoRepository};
use crate::service::todo_service::TodoService;
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error surfaced by `TodoStore` operations.
#[derive(Debug)]
pub enum StoreError {
    /// Repository or database failure, including `RepoError::NotFound`.
    Repo(RepoError),
    /// The store was closed before the operation ran.
    Closed,
    /// The blocking worker task failed to complete.
    Worker(String),
}

impl StoreError {
    /// Returns whether this error is the typed "todo does not exist" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(RepoError::NotFound(_)))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Closed => write!(f, "todo store is closed"),
            Self::Worker(message) => write!(f, "todo store worker failed: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Cloneable handle to the todo store.
///
/// Clones share the same connection; construct once at startup and hand
/// clones to request handlers.
#[derive(Clone)]
pub struct TodoStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl TodoStore {
    /// Opens (or creates) a file-backed store, migrating and seeding it.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let conn = task::spawn_blocking(move || -> StoreResult<Connection> {
            bootstrap(open_db(&path)?)
        })
        .await
        .map_err(|err| StoreError::Worker(err.to_string()))??;
        Ok(Self::ready(conn))
    }

    /// Opens a private in-memory store, migrated and seeded.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let conn = task::spawn_blocking(|| -> StoreResult<Connection> {
            bootstrap(open_db_in_memory()?)
        })
        .await
        .map_err(|err| StoreError::Worker(err.to_string()))??;
        Ok(Self::ready(conn))
    }

    fn ready(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    /// Creates a todo with a store-assigned id.
    pub async fn create(&self, input: NewTodo) -> StoreResult<Todo> {
        self.with_service(move |service| service.create(&input)).await
    }

    /// Lists todos newest first; `filter` is a case-insensitive title substring.
    pub async fn list(&self, filter: Option<String>) -> StoreResult<Vec<Todo>> {
        self.with_service(move |service| service.list(filter.as_deref()))
            .await
    }

    /// Gets one todo; `Ok(None)` when it does not exist.
    pub async fn get(&self, id: TodoId) -> StoreResult<Option<Todo>> {
        self.with_service(move |service| service.get(id)).await
    }

    /// Partially updates a todo.
    ///
    /// Fails with an error for which `is_not_found()` holds when `id` is unknown.
    pub async fn update(&self, id: TodoId, patch: TodoPatch) -> StoreResult<Todo> {
        self.with_service(move |service| service.update(id, &patch)).await
    }

    /// Deletes a todo; returns whether a row was removed.
    pub async fn delete(&self, id: TodoId) -> StoreResult<bool> {
        self.with_service(move |service| service.delete(id)).await
    }

    pub async fn count(&self) -> StoreResult<u64> {
        self.with_service(|service| service.count()).await
    }

    /// Releases the underlying connection.
    ///
    /// Call once during orderly shutdown, after in-flight operations
    /// finished. A second call is a no-op.
    pub async fn close(&self) -> StoreResult<()> {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || -> StoreResult<()> {
            let mut guard = lock_connection(&conn);
            let Some(connection) = guard.take() else {
                warn!("event=store_close module=store status=skipped reason=already_closed");
                return Ok(());
            };
            if let Err((connection, err)) = connection.close() {
                *guard = Some(connection);
                return Err(StoreError::from(err));
            }
            info!("event=store_close module=store status=ok");
            Ok(())
        })
        .await
        .map_err(|err| StoreError::Worker(err.to_string()))?
    }

    async fn with_service<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&TodoService<SqliteTodoRepository<'c>>) -> Result<T, RepoError>
            + Send
            + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || -> StoreResult<T> {
            let mut guard = lock_connection(&conn);
            let connection = guard.as_mut().ok_or(StoreError::Closed)?;
            let service = TodoService::new(SqliteTodoRepository::from_ready(connection));
            Ok(op(&service)?)
        })
        .await
        .map_err(|err| StoreError::Worker(err.to_string()))?
    }
}

fn lock_connection(conn: &Mutex<Option<Connection>>) -> MutexGuard<'_, Option<Connection>> {
    conn.lock().unwrap_or_else(|poisoned| {
        warn!("event=store_lock module=store status=recovered reason=poisoned");
        conn.clear_poison();
        poisoned.into_inner()
    })
}

fn bootstrap(mut conn: Connection) -> StoreResult<Connection> {
    let seeded = {
        let repo = SqliteTodoRepository::try_new(&mut conn)?;
        let mut service = TodoService::new(repo);
        service.initialize()?
    };
    info!("event=store_open module=store status=ok seeded={seeded}");
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::TodoStore;
    use crate::model::todo::NewTodo;
    use std::sync::Arc;

    #[tokio::test]
    async fn store_keeps_serving_after_panic_under_connection_lock() {
        let store = TodoStore::open_in_memory().await.unwrap();

        let conn = Arc::clone(&store.conn);
        let panicked = std::thread::spawn(move || {
            let _guard = conn.lock().unwrap();
            panic!("operation failed while holding the connection");
        })
        .join();
        assert!(panicked.is_err());
        assert!(store.conn.is_poisoned());

        assert_eq!(store.count().await.unwrap(), 2);
        store.create(NewTodo::new("after panic")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
        assert!(!store.conn.is_poisoned());
        store.close().await.unwrap();
    }
}
