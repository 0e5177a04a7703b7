//! Todo repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide single-statement CRUD over the `todos` table.
//! - Own first-boot seeding with "only when empty" semantics.
//!
//! # Invariants
//! - Update is one conditional `UPDATE … RETURNING`; a row deleted
//!   concurrently is reported as `NotFound`, never re-created.
//! - List order is `created_at DESC`, ties broken by insertion order DESC.
//! - Descriptions are normalized on write and on read.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::todo::{normalize_description, NewTodo, Todo, TodoId, TodoPatch};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TODO_COLUMNS: &str = "id, title, description, done, created_at, updated_at";
const NOW_MS_SQL: &str = "CAST(unixepoch('subsec') * 1000 AS INTEGER)";
const LIKE_ESCAPE: char = '\\';

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for todo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(TodoId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing todos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoListQuery {
    /// Case-insensitive substring matched against `title` only.
    /// `None` and `Some("")` both mean "no filter".
    pub title_contains: Option<String>,
}

impl TodoListQuery {
    pub fn title_contains(filter: impl Into<String>) -> Self {
        Self {
            title_contains: Some(filter.into()),
        }
    }

    fn effective_filter(&self) -> Option<&str> {
        self.title_contains
            .as_deref()
            .filter(|value| !value.is_empty())
    }
}

/// Repository interface for todo persistence.
///
/// Implementations back the store with a concrete relational engine;
/// callers above this trait never see SQL.
pub trait TodoRepository {
    /// Persists a new todo under a freshly generated id.
    fn create_todo(&self, input: &NewTodo) -> RepoResult<Todo>;
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>>;
    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<Vec<Todo>>;
    /// Applies a partial update; returns `RepoError::NotFound` for unknown ids.
    fn update_todo(&self, id: TodoId, patch: &TodoPatch) -> RepoResult<Todo>;
    /// Hard-deletes one row; `Ok(false)` when nothing matched.
    fn delete_todo(&self, id: TodoId) -> RepoResult<bool>;
    fn count_todos(&self) -> RepoResult<u64>;
    /// Inserts `seeds` only when the table holds no row. Returns inserted count.
    fn seed_if_empty(&mut self, seeds: &[NewTodo]) -> RepoResult<usize>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when the `todos` table does not exist.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection already verified by `try_new`.
    pub(crate) fn from_ready(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, input: &NewTodo) -> RepoResult<Todo> {
        let id = Uuid::new_v4();
        let description = normalize_description(input.description.clone());

        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO todos (id, title, description, done)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {TODO_COLUMNS};"
        ))?;
        let mut rows = stmt.query(params![
            id.to_string(),
            input.title.as_str(),
            description.as_deref(),
            bool_to_int(input.done),
        ])?;

        if let Some(row) = rows.next()? {
            return parse_todo_row(row);
        }

        Err(RepoError::InvalidData(format!(
            "insert of todo {id} returned no row"
        )))
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_todo_row(row)?));
        }

        Ok(None)
    }

    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<Vec<Todo>> {
        let mut sql = format!("SELECT {TODO_COLUMNS} FROM todos");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(filter) = query.effective_filter() {
            sql.push_str(" WHERE title LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(format!("%{}%", escape_like(filter))));
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut todos = Vec::new();

        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }

        Ok(todos)
    }

    fn update_todo(&self, id: TodoId, patch: &TodoPatch) -> RepoResult<Todo> {
        let replace_description = patch.description.is_some();
        let description = normalize_description(patch.description.clone());

        let mut stmt = self.conn.prepare(&format!(
            "UPDATE todos
             SET
                title = COALESCE(?2, title),
                description = CASE WHEN ?3 = 1 THEN ?4 ELSE description END,
                done = COALESCE(?5, done),
                updated_at = ({NOW_MS_SQL})
             WHERE id = ?1
             RETURNING {TODO_COLUMNS};"
        ))?;
        let mut rows = stmt.query(params![
            id.to_string(),
            patch.title.as_deref(),
            bool_to_int(replace_description),
            description.as_deref(),
            patch.done.map(bool_to_int),
        ])?;

        if let Some(row) = rows.next()? {
            return parse_todo_row(row);
        }

        Err(RepoError::NotFound(id))
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn count_todos(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM todos;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative todo count `{count}`")))
    }

    fn seed_if_empty(&mut self, seeds: &[NewTodo]) -> RepoResult<usize> {
        // IMMEDIATE takes the write lock before counting, so two processes
        // booting against the same file cannot both observe an empty table.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM todos;", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        {
            let mut insert = tx.prepare(
                "INSERT INTO todos (id, title, description, done)
                 VALUES (?1, ?2, ?3, ?4);",
            )?;
            for seed in seeds {
                let description = normalize_description(seed.description.clone());
                insert.execute(params![
                    Uuid::new_v4().to_string(),
                    seed.title.as_str(),
                    description.as_deref(),
                    bool_to_int(seed.done),
                ])?;
            }
        }
        tx.commit()?;

        Ok(seeds.len())
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let has_table: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'todos'
        );",
        [],
        |row| row.get(0),
    )?;
    if has_table == 0 {
        return Err(RepoError::MissingRequiredTable("todos"));
    }

    Ok(())
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in todos.id"))
    })?;

    let done = match row.get::<_, i64>("done")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid done value `{other}` in todos.done"
            )));
        }
    };

    Ok(Todo {
        id,
        title: row.get("title")?,
        description: normalize_description(row.get("description")?),
        done,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_like, TodoListQuery};

    #[test]
    fn escape_like_escapes_wildcards_and_escape_char() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn empty_filter_means_no_filter() {
        assert_eq!(TodoListQuery::default().effective_filter(), None);
        assert_eq!(TodoListQuery::title_contains("").effective_filter(), None);
        assert_eq!(
            TodoListQuery::title_contains("rest").effective_filter(),
            Some("rest")
        );
    }
}
