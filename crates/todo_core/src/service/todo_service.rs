//! Todo use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points over any `TodoRepository`.
//! - Own the first-boot seed data.
//! - Emit metadata-only `event=todo_*` log lines for every use case.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Seeding inserts either all seed rows or none.
//! - Log lines carry ids and counts, never titles or descriptions.

use crate::model::todo::{NewTodo, Todo, TodoId, TodoPatch};
use crate::repo::todo_repo::{RepoError, RepoResult, TodoListQuery, TodoRepository};
use log::{debug, error, info};
use std::time::Instant;

const SEED_TODOS: [(&str, &str, bool); 2] = [
    (
        "Learn TypeScript",
        "Understand the basics of TypeScript.",
        false,
    ),
    (
        "Build a REST API",
        "Create a simple REST API using Node.js and Express.",
        true,
    ),
];

/// Returns the sample rows inserted into an empty store.
pub fn seed_todos() -> Vec<NewTodo> {
    SEED_TODOS
        .iter()
        .map(|(title, description, done)| {
            NewTodo::new(*title)
                .with_description(*description)
                .with_done(*done)
        })
        .collect()
}

/// Use-case service wrapper for todo operations.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Seeds the store when it is empty.
    ///
    /// Returns the number of rows inserted: `2` on a fresh store, `0` when
    /// any row already exists.
    pub fn initialize(&mut self) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.repo.seed_if_empty(&seed_todos());
        match &result {
            Ok(inserted) => info!(
                "event=todo_seed module=service status=ok inserted={} duration_ms={}",
                inserted,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=todo_seed module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Creates a todo. Input is expected to be validated by the caller.
    pub fn create(&self, input: &NewTodo) -> RepoResult<Todo> {
        let started_at = Instant::now();
        let result = self.repo.create_todo(input);
        log_outcome("todo_create", started_at, &result, |todo| {
            format!("id={}", todo.id)
        });
        result
    }

    /// Lists todos, newest first, optionally filtered by title substring.
    pub fn list(&self, filter: Option<&str>) -> RepoResult<Vec<Todo>> {
        let started_at = Instant::now();
        let query = TodoListQuery {
            title_contains: filter.map(str::to_owned),
        };
        let result = self.repo.list_todos(&query);
        log_outcome("todo_list", started_at, &result, |todos| {
            format!("filtered={} count={}", query.title_contains.is_some(), todos.len())
        });
        result
    }

    /// Gets one todo; `Ok(None)` when the id does not exist.
    pub fn get(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        let started_at = Instant::now();
        let result = self.repo.get_todo(id);
        log_outcome("todo_get", started_at, &result, |todo| {
            format!("id={id} found={}", todo.is_some())
        });
        result
    }

    /// Applies a partial update.
    ///
    /// Returns `RepoError::NotFound` unchanged for unknown ids.
    pub fn update(&self, id: TodoId, patch: &TodoPatch) -> RepoResult<Todo> {
        let started_at = Instant::now();
        let result = self.repo.update_todo(id, patch);
        log_outcome("todo_update", started_at, &result, |_| format!("id={id}"));
        result
    }

    /// Deletes a todo; `Ok(false)` when nothing was removed.
    pub fn delete(&self, id: TodoId) -> RepoResult<bool> {
        let started_at = Instant::now();
        let result = self.repo.delete_todo(id);
        log_outcome("todo_delete", started_at, &result, |removed| {
            format!("id={id} removed={removed}")
        });
        result
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.repo.count_todos()
    }
}

fn log_outcome<T>(
    event: &str,
    started_at: Instant,
    result: &RepoResult<T>,
    describe: impl FnOnce(&T) -> String,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) => debug!(
            "event={event} module=service status=ok {} duration_ms={duration_ms}",
            describe(value)
        ),
        Err(RepoError::NotFound(id)) => info!(
            "event={event} module=service status=not_found id={id} duration_ms={duration_ms}"
        ),
        Err(err) => error!(
            "event={event} module=service status=error duration_ms={duration_ms} error={err}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::seed_todos;

    #[test]
    fn seed_data_has_one_open_and_one_done_item() {
        let seeds = seed_todos();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds.iter().filter(|seed| seed.done).count(), 1);
        assert!(seeds.iter().all(|seed| seed.description.is_some()));
    }
}
