//! Todo REST endpoints under `/api`.
//!
//! Handlers validate input, then delegate to `TodoStore`. The store never
//! sees a blank title or an over-long field. Extractors are taken as
//! `Result` so malformed bodies and queries answer with an `ApiError`.

use crate::error::ApiError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use todo_core::{NewTodo, Todo, TodoId, TodoPatch, TodoStore};
use uuid::Uuid;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub done: bool,
}

/// Body of `PUT /api/todo`. Omitted fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListTodosQuery {
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TodoIdQuery {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteTodoResponse {
    pub success: bool,
}

pub fn router(store: TodoStore) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos))
        .route(
            "/api/todo",
            get(get_todo)
                .post(create_todo)
                .put(update_todo)
                .delete(delete_todo),
        )
        .fallback(unknown_route)
        .with_state(store)
}

async fn create_todo(
    State(store): State<TodoStore>,
    input: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Json(input) = input?;
    let title = validate_title(&input.title)?;
    let description = input
        .description
        .as_deref()
        .map(validate_description)
        .transpose()?;

    let new_todo = NewTodo {
        title,
        description,
        done: input.done,
    };
    Ok(Json(store.create(new_todo).await?))
}

async fn list_todos(
    State(store): State<TodoStore>,
    query: Result<Query<ListTodosQuery>, QueryRejection>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(store.list(query.filter).await?))
}

async fn get_todo(
    State(store): State<TodoStore>,
    query: Result<Query<TodoIdQuery>, QueryRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Query(query) = query?;
    let id = parse_id(&query.id)?;
    store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn update_todo(
    State(store): State<TodoStore>,
    input: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Json(input) = input?;
    let id = parse_id(&input.id)?;
    let patch = TodoPatch {
        title: input.title.as_deref().map(validate_title).transpose()?,
        description: input
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?,
        done: input.done,
    };
    Ok(Json(store.update(id, patch).await?))
}

async fn delete_todo(
    State(store): State<TodoStore>,
    query: Result<Query<TodoIdQuery>, QueryRejection>,
) -> Result<Json<DeleteTodoResponse>, ApiError> {
    let Query(query) = query?;
    let id = parse_id(&query.id)?;
    if store.delete(id).await? {
        Ok(Json(DeleteTodoResponse { success: true }))
    } else {
        Err(not_found(id))
    }
}

async fn unknown_route() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}

fn parse_id(value: &str) -> Result<TodoId, ApiError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ApiError::Validation(format!("invalid todo id `{value}`")))
}

fn not_found(id: TodoId) -> ApiError {
    ApiError::NotFound(format!("todo not found: {id}"))
}

fn validate_title(value: &str) -> Result<String, ApiError> {
    let title = value.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("title is required".to_string()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

/// Returns the trimmed description; an empty result means "absent"/"clear".
fn validate_description(value: &str) -> Result<String, ApiError> {
    let description = value.trim();
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "description must be at most {DESCRIPTION_MAX_CHARS} characters"
        )));
    }
    Ok(description.to_string())
}
