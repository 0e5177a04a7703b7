//! Todo domain model.
//!
//! # Responsibility
//! - Define the persisted `Todo` record and its write-side inputs.
//! - Own optional-description normalization shared by all write/read paths.
//!
//! # Invariants
//! - `id` is generated once and never reused for another todo.
//! - `description` is either `None` or contains non-whitespace text.
//! - `done` is always a concrete boolean.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a todo row.
pub type TodoId = Uuid;

/// A persisted todo item.
///
/// Serializes to `{id, title, description?, done, created_at, updated_at}`;
/// an absent description is omitted rather than written as `null` or `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub done: bool,
    /// Unix epoch milliseconds, fixed at insertion.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by every successful update.
    pub updated_at: i64,
}

/// Input for creating a todo. The store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
}

impl NewTodo {
    /// Creates an open (`done = false`) todo input without description.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            done: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }
}

/// Partial update for an existing todo.
///
/// `None` fields keep their stored value. `description: Some("")` clears
/// the stored description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub done: Option<bool>,
}

impl TodoPatch {
    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.done.is_none()
    }
}

/// Collapses blank descriptions to `None`.
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{normalize_description, NewTodo, Todo, TodoPatch};
    use uuid::Uuid;

    #[test]
    fn normalize_description_drops_blank_values() {
        assert_eq!(normalize_description(None), None);
        assert_eq!(normalize_description(Some(String::new())), None);
        assert_eq!(normalize_description(Some("  \n".to_string())), None);
        assert_eq!(
            normalize_description(Some("buy oat milk".to_string())).as_deref(),
            Some("buy oat milk")
        );
    }

    #[test]
    fn todo_without_description_omits_the_key() {
        let todo = Todo {
            id: Uuid::nil(),
            title: "Water plants".to_string(),
            description: None,
            done: false,
            created_at: 1,
            updated_at: 1,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["done"], false);
    }

    #[test]
    fn new_todo_defaults_to_open() {
        let input = NewTodo::new("Call the bank");
        assert!(!input.done);
        assert!(input.description.is_none());

        let input = input.with_description("about the card").with_done(true);
        assert!(input.done);
        assert_eq!(input.description.as_deref(), Some("about the card"));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TodoPatch::default().is_empty());
        let patch = TodoPatch {
            done: Some(true),
            ..TodoPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
