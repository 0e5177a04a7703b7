//! Domain model for the todo store.
//!
//! # Invariants
//! - Every todo is identified by a stable, store-assigned `TodoId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod todo;
