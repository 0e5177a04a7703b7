//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the async store and HTTP layers decoupled from storage details.

pub mod todo_service;
