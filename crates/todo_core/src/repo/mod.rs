//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the engine-agnostic todo data access contract.
//! - Isolate SQL details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Read paths reject undecodable persisted state instead of masking it.

pub mod todo_repo;
