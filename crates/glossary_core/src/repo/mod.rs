//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the term store contract the core persists through.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes receive already validated and reconciled input.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod term_repo;
