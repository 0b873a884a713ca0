//! Domain model for glossary terms and their tags.
//!
//! # Responsibility
//! - Define canonical data structures used by reconciliation and querying.
//! - Keep validation feedback shaped per input field.
//!
//! # Invariants
//! - Every term and tag is identified by a stable UUID.
//! - Tags are referenced by terms, never owned by them.

pub mod tag;
pub mod term;
