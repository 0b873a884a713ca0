//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, tag reconciliation and store calls.
//! - Keep presentation layers decoupled from storage details.

pub mod tag_reconciler;
pub mod term_service;
