//! Core domain logic for the personal glossary.
//! This crate owns term/tag reconciliation and the term query engine.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::tag::{Tag, TagId, TagVocabulary};
pub use model::term::{split_tag_input, Term, TermDraft, TermField, TermId, TermValidationError};
pub use repo::term_repo::{RepoError, RepoResult, SqliteTermRepository, TermRepository, TermWrite};
pub use search::query::{
    normalize_page_size, query_terms, term_matches, QueryPage, QuerySpec, SearchScope, SortKey,
    DEFAULT_PAGE_SIZE,
};
pub use search::state::{QueryState, QueryTicket};
pub use service::tag_reconciler::{normalize_tag_names, reconcile_tags, ReconciledTags};
pub use service::term_service::{TermService, TermServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
