//! Term use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete/get/list/query APIs for glossary terms.
//! - Run validation and tag reconciliation before any store write.
//!
//! # Invariants
//! - Validation failures never reach the store.
//! - `update_term` uses full replacement semantics (title, content, tags).
//! - Stored title/content are trimmed copies of the draft fields.
//! - Deleting a term never removes tags from the vocabulary.

use crate::model::tag::{Tag, TagVocabulary};
use crate::model::term::{Term, TermDraft, TermField, TermId, TermValidationError};
use crate::repo::term_repo::{RepoError, RepoResult, TermRepository, TermWrite};
use crate::search::query::{query_terms, QueryPage, QuerySpec};
use crate::service::tag_reconciler::{reconcile_tags, ReconciledTags};
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for term use-cases.
#[derive(Debug)]
pub enum TermServiceError {
    /// Draft failed field validation; nothing was written.
    Validation(TermValidationError),
    /// Target term does not exist.
    TermNotFound(TermId),
    /// Store failure, propagated unchanged.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TermServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TermNotFound(id) => write!(f, "term not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent term state: {details}"),
        }
    }
}

impl Error for TermServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TermServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TermNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<TermValidationError> for TermServiceError {
    fn from(value: TermValidationError) -> Self {
        Self::Validation(value)
    }
}

impl TermServiceError {
    /// Field-level feedback when this is a validation failure.
    pub fn validation(&self) -> Option<&TermValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Term service facade over a term store.
pub struct TermService<R: TermRepository> {
    repo: R,
}

impl<R: TermRepository> TermService<R> {
    /// Creates a service using the provided store implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one term from a draft.
    ///
    /// New tag names are minted; known names reuse their stored identity.
    pub fn create_term(&mut self, draft: &TermDraft) -> Result<Term, TermServiceError> {
        let started_at = Instant::now();
        let (write, reconciled) = self.prepare_write("term_create", draft)?;

        let created = self.repo.create_term(&write).map_err(|err| {
            log_store_failure("term_create", started_at, &err);
            TermServiceError::from(err)
        })?;
        ensure_tags_applied(&created, &reconciled)?;

        info!(
            "event=term_create module=service status=ok term_id={} tag_count={} minted={} duration_ms={}",
            created.id,
            created.tags.len(),
            reconciled.minted.len(),
            started_at.elapsed().as_millis()
        );
        Ok(created)
    }

    /// Replaces title, content and the whole tag set of one term.
    ///
    /// Tags dropped from this term stay in the vocabulary.
    pub fn update_term(
        &mut self,
        id: TermId,
        draft: &TermDraft,
    ) -> Result<Term, TermServiceError> {
        let started_at = Instant::now();
        let (write, reconciled) = self.prepare_write("term_update", draft)?;

        let updated = self.repo.update_term(id, &write).map_err(|err| {
            log_store_failure("term_update", started_at, &err);
            TermServiceError::from(err)
        })?;
        ensure_tags_applied(&updated, &reconciled)?;

        info!(
            "event=term_update module=service status=ok term_id={} tag_count={} minted={} duration_ms={}",
            updated.id,
            updated.tags.len(),
            reconciled.minted.len(),
            started_at.elapsed().as_millis()
        );
        Ok(updated)
    }

    /// Deletes one term. Its tags remain available to other terms.
    pub fn delete_term(&mut self, id: TermId) -> Result<(), TermServiceError> {
        let started_at = Instant::now();
        self.repo.delete_term(id).map_err(|err| {
            log_store_failure("term_delete", started_at, &err);
            TermServiceError::from(err)
        })?;
        info!(
            "event=term_delete module=service status=ok term_id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Gets one term by stable id.
    pub fn get_term(&self, id: TermId) -> RepoResult<Option<Term>> {
        self.repo.get_term(id)
    }

    /// Lists every term, newest first.
    pub fn list_terms(&self) -> RepoResult<Vec<Term>> {
        self.repo.list_terms()
    }

    /// Lists the tag vocabulary, including tags no term references.
    pub fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        self.repo.list_tags()
    }

    /// Loads the current collection and runs one query over it.
    pub fn query(&self, spec: &QuerySpec) -> Result<QueryPage, TermServiceError> {
        let started_at = Instant::now();
        let terms = self.repo.list_terms()?;
        let page = query_terms(&terms, spec);
        info!(
            "event=term_query module=service status=ok total_terms={} matched={} page={} total_pages={} duration_ms={}",
            terms.len(),
            page.total_matched,
            spec.page,
            page.total_pages,
            started_at.elapsed().as_millis()
        );
        Ok(page)
    }

    fn prepare_write(
        &self,
        event: &'static str,
        draft: &TermDraft,
    ) -> Result<(TermWrite, ReconciledTags), TermServiceError> {
        if let Err(err) = draft.validate() {
            log_rejection(event, &err);
            return Err(err.into());
        }

        let mut vocabulary = TagVocabulary::from_tags(self.repo.list_tags()?);
        let reconciled =
            reconcile_tags(&mut vocabulary, draft.tag_names.as_slice()).map_err(|err| {
                log_rejection(event, &err);
                err
            })?;

        let write = TermWrite {
            title: draft.title.trim().to_string(),
            content: draft.content.trim().to_string(),
            tags: reconciled.tags.clone(),
        };
        Ok((write, reconciled))
    }
}

fn ensure_tags_applied(
    stored: &Term,
    reconciled: &ReconciledTags,
) -> Result<(), TermServiceError> {
    let expected = reconciled
        .tags
        .iter()
        .map(|tag| tag.name.as_str())
        .collect::<BTreeSet<_>>();
    let actual = stored.tag_names().collect::<BTreeSet<_>>();
    if expected != actual {
        error!(
            "event=tag_reconcile module=service status=error term_id={} expected={} actual={}",
            stored.id,
            expected.len(),
            actual.len()
        );
        return Err(TermServiceError::InconsistentState(
            "stored tag set differs from reconciled tag set",
        ));
    }
    Ok(())
}

fn log_rejection(event: &str, err: &TermValidationError) {
    let fields = err
        .fields()
        .map(|(field, _)| TermField::as_str(field))
        .collect::<Vec<_>>()
        .join(",");
    warn!("event={event} module=service status=rejected fields={fields}");
}

fn log_store_failure(event: &str, started_at: Instant, err: &RepoError) {
    error!(
        "event={} module=service status=error duration_ms={} error={}",
        event,
        started_at.elapsed().as_millis(),
        err
    );
}

#[cfg(test)]
mod tests {
    use super::{TermService, TermServiceError};
    use crate::db::DbError;
    use crate::model::tag::Tag;
    use crate::model::term::{Term, TermDraft, TermField, TermId};
    use crate::repo::term_repo::{RepoError, RepoResult, TermRepository, TermWrite};
    use std::cell::Cell;
    use uuid::Uuid;

    /// Store double that counts writes and can be told to fail them.
    #[derive(Default)]
    struct RecordingRepo {
        tags: Vec<Tag>,
        writes: Cell<usize>,
        fail_writes: bool,
    }

    impl RecordingRepo {
        fn write(&self, id: TermId, write: &TermWrite) -> RepoResult<Term> {
            self.writes.set(self.writes.get() + 1);
            if self.fail_writes {
                return Err(RepoError::Db(DbError::Sqlite(
                    rusqlite::Error::InvalidQuery,
                )));
            }
            let mut tags = write.tags.clone();
            tags.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(Term {
                id,
                title: write.title.clone(),
                content: write.content.clone(),
                tags,
                created_at: 1,
                updated_at: 1,
            })
        }
    }

    impl TermRepository for RecordingRepo {
        fn list_terms(&self) -> RepoResult<Vec<Term>> {
            Ok(Vec::new())
        }

        fn get_term(&self, _id: TermId) -> RepoResult<Option<Term>> {
            Ok(None)
        }

        fn create_term(&mut self, write: &TermWrite) -> RepoResult<Term> {
            self.write(Uuid::new_v4(), write)
        }

        fn update_term(&mut self, id: TermId, write: &TermWrite) -> RepoResult<Term> {
            self.write(id, write)
        }

        fn delete_term(&mut self, id: TermId) -> RepoResult<()> {
            self.writes.set(self.writes.get() + 1);
            Err(RepoError::NotFound(id))
        }

        fn list_tags(&self) -> RepoResult<Vec<Tag>> {
            Ok(self.tags.clone())
        }
    }

    #[test]
    fn invalid_draft_makes_no_store_write() {
        let mut service = TermService::new(RecordingRepo::default());
        let err = service
            .create_term(&TermDraft::new("", "body", ["tag"]))
            .unwrap_err();
        let validation = err.validation().expect("validation error expected");
        assert!(validation.has_field(TermField::Title));
        assert_eq!(service.repo.writes.get(), 0);
    }

    #[test]
    fn create_trims_fields_and_reuses_known_tags() {
        let known = Tag::new("web");
        let repo = RecordingRepo {
            tags: vec![known.clone()],
            ..RecordingRepo::default()
        };
        let mut service = TermService::new(repo);

        let created = service
            .create_term(&TermDraft::from_tag_input("  HTTP ", " Protocol. ", "web, net"))
            .unwrap();
        assert_eq!(created.title, "HTTP");
        assert_eq!(created.content, "Protocol.");
        assert!(created.tags.contains(&known));
        assert!(created.has_tag("net"));
    }

    #[test]
    fn store_failure_is_propagated_unchanged() {
        let repo = RecordingRepo {
            fail_writes: true,
            ..RecordingRepo::default()
        };
        let mut service = TermService::new(repo);
        let err = service
            .update_term(Uuid::new_v4(), &TermDraft::new("t", "c", ["x"]))
            .unwrap_err();
        assert!(matches!(err, TermServiceError::Repo(RepoError::Db(_))));
        assert_eq!(service.repo.writes.get(), 1);
    }

    #[test]
    fn store_not_found_maps_to_term_not_found() {
        let mut service = TermService::new(RecordingRepo::default());
        let id = Uuid::new_v4();
        let err = service.delete_term(id).unwrap_err();
        assert!(matches!(err, TermServiceError::TermNotFound(missing) if missing == id));
    }
}
