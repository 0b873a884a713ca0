//! Tag reconciliation for term create/update.
//!
//! # Responsibility
//! - Resolve a requested tag-name list against the known vocabulary.
//! - Mint identities only for names the vocabulary has never seen.
//!
//! # Invariants
//! - Names are trimmed; blank names are dropped; duplicates collapse.
//! - Identity is the exact trimmed name, so `a` and `A` are distinct tags.
//! - An empty result is rejected before anything is minted.

use crate::model::tag::{Tag, TagVocabulary};
use crate::model::term::{TermField, TermValidationError, TAGS_REQUIRED_MESSAGE};
use std::collections::HashSet;

/// Outcome of one reconciliation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledTags {
    /// Full tag set for the term, in first-requested order.
    pub tags: Vec<Tag>,
    /// Tags allocated by this call (subset of `tags`).
    pub minted: Vec<Tag>,
}

/// Resolves `requested` names into the exact tag set a term should carry.
///
/// Existing identities are reused; unseen names are minted and inserted into
/// `vocabulary`. Calling this twice with the same names returns the same ids
/// and mints nothing the second time.
///
/// # Errors
/// - Returns a `tags` field error when no name survives trimming. The
///   vocabulary is untouched in that case.
pub fn reconcile_tags<S: AsRef<str>>(
    vocabulary: &mut TagVocabulary,
    requested: &[S],
) -> Result<ReconciledTags, TermValidationError> {
    let names = normalize_tag_names(requested);
    if names.is_empty() {
        return Err(TermValidationError::single(
            TermField::Tags,
            TAGS_REQUIRED_MESSAGE,
        ));
    }

    let mut tags = Vec::with_capacity(names.len());
    let mut minted = Vec::new();
    for name in names {
        let (tag, created) = vocabulary.find_or_mint(name);
        if created {
            minted.push(tag.clone());
        }
        tags.push(tag);
    }

    Ok(ReconciledTags { tags, minted })
}

/// Trims, drops blanks and de-duplicates names, keeping first occurrence.
pub fn normalize_tag_names<S: AsRef<str>>(requested: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    requested
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag_names, reconcile_tags};
    use crate::model::tag::{Tag, TagVocabulary};
    use crate::model::term::TermField;

    #[test]
    fn reuses_existing_and_mints_unknown_names() {
        let web = Tag::new("web");
        let mut vocabulary = TagVocabulary::from_tags([web.clone()]);

        let result = reconcile_tags(&mut vocabulary, &["web", "css"]).unwrap();
        assert_eq!(result.tags.len(), 2);
        assert_eq!(result.tags[0], web);
        assert_eq!(result.tags[1].name, "css");
        assert_eq!(result.minted, vec![result.tags[1].clone()]);
        assert_eq!(vocabulary.len(), 2);
    }

    #[test]
    fn second_pass_is_idempotent() {
        let mut vocabulary = TagVocabulary::new();
        let first = reconcile_tags(&mut vocabulary, &["http", "tcp"]).unwrap();
        let second = reconcile_tags(&mut vocabulary, &["http", "tcp"]).unwrap();

        assert_eq!(first.tags, second.tags);
        assert!(second.minted.is_empty());
        assert_eq!(vocabulary.len(), 2);
    }

    #[test]
    fn duplicates_collapse_but_case_variants_stay_distinct() {
        let mut vocabulary = TagVocabulary::new();
        let result = reconcile_tags(&mut vocabulary, &["a", "A ", "a"]).unwrap();
        let names = result
            .tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "A"]);
        assert_eq!(result.minted.len(), 2);
    }

    #[test]
    fn blank_only_request_fails_without_minting() {
        let mut vocabulary = TagVocabulary::from_tags([Tag::new("kept")]);
        let err = reconcile_tags(&mut vocabulary, &["  ", ""]).unwrap_err();
        assert!(err.has_field(TermField::Tags));
        assert_eq!(vocabulary.len(), 1);
    }

    #[test]
    fn normalize_trims_and_preserves_first_order() {
        let raw = vec![" beta".to_string(), "alpha".to_string(), "beta ".to_string()];
        assert_eq!(normalize_tag_names(&raw), vec!["beta", "alpha"]);
    }
}
