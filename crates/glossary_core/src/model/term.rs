//! Term domain model.
//!
//! # Responsibility
//! - Define the glossary record and the caller-supplied draft used to
//!   create or fully replace it.
//! - Validate drafts into field-level feedback for the presentation layer.
//!
//! # Invariants
//! - `id` is stable and never reused for another term.
//! - `title` and `content` are non-empty after trimming.
//! - A persisted term references at least one tag.

use crate::model::tag::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a glossary term.
pub type TermId = Uuid;

/// Canonical glossary record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Stable id used by update/delete.
    pub id: TermId,
    /// Display title. Non-empty after trim.
    pub title: String,
    /// Definition body. Non-empty after trim.
    pub content: String,
    /// Associated tags, sorted by name. Order carries no meaning.
    pub tags: Vec<Tag>,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Last full-replace time in epoch milliseconds.
    pub updated_at: i64,
}

impl Term {
    /// Returns whether any associated tag carries exactly `name`.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }

    /// Iterates associated tag names.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|tag| tag.name.as_str())
    }
}

/// Input fields of a term, as typed by the user.
///
/// Used for both creation and full replacement; there is no partial patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDraft {
    pub title: String,
    pub content: String,
    /// Raw tag names. Trimming and de-duplication happen during reconciliation.
    pub tag_names: Vec<String>,
}

impl TermDraft {
    /// Creates a draft from already split tag names.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        tag_names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tag_names: tag_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a draft from a single comma-separated tag field.
    pub fn from_tag_input(
        title: impl Into<String>,
        content: impl Into<String>,
        tag_input: &str,
    ) -> Self {
        Self::new(title, content, split_tag_input(tag_input))
    }

    /// Checks every field and reports all failures at once.
    ///
    /// The tag check only asserts that at least one name survives trimming;
    /// identity resolution is left to the reconciler.
    pub fn validate(&self) -> Result<(), TermValidationError> {
        let mut errors = TermValidationError::default();
        if self.title.trim().is_empty() {
            errors.push(TermField::Title, "title is required");
        }
        if self.content.trim().is_empty() {
            errors.push(TermField::Content, "content is required");
        }
        if self.tag_names.iter().all(|name| name.trim().is_empty()) {
            errors.push(TermField::Tags, TAGS_REQUIRED_MESSAGE);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub(crate) const TAGS_REQUIRED_MESSAGE: &str = "at least one tag is required";

/// Splits a comma-separated tag field into raw names.
///
/// Segments are returned untrimmed; blank segments are kept so the
/// reconciler stays the single place that discards them.
pub fn split_tag_input(input: &str) -> Vec<String> {
    input.split(',').map(str::to_string).collect()
}

/// Input field a validation message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermField {
    Title,
    Content,
    Tags,
}

impl TermField {
    /// Stable field name used by form bindings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
            Self::Tags => "tags",
        }
    }
}

/// Field-level validation failure for a term draft.
///
/// Recoverable: callers surface the messages next to the failing inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermValidationError {
    fields: BTreeMap<TermField, String>,
}

impl TermValidationError {
    /// Builds an error for a single field.
    pub fn single(field: TermField, message: impl Into<String>) -> Self {
        let mut error = Self::default();
        error.push(field, message);
        error
    }

    fn push(&mut self, field: TermField, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the message recorded for `field`, if any.
    pub fn message(&self, field: TermField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Returns whether `field` failed validation.
    pub fn has_field(&self, field: TermField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Iterates failing fields in `title, content, tags` order.
    pub fn fields(&self) -> impl Iterator<Item = (TermField, &str)> {
        self.fields
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    /// Field-name to message mapping for form rendering.
    pub fn field_messages(&self) -> BTreeMap<&'static str, String> {
        self.fields
            .iter()
            .map(|(field, message)| (field.as_str(), message.clone()))
            .collect()
    }
}

impl Display for TermValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid term")?;
        let mut separator = ": ";
        for (field, message) in &self.fields {
            write!(f, "{separator}{}: {message}", field.as_str())?;
            separator = "; ";
        }
        Ok(())
    }
}

impl Error for TermValidationError {}

#[cfg(test)]
mod tests {
    use super::{split_tag_input, TermDraft, TermField};

    #[test]
    fn validate_reports_every_failing_field() {
        let draft = TermDraft::new("  ", "\n", ["", "  "]);
        let err = draft.validate().expect_err("blank draft must fail");
        assert!(err.has_field(TermField::Title));
        assert!(err.has_field(TermField::Content));
        assert!(err.has_field(TermField::Tags));

        let messages = err.field_messages();
        assert_eq!(
            messages.keys().copied().collect::<Vec<_>>(),
            vec!["content", "tags", "title"]
        );
    }

    #[test]
    fn validate_accepts_draft_with_one_usable_tag() {
        let draft = TermDraft::from_tag_input("Closure", "Captures its environment.", " , fn");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn split_tag_input_keeps_raw_segments() {
        assert_eq!(split_tag_input("web, css ,"), vec!["web", " css ", ""]);
    }

    #[test]
    fn display_lists_fields_in_stable_order() {
        let err = TermDraft::new("", "body", ["x"])
            .validate()
            .expect_err("missing title must fail");
        assert_eq!(err.to_string(), "invalid term: title: title is required");
    }
}
