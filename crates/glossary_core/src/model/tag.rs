//! Tag entity and name-keyed vocabulary.
//!
//! # Responsibility
//! - Define the shared tag entity referenced by terms.
//! - Provide an explicit lookup structure for find-or-create by name.
//!
//! # Invariants
//! - No two tags in a vocabulary share the same name.
//! - Names are compared exactly (case-sensitive) for identity.
//! - Entries are never removed; unreferenced tags are tolerated orphans.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable identifier for a tag.
pub type TagId = Uuid;

/// Named label shared by any number of terms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    /// Trimmed, case-preserved name. Unique within the vocabulary.
    pub name: String,
}

impl Tag {
    /// Creates a tag with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a tag with a caller-provided id (store read-back paths).
    pub fn with_id(id: TagId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Snapshot of all known tags, keyed by exact name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagVocabulary {
    by_name: BTreeMap<String, Tag>,
}

impl TagVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vocabulary from store rows.
    ///
    /// When two rows carry the same name, the first one is kept.
    pub fn from_tags(tags: impl IntoIterator<Item = Tag>) -> Self {
        let mut vocabulary = Self::new();
        for tag in tags {
            vocabulary.by_name.entry(tag.name.clone()).or_insert(tag);
        }
        vocabulary
    }

    /// Looks up a tag by exact name.
    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterates tags in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.by_name.values()
    }

    /// Returns the tag named `name`, minting it when absent.
    ///
    /// The boolean is `true` when a new identity was allocated.
    pub(crate) fn find_or_mint(&mut self, name: &str) -> (Tag, bool) {
        if let Some(existing) = self.by_name.get(name) {
            return (existing.clone(), false);
        }
        let tag = Tag::new(name);
        self.by_name.insert(name.to_string(), tag.clone());
        (tag, true)
    }
}
