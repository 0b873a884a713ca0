//! In-memory term query engine.
//!
//! # Responsibility
//! - Filter a term collection by case-insensitive substring match.
//! - Order matches by the requested sort key and cut one page.
//!
//! # Invariants
//! - Inputs are never mutated; the same inputs always yield the same page.
//! - Sorting is stable: equal keys keep their input order.
//! - The requested page is not clamped; out-of-range pages are empty.
//! - Title order uses root-locale collation at secondary strength: accents
//!   count, case does not, and the raw title breaks remaining ties.

use crate::model::term::Term;
use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::Collator;
use log::warn;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Number of terms shown per page.
pub const DEFAULT_PAGE_SIZE: u32 = 6;

/// Fields a free-text query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Title, content or any tag name.
    #[default]
    All,
    Title,
    Content,
    /// Any associated tag name.
    Tags,
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Descending `created_at`.
    #[default]
    NewestFirst,
    /// Ascending `created_at`.
    OldestFirst,
    /// Ascending title, case folded first.
    TitleAlphabetical,
}

/// Full description of one list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Free text. Blank after trim means "match everything".
    pub text: String,
    pub scope: SearchScope,
    pub sort: SortKey,
    /// 1-based page number.
    pub page: u32,
    /// Terms per page. `0` is treated as [`DEFAULT_PAGE_SIZE`].
    pub page_size: u32,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            scope: SearchScope::All,
            sort: SortKey::NewestFirst,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuerySpec {
    /// Creates a first-page spec for `text` with default scope and sort.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Page size after normalization.
    pub fn effective_page_size(&self) -> usize {
        normalize_page_size(self.page_size) as usize
    }
}

/// One page of query results plus pagination counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPage {
    /// Terms on the requested page, in sort order.
    pub items: Vec<Term>,
    /// Number of terms that matched the filter across all pages.
    pub total_matched: usize,
    /// `ceil(total_matched / page_size)`; `0` when nothing matched.
    pub total_pages: usize,
}

/// Normalizes page size according to the list contract.
pub fn normalize_page_size(page_size: u32) -> u32 {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}

/// Runs filter, sort and pagination over `terms`.
///
/// The caller is responsible for resetting `spec.page` to 1 whenever the
/// text, scope or sort key changes.
pub fn query_terms(terms: &[Term], spec: &QuerySpec) -> QueryPage {
    let needle = spec.text.trim().to_lowercase();
    let mut matched: Vec<&Term> = if needle.is_empty() {
        terms.iter().collect()
    } else {
        terms
            .iter()
            .filter(|term| term_matches(term, needle.as_str(), spec.scope))
            .collect()
    };

    sort_matches(&mut matched, spec.sort);

    let page_size = spec.effective_page_size();
    let total_matched = matched.len();
    let total_pages = total_matched.div_ceil(page_size);
    let items: Vec<Term> = page_bounds(spec.page, page_size, total_matched)
        .map(|(start, end)| matched[start..end].iter().copied().cloned().collect())
        .unwrap_or_default();

    QueryPage {
        items,
        total_matched,
        total_pages,
    }
}

/// Returns whether `term` contains `needle` in the fields selected by
/// `scope`. `needle` must already be lowercase.
pub fn term_matches(term: &Term, needle: &str, scope: SearchScope) -> bool {
    let in_title = || contains_folded(&term.title, needle);
    let in_content = || contains_folded(&term.content, needle);
    let in_tags = || term.tag_names().any(|name| contains_folded(name, needle));

    match scope {
        SearchScope::All => in_title() || in_content() || in_tags(),
        SearchScope::Title => in_title(),
        SearchScope::Content => in_content(),
        SearchScope::Tags => in_tags(),
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn sort_matches(matched: &mut [&Term], sort: SortKey) {
    match sort {
        SortKey::NewestFirst => matched.sort_by_key(|term| Reverse(term.created_at)),
        SortKey::OldestFirst => matched.sort_by_key(|term| term.created_at),
        SortKey::TitleAlphabetical => sort_by_title(matched),
    }
}

fn sort_by_title(matched: &mut [&Term]) {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Secondary);
    match Collator::try_new(Default::default(), options) {
        Ok(collator) => matched.sort_by(|left, right| {
            collator
                .compare(&left.title, &right.title)
                .then_with(|| left.title.cmp(&right.title))
        }),
        Err(err) => {
            warn!("event=title_collator_init module=search status=error error={err}");
            matched.sort_by_cached_key(|term| (term.title.to_lowercase(), term.title.clone()));
        }
    }
}

fn page_bounds(page: u32, page_size: usize, total: usize) -> Option<(usize, usize)> {
    let index = usize::try_from(page).ok()?.checked_sub(1)?;
    let start = index.checked_mul(page_size)?;
    if start >= total {
        return None;
    }
    Some((start, total.min(start + page_size)))
}
