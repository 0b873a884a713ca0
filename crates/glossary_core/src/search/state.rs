//! Caller-side list view state.
//!
//! # Responsibility
//! - Hold the current [`QuerySpec`] between control changes.
//! - Reset or clamp the page whenever the view changes shape.
//! - Tag each recomputation so superseded results can be dropped.
//!
//! # Invariants
//! - Changing text, scope or sort always lands on page 1.
//! - `page` never drops below 1.
//! - The generation only moves forward; a ticket is current until the next
//!   effective change.

use crate::search::query::{QueryPage, QuerySpec, SearchScope, SortKey};

/// Generation marker issued for one query recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryTicket(u64);

/// Mutable view state owned by the presentation caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    spec: QuerySpec,
    generation: u64,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an explicit spec (e.g. restored from a URL).
    pub fn with_spec(spec: QuerySpec) -> Self {
        let mut spec = spec;
        spec.page = spec.page.max(1);
        Self {
            spec,
            generation: 0,
        }
    }

    /// Current spec to hand to the query engine.
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Replaces the free-text query. Returns `true` when the view changed.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.spec.text == text {
            return false;
        }
        self.spec.text = text;
        self.reset_page();
        true
    }

    /// Replaces the search scope. Returns `true` when the view changed.
    pub fn set_scope(&mut self, scope: SearchScope) -> bool {
        if self.spec.scope == scope {
            return false;
        }
        self.spec.scope = scope;
        self.reset_page();
        true
    }

    /// Replaces the sort key. Returns `true` when the view changed.
    pub fn set_sort(&mut self, sort: SortKey) -> bool {
        if self.spec.sort == sort {
            return false;
        }
        self.spec.sort = sort;
        self.reset_page();
        true
    }

    /// Moves to `page`, clamped to `[1, max(total_pages, 1)]`.
    ///
    /// Returns `true` when the effective page changed.
    pub fn set_page(&mut self, page: u32, total_pages: usize) -> bool {
        let last = u32::try_from(total_pages.max(1)).unwrap_or(u32::MAX);
        let clamped = page.clamp(1, last);
        if self.spec.page == clamped {
            return false;
        }
        self.spec.page = clamped;
        self.bump();
        true
    }

    /// Pulls the page back after a mutation shrank the result set.
    ///
    /// An empty result settles on page 1.
    ///
    /// Returns `true` when the caller must re-query with the new spec.
    pub fn settle(&mut self, result: &QueryPage) -> bool {
        let current = usize::try_from(self.spec.page).unwrap_or(usize::MAX);
        if current <= result.total_pages.max(1) {
            return false;
        }
        self.set_page(self.spec.page, result.total_pages)
    }

    /// Marks the start of a recomputation for the current spec.
    pub fn ticket(&self) -> QueryTicket {
        QueryTicket(self.generation)
    }

    /// Returns whether a result computed under `ticket` is still current.
    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Records that the underlying collection changed (create/update/delete).
    ///
    /// Keeps the spec but invalidates outstanding tickets.
    pub fn invalidate(&mut self) {
        self.bump();
    }

    fn reset_page(&mut self) {
        self.spec.page = 1;
        self.bump();
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::QueryState;
    use crate::search::query::{QueryPage, QuerySpec, SearchScope, SortKey};

    #[test]
    fn changing_text_scope_or_sort_resets_page() {
        let mut state = QueryState::new();
        assert!(state.set_page(3, 5));
        assert!(state.set_text("web"));
        assert_eq!(state.spec().page, 1);

        state.set_page(2, 5);
        assert!(state.set_scope(SearchScope::Tags));
        assert_eq!(state.spec().page, 1);

        state.set_page(4, 5);
        assert!(state.set_sort(SortKey::TitleAlphabetical));
        assert_eq!(state.spec().page, 1);
    }

    #[test]
    fn unchanged_values_keep_page_and_ticket() {
        let mut state = QueryState::new();
        state.set_page(2, 3);
        let ticket = state.ticket();
        assert!(!state.set_text(""));
        assert!(!state.set_scope(SearchScope::All));
        assert!(!state.set_sort(SortKey::NewestFirst));
        assert_eq!(state.spec().page, 2);
        assert!(state.is_current(ticket));
    }

    #[test]
    fn set_page_clamps_into_existing_range() {
        let mut state = QueryState::new();
        state.set_page(9, 3);
        assert_eq!(state.spec().page, 3);
        state.set_page(0, 3);
        assert_eq!(state.spec().page, 1);
        state.set_page(7, 0);
        assert_eq!(state.spec().page, 1);
    }

    #[test]
    fn settle_moves_back_to_last_page() {
        let mut state = QueryState::with_spec(QuerySpec::default().with_page(3));
        let shrunk = QueryPage {
            items: Vec::new(),
            total_matched: 12,
            total_pages: 2,
        };
        assert!(state.settle(&shrunk));
        assert_eq!(state.spec().page, 2);
        assert!(!state.settle(&shrunk));
    }

    #[test]
    fn settle_returns_to_first_page_when_nothing_matches() {
        let mut state = QueryState::with_spec(QuerySpec::default().with_page(3));
        let stale = state.ticket();
        assert!(state.settle(&QueryPage::default()));
        assert_eq!(state.spec().page, 1);
        assert!(!state.is_current(stale));
        assert!(!state.settle(&QueryPage::default()));
    }

    #[test]
    fn superseded_tickets_are_not_current() {
        let mut state = QueryState::new();
        let stale = state.ticket();
        state.set_text("h");
        let fresh = state.ticket();
        assert!(!state.is_current(stale));
        assert!(state.is_current(fresh));

        state.invalidate();
        assert!(!state.is_current(fresh));
    }
}
