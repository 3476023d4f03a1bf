//! Search/pagination controller and result reconciliation.
//!
//! # Design
//! - Every filter, sort, or page-size mutation funnels through
//!   [`SearchController::reconfigure`], the single page-reset point.
//! - Each issued search carries a generation; only the response for the latest
//!   generation is applied, older ones are dropped on arrival.
//! - Result state is replaced wholesale, never patched.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::{CatalogResult, QueryError};
use crate::favorites::FavoriteSet;
use crate::model::{Item, SearchRequest, order_by_ids};
use crate::query::{
    FIRST_PAGE, QueryDescriptor, derive_request, normalize_categories, validate_page,
    validate_page_size,
};
use crate::service::CatalogService;
use crate::sort::{SortField, SortState};

/// User-facing message when a search fails.
pub const SEARCH_FAILED_MESSAGE: &str =
    "Failed to fetch dogs. Please adjust your filters or try again.";

/// Lifecycle of the current result page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchStatus {
    /// Nothing issued yet.
    #[default]
    Idle,
    /// A search is in flight.
    Loading,
    /// Results for the latest search are available.
    Ready,
    /// The latest search failed; results are empty.
    Failed {
        /// Message suitable for display.
        message: String,
    },
}

/// Handle for one issued search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    /// Request to submit.
    pub request: SearchRequest,
}

impl SearchTicket {
    /// Generation this ticket was issued under.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Hydrated response for one page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchOutcome {
    /// Result identifiers in order.
    pub ids: Vec<String>,
    /// Total matches across all pages.
    pub total: u64,
    /// Item details, ordered like `ids`.
    pub items: Vec<Item>,
}

/// Position of the current page within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// 1-based page index.
    pub page: u32,
    /// Page size.
    pub page_size: u32,
    /// Total matches.
    pub total: u64,
    /// Number of pages (zero when there are no matches).
    pub total_pages: u64,
    /// 1-based index of the first entry shown, zero when the page is empty.
    pub first: u64,
    /// 1-based index of the last entry shown, zero when the page is empty.
    pub last: u64,
}

impl PageBounds {
    /// Compute bounds for `page` of `page_size` entries out of `total`.
    #[must_use]
    pub fn compute(page: u32, page_size: u32, total: u64) -> Self {
        let size = u64::from(page_size.max(1));
        let total_pages = total.div_ceil(size);
        let offset = u64::from(page.saturating_sub(1)) * size;
        let (first, last) = if offset >= total {
            (0, 0)
        } else {
            (offset + 1, (offset + size).min(total))
        };
        Self {
            page,
            page_size,
            total,
            total_pages,
            first,
            last,
        }
    }

    /// Whether a later page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > FIRST_PAGE
    }
}

/// Result entry annotated with favorite membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// Catalog entry.
    pub item: Item,
    /// Whether the entry is in the favorite set.
    pub favorited: bool,
}

/// Current page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage {
    /// Result identifiers in order.
    pub ids: Vec<String>,
    /// Hydrated entries, ordered like `ids`.
    pub items: Vec<Item>,
    /// Page position.
    pub bounds: PageBounds,
}

impl ResultPage {
    fn empty(descriptor: &QueryDescriptor) -> Self {
        Self {
            ids: Vec::new(),
            items: Vec::new(),
            bounds: PageBounds::compute(descriptor.page, descriptor.page_size, 0),
        }
    }

    /// Pair every entry with its favorite flag.
    #[must_use]
    pub fn rows(&self, favorites: &FavoriteSet) -> Vec<ResultRow> {
        self.items
            .iter()
            .map(|item| ResultRow {
                favorited: favorites.contains(&item.id),
                item: item.clone(),
            })
            .collect()
    }
}

/// Owns the query descriptor, the sort cycle, and the latest result page.
#[derive(Debug, Clone)]
pub struct SearchController {
    descriptor: QueryDescriptor,
    generation: u64,
    last_issued: Option<SearchRequest>,
    status: SearchStatus,
    results: ResultPage,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(QueryDescriptor::default())
    }
}

impl SearchController {
    /// Start from an explicit descriptor.
    #[must_use]
    pub fn new(descriptor: QueryDescriptor) -> Self {
        let results = ResultPage::empty(&descriptor);
        Self {
            descriptor,
            generation: 0,
            last_issued: None,
            status: SearchStatus::Idle,
            results,
        }
    }

    /// Current descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    /// Current sort state.
    #[must_use]
    pub const fn sort(&self) -> SortState {
        self.descriptor.sort
    }

    /// Latest status.
    #[must_use]
    pub const fn status(&self) -> &SearchStatus {
        &self.status
    }

    /// Latest result page.
    #[must_use]
    pub const fn results(&self) -> &ResultPage {
        &self.results
    }

    /// Replace the category filter.
    pub fn set_categories(&mut self, categories: impl IntoIterator<Item = String>) {
        let next = normalize_categories(categories);
        self.reconfigure(|descriptor| descriptor.categories = next);
    }

    /// Add `category` to the filter, or remove it when already present.
    pub fn toggle_category(&mut self, category: &str) {
        let category = category.trim().to_string();
        if category.is_empty() {
            return;
        }
        self.reconfigure(|descriptor| {
            if !descriptor.categories.remove(&category) {
                descriptor.categories.insert(category);
            }
        });
    }

    /// Drop every category filter.
    pub fn clear_categories(&mut self) {
        self.reconfigure(|descriptor| descriptor.categories = BTreeSet::new());
    }

    /// Apply a click on a sort field.
    pub fn select_sort(&mut self, field: SortField) {
        self.reconfigure(|descriptor| descriptor.sort = descriptor.sort.select(field));
    }

    /// Change the page size.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPageSize`] for a zero size.
    pub fn set_page_size(&mut self, page_size: u32) -> Result<(), QueryError> {
        validate_page_size(page_size)?;
        self.reconfigure(|descriptor| descriptor.page_size = page_size);
        Ok(())
    }

    /// Navigate to `page` without touching filters, sort, or page size.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::PageOutOfRange`] for page zero.
    pub fn set_page(&mut self, page: u32) -> Result<(), QueryError> {
        validate_page(page)?;
        self.descriptor.page = page;
        Ok(())
    }

    /// Advance one page when the current results report a later page.
    pub fn next_page(&mut self) -> bool {
        if self.status == SearchStatus::Ready && self.results.bounds.has_next() {
            self.descriptor.page += 1;
            return true;
        }
        false
    }

    /// Step back one page.
    pub const fn prev_page(&mut self) -> bool {
        if self.descriptor.page > FIRST_PAGE {
            self.descriptor.page -= 1;
            return true;
        }
        false
    }

    /// Issue a search for the current descriptor unless the same request is
    /// already the latest one issued.
    pub fn begin_search(&mut self) -> Option<SearchTicket> {
        let request = derive_request(&self.descriptor);
        if self.last_issued.as_ref() == Some(&request) {
            return None;
        }
        Some(self.issue(request))
    }

    /// Re-issue the current request even if it matches the latest one.
    pub fn refresh(&mut self) -> SearchTicket {
        let request = derive_request(&self.descriptor);
        self.issue(request)
    }

    /// Apply a response. Returns `false` when the ticket is stale.
    pub fn apply(&mut self, ticket: &SearchTicket, outcome: CatalogResult<SearchOutcome>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale search response"
            );
            return false;
        }
        match outcome {
            Ok(outcome) => {
                self.results = ResultPage {
                    ids: outcome.ids,
                    items: outcome.items,
                    bounds: PageBounds::compute(
                        self.descriptor.page,
                        self.descriptor.page_size,
                        outcome.total,
                    ),
                };
                self.status = SearchStatus::Ready;
            }
            Err(err) => {
                warn!(error = %err, "search failed");
                self.results = ResultPage::empty(&self.descriptor);
                // Allow the same request to be issued again.
                self.last_issued = None;
                self.status = SearchStatus::Failed {
                    message: SEARCH_FAILED_MESSAGE.to_string(),
                };
            }
        }
        true
    }

    fn issue(&mut self, request: SearchRequest) -> SearchTicket {
        self.generation += 1;
        self.last_issued = Some(request.clone());
        self.status = SearchStatus::Loading;
        self.results = ResultPage::empty(&self.descriptor);
        SearchTicket {
            generation: self.generation,
            request,
        }
    }

    /// Single page-reset point: any change to filters, sort, or page size
    /// returns to the first page.
    fn reconfigure(&mut self, change: impl FnOnce(&mut QueryDescriptor)) {
        let before = self.descriptor.clone();
        change(&mut self.descriptor);
        if self.descriptor != before {
            self.descriptor.page = FIRST_PAGE;
        }
    }
}

/// Run `ticket`'s search and hydrate the returned identifiers.
///
/// An empty id list skips the detail lookup and keeps the reported total.
///
/// # Errors
///
/// Propagates any [`crate::CatalogError`] from either call.
pub async fn fetch_page(
    service: &dyn CatalogService,
    ticket: &SearchTicket,
) -> CatalogResult<SearchOutcome> {
    let response = service.search(&ticket.request).await?;
    if response.result_ids.is_empty() {
        return Ok(SearchOutcome {
            ids: Vec::new(),
            total: response.total,
            items: Vec::new(),
        });
    }
    let items = service.fetch_by_ids(&response.result_ids).await?;
    Ok(SearchOutcome {
        items: order_by_ids(&response.result_ids, items),
        ids: response.result_ids,
        total: response.total,
    })
}

/// Issue (if needed), run, and apply a search in one step.
///
/// Returns `false` when the descriptor was already searched.
pub async fn run_search(service: &dyn CatalogService, controller: &mut SearchController) -> bool {
    let Some(ticket) = controller.begin_search() else {
        return false;
    };
    let outcome = fetch_page(service, &ticket).await;
    controller.apply(&ticket, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::fake::FakeCatalog;
    use crate::favorites::MemoryFavoritesStore;
    use crate::model::{SearchResponse, sample_item};
    use crate::query::DEFAULT_PAGE_SIZE;
    use crate::sort::SortDirection;
    use proptest::prelude::*;

    fn response(ids: &[&str], total: u64) -> SearchResponse {
        SearchResponse {
            result_ids: ids.iter().map(|id| (*id).to_string()).collect(),
            total,
            next: None,
            prev: None,
        }
    }

    fn ready_outcome(total: u64) -> CatalogResult<SearchOutcome> {
        Ok(SearchOutcome {
            ids: Vec::new(),
            total,
            items: Vec::new(),
        })
    }

    #[test]
    fn page_size_change_resets_page() -> Result<(), QueryError> {
        let mut controller = SearchController::default();
        controller.set_page(3)?;
        assert_eq!(controller.descriptor().offset(), 40);
        controller.set_page_size(50)?;
        assert_eq!(controller.descriptor().page, 1);
        let request = derive_request(controller.descriptor());
        assert_eq!(request.from, 0);
        assert_eq!(request.size, 50);
        Ok(())
    }

    #[test]
    fn filter_and_sort_changes_reset_page() -> Result<(), QueryError> {
        let mut controller = SearchController::default();
        controller.set_page(4)?;
        controller.toggle_category("Pug");
        assert_eq!(controller.descriptor().page, 1);

        controller.set_page(4)?;
        controller.select_sort(SortField::Age);
        assert_eq!(controller.descriptor().page, 1);
        assert_eq!(controller.sort().direction, SortDirection::Ascending);

        controller.set_page(2)?;
        controller.clear_categories();
        assert_eq!(controller.descriptor().page, 1);
        Ok(())
    }

    #[test]
    fn unchanged_configuration_keeps_page() -> Result<(), QueryError> {
        let mut controller = SearchController::default();
        controller.set_page(2)?;
        controller.set_page_size(DEFAULT_PAGE_SIZE)?;
        controller.set_categories(Vec::new());
        assert_eq!(controller.descriptor().page, 2);
        Ok(())
    }

    #[test]
    fn navigation_leaves_other_fields_untouched() -> Result<(), QueryError> {
        let mut controller = SearchController::default();
        controller.set_categories(vec!["Beagle".to_string()]);
        controller.select_sort(SortField::Name);
        controller.set_page_size(10)?;
        let before = controller.descriptor().clone();
        controller.set_page(7)?;
        let after = controller.descriptor();
        assert_eq!(after.categories, before.categories);
        assert_eq!(after.sort, before.sort);
        assert_eq!(after.page_size, before.page_size);
        assert_eq!(after.page, 7);
        assert_eq!(controller.set_page(0), Err(QueryError::PageOutOfRange { page: 0 }));
        Ok(())
    }

    #[test]
    fn identical_descriptor_is_issued_once() {
        let mut controller = SearchController::default();
        let first = controller.begin_search().expect("first search issued");
        assert!(controller.begin_search().is_none());
        assert!(controller.apply(&first, ready_outcome(3)));
        assert!(controller.begin_search().is_none());
        let forced = controller.refresh();
        assert!(forced.generation() > first.generation());
    }

    #[test]
    fn stale_response_is_ignored() {
        let mut controller = SearchController::default();
        let stale = controller.begin_search().expect("issued");
        controller.toggle_category("Pug");
        let fresh = controller.begin_search().expect("issued");

        assert!(controller.apply(&fresh, ready_outcome(5)));
        assert!(!controller.apply(
            &stale,
            Ok(SearchOutcome {
                ids: vec!["old".into()],
                total: 999,
                items: vec![sample_item("old", "Akita")],
            })
        ));
        assert_eq!(controller.results().bounds.total, 5);
        assert!(controller.results().ids.is_empty());
    }

    #[test]
    fn failure_clears_results_and_allows_retry() {
        let mut controller = SearchController::default();
        let ticket = controller.begin_search().expect("issued");
        controller.apply(&ticket, Err(CatalogError::transport("search", "boom")));
        assert_eq!(
            controller.status(),
            &SearchStatus::Failed {
                message: "Failed to fetch dogs. Please adjust your filters or try again.".into(),
            }
        );
        assert!(controller.results().items.is_empty());
        assert_eq!(controller.results().bounds.total, 0);
        assert!(controller.begin_search().is_some());
    }

    #[test]
    fn page_bounds_describe_window() {
        let bounds = PageBounds::compute(2, 20, 45);
        assert_eq!(bounds.total_pages, 3);
        assert_eq!((bounds.first, bounds.last), (21, 40));
        assert!(bounds.has_next());
        assert!(bounds.has_prev());

        let last = PageBounds::compute(3, 20, 45);
        assert_eq!((last.first, last.last), (41, 45));
        assert!(!last.has_next());

        let empty = PageBounds::compute(1, 20, 0);
        assert_eq!((empty.first, empty.last, empty.total_pages), (0, 0, 0));
        assert!(!empty.has_prev());
    }

    #[test]
    fn next_page_requires_known_later_page() {
        let mut controller = SearchController::default();
        assert!(!controller.next_page());
        let ticket = controller.begin_search().expect("issued");
        controller.apply(&ticket, ready_outcome(45));
        assert!(controller.next_page());
        assert_eq!(controller.descriptor().page, 2);
        assert!(controller.prev_page());
        assert!(!controller.prev_page());
    }

    #[test]
    fn rows_flag_favorites() {
        let mut favorites = FavoriteSet::open(Box::new(MemoryFavoritesStore::default()));
        favorites.toggle("b");
        let mut controller = SearchController::default();
        let ticket = controller.begin_search().expect("issued");
        controller.apply(
            &ticket,
            Ok(SearchOutcome {
                ids: vec!["a".into(), "b".into()],
                total: 2,
                items: vec![sample_item("a", "Pug"), sample_item("b", "Pug")],
            }),
        );
        let flags: Vec<bool> = controller
            .results()
            .rows(&favorites)
            .iter()
            .map(|row| row.favorited)
            .collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[tokio::test]
    async fn run_search_hydrates_in_result_order() {
        let service = FakeCatalog::with_items(vec![
            sample_item("a", "Pug"),
            sample_item("b", "Beagle"),
        ]);
        service.push_search(Ok(response(&["a", "b"], 2)));
        let mut controller = SearchController::default();

        assert!(run_search(&service, &mut controller).await);
        let ids: Vec<&str> = controller
            .results()
            .items
            .iter()
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(controller.status(), &SearchStatus::Ready);
        assert_eq!(service.calls(), vec!["search:0:breed:asc", "fetch:a,b"]);

        assert!(!run_search(&service, &mut controller).await);
    }

    #[tokio::test]
    async fn empty_result_skips_detail_lookup() {
        let service = FakeCatalog::default();
        service.push_search(Ok(response(&[], 0)));
        let mut controller = SearchController::default();
        controller.toggle_category("Nonexistent");

        assert!(run_search(&service, &mut controller).await);
        assert_eq!(service.calls().len(), 1);
        assert!(controller.results().items.is_empty());
    }

    proptest! {
        #[test]
        fn any_filter_or_size_change_returns_to_first_page(
            page in 2u32..500,
            size in 1u32..200,
            breed in "[A-Za-z]{1,12}",
        ) {
            let mut controller = SearchController::default();
            controller.set_page(page).unwrap();
            controller.toggle_category(&breed);
            prop_assert_eq!(controller.descriptor().page, 1);

            controller.set_page(page).unwrap();
            let target = if size == controller.descriptor().page_size { size + 1 } else { size };
            controller.set_page_size(target).unwrap();
            prop_assert_eq!(controller.descriptor().page, 1);
            prop_assert_eq!(controller.descriptor().offset(), 0);
        }

        #[test]
        fn page_navigation_preserves_configuration(page in 1u32..10_000) {
            let mut controller = SearchController::default();
            controller.toggle_category("Pug");
            controller.select_sort(SortField::Age);
            let before = controller.descriptor().clone();
            controller.set_page(page).unwrap();
            prop_assert_eq!(&controller.descriptor().categories, &before.categories);
            prop_assert_eq!(controller.descriptor().sort, before.sort);
            prop_assert_eq!(controller.descriptor().page_size, before.page_size);
        }
    }
}
