//! Query descriptor and the pure derivation of search requests.

use std::collections::BTreeSet;

use crate::error::QueryError;
use crate::model::SearchRequest;
use crate::sort::{SortDirection, SortField, SortState};

/// First page index; pages are 1-based.
pub const FIRST_PAGE: u32 = 1;
/// Page size used until the user picks another.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Page sizes offered by the pager.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 20, 50, 100];

/// Filter, sort, and pagination state for one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// Category filter; empty means unfiltered.
    pub categories: BTreeSet<String>,
    /// Active sort field and direction.
    pub sort: SortState,
    /// 1-based page index.
    pub page: u32,
    /// Positive page size.
    pub page_size: u32,
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            categories: BTreeSet::new(),
            sort: SortState::default(),
            page: FIRST_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryDescriptor {
    /// Build a descriptor, validating pagination input.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when `page` is zero or `page_size` is zero.
    pub fn new(
        categories: impl IntoIterator<Item = String>,
        sort_field: SortField,
        sort_direction: SortDirection,
        page: u32,
        page_size: u32,
    ) -> Result<Self, QueryError> {
        validate_page(page)?;
        validate_page_size(page_size)?;
        Ok(Self {
            categories: normalize_categories(categories),
            sort: SortState {
                field: sort_field,
                direction: sort_direction,
            },
            page,
            page_size,
        })
    }

    /// Zero-based offset for the current page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// Derive the request submitted to the remote search endpoint.
#[must_use]
pub fn derive_request(descriptor: &QueryDescriptor) -> SearchRequest {
    SearchRequest {
        breeds: descriptor.categories.iter().cloned().collect(),
        size: descriptor.page_size,
        from: descriptor.offset(),
        sort: descriptor.sort.effective(),
    }
}

pub(crate) fn normalize_categories(values: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

pub(crate) const fn validate_page(page: u32) -> Result<(), QueryError> {
    if page < FIRST_PAGE {
        return Err(QueryError::PageOutOfRange { page });
    }
    Ok(())
}

pub(crate) const fn validate_page_size(size: u32) -> Result<(), QueryError> {
    if size == 0 {
        return Err(QueryError::InvalidPageSize);
    }
    Ok(())
}
