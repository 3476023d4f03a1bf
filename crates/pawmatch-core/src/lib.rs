#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
//! Search, favorites, and match state for the pawmatch catalog client.
//!
//! Everything here is transport-agnostic: the remote catalog and session
//! endpoints are reached through the traits in [`service`], and favorites are
//! mirrored through a [`favorites::FavoritesStore`]. The CLI crate supplies the
//! HTTP and file-backed implementations.
//!
//! Layout:
//! - `model.rs`: catalog items and wire DTOs
//! - `sort.rs`: sort field/direction cycle
//! - `query.rs`: query descriptor and request derivation
//! - `search.rs`: pagination controller with stale-response guard
//! - `favorites.rs`: favorites set and durable stores
//! - `matching.rs`: favorites surface and match generation flow
//! - `breeds.rs` / `session.rs`: breed list loading and session probing
//! - `service.rs` / `error.rs`: collaborator traits and error taxonomy

pub mod breeds;
pub mod error;
pub mod favorites;
pub mod matching;
pub mod model;
pub mod query;
pub mod search;
pub mod service;
pub mod session;
pub mod sort;

#[cfg(test)]
pub(crate) mod fake;

pub use breeds::{BREEDS_FAILED_MESSAGE, BreedList, load_breeds};
pub use error::{CatalogError, CatalogResult, QueryError, StoreError, StoreResult};
pub use favorites::{
    FAVORITES_KEY, FavoriteSet, FavoritesStore, JsonFileStore, MemoryFavoritesStore, ToggleOutcome,
};
pub use matching::{
    MatchFailure, MatchSession, MatchStage, MatchTicket, load_favorite_details, run_match,
};
pub use model::{
    Item, LoginRequest, MAX_FETCH_IDS, MatchResponse, SearchRequest, SearchResponse, order_by_ids,
};
pub use query::{
    DEFAULT_PAGE_SIZE, FIRST_PAGE, PAGE_SIZE_OPTIONS, QueryDescriptor, derive_request,
};
pub use search::{
    PageBounds, ResultPage, ResultRow, SEARCH_FAILED_MESSAGE, SearchController, SearchOutcome,
    SearchStatus, SearchTicket, fetch_page, run_search,
};
pub use service::{CatalogService, SessionService};
pub use session::{SessionStatus, check_session};
pub use sort::{EffectiveSort, SortDirection, SortField, SortOrder, SortState};
