//! Collaborator traits for the remote catalog and session endpoints.

use async_trait::async_trait;

use crate::error::CatalogResult;
use crate::model::{Item, SearchRequest, SearchResponse};

#[async_trait]
/// Search, detail lookup, breed list, and match generation.
pub trait CatalogService: Send + Sync {
    /// Run a paginated search.
    async fn search(&self, request: &SearchRequest) -> CatalogResult<SearchResponse>;
    /// Fetch details for `ids`. Result order is not guaranteed to follow `ids`.
    async fn fetch_by_ids(&self, ids: &[String]) -> CatalogResult<Vec<Item>>;
    /// List every known category label.
    async fn fetch_breeds(&self) -> CatalogResult<Vec<String>>;
    /// Ask the service to pick one identifier out of `ids`.
    async fn generate_match(&self, ids: &[String]) -> CatalogResult<String>;
}

#[async_trait]
/// Cookie-backed login and logout.
pub trait SessionService: Send + Sync {
    /// Start a session for `name` / `email`.
    async fn login(&self, name: &str, email: &str) -> CatalogResult<()>;
    /// End the current session.
    async fn logout(&self) -> CatalogResult<()>;
}
