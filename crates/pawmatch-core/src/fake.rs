//! Scripted in-memory catalog used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CatalogError, CatalogResult};
use crate::model::{Item, SearchRequest, SearchResponse};
use crate::service::{CatalogService, SessionService};

#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub(crate) items: HashMap<String, Item>,
    pub(crate) breeds: Vec<String>,
    pub(crate) search_results: Mutex<VecDeque<CatalogResult<SearchResponse>>>,
    pub(crate) matches: Mutex<VecDeque<CatalogResult<String>>>,
    pub(crate) breeds_error: Mutex<Option<CatalogError>>,
    pub(crate) fetch_error: Mutex<Option<CatalogError>>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub(crate) fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn push_search(&self, result: CatalogResult<SearchResponse>) {
        self.search_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_match(&self, result: CatalogResult<String>) {
        self.matches.lock().unwrap().push_back(result);
    }

    pub(crate) fn fail_fetch(&self, error: CatalogError) {
        *self.fetch_error.lock().unwrap() = Some(error);
    }

    pub(crate) fn fail_breeds(&self, error: CatalogError) {
        *self.breeds_error.lock().unwrap() = Some(error);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn search(&self, request: &SearchRequest) -> CatalogResult<SearchResponse> {
        self.record(format!("search:{}:{}", request.from, request.sort.to_param()));
        self.search_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CatalogError::transport("search", "no scripted result")))
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> CatalogResult<Vec<Item>> {
        self.record(format!("fetch:{}", ids.join(",")));
        if let Some(error) = self.fetch_error.lock().unwrap().take() {
            return Err(error);
        }
        // Reverse to exercise callers that must not rely on response order.
        Ok(ids
            .iter()
            .rev()
            .filter_map(|id| self.items.get(id).cloned())
            .collect())
    }

    async fn fetch_breeds(&self) -> CatalogResult<Vec<String>> {
        self.record("breeds");
        if let Some(error) = self.breeds_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.breeds.clone())
    }

    async fn generate_match(&self, ids: &[String]) -> CatalogResult<String> {
        self.record(format!("match:{}", ids.join(",")));
        self.matches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CatalogError::transport("generate_match", "no scripted match")))
    }
}

#[async_trait]
impl SessionService for FakeCatalog {
    async fn login(&self, name: &str, _email: &str) -> CatalogResult<()> {
        self.record(format!("login:{name}"));
        Ok(())
    }

    async fn logout(&self) -> CatalogResult<()> {
        self.record("logout");
        Ok(())
    }
}
