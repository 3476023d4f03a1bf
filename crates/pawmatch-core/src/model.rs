//! Catalog entries and the wire DTOs exchanged with the remote service.

use serde::{Deserialize, Serialize};

use crate::sort::EffectiveSort;

/// Upper bound on identifiers accepted by a single detail lookup.
pub const MAX_FETCH_IDS: usize = 100;

/// A single catalog entry. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: String,
    /// Image URL.
    pub img: String,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Location code.
    pub zip_code: String,
    /// Category label.
    pub breed: String,
}

/// Search parameters submitted to `GET /dogs/search`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    /// Category filter; empty means no filter. Sorted and de-duplicated.
    pub breeds: Vec<String>,
    /// Page size (`size`).
    pub size: u32,
    /// Zero-based offset (`from`).
    pub from: u64,
    /// Resolved sort (`sort=field:order`).
    pub sort: EffectiveSort,
}

impl SearchRequest {
    /// Encode as query pairs in a stable order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(self.breeds.len() + 3);
        for breed in &self.breeds {
            pairs.push(("breeds", breed.clone()));
        }
        pairs.push(("size", self.size.to_string()));
        pairs.push(("from", self.from.to_string()));
        pairs.push(("sort", self.sort.to_param()));
        pairs
    }
}

/// Response body of `GET /dogs/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Identifiers for the requested page, in result order.
    #[serde(default)]
    pub result_ids: Vec<String>,
    /// Total matches across all pages.
    #[serde(default)]
    pub total: u64,
    /// Relative query for the next page, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Relative query for the previous page, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// Response body of `POST /dogs/match`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResponse {
    /// Identifier chosen from the submitted favorites.
    #[serde(rename = "match")]
    pub match_id: String,
}

/// Request body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Reorder fetched items to follow `ids`. Unknown items are dropped.
#[must_use]
pub fn order_by_ids(ids: &[String], mut items: Vec<Item>) -> Vec<Item> {
    let mut ordered = Vec::with_capacity(items.len());
    for id in ids {
        if let Some(position) = items.iter().position(|item| &item.id == id) {
            ordered.push(items.swap_remove(position));
        }
    }
    ordered
}

#[cfg(test)]
pub(crate) fn sample_item(id: &str, breed: &str) -> Item {
    Item {
        id: id.to_string(),
        img: format!("https://img.example/{id}.jpg"),
        name: format!("dog-{id}"),
        age: 3,
        zip_code: "02139".to_string(),
        breed: breed.to_string(),
    }
}
