//! reqwest-backed implementation of the catalog and session services.
//!
//! Authentication is cookie based: the `set-cookie` values returned by login
//! are replayed as a `Cookie` header on every later call.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use pawmatch_core::{
    CatalogError, CatalogResult, CatalogService, Item, LoginRequest, MAX_FETCH_IDS, MatchResponse,
    SearchRequest, SearchResponse, SessionService,
};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

const BODY_EXCERPT_LIMIT: usize = 200;

/// Remote catalog reached over HTTP.
pub(crate) struct HttpCatalog {
    client: Client,
    base_url: Url,
    cookie: RwLock<Option<String>>,
}

impl HttpCatalog {
    /// Endpoint paths are joined relative to `base_url`, so a path prefix such
    /// as `https://host/api` is kept.
    pub(crate) fn new(client: Client, mut base_url: Url, cookie: Option<String>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client,
            base_url,
            cookie: RwLock::new(cookie),
        }
    }

    /// Cookie currently attached to requests.
    pub(crate) fn cookie(&self) -> Option<String> {
        self.cookie
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_cookie(&self, value: Option<String>) {
        *self.cookie.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    fn endpoint(&self, operation: &'static str, path: &str) -> CatalogResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| CatalogError::transport(operation, format!("invalid base URL: {err}")))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.cookie() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> CatalogResult<Response> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|err| CatalogError::transport(operation, err))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_response(operation, response).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> CatalogResult<T> {
        let response = self.send(operation, builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| CatalogError::transport(operation, format!("invalid response body: {err}")))
    }
}

/// Map a non-success response onto the catalog error taxonomy.
pub(crate) async fn classify_response(operation: &'static str, response: Response) -> CatalogError {
    let status = response.status();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        debug!(operation, %status, "request rejected as unauthenticated");
        return CatalogError::Auth { operation };
    }
    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.trim().chars().take(BODY_EXCERPT_LIMIT).collect();
    let detail = if excerpt.is_empty() {
        format!("status {status}")
    } else {
        format!("status {status}: {excerpt}")
    };
    warn!(operation, %status, "request failed");
    CatalogError::Transport { operation, detail }
}

/// Reduce `set-cookie` values to a single `Cookie` header value.
fn cookie_header<'a>(set_cookies: impl Iterator<Item = &'a str>) -> Option<String> {
    let pairs: Vec<&str> = set_cookies
        .filter_map(|raw| raw.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();
    (!pairs.is_empty()).then(|| pairs.join("; "))
}

#[async_trait]
impl CatalogService for HttpCatalog {
    async fn search(&self, request: &SearchRequest) -> CatalogResult<SearchResponse> {
        let url = self.endpoint("search", "dogs/search")?;
        debug!(query = ?request.query_pairs(), "searching catalog");
        let builder = self.client.get(url).query(&request.query_pairs());
        self.send_json("search", builder).await
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> CatalogResult<Vec<Item>> {
        let url = self.endpoint("fetch_by_ids", "dogs")?;
        let mut items = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_FETCH_IDS) {
            let builder = self.client.post(url.clone()).json(chunk);
            let batch: Vec<Item> = self.send_json("fetch_by_ids", builder).await?;
            items.extend(batch);
        }
        Ok(items)
    }

    async fn fetch_breeds(&self) -> CatalogResult<Vec<String>> {
        let url = self.endpoint("fetch_breeds", "dogs/breeds")?;
        self.send_json("fetch_breeds", self.client.get(url)).await
    }

    async fn generate_match(&self, ids: &[String]) -> CatalogResult<String> {
        let url = self.endpoint("generate_match", "dogs/match")?;
        let response: MatchResponse = self
            .send_json("generate_match", self.client.post(url).json(ids))
            .await?;
        Ok(response.match_id)
    }
}

#[async_trait]
impl SessionService for HttpCatalog {
    async fn login(&self, name: &str, email: &str) -> CatalogResult<()> {
        let url = self.endpoint("login", "auth/login")?;
        let body = LoginRequest {
            name: name.to_string(),
            email: email.to_string(),
        };
        let response = self.send("login", self.client.post(url).json(&body)).await?;
        let cookie = cookie_header(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );
        if cookie.is_none() {
            warn!("login succeeded without a session cookie");
        }
        self.set_cookie(cookie);
        Ok(())
    }

    async fn logout(&self) -> CatalogResult<()> {
        let url = self.endpoint("logout", "auth/logout")?;
        let result = self.send("logout", self.client.post(url)).await;
        self.set_cookie(None);
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use pawmatch_core::{EffectiveSort, SortField, SortOrder};
    use serde_json::json;

    fn catalog(server: &MockServer, cookie: Option<&str>) -> HttpCatalog {
        HttpCatalog::new(
            Client::new(),
            server.base_url().parse().expect("valid URL"),
            cookie.map(str::to_string),
        )
    }

    fn dog(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "img": format!("https://img.example/{id}.jpg"),
            "name": format!("dog-{id}"),
            "age": 4,
            "zip_code": "10001",
            "breed": "Beagle"
        })
    }

    #[test]
    fn cookie_header_keeps_name_value_pairs() {
        let header = cookie_header(
            [
                "fetch-access-token=abc; Path=/; HttpOnly",
                "other=1; Secure",
                "junk",
            ]
            .into_iter(),
        );
        assert_eq!(header.as_deref(), Some("fetch-access-token=abc; other=1"));
        assert!(cookie_header(std::iter::empty()).is_none());
    }

    #[tokio::test]
    async fn login_captures_cookie_and_replays_it() -> CatalogResult<()> {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(json!({"name": "Ada", "email": "ada@example.com"}));
            then.status(200)
                .header("set-cookie", "fetch-access-token=tok; HttpOnly")
                .body("OK");
        });
        let breeds = server.mock(|when, then| {
            when.method(GET)
                .path("/dogs/breeds")
                .header("cookie", "fetch-access-token=tok");
            then.status(200).json_body(json!(["Pug", "Akita"]));
        });

        let catalog = catalog(&server, None);
        catalog.login("Ada", "ada@example.com").await?;
        assert_eq!(catalog.cookie().as_deref(), Some("fetch-access-token=tok"));
        let listed = catalog.fetch_breeds().await?;

        login.assert();
        breeds.assert();
        assert_eq!(listed, vec!["Pug", "Akita"]);
        Ok(())
    }

    #[tokio::test]
    async fn search_encodes_query_pairs() -> CatalogResult<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/dogs/search")
                .query_param("breeds", "Pug")
                .query_param("size", "20")
                .query_param("from", "40")
                .query_param("sort", "age:desc");
            then.status(200)
                .json_body(json!({"resultIds": ["a"], "total": 41, "prev": "/dogs/search?from=20"}));
        });

        let request = SearchRequest {
            breeds: vec!["Pug".into()],
            size: 20,
            from: 40,
            sort: EffectiveSort {
                field: SortField::Age,
                order: SortOrder::Desc,
            },
        };
        let response = catalog(&server, Some("c=1")).search(&request).await?;
        mock.assert();
        assert_eq!(response.result_ids, vec!["a"]);
        assert_eq!(response.total, 41);
        Ok(())
    }

    #[tokio::test]
    async fn base_url_path_prefix_is_kept() -> CatalogResult<()> {
        let server = MockServer::start_async().await;
        let breeds = server.mock(|when, then| {
            when.method(GET).path("/api/dogs/breeds");
            then.status(200).json_body(json!(["Pug"]));
        });
        let catalog = HttpCatalog::new(
            Client::new(),
            format!("{}/api", server.base_url()).parse().expect("valid URL"),
            None,
        );
        assert_eq!(catalog.fetch_breeds().await?, vec!["Pug"]);
        breeds.assert();
        Ok(())
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/dogs/breeds");
            then.status(401).body("Unauthorized");
        });
        let err = catalog(&server, None)
            .fetch_breeds()
            .await
            .expect_err("unauthorized");
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn server_error_maps_to_transport_with_excerpt() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/dogs/match");
            then.status(500).body("upstream exploded");
        });
        let err = catalog(&server, None)
            .generate_match(&["a".into()])
            .await
            .expect_err("server error");
        let message = err.to_string();
        assert!(message.starts_with("generate_match failed: status 500"));
        assert!(message.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn match_and_details_round_trip() -> CatalogResult<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/dogs/match").json_body(json!(["a", "b"]));
            then.status(200).json_body(json!({"match": "b"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/dogs").json_body(json!(["b"]));
            then.status(200).json_body(json!([dog("b")]));
        });
        let catalog = catalog(&server, None);
        let picked = catalog.generate_match(&["a".into(), "b".into()]).await?;
        let items = catalog.fetch_by_ids(&[picked]).await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].zip_code, "10001");
        Ok(())
    }

    #[tokio::test]
    async fn fetch_by_ids_chunks_large_requests() -> CatalogResult<()> {
        let server = MockServer::start_async().await;
        let ids: Vec<String> = (0..=MAX_FETCH_IDS).map(|n| n.to_string()).collect();
        let first: Vec<String> = ids[..MAX_FETCH_IDS].to_vec();
        let first_mock = server.mock(|when, then| {
            when.method(POST).path("/dogs").json_body(json!(first));
            then.status(200).json_body(json!([dog("0")]));
        });
        let second_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/dogs")
                .json_body(json!([MAX_FETCH_IDS.to_string()]));
            then.status(200).json_body(json!([dog("100")]));
        });

        let items = catalog(&server, None).fetch_by_ids(&ids).await?;
        first_mock.assert();
        second_mock.assert();
        assert_eq!(items.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn logout_clears_cookie_even_on_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/logout");
            then.status(503);
        });
        let catalog = catalog(&server, Some("fetch-access-token=tok"));
        assert!(catalog.logout().await.is_err());
        assert!(catalog.cookie().is_none());
    }
}
