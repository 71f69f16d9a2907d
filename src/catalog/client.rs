//! HTTP client for the catalog API and the listing supersession guard.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{CatalogEntry, CatalogError, CatalogPage};

/// Parameters of one listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// 1-based page number; incremented client-side for "load more".
    pub page: u32,
    /// Free-text search term; omitted from the request when empty.
    pub search: String,
    /// Category/topic filter; omitted from the request when empty.
    pub topic: String,
}

impl ListingQuery {
    /// Creates a query for the first page with no filters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            page: 1,
            search: String::new(),
            topic: String::new(),
        }
    }

    /// Returns a copy of this query moved to the next page.
    #[must_use]
    pub fn next_page(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed client for the two catalog endpoints.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// Creates a catalog client on top of a shared HTTP client.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetches one page of the catalog listing.
    ///
    /// Query parameters are percent-encoded; empty search/topic filters
    /// are omitted entirely rather than sent blank.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on network failure, non-success status, or
    /// a body that does not decode as a listing page.
    #[instrument(skip(self), fields(page = query.page))]
    pub async fn list(&self, query: &ListingQuery) -> Result<CatalogPage, CatalogError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|_| CatalogError::invalid_url(&self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            if query.page > 0 {
                pairs.append_pair("page", &query.page.to_string());
            }
            if !query.search.is_empty() {
                pairs.append_pair("search", &query.search);
            }
            if !query.topic.is_empty() {
                pairs.append_pair("topic", &query.topic);
            }
        }
        self.get_json(url.as_str()).await
    }

    /// Fetches a single catalog entry by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on network failure, non-success status, or
    /// a body that does not decode as an entry.
    #[instrument(skip(self))]
    pub async fn item(&self, id: u64) -> Result<CatalogEntry, CatalogError> {
        let url = format!("{}/{id}", self.base_url.trim_end_matches('/'));
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| CatalogError::network(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|source| CatalogError::network(url, source))?;
        serde_json::from_str(&body).map_err(|source| CatalogError::decode(url, source))
    }
}

/// Listing requests with at-most-one-honored in-flight semantics.
///
/// Each `search` call claims a fresh generation number; when it completes,
/// the result is applied only if no newer call has claimed a later
/// generation in the meantime. A stale request's outcome, success or
/// failure, collapses to [`CatalogError::Superseded`], which callers drop
/// silently.
///
/// The generation counter is the only shared state; the execution model is
/// a single logical task per UI surface, so no further locking is needed.
#[derive(Debug)]
pub struct ListingSession {
    client: CatalogClient,
    generation: AtomicU64,
}

impl ListingSession {
    /// Creates a listing session around a catalog client.
    #[must_use]
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client,
            generation: AtomicU64::new(0),
        }
    }

    /// Runs a listing query, superseding any query still in flight.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Superseded`] when a newer query was issued
    /// before this one completed; the stale result is never returned.
    /// Other [`CatalogError`] values surface only for the newest query.
    #[instrument(skip(self), fields(page = query.page))]
    pub async fn search(&self, query: &ListingQuery) -> Result<CatalogPage, CatalogError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.client.list(query).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Listing request superseded; dropping result");
            return Err(CatalogError::superseded(generation));
        }
        result
    }
}
