//! Resource fetching through an ordered fallback chain.
//!
//! Remote book content sits behind servers that frequently refuse direct
//! cross-origin-style access, so every fetch runs through an ordered chain
//! of intermediary proxy endpoints before falling back to a direct request.
//!
//! # Architecture
//!
//! - [`FetchStrategy`] - Async trait that individual fetch paths implement
//! - [`ProxyStrategy`] - Fetches the target through a proxy URL prefix
//! - [`DirectStrategy`] - Fetches the target URL as-is (always last)
//! - [`FetchChain`] - Ordered collection of strategies with the fetch loop
//!
//! The chain makes exactly one attempt per candidate, in a fixed
//! deterministic order. The composition of the chain is a configuration
//! concern ([`AppConfig::proxies`](crate::config::AppConfig)), not
//! hard-coded.
//!
//! # Example
//!
//! ```no_run
//! use folio_core::config::AppConfig;
//! use folio_core::fetch::FetchChain;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let chain = FetchChain::from_config(&AppConfig::default())?;
//! let resource = chain.fetch("https://www.gutenberg.org/files/84/84-h.htm").await?;
//! println!("Fetched {} bytes", resource.body.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod http_client;

pub use error::FetchError;
pub use http_client::build_http_client;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};
use url::Url;

use crate::config::AppConfig;

/// The body and content type of a successfully fetched resource.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Raw response body.
    pub body: Vec<u8>,
    /// The Content-Type header value, if the server sent one.
    pub content_type: Option<String>,
}

impl FetchedResource {
    /// Returns the body decoded as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Trait that all fetch paths implement.
///
/// A strategy turns a target URL into the URL actually requested (for a
/// proxy, the proxied form with the target encoded into a query parameter)
/// and performs a single GET attempt.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn FetchStrategy>`. Rust 2024 native async traits are not
/// object-safe, so `async_trait` is required for the chain pattern.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Returns the strategy's name (e.g. "corsproxy", "direct").
    fn name(&self) -> &str;

    /// Returns the URL this strategy would request for `target`.
    fn request_url(&self, target: &str) -> String;

    /// Makes a single GET attempt for `target` through this path.
    async fn fetch(&self, client: &Client, target: &str)
    -> Result<FetchedResource, FetchError> {
        execute_get(client, &self.request_url(target), target).await
    }
}

/// Fetches the target through an intermediary proxy endpoint.
///
/// The proxy accepts the percent-encoded target URL appended to a fixed
/// prefix, e.g. `https://corsproxy.io/?<encoded target>`.
#[derive(Debug, Clone)]
pub struct ProxyStrategy {
    name: String,
    prefix: String,
}

impl ProxyStrategy {
    /// Creates a proxy strategy from a name and URL prefix.
    #[must_use]
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl FetchStrategy for ProxyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn request_url(&self, target: &str) -> String {
        format!("{}{}", self.prefix, urlencoding::encode(target))
    }
}

/// Fetches the target URL as-is, with no intermediary.
///
/// Always the last candidate in the chain: if every proxy fails, the
/// direct path is the final attempt before the fetch is declared
/// unreachable.
#[derive(Debug, Clone, Default)]
pub struct DirectStrategy;

impl DirectStrategy {
    /// Creates a new `DirectStrategy`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FetchStrategy for DirectStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn request_url(&self, target: &str) -> String {
        target.to_string()
    }
}

/// An ordered chain of fetch strategies with the fallback loop.
///
/// Candidates are tried in construction order, one GET attempt each; the
/// first successful status wins. Per-candidate failures are logged and
/// absorbed. Only exhaustion of the whole chain is an error.
pub struct FetchChain {
    client: Client,
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl FetchChain {
    /// Creates a chain from an explicit strategy list.
    #[must_use]
    pub fn new(client: Client, strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self { client, strategies }
    }

    /// Builds the default chain from configuration: each configured proxy
    /// in order, then the direct path.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientConstruction`] when the HTTP client
    /// cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Builds the configured chain on top of an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, config: &AppConfig) -> Self {
        let mut strategies: Vec<Box<dyn FetchStrategy>> = config
            .proxies
            .iter()
            .map(|proxy| {
                Box::new(ProxyStrategy::new(&proxy.name, &proxy.prefix))
                    as Box<dyn FetchStrategy>
            })
            .collect();
        strategies.push(Box::new(DirectStrategy::new()));
        Self::new(client, strategies)
    }

    /// Returns the number of candidate paths in the chain.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.strategies.len()
    }

    /// Fetches `url` through the chain.
    ///
    /// Tries each candidate in order with a single attempt; the first
    /// response with a successful status is returned. No retry happens
    /// within a candidate and the order is fixed, trading latency for
    /// simplicity over availability.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when `url` does not parse, and
    /// [`FetchError::Unreachable`] when every candidate path fails.
    #[tracing::instrument(skip(self), fields(candidates = self.strategies.len()))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedResource, FetchError> {
        if Url::parse(url).is_err() {
            return Err(FetchError::invalid_url(url));
        }

        let mut attempts: usize = 0;
        for strategy in &self.strategies {
            attempts += 1;
            match strategy.fetch(&self.client, url).await {
                Ok(resource) => {
                    debug!(
                        path = strategy.name(),
                        bytes = resource.body.len(),
                        "Fetch succeeded"
                    );
                    return Ok(resource);
                }
                Err(error) => {
                    warn!(
                        path = strategy.name(),
                        error = %error,
                        "Fetch path failed; trying next candidate"
                    );
                }
            }
        }

        Err(FetchError::unreachable(url, attempts))
    }
}

async fn execute_get(
    client: &Client,
    request_url: &str,
    target: &str,
) -> Result<FetchedResource, FetchError> {
    let response = client
        .get(request_url)
        .send()
        .await
        .map_err(|source| FetchError::network(target, source))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::status(target, status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = response
        .bytes()
        .await
        .map_err(|source| FetchError::network(target, source))?
        .to_vec();

    Ok(FetchedResource { body, content_type })
}
