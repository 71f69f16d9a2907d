//! Error types for the catalog client.

use thiserror::Error;

/// Errors that can occur while talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network-level error reaching the catalog.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The request URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response from the catalog.
    #[error("HTTP {status} requesting {url}")]
    Status {
        /// The request URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The catalog response body did not decode as the expected JSON.
    #[error("failed to decode catalog response from {url}: {source}")]
    Decode {
        /// The request URL whose body failed to decode.
        url: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// The catalog base URL in configuration is malformed.
    #[error("invalid catalog URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// A newer listing request superseded this one before it completed.
    ///
    /// Never surfaced to users: callers swallow this and keep the newer
    /// request's results.
    #[error("listing request superseded (generation {generation})")]
    Superseded {
        /// The generation number of the superseded request.
        generation: u64,
    },
}

impl CatalogError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a superseded-request marker.
    #[must_use]
    pub fn superseded(generation: u64) -> Self {
        Self::Superseded { generation }
    }

    /// Returns true if this error marks a superseded listing request.
    ///
    /// Superseded requests are benign no-ops: the caller drops the stale
    /// result silently instead of surfacing an error.
    #[must_use]
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}
