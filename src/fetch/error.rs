//! Error types for the resource fetch module.
//!
//! These errors distinguish per-candidate failures (network, HTTP status),
//! which the fetch chain absorbs while moving to the next candidate, from
//! chain exhaustion, which is the only failure surfaced to callers.

use thiserror::Error;

/// Errors that can occur while fetching a remote resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The target URL that failed to fetch.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// The target URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Every candidate path (all proxies, then direct) failed.
    #[error("unreachable resource {url}: all {attempts} fetch paths exhausted")]
    Unreachable {
        /// The target URL that could not be reached.
        url: String,
        /// Number of candidate paths attempted.
        attempts: usize,
    },

    /// HTTP client construction failed during chain setup.
    #[error("HTTP client construction failed: {source}")]
    ClientConstruction {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
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

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a chain-exhaustion error.
    pub fn unreachable(url: impl Into<String>, attempts: usize) -> Self {
        Self::Unreachable {
            url: url.into(),
            attempts,
        }
    }

    /// Creates a client construction error.
    pub fn client_construction(source: reqwest::Error) -> Self {
        Self::ClientConstruction { source }
    }

    /// Returns true if this is the terminal chain-exhaustion error.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` because the
// variants require the target URL, which the source error does not carry.
// The helper constructors are the pattern used throughout this crate.
