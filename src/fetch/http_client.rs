//! Shared HTTP client construction policy.
//!
//! Centralizes networking defaults so the catalog client and the fetch
//! chain stay consistent on timeout, user-agent, and compression.

use std::time::Duration;

use reqwest::Client;

use crate::config::AppConfig;

use super::FetchError;

/// Builds the shared HTTP client from application configuration.
///
/// Configuration applied:
/// - Connect timeout (default 10 seconds)
/// - Read timeout (default 30 seconds)
/// - Gzip decompression: enabled
/// - User-agent from config
///
/// # Errors
///
/// Returns [`FetchError::ClientConstruction`] when the builder fails.
pub fn build_http_client(config: &AppConfig) -> Result<Client, FetchError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.read_timeout_secs))
        .user_agent(config.user_agent.clone())
        .gzip(true)
        .build()
        .map_err(FetchError::client_construction)
}
