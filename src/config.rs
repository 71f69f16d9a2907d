//! Application configuration: catalog endpoint, proxy chain, HTTP policy.
//!
//! The ordered proxy chain lives here rather than in the fetch module so
//! the chain's composition and order are a configuration concern. The
//! defaults carry the stock public proxy endpoints; a JSON config file can
//! replace the whole chain.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default catalog API base URL (Gutendex-style listing endpoint).
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://gutendex.com/books";

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Default modeled viewport height for the reader, in scroll units.
pub const DEFAULT_VIEWPORT_HEIGHT: u64 = 800;

/// One intermediary proxy endpoint in the fetch fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyEndpoint {
    /// Short name used in logs (e.g. "corsproxy").
    pub name: String,
    /// URL prefix the percent-encoded target is appended to.
    pub prefix: String,
}

impl ProxyEndpoint {
    /// Creates a proxy endpoint from a name and prefix.
    #[must_use]
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
        }
    }
}

/// Application configuration.
///
/// Every field has a default; a config file only needs the fields it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog API base URL.
    pub catalog_base_url: String,
    /// Ordered proxy chain tried before the direct fetch.
    pub proxies: Vec<ProxyEndpoint>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: u64,
    /// User-agent header sent on every request.
    pub user_agent: String,
    /// Modeled reader viewport height, in scroll units.
    pub viewport_height: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            proxies: vec![
                ProxyEndpoint::new("corsproxy", "https://corsproxy.io/?"),
                ProxyEndpoint::new("allorigins", "https://api.allorigins.win/raw?url="),
                ProxyEndpoint::new("codetabs", "https://api.codetabs.com/v1/proxy?quest="),
            ],
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            user_agent: format!("folio/{}", env!("CARGO_PKG_VERSION")),
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a JSON file, with defaults for absent fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid JSON for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the config schema.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}
