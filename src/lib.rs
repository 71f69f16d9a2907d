//! Folio Core Library
//!
//! This library provides the core functionality for the folio reader,
//! which browses a remote catalog of public-domain e-books and turns a
//! catalog entry into a readable, position-persistent document.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Catalog API client, listing queries, request supersession
//! - [`config`] - Catalog endpoint, proxy chain, and HTTP policy
//! - [`fetch`] - Resource fetching through the proxy fallback chain
//! - [`format`] - Readable-variant and cover selection from format maps
//! - [`normalize`] - Sanitization into the canonical document model
//! - [`reader`] - Reader session lifecycle and directional navigation
//! - [`store`] - Persisted reading progress and recent-books list

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod fetch;
pub mod format;
pub mod normalize;
pub mod reader;
pub mod store;

// Re-export commonly used types
pub use catalog::{
    Author, CatalogClient, CatalogEntry, CatalogError, CatalogPage, ListingQuery, ListingSession,
    SEARCH_DEBOUNCE_MS,
};
pub use config::{AppConfig, ConfigError, ProxyEndpoint};
pub use fetch::{FetchChain, FetchError, FetchedResource};
pub use format::{ContentSource, FormatError, PLACEHOLDER_COVER, resolve_content, resolve_cover};
pub use normalize::{ImageAsset, NormalizedContent, RenderedDocument, normalize, resolve_images};
pub use reader::navigation::{Direction, InputEvent, Key, SWIPE_THRESHOLD, Viewport};
pub use reader::{OpenBook, ReadError, ReaderSession, SessionState};
pub use store::{
    JsonFileStore, MAX_RECENT_BOOKS, MemoryStore, ProgressStore, RecentBook, RecentBooks,
    StateStore, StoreError,
};
