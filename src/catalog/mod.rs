//! Catalog API client: listing, item lookup, and request supersession.
//!
//! The catalog is an external Gutendex-style JSON API:
//!
//! - `GET <base>?page=<n>&search=<term>&topic=<topic>` returns a page of
//!   entries with a cursor-via-`next` URL
//! - `GET <base>/<id>` returns a single entry
//!
//! [`ListingSession`] enforces the at-most-one-honored in-flight listing
//! rule: issuing a new query supersedes any request still in flight, and a
//! superseded request's result is dropped as the benign
//! [`CatalogError::Superseded`] rather than applied.

mod client;
mod error;

pub use client::{CatalogClient, ListingQuery, ListingSession};
pub use error::CatalogError;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Debounce interval UI callers should apply to search input before
/// issuing a listing request, in milliseconds.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// One author of a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    /// Author display name.
    pub name: String,
}

/// A single book entry as served by the catalog.
///
/// Immutable once fetched; `formats` maps MIME-type strings to resource
/// URLs and drives format resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Identifier, unique per catalog source.
    pub id: u64,
    /// Book title.
    pub title: String,
    /// Ordered author list.
    #[serde(default)]
    pub authors: Vec<Author>,
    /// MIME type → resource URL for every available variant.
    #[serde(default)]
    pub formats: HashMap<String, String>,
}

impl CatalogEntry {
    /// Returns the first author's name, or a fixed placeholder when the
    /// entry carries no authors.
    #[must_use]
    pub fn primary_author(&self) -> &str {
        self.authors
            .first()
            .map_or("Unknown author", |author| author.name.as_str())
    }
}

/// One page of catalog listing results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPage {
    /// Entries on this page.
    #[serde(default)]
    pub results: Vec<CatalogEntry>,
    /// Cursor URL for the next page, absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
}
