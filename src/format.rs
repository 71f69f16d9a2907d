//! Format resolution: picking one readable variant from a catalog entry.
//!
//! A catalog entry advertises several format variants keyed by MIME type.
//! Content resolution walks a fixed preference ladder (HTML first, then
//! UTF-8 plain text, then any plain text) and is deterministic: when
//! several keys match a rung by prefix, the lexicographically smallest key
//! wins. Cover resolution is a separate concern used by the catalog
//! listing and never fails.

use thiserror::Error;

use crate::catalog::CatalogEntry;

/// Fixed placeholder used when an entry has no JPEG cover variant.
pub const PLACEHOLDER_COVER: &str = "assets/cover-placeholder.jpg";

/// The single content stream selected for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSource {
    /// Resource URL of the chosen variant.
    pub url: String,
    /// True when the variant is HTML, selecting the markup normalization
    /// path with inline-image rewriting.
    pub is_markup: bool,
}

/// Errors from format resolution.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The entry has neither an HTML nor a plain-text variant.
    #[error("no readable format for book {book_id} (available: {})", available.join(", "))]
    NoReadableFormat {
        /// The entry whose formats were inspected.
        book_id: u64,
        /// The MIME keys the entry did advertise, sorted.
        available: Vec<String>,
    },
}

/// Resolves the preferred readable content stream for an entry.
///
/// Preference order: `text/html` over `text/plain; charset=utf-8` over any
/// other `text/plain` variant. Keys carrying extra parameters (e.g.
/// `text/html; charset=utf-8`) match their rung by prefix.
///
/// # Errors
///
/// Returns [`FormatError::NoReadableFormat`] when neither accepted text
/// MIME type is present.
pub fn resolve_content(entry: &CatalogEntry) -> Result<ContentSource, FormatError> {
    if let Some(url) = lookup(entry, "text/html") {
        return Ok(ContentSource {
            url,
            is_markup: true,
        });
    }
    if let Some(url) = entry.formats.get("text/plain; charset=utf-8") {
        return Ok(ContentSource {
            url: url.clone(),
            is_markup: false,
        });
    }
    if let Some(url) = lookup(entry, "text/plain") {
        return Ok(ContentSource {
            url,
            is_markup: false,
        });
    }

    let mut available: Vec<String> = entry.formats.keys().cloned().collect();
    available.sort();
    Err(FormatError::NoReadableFormat {
        book_id: entry.id,
        available,
    })
}

/// Resolves the cover image for an entry.
///
/// Prefers any `image/jpeg` variant; falls back to the fixed placeholder.
/// This never fails.
#[must_use]
pub fn resolve_cover(entry: &CatalogEntry) -> String {
    lookup(entry, "image/jpeg").unwrap_or_else(|| PLACEHOLDER_COVER.to_string())
}

/// Exact-key lookup, then smallest prefix match for keys with parameters.
fn lookup(entry: &CatalogEntry, mime: &str) -> Option<String> {
    if let Some(url) = entry.formats.get(mime) {
        return Some(url.clone());
    }
    let mut matches: Vec<&String> = entry
        .formats
        .keys()
        .filter(|key| key.starts_with(mime))
        .collect();
    matches.sort();
    matches
        .first()
        .and_then(|key| entry.formats.get(*key).cloned())
}
