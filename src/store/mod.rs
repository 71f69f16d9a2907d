//! Persisted reader state: reading progress and the recent-books list.
//!
//! The external store is a plain key-value contract: JSON-serializable
//! structures read and written whole under fixed keys, durable across
//! sessions but not synchronized across processes. [`JsonFileStore`] backs
//! it with a single JSON object file; [`MemoryStore`] backs tests.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::catalog::CatalogEntry;

/// Fixed store key for the reading-progress map.
pub const PROGRESS_KEY: &str = "folio.reading-progress";

/// Fixed store key for the recent-books list.
pub const RECENT_KEY: &str = "folio.recent-books";

/// Maximum length of the recent-books list.
pub const MAX_RECENT_BOOKS: usize = 10;

/// Errors from the persisted state layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("store IO error at {path}: {source}")]
    Io {
        /// The backing file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized for storage.
    #[error("failed to serialize store value for key {key}: {source}")]
    Serialize {
        /// The store key being written.
        key: String,
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value contract over the external persistent store.
///
/// Values are whole JSON documents; a corrupt or missing value reads as
/// absent rather than failing, matching the read side of a browser-local
/// storage contract.
pub trait StateStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing medium rejects the write.
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// File-backed store: one JSON object mapping keys to value documents.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file path. The file is created
    /// on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> HashMap<String, String> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "Corrupt state file; starting empty");
                HashMap::new()
            }
        }
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().remove(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value);
        let serialized = serde_json::to_string_pretty(&map).map_err(|source| {
            StoreError::Serialize {
                key: key.to_string(),
                source,
            }
        })?;
        fs::write(&self.path, serialized).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(key.to_string(), value);
        Ok(())
    }
}

/// Reading progress: book id → scroll offset, persisted whole under
/// [`PROGRESS_KEY`].
#[derive(Clone)]
pub struct ProgressStore {
    store: Arc<dyn StateStore>,
}

impl ProgressStore {
    /// Creates a progress store over a shared state store.
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Returns the saved scroll offset for a book, if any.
    #[must_use]
    pub fn get(&self, book_id: u64) -> Option<u64> {
        self.read_map().get(&book_id.to_string()).copied()
    }

    /// Saves the scroll offset for a book.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store rejects the write.
    pub fn set(&self, book_id: u64, offset: u64) -> Result<(), StoreError> {
        let mut map = self.read_map();
        map.insert(book_id.to_string(), offset);
        let serialized =
            serde_json::to_string(&map).map_err(|source| StoreError::Serialize {
                key: PROGRESS_KEY.to_string(),
                source,
            })?;
        self.store.set(PROGRESS_KEY, serialized)
    }

    fn read_map(&self) -> HashMap<String, u64> {
        self.store
            .get(PROGRESS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

/// One entry of the recent-books list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentBook {
    /// Catalog identifier.
    pub id: u64,
    /// Book title.
    pub title: String,
    /// Primary author display name.
    pub author: String,
    /// Unix timestamp (seconds) of when the book was last opened.
    pub timestamp: u64,
}

impl RecentBook {
    /// Builds a recent-list entry for a catalog entry, stamped now.
    #[must_use]
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self {
            id: entry.id,
            title: entry.title.clone(),
            author: entry.primary_author().to_string(),
            timestamp,
        }
    }
}

/// The bounded, deduplicated recent-books list, persisted whole under
/// [`RECENT_KEY`].
#[derive(Clone)]
pub struct RecentBooks {
    store: Arc<dyn StateStore>,
}

impl RecentBooks {
    /// Creates a recent-books list over a shared state store.
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Returns the list, most recent first.
    #[must_use]
    pub fn list(&self) -> Vec<RecentBook> {
        self.store
            .get(RECENT_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Records a book at the front of the list.
    ///
    /// A book already present moves to the front without duplication; the
    /// list is truncated to [`MAX_RECENT_BOOKS`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store rejects the write.
    pub fn record(&self, book: RecentBook) -> Result<(), StoreError> {
        let mut list = self.list();
        list.retain(|existing| existing.id != book.id);
        list.insert(0, book);
        list.truncate(MAX_RECENT_BOOKS);
        let serialized =
            serde_json::to_string(&list).map_err(|source| StoreError::Serialize {
                key: RECENT_KEY.to_string(),
                source,
            })?;
        self.store.set(RECENT_KEY, serialized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn recent(id: u64, title: &str) -> RecentBook {
        RecentBook {
            id,
            title: title.to_string(),
            author: "Author".to_string(),
            timestamp: 1_700_000_000 + id,
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get("missing").is_none());
        store.set("k", "v".to_string()).unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_progress_store_round_trip_and_default() {
        let progress = ProgressStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(progress.get(42), None, "unsaved book has no offset");
        progress.set(42, 450).unwrap();
        assert_eq!(progress.get(42), Some(450));
        assert_eq!(progress.get(7), None, "other ids must stay absent");
    }

    #[test]
    fn test_progress_store_overwrites_offset() {
        let progress = ProgressStore::new(Arc::new(MemoryStore::new()));
        progress.set(42, 100).unwrap();
        progress.set(42, 900).unwrap();
        assert_eq!(progress.get(42), Some(900));
    }

    #[test]
    fn test_recent_books_moves_readd_to_front_without_duplicate() {
        let recents = RecentBooks::new(Arc::new(MemoryStore::new()));
        for (id, title) in [(3, "C"), (2, "B"), (1, "A")] {
            recents.record(recent(id, title)).unwrap();
        }
        // Front-to-back is now [A, B, C]; re-adding B moves it to front.
        recents.record(recent(2, "B")).unwrap();
        let list = recents.list();
        let ids: Vec<u64> = list.iter().map(|book| book.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(list.len(), 3, "re-add must not duplicate");
    }

    #[test]
    fn test_recent_books_bounded_at_ten() {
        let recents = RecentBooks::new(Arc::new(MemoryStore::new()));
        for id in 1..=15 {
            recents.record(recent(id, "T")).unwrap();
        }
        let list = recents.list();
        assert_eq!(list.len(), MAX_RECENT_BOOKS);
        assert_eq!(list[0].id, 15, "newest stays at the front");
        assert_eq!(list[9].id, 6, "oldest beyond the bound dropped");
    }

    #[test]
    fn test_json_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::new(&path);
        store.set("k", "\"v\"".to_string()).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("k").as_deref(), Some("\"v\""));
    }

    #[test]
    fn test_json_file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn test_json_file_store_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{{not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(store.get("k").is_none());
        // A write after corruption starts a fresh map rather than failing.
        store.set("k", "1".to_string()).unwrap();
        assert_eq!(store.get("k").as_deref(), Some("1"));
    }
}
