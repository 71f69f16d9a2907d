//! Reader session: the open/close lifecycle around one book.
//!
//! The session owns the orchestration chain for opening a book: catalog
//! metadata → format resolution → content fetch → normalization →
//! per-image resolution → progress restore → recent-list update, strictly
//! in that order. Failures anywhere in the chain collapse to the `Error`
//! state; no partial document is ever exposed. Only one book may be
//! opening or open at a time.

pub mod navigation;

use std::collections::HashMap;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::catalog::{CatalogClient, CatalogEntry, CatalogError};
use crate::config::DEFAULT_VIEWPORT_HEIGHT;
use crate::fetch::{FetchChain, FetchError};
use crate::format::{self, FormatError};
use crate::normalize::{self, ImageAsset, RenderedDocument};
use crate::store::{ProgressStore, RecentBook, RecentBooks};

use navigation::{Direction, InputEvent, Viewport, direction_for};

/// Crude text-density model mapping rendered markup to scroll units.
const CHARS_PER_SCROLL_UNIT: u64 = 2;

/// Errors that abort an open attempt.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The catalog item endpoint failed for this book.
    #[error("failed to load catalog metadata for book {book_id}: {source}")]
    Metadata {
        /// The book being opened.
        book_id: u64,
        /// The underlying catalog error.
        #[source]
        source: CatalogError,
    },

    /// The entry has no readable format variant.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The chosen content stream could not be fetched.
    #[error("failed to fetch content for book {book_id} from {url}: {source}")]
    Content {
        /// The book being opened.
        book_id: u64,
        /// The content URL that failed.
        url: String,
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },
}

/// A fully opened book.
#[derive(Debug)]
pub struct OpenBook {
    /// The catalog entry the book was opened from.
    pub entry: CatalogEntry,
    /// The rendered document.
    pub document: RenderedDocument,
    /// The scroll viewport over the document.
    pub viewport: Viewport,
}

/// Session lifecycle state.
///
/// Transitions: `Closed → Opening` on open; `Opening → Open` on success;
/// `Opening → Error` on any pipeline failure; `Open/Error → Closed` on
/// close. Opening a different book while one is open passes through
/// `Closed` semantics first.
#[derive(Debug)]
pub enum SessionState {
    /// No book is open.
    Closed,
    /// An open attempt is in flight.
    Opening {
        /// The book being opened.
        book_id: u64,
    },
    /// A book is open and readable.
    Open(Box<OpenBook>),
    /// The last open attempt failed; the only recovery action is close.
    Error {
        /// The book the attempt was for.
        book_id: u64,
        /// The failure that aborted the attempt.
        error: ReadError,
    },
}

/// The reader session owning current-book state and lifecycle.
pub struct ReaderSession {
    catalog: CatalogClient,
    fetcher: FetchChain,
    progress: ProgressStore,
    recents: RecentBooks,
    viewport_height: u64,
    state: SessionState,
}

impl ReaderSession {
    /// Creates a closed session over its collaborators.
    #[must_use]
    pub fn new(
        catalog: CatalogClient,
        fetcher: FetchChain,
        progress: ProgressStore,
        recents: RecentBooks,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            progress,
            recents,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            state: SessionState::Closed,
        }
    }

    /// Overrides the modeled viewport height.
    #[must_use]
    pub fn with_viewport_height(mut self, height: u64) -> Self {
        self.viewport_height = height.max(1);
        self
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the open book, if the session is `Open`.
    #[must_use]
    pub fn book(&self) -> Option<&OpenBook> {
        match &self.state {
            SessionState::Open(book) => Some(book),
            _ => None,
        }
    }

    /// Returns the failure of the last open attempt, if the session is in
    /// the `Error` state.
    #[must_use]
    pub fn error(&self) -> Option<&ReadError> {
        match &self.state {
            SessionState::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns true when a book is open and readable.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open(_))
    }

    /// Opens a book, closing any prior book first.
    ///
    /// Runs the full acquisition chain. On success the session is `Open`
    /// with the saved reading position restored (top of document when none
    /// was saved) and the book recorded at the front of the recent list.
    /// On failure the session is `Error` and the document of the failed
    /// attempt is discarded; there is no automatic retry.
    #[instrument(skip(self))]
    pub async fn open(&mut self, book_id: u64) {
        if !matches!(self.state, SessionState::Closed) {
            // Single-session rule: the prior book (open, failed, or a
            // superseded in-flight attempt) is discarded first.
            self.close();
        }
        self.state = SessionState::Opening { book_id };

        match self.open_pipeline(book_id).await {
            Ok(book) => {
                info!(
                    book_id,
                    title = %book.entry.title,
                    offset = book.viewport.offset,
                    "Book opened"
                );
                self.state = SessionState::Open(Box::new(book));
            }
            Err(error) => {
                warn!(book_id, error = %error, "Open attempt failed");
                self.state = SessionState::Error { book_id, error };
            }
        }
    }

    /// Closes the session, persisting the reading position of an open book
    /// and discarding its rendered document.
    pub fn close(&mut self) {
        if let SessionState::Open(book) = &self.state {
            if let Err(error) = self.progress.set(book.entry.id, book.viewport.offset) {
                warn!(book_id = book.entry.id, error = %error, "Failed to persist reading position");
            }
        }
        self.state = SessionState::Closed;
    }

    /// Moves the reading position one viewport in the given direction.
    ///
    /// No-op unless a book is open. The new position is persisted.
    pub fn navigate(&mut self, direction: Direction) {
        let SessionState::Open(book) = &mut self.state else {
            return;
        };
        book.viewport.navigate(direction);
        let (book_id, offset) = (book.entry.id, book.viewport.offset);
        if let Err(error) = self.progress.set(book_id, offset) {
            warn!(book_id, error = %error, "Failed to persist reading position");
        }
    }

    /// Feeds a raw input event into navigation.
    ///
    /// Key, swipe, and button inputs all funnel through the same mapping,
    /// so behavior is identical across modalities.
    pub fn handle_input(&mut self, event: InputEvent) {
        if let Some(direction) = direction_for(event) {
            self.navigate(direction);
        }
    }

    /// Returns the current scroll offset of an open book.
    #[must_use]
    pub fn scroll_offset(&self) -> Option<u64> {
        self.book().map(|book| book.viewport.offset)
    }

    /// Jumps an open book to an absolute scroll offset and persists it.
    pub fn set_scroll_offset(&mut self, offset: u64) {
        let SessionState::Open(book) = &mut self.state else {
            return;
        };
        book.viewport.scroll_to(offset);
        let (book_id, offset) = (book.entry.id, book.viewport.offset);
        if let Err(error) = self.progress.set(book_id, offset) {
            warn!(book_id, error = %error, "Failed to persist reading position");
        }
    }

    /// Renders the dedicated error view for a failed open attempt.
    ///
    /// The view offers a single recovery action: closing the reader.
    #[must_use]
    pub fn error_view(&self) -> Option<String> {
        let SessionState::Error { error, .. } = &self.state else {
            return None;
        };
        let mut message = String::new();
        for ch in error.to_string().chars() {
            match ch {
                '&' => message.push_str("&amp;"),
                '<' => message.push_str("&lt;"),
                '>' => message.push_str("&gt;"),
                other => message.push(other),
            }
        }
        Some(format!(
            r#"<div class="reader-error"><p>{message}</p><button data-action="close">Close</button></div>"#
        ))
    }

    async fn open_pipeline(&self, book_id: u64) -> Result<OpenBook, ReadError> {
        let entry = self
            .catalog
            .item(book_id)
            .await
            .map_err(|source| ReadError::Metadata { book_id, source })?;

        let source = format::resolve_content(&entry)?;
        debug!(book_id, url = %source.url, is_markup = source.is_markup, "Content source resolved");

        let resource = self
            .fetcher
            .fetch(&source.url)
            .await
            .map_err(|fetch_error| ReadError::Content {
                book_id,
                url: source.url.clone(),
                source: fetch_error,
            })?;

        let content = normalize::normalize(&resource.text(), source.is_markup);
        let assets = self.fetch_images(&source.url, &content.image_refs).await;
        let document = normalize::resolve_images(&content, &assets);

        let content_height = (document.html.chars().count() as u64 / CHARS_PER_SCROLL_UNIT)
            .max(self.viewport_height);
        let mut viewport = Viewport::new(self.viewport_height, content_height);
        if let Some(offset) = self.progress.get(book_id) {
            viewport.scroll_to(offset);
            debug!(book_id, offset, "Reading position restored");
        }

        if let Err(error) = self.recents.record(RecentBook::from_entry(&entry)) {
            // Recents are a convenience list; losing one write never
            // blocks reading.
            warn!(book_id, error = %error, "Failed to record recent book");
        }

        Ok(OpenBook {
            entry,
            document,
            viewport,
        })
    }

    /// Fetches every inline image, independently and in any order.
    ///
    /// References are resolved against the content URL first, since book
    /// markup typically refers to its plates by relative path. Each
    /// reference fully resolves (to a data-URI handle or to hidden) before
    /// the document is considered rendered; a per-image failure is
    /// absorbed here and never aborts the open.
    async fn fetch_images(
        &self,
        content_url: &str,
        refs: &[String],
    ) -> HashMap<String, ImageAsset> {
        let base = Url::parse(content_url).ok();
        let fetches = refs.iter().map(|src| {
            let target = base
                .as_ref()
                .and_then(|base| base.join(src).ok())
                .map_or_else(|| src.clone(), String::from);
            async move {
                let outcome = self.fetcher.fetch(&target).await;
                (src.clone(), outcome)
            }
        });

        let mut assets = HashMap::new();
        for (src, outcome) in join_all(fetches).await {
            match outcome {
                Ok(resource) => {
                    let uri =
                        normalize::image_data_uri(&resource.body, resource.content_type.as_deref());
                    assets.insert(src, ImageAsset::Data(uri));
                }
                Err(error) => {
                    warn!(image = %src, error = %error, "Inline image fetch failed; hiding image");
                    assets.insert(src, ImageAsset::Hidden);
                }
            }
        }
        assets
    }
}
