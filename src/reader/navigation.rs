//! Directional navigation over the rendered document.
//!
//! Every input modality (arrow key, horizontal swipe, explicit prev/next
//! control) funnels into the same [`Direction`] through [`direction_for`],
//! so behavior is identical regardless of how the command was produced.
//! Navigation itself is a scroll-position command against a modeled
//! [`Viewport`]; it knows nothing about how the document was produced.

/// A directional navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the start of the document.
    Prev,
    /// Toward the end of the document.
    Next,
}

/// Keyboard keys the reader reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Left arrow: previous page.
    ArrowLeft,
    /// Right arrow: next page.
    ArrowRight,
    /// Any other key: ignored.
    Other,
}

/// One raw navigation input from any modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press.
    Key(Key),
    /// A completed horizontal swipe with its displacement. Positive is
    /// rightward.
    Swipe {
        /// Horizontal displacement in scroll units.
        dx: i64,
    },
    /// An explicit prev/next control.
    Button(Direction),
}

/// Minimum horizontal swipe displacement that counts as a navigation
/// gesture, in scroll units.
pub const SWIPE_THRESHOLD: i64 = 48;

/// Maps a raw input event to a navigation direction.
///
/// Returns `None` for inputs below the swipe threshold or keys the reader
/// does not handle. A rightward swipe pages back, mirroring the physical
/// gesture of turning to the previous page.
#[must_use]
pub fn direction_for(event: InputEvent) -> Option<Direction> {
    match event {
        InputEvent::Key(Key::ArrowLeft) => Some(Direction::Prev),
        InputEvent::Key(Key::ArrowRight) => Some(Direction::Next),
        InputEvent::Key(Key::Other) => None,
        InputEvent::Swipe { dx } if dx >= SWIPE_THRESHOLD => Some(Direction::Prev),
        InputEvent::Swipe { dx } if dx <= -SWIPE_THRESHOLD => Some(Direction::Next),
        InputEvent::Swipe { .. } => None,
        InputEvent::Button(direction) => Some(direction),
    }
}

/// The visible window over the rendered document.
///
/// Offsets are modeled scroll units; content height is derived from the
/// rendered document when a book opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Current scroll offset from the top of the document.
    pub offset: u64,
    /// Height of the visible window.
    pub height: u64,
    /// Total height of the rendered document.
    pub content_height: u64,
}

impl Viewport {
    /// Creates a viewport at the top of a document.
    #[must_use]
    pub fn new(height: u64, content_height: u64) -> Self {
        Self {
            offset: 0,
            height,
            content_height,
        }
    }

    /// Largest valid scroll offset.
    #[must_use]
    pub fn max_offset(&self) -> u64 {
        self.content_height.saturating_sub(self.height)
    }

    /// Moves the offset by one full viewport height in the given
    /// direction, clamped to the document bounds.
    pub fn navigate(&mut self, direction: Direction) {
        self.offset = match direction {
            Direction::Prev => self.offset.saturating_sub(self.height),
            Direction::Next => (self.offset + self.height).min(self.max_offset()),
        };
    }

    /// Jumps to an absolute offset, clamped to the document bounds.
    pub fn scroll_to(&mut self, offset: u64) {
        self.offset = offset.min(self.max_offset());
    }
}
