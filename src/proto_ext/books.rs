//! Book accessor traits and sequence arithmetic.

use crate::proto::{CommandBook, CommandPage, EventBook, EventPage};

/// Next sequence number implied by a prior event history.
///
/// Last page sequence + 1, falling back to snapshot sequence + 1 when
/// only a snapshot is present, else 0. Page sequences are strictly
/// monotonic from 0 within a book, so for an unsnapshotted book this
/// equals the page count; `next_sequence(None) == 0`.
pub fn next_sequence(event_book: Option<&EventBook>) -> u32 {
    let Some(book) = event_book else {
        return 0;
    };

    if let Some(last) = book.pages.last() {
        return last.sequence + 1;
    }

    book.snapshot.as_ref().map(|s| s.sequence + 1).unwrap_or(0)
}

/// Accessors for event books.
pub trait EventBookExt {
    /// Next sequence number for events appended to this book.
    fn next_sequence(&self) -> u32;

    /// True when the book has no event pages.
    fn is_empty(&self) -> bool;

    fn first_page(&self) -> Option<&EventPage>;
    fn last_page(&self) -> Option<&EventPage>;
}

impl EventBookExt for EventBook {
    fn next_sequence(&self) -> u32 {
        next_sequence(Some(self))
    }

    fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn first_page(&self) -> Option<&EventPage> {
        self.pages.first()
    }

    fn last_page(&self) -> Option<&EventPage> {
        self.pages.last()
    }
}

/// Accessors for command books.
pub trait CommandBookExt {
    /// Sequence number carried by the first command page (0 if none).
    fn command_sequence(&self) -> u32;

    fn first_command(&self) -> Option<&CommandPage>;
}

impl CommandBookExt for CommandBook {
    fn command_sequence(&self) -> u32 {
        self.pages.first().map(|p| p.sequence).unwrap_or(0)
    }

    fn first_command(&self) -> Option<&CommandPage> {
        self.pages.first()
    }
}
