//! Typed message routers: the dispatch core each component embeds.
//!
//! - [`CommandRouter`]: aggregate command dispatch with compensation.
//! - [`EventRouter`]: saga two-phase event dispatch.
//! - [`ProcessManagerRouter`]: stateful cross-domain orchestration.
//! - [`ProjectionRouter`]: event to key/value projection deltas.
//! - [`UpcasterRouter`]: forward-only event version transforms.
//!
//! Routers are plain values built by fluent registration at startup and
//! read-only afterwards; one router per component per service, owned by
//! its facade. There are no global registries.

pub mod command;
pub mod event;
pub mod process;
pub mod projection;
pub mod upcast;

pub use command::{CommandRouter, CompensationContext, RejectionHandlerResponse};
pub use event::EventRouter;
pub use process::ProcessManagerRouter;
pub use projection::{tombstone, upsert, ProjectionRouter};
pub use upcast::UpcasterRouter;

use prost_types::Any;
use uuid::Uuid;

use crate::convert::{now, type_name, uuid_to_proto};
use crate::proto::{
    CommandBook, CommandPage, Cover, EventBook, EventPage, RejectionNotification,
};

/// Event page stamped with the current time.
pub fn event_page(sequence: u32, event: Any) -> EventPage {
    EventPage {
        sequence,
        created_at: Some(now()),
        event: Some(event),
    }
}

/// Event book answering a command, reusing the command's cover.
pub fn event_book_for(command_book: &CommandBook, pages: Vec<EventPage>) -> EventBook {
    EventBook {
        cover: command_book.cover.clone(),
        snapshot: None,
        pages,
    }
}

/// Single-event book answering a command, the common handler return.
pub fn new_event_book(command_book: &CommandBook, sequence: u32, event: Any) -> EventBook {
    event_book_for(command_book, vec![event_page(sequence, event)])
}

/// Multi-event book answering a command, pages numbered from
/// `start_sequence`.
pub fn new_event_book_multi(
    command_book: &CommandBook,
    start_sequence: u32,
    events: Vec<Any>,
) -> EventBook {
    let pages = events
        .into_iter()
        .enumerate()
        .map(|(i, event)| event_page(start_sequence + i as u32, event))
        .collect();
    event_book_for(command_book, pages)
}

/// Single-command book targeting `(domain, root)`.
///
/// Saga and process-manager outputs must carry the source correlation
/// ID; this is the one constructor they use.
pub fn command_book_for(
    domain: impl Into<String>,
    root: Option<Uuid>,
    correlation_id: impl Into<String>,
    sequence: u32,
    command: Any,
) -> CommandBook {
    CommandBook {
        cover: Some(Cover {
            domain: domain.into(),
            root: root.map(uuid_to_proto),
            correlation_id: correlation_id.into(),
            edition: String::new(),
        }),
        pages: vec![CommandPage {
            sequence,
            command: Some(command),
        }],
    }
}

/// Extract the `(target_domain, command_type_name)` key of the rejected
/// command inside a rejection.
pub(crate) fn rejection_key(rejection: &RejectionNotification) -> (String, String) {
    let Some(rejected) = &rejection.rejected_command else {
        return (String::new(), String::new());
    };

    let domain = rejected
        .cover
        .as_ref()
        .map(|c| c.domain.clone())
        .unwrap_or_default();

    let command = rejected
        .pages
        .first()
        .and_then(|p| p.command.as_ref())
        .map(|c| type_name(&c.type_url).to_string())
        .unwrap_or_default();

    (domain, command)
}
