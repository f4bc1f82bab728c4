//! Ergonomic Rust client runtime for folio services.
//!
//! Folio is an event-sourced, CQRS-style coordination fabric: many
//! small business-logic services, each owning one role (aggregate,
//! saga, process manager, or projector) wired together by a
//! coordinator that stores events, routes commands and events, and
//! enforces per-aggregate ordering. This crate is the in-process
//! runtime those services embed: typed routers over the type-tagged
//! envelope, state rebuilding, the two-phase saga/PM protocol, and the
//! error taxonomy the RPC boundary maps to status codes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use folio_client::{Aggregate, CommandRouter, StateRouter};
//!
//! let state = StateRouter::<PlayerState>::new()
//!     .on("PlayerRegistered", apply_registered)
//!     .on("FundsDeposited", apply_deposited);
//!
//! let aggregate = Aggregate::new(
//!     CommandRouter::new("player", state)
//!         .on("RegisterPlayer", handle_register)
//!         .on("DepositFunds", handle_deposit),
//! );
//!
//! // The host's transport adapter wraps `aggregate` (a
//! // `BusinessService`) and serves `aggregate.descriptor()` to the
//! // coordinator at startup.
//! ```
//!
//! # Mocking for Tests
//!
//! Implement [`traits::GatewayClient`] and [`traits::QueryClient`] to
//! drive the fluent builders against mocks:
//!
//! ```rust,ignore
//! let response = client
//!     .command("player", root)
//!     .with_command("type.googleapis.com/examples.DepositFunds", &deposit)
//!     .execute()
//!     .await?;
//! ```

pub mod builder;
pub mod config;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod facade;
pub mod proto;
pub mod proto_ext;
pub mod router;
pub mod state;
pub mod telemetry;
pub mod traits;
pub mod validation;

pub use builder::{
    events_from_response, CommandBuilder, CommandBuilderExt, QueryBuilder, QueryBuilderExt,
};
pub use convert::{
    matches, name_matches, now, pack, pack_as, parse_timestamp, proto_to_uuid, type_name,
    type_url, unpack_as, uuid_to_proto, TYPE_URL_PREFIX,
};
pub use descriptor::ComponentRole;
pub use error::{ClientError, HandlerError, HandlerResult, Result};
pub use facade::{Aggregate, ProcessManager, Projector, Saga, Upcaster};
pub use proto_ext::{
    next_sequence, CommandBookExt, CommandPageExt, CoverExt, EventBookExt, EventPageExt,
};
pub use router::{
    command_book_for, event_book_for, event_page, new_event_book, new_event_book_multi, tombstone,
    upsert, CommandRouter, CompensationContext, EventRouter, ProcessManagerRouter,
    ProjectionRouter, RejectionHandlerResponse, UpcasterRouter,
};
pub use state::{Rebuilt, StateRouter};
pub use telemetry::init_tracing;
