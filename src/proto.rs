//! Wire types for the `folio` message schema.
//!
//! These are hand-maintained prost structs mirroring the coordinator's
//! schema, so the crate builds without a protoc toolchain. Field numbers
//! are part of the wire contract; do not renumber.
//!
//! The transport itself is out of scope for this crate: host services
//! wrap the service traits in [`crate::traits`] with whatever gRPC
//! codegen they use, exchanging exactly these shapes.

/// Implements `prost::Name` for a message in the `folio` package.
macro_rules! folio_name {
    ($ty:ident) => {
        impl ::prost::Name for $ty {
            const NAME: &'static str = stringify!($ty);
            const PACKAGE: &'static str = "folio";
            fn full_name() -> String {
                concat!("folio.", stringify!($ty)).to_string()
            }
        }
    };
}

/// A 16-byte identifier naming one aggregate instance.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Uuid {
    #[prost(bytes = "vec", tag = "1")]
    pub value: Vec<u8>,
}
folio_name!(Uuid);

/// Header of a command/event/query envelope.
///
/// `domain` is always set; `root` identifies one aggregate instance;
/// `correlation_id` links all envelopes in one logical workflow;
/// `edition` names a timeline (empty means the main timeline).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Cover {
    #[prost(string, tag = "1")]
    pub domain: String,
    #[prost(message, optional, tag = "2")]
    pub root: Option<Uuid>,
    #[prost(string, tag = "3")]
    pub correlation_id: String,
    #[prost(string, tag = "4")]
    pub edition: String,
}
folio_name!(Cover);

/// One command with its expected sequence number.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandPage {
    #[prost(uint32, tag = "1")]
    pub sequence: u32,
    #[prost(message, optional, tag = "2")]
    pub command: Option<::prost_types::Any>,
}
folio_name!(CommandPage);

/// Ordered sequence of command pages under a cover.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandBook {
    #[prost(message, optional, tag = "1")]
    pub cover: Option<Cover>,
    #[prost(message, repeated, tag = "2")]
    pub pages: Vec<CommandPage>,
}
folio_name!(CommandBook);

/// One persisted event.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EventPage {
    #[prost(uint32, tag = "1")]
    pub sequence: u32,
    #[prost(message, optional, tag = "2")]
    pub created_at: Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "3")]
    pub event: Option<::prost_types::Any>,
}
folio_name!(EventPage);

/// State seed covering all events up to and including `sequence`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Snapshot {
    #[prost(uint32, tag = "1")]
    pub sequence: u32,
    #[prost(message, optional, tag = "2")]
    pub state: Option<::prost_types::Any>,
}
folio_name!(Snapshot);

/// Ordered sequence of event pages under a cover, with an optional
/// snapshot prefix.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EventBook {
    #[prost(message, optional, tag = "1")]
    pub cover: Option<Cover>,
    #[prost(message, optional, tag = "2")]
    pub snapshot: Option<Snapshot>,
    #[prost(message, repeated, tag = "3")]
    pub pages: Vec<EventPage>,
}
folio_name!(EventBook);

/// A command together with the prior event history of its target.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContextualCommand {
    #[prost(message, optional, tag = "1")]
    pub command: Option<CommandBook>,
    #[prost(message, optional, tag = "2")]
    pub events: Option<EventBook>,
}
folio_name!(ContextualCommand);

/// Reserved carrier for a downstream-rejected command.
///
/// The payload is a packed [`RejectionNotification`]. The command router
/// treats any command page whose type name is `Notification` as a
/// rejection and dispatches it through the compensation pathway.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Notification {
    #[prost(message, optional, tag = "1")]
    pub payload: Option<::prost_types::Any>,
}
folio_name!(Notification);

/// Details of a rejected command, materialised by the coordinator.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RejectionNotification {
    /// Name of the saga/PM that issued the rejected command.
    #[prost(string, tag = "1")]
    pub issuer_name: String,
    /// Kind of issuer: "saga" or "process_manager".
    #[prost(string, tag = "2")]
    pub issuer_type: String,
    #[prost(string, tag = "3")]
    pub rejection_reason: String,
    /// Sequence of the source event that triggered the issuing flow.
    #[prost(uint32, tag = "4")]
    pub source_event_sequence: u32,
    #[prost(message, optional, tag = "5")]
    pub rejected_command: Option<CommandBook>,
    /// Cover of the aggregate whose event triggered the flow.
    #[prost(message, optional, tag = "6")]
    pub source: Option<Cover>,
}
folio_name!(RejectionNotification);

/// Runtime answer when no compensation handler claims a rejection, or
/// when a handler absorbed it without emitting anything.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Revocation {
    /// When true the coordinator emits a default system revocation event.
    #[prost(bool, tag = "1")]
    pub emit_system_revocation: bool,
    #[prost(string, tag = "2")]
    pub reason: String,
}
folio_name!(Revocation);

/// Outcome of one business-logic dispatch.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BusinessResponse {
    #[prost(oneof = "business_response::Result", tags = "1, 2, 3")]
    pub result: Option<business_response::Result>,
}
folio_name!(BusinessResponse);

pub mod business_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        /// New events to persist.
        #[prost(message, tag = "1")]
        Events(super::EventBook),
        /// Rejection forwarded one hop upstream.
        #[prost(message, tag = "2")]
        Notification(super::Notification),
        /// Rejection left to the coordinator.
        #[prost(message, tag = "3")]
        Revocation(super::Revocation),
    }
}

/// Inclusive sequence range filter.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SequenceRange {
    #[prost(uint32, tag = "1")]
    pub lower: u32,
    #[prost(uint32, optional, tag = "2")]
    pub upper: Option<u32>,
}
folio_name!(SequenceRange);

/// Point-in-time filter: state as of a sequence or a wall-clock instant.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TemporalQuery {
    #[prost(oneof = "temporal_query::PointInTime", tags = "1, 2")]
    pub point_in_time: Option<temporal_query::PointInTime>,
}
folio_name!(TemporalQuery);

pub mod temporal_query {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PointInTime {
        #[prost(uint32, tag = "1")]
        AsOfSequence(u32),
        #[prost(message, tag = "2")]
        AsOfTime(::prost_types::Timestamp),
    }
}

/// Historical event query: either a sequence range or a temporal filter.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Query {
    #[prost(message, optional, tag = "1")]
    pub cover: Option<Cover>,
    #[prost(oneof = "query::Selection", tags = "2, 3")]
    pub selection: Option<query::Selection>,
}
folio_name!(Query);

pub mod query {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Selection {
        #[prost(message, tag = "2")]
        Range(super::SequenceRange),
        #[prost(message, tag = "3")]
        Temporal(super::TemporalQuery),
    }
}

/// One projection delta: an upsert of `value` under `key`, or a
/// tombstone for `key`. `speculative` results must not be persisted.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Projection {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<::prost_types::Any>,
    #[prost(bool, tag = "3")]
    pub tombstone: bool,
    #[prost(bool, tag = "4")]
    pub speculative: bool,
}
folio_name!(Projection);

/// One input subscription: a source domain and the type names consumed
/// from it.
#[derive(Clone, PartialEq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
pub struct Target {
    #[prost(string, tag = "1")]
    pub domain: String,
    #[prost(string, repeated, tag = "2")]
    pub types: Vec<String>,
}
folio_name!(Target);

/// Static self-description each component exposes for coordinator-driven
/// topology wiring. Serde derives support annotation-based export.
#[derive(Clone, PartialEq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
pub struct ComponentDescriptor {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub role: String,
    #[prost(message, repeated, tag = "3")]
    pub inputs: Vec<Target>,
}
folio_name!(ComponentDescriptor);

/// Coordinator acknowledgement of a command, carrying resulting events
/// for synchronous calls.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandResponse {
    #[prost(message, optional, tag = "1")]
    pub events: Option<EventBook>,
}
folio_name!(CommandResponse);

/// Command wrapper for the synchronous coordinator entry point.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SyncCommandBook {
    #[prost(message, optional, tag = "1")]
    pub command: Option<CommandBook>,
}
folio_name!(SyncCommandBook);

/// Command run against (optionally temporal) state with no persistence.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpeculateAggregateRequest {
    #[prost(message, optional, tag = "1")]
    pub command: Option<CommandBook>,
    #[prost(message, optional, tag = "2")]
    pub as_of: Option<TemporalQuery>,
}
folio_name!(SpeculateAggregateRequest);

/// Request to rebuild state from a replayed history.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReplayRequest {
    #[prost(message, optional, tag = "1")]
    pub events: Option<EventBook>,
}
folio_name!(ReplayRequest);

/// Typed snapshot of rebuilt state.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReplayResponse {
    #[prost(message, optional, tag = "1")]
    pub state: Option<::prost_types::Any>,
}
folio_name!(ReplayResponse);

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SagaPrepareRequest {
    #[prost(message, optional, tag = "1")]
    pub source: Option<EventBook>,
}
folio_name!(SagaPrepareRequest);

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SagaPrepareResponse {
    #[prost(message, repeated, tag = "1")]
    pub destinations: Vec<Cover>,
}
folio_name!(SagaPrepareResponse);

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SagaExecuteRequest {
    #[prost(message, optional, tag = "1")]
    pub source: Option<EventBook>,
    #[prost(message, repeated, tag = "2")]
    pub destinations: Vec<EventBook>,
}
folio_name!(SagaExecuteRequest);

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SagaResponse {
    #[prost(message, repeated, tag = "1")]
    pub commands: Vec<CommandBook>,
}
folio_name!(SagaResponse);

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessManagerPrepareRequest {
    #[prost(message, optional, tag = "1")]
    pub trigger: Option<EventBook>,
    /// Prior event history of the PM itself, keyed by correlation ID.
    #[prost(message, optional, tag = "2")]
    pub process_state: Option<EventBook>,
}
folio_name!(ProcessManagerPrepareRequest);

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessManagerPrepareResponse {
    #[prost(message, repeated, tag = "1")]
    pub destinations: Vec<Cover>,
}
folio_name!(ProcessManagerPrepareResponse);

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessManagerHandleRequest {
    #[prost(message, optional, tag = "1")]
    pub trigger: Option<EventBook>,
    #[prost(message, optional, tag = "2")]
    pub process_state: Option<EventBook>,
    #[prost(message, repeated, tag = "3")]
    pub destinations: Vec<EventBook>,
}
folio_name!(ProcessManagerHandleRequest);

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessManagerHandleResponse {
    #[prost(message, repeated, tag = "1")]
    pub commands: Vec<CommandBook>,
    /// Events to append to the PM's own history (compensation records).
    #[prost(message, optional, tag = "2")]
    pub process_events: Option<EventBook>,
    /// Rejection propagated one hop upstream.
    #[prost(message, optional, tag = "3")]
    pub notification: Option<Notification>,
}
folio_name!(ProcessManagerHandleResponse);
