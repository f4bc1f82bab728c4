//! Traits at the RPC boundary.
//!
//! The transport is out of scope for this crate: these traits specify
//! the request/response shapes exchanged at the service boundary.
//! Client traits are implemented by whatever dials the coordinator
//! (and by mocks in tests); service traits are implemented by the
//! facades in [`crate::facade`] and wrapped by the host's transport
//! adapter.

use async_trait::async_trait;
use tonic::Status;

use crate::error::Result;
use crate::proto::{
    BusinessResponse, CommandBook, CommandResponse, ComponentDescriptor, ContextualCommand,
    EventBook, ProcessManagerHandleRequest, ProcessManagerHandleResponse,
    ProcessManagerPrepareRequest, ProcessManagerPrepareResponse, Projection, Query, ReplayRequest,
    ReplayResponse, SagaExecuteRequest, SagaPrepareRequest, SagaPrepareResponse, SagaResponse,
    SpeculateAggregateRequest, SyncCommandBook,
};

/// Command execution against the aggregate coordinator.
///
/// Implement to mock command execution in tests or to supply an
/// alternative transport.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Fire-and-forget: persistence acknowledged, events not returned.
    async fn execute(&self, command: CommandBook) -> Result<CommandResponse>;

    /// Synchronous: the response carries resulting events.
    async fn execute_sync(&self, command: SyncCommandBook) -> Result<CommandResponse>;

    /// Speculative: no persistence.
    async fn execute_speculative(
        &self,
        request: SpeculateAggregateRequest,
    ) -> Result<CommandResponse>;
}

/// Historical event queries.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Fetch a single event book.
    async fn get_event_book(&self, query: Query) -> Result<EventBook>;

    /// Fetch all matching event books (bulk histories).
    async fn get_events(&self, query: Query) -> Result<Vec<EventBook>>;
}

/// Business-logic service implemented by each aggregate.
#[async_trait]
pub trait BusinessService: Send + Sync {
    async fn handle(&self, command: ContextualCommand) -> std::result::Result<BusinessResponse, Status>;

    /// Rebuild state from a replayed history as a typed snapshot.
    async fn replay(&self, request: ReplayRequest) -> std::result::Result<ReplayResponse, Status>;
}

/// Saga service: the two-phase prepare → execute protocol.
#[async_trait]
pub trait SagaService: Send + Sync {
    async fn prepare(
        &self,
        request: SagaPrepareRequest,
    ) -> std::result::Result<SagaPrepareResponse, Status>;

    async fn execute(
        &self,
        request: SagaExecuteRequest,
    ) -> std::result::Result<SagaResponse, Status>;
}

/// Process-manager service: prepare → handle with prior process state.
#[async_trait]
pub trait ProcessManagerService: Send + Sync {
    async fn prepare(
        &self,
        request: ProcessManagerPrepareRequest,
    ) -> std::result::Result<ProcessManagerPrepareResponse, Status>;

    async fn handle(
        &self,
        request: ProcessManagerHandleRequest,
    ) -> std::result::Result<ProcessManagerHandleResponse, Status>;
}

/// Projector service; speculative results are tagged, not persisted.
#[async_trait]
pub trait ProjectorService: Send + Sync {
    async fn handle(&self, book: EventBook) -> std::result::Result<Vec<Projection>, Status>;

    async fn handle_speculative(
        &self,
        book: EventBook,
    ) -> std::result::Result<Vec<Projection>, Status>;
}

/// Upcaster service: rewrite a history to current event versions.
#[async_trait]
pub trait UpcasterService: Send + Sync {
    async fn upcast(&self, book: EventBook) -> std::result::Result<EventBook, Status>;
}

/// Descriptor service exposed by every component.
///
/// Descriptors are read-only projections of router registrations,
/// queried once by the coordinator at startup.
pub trait DescriptorService {
    fn get_descriptor(&self) -> ComponentDescriptor;
}
