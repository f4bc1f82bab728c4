//! Component facades: thin shells around the routers.
//!
//! Each facade owns one router, derives the component's descriptor from
//! its registrations, and implements the matching service trait so the
//! host's transport adapter has one object to wrap.

use async_trait::async_trait;
use prost::Message;
use tonic::Status;
use tracing::debug;

use crate::convert::pack;
use crate::descriptor::{descriptor, ComponentRole};
use crate::proto::{
    BusinessResponse, ComponentDescriptor, ContextualCommand, EventBook,
    ProcessManagerHandleRequest, ProcessManagerHandleResponse, ProcessManagerPrepareRequest,
    ProcessManagerPrepareResponse, Projection, ReplayRequest, ReplayResponse, SagaExecuteRequest,
    SagaPrepareRequest, SagaPrepareResponse, SagaResponse,
};
use crate::router::{
    CommandRouter, EventRouter, ProcessManagerRouter, ProjectionRouter, UpcasterRouter,
};
use crate::traits::{
    BusinessService, DescriptorService, ProcessManagerService, ProjectorService, SagaService,
    UpcasterService,
};

/// Aggregate facade: command dispatch plus replay.
pub struct Aggregate<S> {
    router: CommandRouter<S>,
}

impl<S: 'static> Aggregate<S> {
    pub fn new(router: CommandRouter<S>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &CommandRouter<S> {
        &self.router
    }

    pub fn descriptor(&self) -> ComponentDescriptor {
        descriptor(
            self.router.domain(),
            ComponentRole::Aggregate,
            vec![(
                self.router.domain().to_string(),
                self.router.command_types(),
            )],
        )
    }
}

impl<S: 'static> DescriptorService for Aggregate<S> {
    fn get_descriptor(&self) -> ComponentDescriptor {
        self.descriptor()
    }
}

#[async_trait]
impl<S> BusinessService for Aggregate<S>
where
    S: Message + prost::Name + Send + Sync + 'static,
{
    async fn handle(
        &self,
        command: ContextualCommand,
    ) -> std::result::Result<BusinessResponse, Status> {
        Ok(self.router.dispatch(&command)?)
    }

    async fn replay(
        &self,
        request: ReplayRequest,
    ) -> std::result::Result<ReplayResponse, Status> {
        let rebuilt = self.router.rebuild(request.events.as_ref());
        Ok(ReplayResponse {
            state: Some(pack(&*rebuilt)),
        })
    }
}

/// Saga facade: stateless event-to-command translation.
pub struct Saga {
    router: EventRouter,
}

impl Saga {
    pub fn new(router: EventRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn descriptor(&self) -> ComponentDescriptor {
        descriptor(
            self.router.name(),
            ComponentRole::Saga,
            self.router.subscriptions(),
        )
    }
}

impl DescriptorService for Saga {
    fn get_descriptor(&self) -> ComponentDescriptor {
        self.descriptor()
    }
}

#[async_trait]
impl SagaService for Saga {
    async fn prepare(
        &self,
        request: SagaPrepareRequest,
    ) -> std::result::Result<SagaPrepareResponse, Status> {
        let destinations = request
            .source
            .as_ref()
            .map(|source| self.router.prepare_destinations(source))
            .unwrap_or_default();
        Ok(SagaPrepareResponse { destinations })
    }

    async fn execute(
        &self,
        request: SagaExecuteRequest,
    ) -> std::result::Result<SagaResponse, Status> {
        let source = request
            .source
            .as_ref()
            .ok_or_else(|| Status::invalid_argument("missing source event book"))?;

        let commands = self.router.dispatch(source, &request.destinations)?;
        debug!(saga = %self.router.name(), commands = commands.len(), "saga dispatch complete");
        Ok(SagaResponse { commands })
    }
}

/// Process-manager facade: stateful orchestration keyed by correlation.
pub struct ProcessManager<S> {
    router: ProcessManagerRouter<S>,
}

impl<S: 'static> ProcessManager<S> {
    pub fn new(router: ProcessManagerRouter<S>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &ProcessManagerRouter<S> {
        &self.router
    }

    pub fn descriptor(&self) -> ComponentDescriptor {
        descriptor(
            self.router.name(),
            ComponentRole::ProcessManager,
            self.router.subscriptions(),
        )
    }
}

impl<S: 'static> ProcessManager<S>
where
    S: Message + prost::Name,
{
    /// Rebuild the PM's own state as a typed snapshot.
    pub fn replay(&self, request: &ReplayRequest) -> ReplayResponse {
        let rebuilt = self.router.rebuild(request.events.as_ref());
        ReplayResponse {
            state: Some(pack(&*rebuilt)),
        }
    }
}

impl<S: 'static> DescriptorService for ProcessManager<S> {
    fn get_descriptor(&self) -> ComponentDescriptor {
        self.descriptor()
    }
}

#[async_trait]
impl<S: Send + Sync + 'static> ProcessManagerService for ProcessManager<S> {
    async fn prepare(
        &self,
        request: ProcessManagerPrepareRequest,
    ) -> std::result::Result<ProcessManagerPrepareResponse, Status> {
        let destinations = request
            .trigger
            .as_ref()
            .map(|trigger| {
                self.router
                    .prepare_destinations(trigger, request.process_state.as_ref())
            })
            .unwrap_or_default();
        Ok(ProcessManagerPrepareResponse { destinations })
    }

    async fn handle(
        &self,
        request: ProcessManagerHandleRequest,
    ) -> std::result::Result<ProcessManagerHandleResponse, Status> {
        let trigger = request
            .trigger
            .as_ref()
            .ok_or_else(|| Status::invalid_argument("missing trigger event book"))?;

        Ok(self.router.dispatch(
            trigger,
            request.process_state.as_ref(),
            &request.destinations,
        )?)
    }
}

/// Projector facade: events to projection deltas.
pub struct Projector {
    router: ProjectionRouter,
}

impl Projector {
    pub fn new(router: ProjectionRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &ProjectionRouter {
        &self.router
    }

    pub fn descriptor(&self) -> ComponentDescriptor {
        descriptor(
            self.router.name(),
            ComponentRole::Projector,
            self.router.subscriptions(),
        )
    }
}

impl DescriptorService for Projector {
    fn get_descriptor(&self) -> ComponentDescriptor {
        self.descriptor()
    }
}

#[async_trait]
impl ProjectorService for Projector {
    async fn handle(&self, book: EventBook) -> std::result::Result<Vec<Projection>, Status> {
        Ok(self.router.dispatch(&book)?)
    }

    async fn handle_speculative(
        &self,
        book: EventBook,
    ) -> std::result::Result<Vec<Projection>, Status> {
        Ok(self.router.dispatch_speculative(&book)?)
    }
}

/// Upcaster facade: history rewriting between storage and rebuild.
pub struct Upcaster {
    router: UpcasterRouter,
}

impl Upcaster {
    pub fn new(router: UpcasterRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &UpcasterRouter {
        &self.router
    }

    pub fn descriptor(&self) -> ComponentDescriptor {
        descriptor(
            self.router.domain(),
            ComponentRole::Upcaster,
            vec![(self.router.domain().to_string(), self.router.event_types())],
        )
    }
}

impl DescriptorService for Upcaster {
    fn get_descriptor(&self) -> ComponentDescriptor {
        self.descriptor()
    }
}

#[async_trait]
impl UpcasterService for Upcaster {
    async fn upcast(&self, book: EventBook) -> std::result::Result<EventBook, Status> {
        Ok(self.router.upcast_book(book)?)
    }
}
