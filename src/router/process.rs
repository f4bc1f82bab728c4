//! Process-manager dispatch: stateful cross-domain orchestration.
//!
//! A process manager is an event router that additionally carries its
//! own replayable state, keyed by correlation ID. The coordinator keeps
//! one event history per (PM name, correlation ID) and passes it in as
//! `process_state`; the router rebuilds at dispatch start and advances
//! the state through its appliers before each react handler fires, so
//! the state observed while reacting to `e_n` reflects `e_0 … e_n`.
//!
//! A trigger without a correlation ID produces nothing: a PM without a
//! workflow identity has nothing to advance.

use prost::Message;
use prost_types::Any;
use tracing::{debug, warn};

use crate::convert::name_matches;
use crate::error::{HandlerError, HandlerResult};
use crate::proto::{
    CommandBook, Cover, EventBook, Notification, ProcessManagerHandleResponse,
    RejectionNotification,
};
use crate::proto_ext::CoverExt;
use crate::router::command::RejectionHandlerResponse;
use crate::state::StateRouter;
use uuid::Uuid;

use super::rejection_key;

const NOTIFICATION_TYPE: &str = "Notification";

type ReactFn<S> = Box<
    dyn Fn(&Any, &S, Option<Uuid>, &str, &[EventBook]) -> HandlerResult<Vec<CommandBook>>
        + Send
        + Sync,
>;

type PrepareFn<S> = Box<dyn Fn(&Any, &S, Option<Uuid>) -> Vec<Cover> + Send + Sync>;

type RejectionFn<S> =
    Box<dyn Fn(&Notification, &S) -> HandlerResult<RejectionHandlerResponse> + Send + Sync>;

struct DomainRegistrations<S> {
    domain: String,
    reacts: Vec<(String, ReactFn<S>)>,
    prepares: Vec<(String, PrepareFn<S>)>,
}

/// Event router with its own replayable state.
///
/// ```rust,ignore
/// let router = ProcessManagerRouter::new("pm-order-flow", order_flow_state())
///     .domain("order")
///     .on("OrderCreated", handle_order_created)
///     .domain("inventory")
///     .on("StockReserved", handle_stock_reserved)
///     .on_rejected("inventory", "ReserveStock", handle_reserve_rejected);
/// ```
pub struct ProcessManagerRouter<S> {
    name: String,
    state: StateRouter<S>,
    domains: Vec<DomainRegistrations<S>>,
    cursor: Option<usize>,
    rejection_handlers: Vec<((String, String), RejectionFn<S>)>,
}

impl<S: 'static> ProcessManagerRouter<S> {
    pub fn new(name: impl Into<String>, state: StateRouter<S>) -> Self {
        Self {
            name: name.into(),
            state,
            domains: Vec::new(),
            cursor: None,
            rejection_handlers: Vec::new(),
        }
    }

    /// Set the source-domain cursor for subsequent registrations.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        let index = self.domains.iter().position(|d| d.domain == domain);
        self.cursor = Some(index.unwrap_or_else(|| {
            self.domains.push(DomainRegistrations {
                domain,
                reacts: Vec::new(),
                prepares: Vec::new(),
            });
            self.domains.len() - 1
        }));
        self
    }

    fn current(&mut self, method: &str) -> &mut DomainRegistrations<S> {
        let index = self
            .cursor
            .unwrap_or_else(|| panic!("call domain() before {method}()"));
        &mut self.domains[index]
    }

    /// Register a typed prepare handler for events matching `key` in
    /// the current domain. The handler peeks at the PM's own state when
    /// choosing destinations.
    pub fn prepare<E, H>(mut self, key: impl Into<String>, handler: H) -> Self
    where
        E: Message + Default + 'static,
        H: Fn(&E, &S, Option<Uuid>) -> Vec<Cover> + Send + Sync + 'static,
    {
        let erased: PrepareFn<S> =
            Box::new(move |any, state, root| match E::decode(any.value.as_slice()) {
                Ok(event) => handler(&event, state, root),
                Err(_) => Vec::new(),
            });
        self.current("prepare").prepares.push((key.into(), erased));
        self
    }

    /// Register a typed react handler for events matching `key` in the
    /// current domain. The handler additionally receives the PM's own
    /// state, already advanced through this event.
    pub fn on<E, H>(mut self, key: impl Into<String>, handler: H) -> Self
    where
        E: Message + Default + 'static,
        H: Fn(&E, &S, Option<Uuid>, &str, &[EventBook]) -> HandlerResult<Vec<CommandBook>>
            + Send
            + Sync
            + 'static,
    {
        let erased: ReactFn<S> = Box::new(move |any, state, root, correlation_id, destinations| {
            let event = E::decode(any.value.as_slice())
                .map_err(|e| HandlerError::Decode(format!("{}: {e}", any.type_url)))?;
            handler(&event, state, root, correlation_id, destinations)
        });
        self.current("on").reacts.push((key.into(), erased));
        self
    }

    /// Register a compensation handler for rejections of `command` sent
    /// to `domain`. Re-registration overwrites (last write wins).
    pub fn on_rejected<H>(
        mut self,
        domain: impl Into<String>,
        command: impl Into<String>,
        handler: H,
    ) -> Self
    where
        H: Fn(&Notification, &S) -> HandlerResult<RejectionHandlerResponse>
            + Send
            + Sync
            + 'static,
    {
        let key = (domain.into(), command.into());
        self.rejection_handlers.retain(|(k, _)| *k != key);
        self.rejection_handlers.push((key, Box::new(handler)));
        self
    }

    /// The process manager's logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscriptions derived from registrations, in registration order.
    pub fn subscriptions(&self) -> Vec<(String, Vec<String>)> {
        self.domains
            .iter()
            .map(|d| {
                let mut types: Vec<String> = d.reacts.iter().map(|(k, _)| k.clone()).collect();
                for (key, _) in &d.prepares {
                    if !types.contains(key) {
                        types.push(key.clone());
                    }
                }
                (d.domain.clone(), types)
            })
            .filter(|(_, types)| !types.is_empty())
            .collect()
    }

    /// Rebuild the PM's own state from its prior event history.
    pub fn rebuild(&self, process_state: Option<&EventBook>) -> crate::state::Rebuilt<S> {
        self.state.rebuild(process_state)
    }

    fn registrations_for(&self, domain: &str) -> Option<&DomainRegistrations<S>> {
        self.domains.iter().find(|d| d.domain == domain)
    }

    /// Phase 1: enumerate destination covers for a trigger book.
    pub fn prepare_destinations(
        &self,
        trigger: &EventBook,
        process_state: Option<&EventBook>,
    ) -> Vec<Cover> {
        let Some(registrations) = self.registrations_for(trigger.domain()) else {
            return Vec::new();
        };

        let state = self.state.rebuild(process_state);
        let root = trigger.root_uuid();
        let mut destinations = Vec::new();

        for page in &trigger.pages {
            let Some(event) = &page.event else { continue };
            let trailing = crate::convert::type_name(&event.type_url);
            if let Some((_, handler)) = registrations
                .prepares
                .iter()
                .find(|(key, _)| name_matches(trailing, key))
            {
                destinations.extend(handler(event, &state, root));
            }
        }
        destinations
    }

    /// Phase 2: advance the PM's state through the trigger events and
    /// translate them into command books.
    ///
    /// Rejection notifications in the trigger route to the registered
    /// compensation handlers; their events come back as
    /// `process_events` for the coordinator to append to the PM's own
    /// history.
    pub fn dispatch(
        &self,
        trigger: &EventBook,
        process_state: Option<&EventBook>,
        destinations: &[EventBook],
    ) -> HandlerResult<ProcessManagerHandleResponse> {
        let correlation_id = trigger.correlation_id().to_string();
        if correlation_id.is_empty() {
            warn!(pm = %self.name, "trigger has no correlation ID, nothing to advance");
            return Ok(ProcessManagerHandleResponse::default());
        }

        let registrations = self.registrations_for(trigger.domain());
        let root = trigger.root_uuid();
        let mut state = self.state.rebuild(process_state).into_inner();
        let mut commands = Vec::new();

        for page in &trigger.pages {
            let Some(event) = &page.event else { continue };
            let trailing = crate::convert::type_name(&event.type_url);

            if name_matches(trailing, NOTIFICATION_TYPE) {
                return self.dispatch_rejection(event, &state, commands);
            }

            // Applier first: reacts observe the state including this event.
            self.state.apply(&mut state, event);

            let Some(registrations) = registrations else {
                continue;
            };
            if let Some((_, handler)) = registrations
                .reacts
                .iter()
                .find(|(key, _)| name_matches(trailing, key))
            {
                commands.extend(handler(event, &state, root, &correlation_id, destinations)?);
            }
        }

        Ok(ProcessManagerHandleResponse {
            commands,
            process_events: None,
            notification: None,
        })
    }

    fn dispatch_rejection(
        &self,
        event: &Any,
        state: &S,
        commands: Vec<CommandBook>,
    ) -> HandlerResult<ProcessManagerHandleResponse> {
        let notification = Notification::decode(event.value.as_slice())
            .map_err(|e| HandlerError::Decode(format!("notification: {e}")))?;

        let rejection = notification
            .payload
            .as_ref()
            .map(|p| RejectionNotification::decode(p.value.as_slice()))
            .transpose()
            .map_err(|e| HandlerError::Decode(format!("rejection notification: {e}")))?
            .unwrap_or_default();

        let (target_domain, command) = rejection_key(&rejection);

        let handler = self
            .rejection_handlers
            .iter()
            .find(|((d, c), _)| *d == target_domain && name_matches(&command, c));

        let Some((_, handler)) = handler else {
            debug!(
                pm = %self.name,
                target = %target_domain,
                command = %command,
                "no compensation handler, deferring to coordinator"
            );
            return Ok(ProcessManagerHandleResponse {
                commands,
                process_events: None,
                notification: None,
            });
        };

        let response = handler(&notification, state)?;
        Ok(ProcessManagerHandleResponse {
            commands,
            process_events: response.events,
            notification: response.notification,
        })
    }
}
