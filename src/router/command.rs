//! Aggregate command dispatch.
//!
//! A [`CommandRouter`] owns one aggregate's registrations: command
//! handlers keyed by type name, compensation handlers keyed by
//! `(target domain, command type name)`, and the state rebuilder.
//!
//! Handlers follow guard → validate → compute: guard failures raise
//! [`HandlerError::Rejected`], validation failures
//! [`HandlerError::InvalidArgument`], and compute returns events.

use prost::Message;
use prost_types::Any;
use tracing::debug;

use crate::convert::{name_matches, type_name};
use crate::error::{HandlerError, HandlerResult};
use crate::proto::{
    business_response, BusinessResponse, CommandBook, ContextualCommand, Cover, EventBook,
    Notification, RejectionNotification, Revocation,
};
use crate::proto_ext::next_sequence;
use crate::state::{Rebuilt, StateRouter};

use super::rejection_key;

/// Reserved type name for the compensation carrier.
const NOTIFICATION_TYPE: &str = "Notification";

/// What a compensation handler decided.
///
/// Events absorb the rejection locally; a notification propagates it
/// one hop upstream; neither defers to the coordinator.
#[derive(Default)]
pub struct RejectionHandlerResponse {
    /// Events to persist to the aggregate's own history.
    pub events: Option<EventBook>,
    /// Notification to forward upstream.
    pub notification: Option<Notification>,
}

impl RejectionHandlerResponse {
    pub fn events(events: EventBook) -> Self {
        Self {
            events: Some(events),
            notification: None,
        }
    }

    pub fn forward(notification: Notification) -> Self {
        Self {
            events: None,
            notification: Some(notification),
        }
    }
}

/// Rejection context unpacked for handler convenience.
#[derive(Default)]
pub struct CompensationContext {
    /// Saga/PM that issued the rejected command.
    pub issuer_name: String,
    /// "saga" or "process_manager".
    pub issuer_type: String,
    pub rejection_reason: String,
    /// Source event that triggered the issuing flow.
    pub source_event_sequence: u32,
    pub rejected_command: Option<CommandBook>,
    /// Cover of the aggregate whose event triggered the flow.
    pub source: Option<Cover>,
}

impl CompensationContext {
    /// Unpack the inner rejection from a notification. Fields default
    /// when the payload is absent or undecodable.
    pub fn from_notification(notification: &Notification) -> Self {
        let rejection = notification
            .payload
            .as_ref()
            .and_then(|p| RejectionNotification::decode(p.value.as_slice()).ok())
            .unwrap_or_default();

        Self {
            issuer_name: rejection.issuer_name,
            issuer_type: rejection.issuer_type,
            rejection_reason: rejection.rejection_reason,
            source_event_sequence: rejection.source_event_sequence,
            rejected_command: rejection.rejected_command,
            source: rejection.source,
        }
    }
}

type CommandHandlerFn<S> =
    Box<dyn Fn(&CommandBook, &Any, &Rebuilt<S>, u32) -> HandlerResult<EventBook> + Send + Sync>;

type RejectionHandlerFn<S> = Box<
    dyn Fn(&Notification, &Rebuilt<S>) -> HandlerResult<RejectionHandlerResponse> + Send + Sync,
>;

/// Command router for one aggregate domain.
///
/// ```rust,ignore
/// let router = CommandRouter::new("player", player_state())
///     .on("RegisterPlayer", handle_register)
///     .on("DepositFunds", handle_deposit)
///     .on_rejected("inventory", "ReserveStock", handle_reserve_rejected);
/// ```
pub struct CommandRouter<S> {
    domain: String,
    state: StateRouter<S>,
    handlers: Vec<(String, CommandHandlerFn<S>)>,
    rejection_handlers: Vec<((String, String), RejectionHandlerFn<S>)>,
}

impl<S: 'static> CommandRouter<S> {
    pub fn new(domain: impl Into<String>, state: StateRouter<S>) -> Self {
        Self {
            domain: domain.into(),
            state,
            handlers: Vec::new(),
            rejection_handlers: Vec::new(),
        }
    }

    /// Register a typed handler for commands matching `key`.
    ///
    /// The handler receives the command book, the decoded command, the
    /// rebuilt state, and the next sequence number.
    ///
    /// # Panics
    ///
    /// Registering the same key twice is a programming error and panics
    /// at startup.
    pub fn on<C, H>(mut self, key: impl Into<String>, handler: H) -> Self
    where
        C: Message + Default + 'static,
        H: Fn(&CommandBook, C, &Rebuilt<S>, u32) -> HandlerResult<EventBook>
            + Send
            + Sync
            + 'static,
    {
        let key = key.into();
        assert!(
            !self.handlers.iter().any(|(k, _)| *k == key),
            "duplicate command handler for {key}"
        );

        let erased: CommandHandlerFn<S> = Box::new(move |book, any, state, seq| {
            let command = C::decode(any.value.as_slice())
                .map_err(|e| HandlerError::Decode(format!("{}: {e}", any.type_url)))?;
            handler(book, command, state, seq)
        });
        self.handlers.push((key, erased));
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
        H: Fn(&Notification, &Rebuilt<S>) -> HandlerResult<RejectionHandlerResponse>
            + Send
            + Sync
            + 'static,
    {
        let key = (domain.into(), command.into());
        self.rejection_handlers.retain(|(k, _)| *k != key);
        self.rejection_handlers.push((key, Box::new(handler)));
        self
    }

    /// The aggregate domain this router serves.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Registered command type names, in registration order.
    pub fn command_types(&self) -> Vec<String> {
        self.handlers.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Rebuild state from a prior history (also backs the replay RPC).
    pub fn rebuild(&self, events: Option<&EventBook>) -> Rebuilt<S> {
        self.state.rebuild(events)
    }

    /// Dispatch a contextual command.
    ///
    /// Rebuilds state, routes by the command's trailing type name, and
    /// wraps the handler result. A `Notification` payload enters the
    /// rejection pathway instead.
    pub fn dispatch(&self, cmd: &ContextualCommand) -> HandlerResult<BusinessResponse> {
        let command_book = cmd
            .command
            .as_ref()
            .ok_or_else(|| HandlerError::InvalidArgument("missing command book".to_string()))?;

        let command_any = command_book
            .pages
            .first()
            .and_then(|p| p.command.as_ref())
            .filter(|a| !a.type_url.is_empty())
            .ok_or_else(|| HandlerError::InvalidArgument("no command pages".to_string()))?;

        let state = self.state.rebuild(cmd.events.as_ref());
        let seq = next_sequence(cmd.events.as_ref());
        let trailing = type_name(&command_any.type_url);

        debug!(domain = %self.domain, command = trailing, seq, "dispatching command");

        if name_matches(trailing, NOTIFICATION_TYPE) {
            return self.dispatch_rejection(command_any, &state);
        }

        let handler = self
            .handlers
            .iter()
            .find(|(key, _)| name_matches(trailing, key))
            .map(|(_, h)| h)
            .ok_or_else(|| {
                HandlerError::InvalidArgument(format!(
                    "Unknown command type: {}",
                    command_any.type_url
                ))
            })?;

        let events = handler(command_book, command_any, &state, seq)?;

        Ok(BusinessResponse {
            result: Some(business_response::Result::Events(events)),
        })
    }

    /// Route a rejection notification to its compensation handler.
    fn dispatch_rejection(
        &self,
        command_any: &Any,
        state: &Rebuilt<S>,
    ) -> HandlerResult<BusinessResponse> {
        let notification = Notification::decode(command_any.value.as_slice())
            .map_err(|e| HandlerError::Decode(format!("notification: {e}")))?;

        let rejection = notification
            .payload
            .as_ref()
            .map(|p| RejectionNotification::decode(p.value.as_slice()))
            .transpose()
            .map_err(|e| HandlerError::Decode(format!("rejection notification: {e}")))?
            .unwrap_or_default();

        let (target_domain, command) = rejection_key(&rejection);

        let handler = self.rejection_handlers.iter().find(|((d, c), _)| {
            *d == target_domain && name_matches(&command, c)
        });

        let Some((_, handler)) = handler else {
            debug!(
                domain = %self.domain,
                target = %target_domain,
                command = %command,
                "no compensation handler, deferring to coordinator"
            );
            return Ok(revocation(
                true,
                format!(
                    "{} has no custom compensation for {}/{}",
                    self.domain, target_domain, command
                ),
            ));
        };

        let response = handler(&notification, state)?;

        let result = match (response.events, response.notification) {
            // Forwarding wins: the upstream must learn of the rejection.
            (_, Some(forwarded)) => business_response::Result::Notification(forwarded),
            (Some(events), None) => business_response::Result::Events(events),
            (None, None) => {
                return Ok(revocation(
                    false,
                    format!(
                        "{} handled rejection for {}/{}",
                        self.domain, target_domain, command
                    ),
                ))
            }
        };

        Ok(BusinessResponse {
            result: Some(result),
        })
    }
}

fn revocation(emit_system_revocation: bool, reason: String) -> BusinessResponse {
    BusinessResponse {
        result: Some(business_response::Result::Revocation(Revocation {
            emit_system_revocation,
            reason,
        })),
    }
}
