//! Saga event dispatch: the two-phase prepare → dispatch protocol.
//!
//! Registrations hang off a source-domain cursor:
//!
//! ```rust,ignore
//! let router = EventRouter::new("saga-pot-payout")
//!     .domain("hand")
//!     .prepare("PotAwarded", prepare_pot_awarded)
//!     .on("PotAwarded", handle_pot_awarded);
//! ```
//!
//! Phase 1 ([`EventRouter::prepare_destinations`]) enumerates the
//! destination aggregates whose state the saga wants to peek at; the
//! coordinator fetches those books and passes them to phase 2
//! ([`EventRouter::dispatch`]), which translates source events into
//! command books. Sagas are stateless: a missing correlation ID does
//! not stop dispatch, but every emitted command must carry the source
//! correlation ID.

use prost::Message;
use prost_types::Any;
use tracing::debug;

use crate::convert::name_matches;
use crate::error::{HandlerError, HandlerResult};
use crate::proto::{CommandBook, Cover, EventBook};
use crate::proto_ext::CoverExt;
use uuid::Uuid;

type ReactFn = Box<
    dyn Fn(&Any, Option<Uuid>, &str, &[EventBook]) -> HandlerResult<Vec<CommandBook>>
        + Send
        + Sync,
>;

type PrepareFn = Box<dyn Fn(&Any, Option<Uuid>) -> Vec<Cover> + Send + Sync>;

struct DomainRegistrations {
    domain: String,
    reacts: Vec<(String, ReactFn)>,
    prepares: Vec<(String, PrepareFn)>,
}

/// Event router for a saga.
pub struct EventRouter {
    name: String,
    domains: Vec<DomainRegistrations>,
    cursor: Option<usize>,
}

impl EventRouter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domains: Vec::new(),
            cursor: None,
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

    fn current(&mut self, method: &str) -> &mut DomainRegistrations {
        let index = self
            .cursor
            .unwrap_or_else(|| panic!("call domain() before {method}()"));
        &mut self.domains[index]
    }

    /// Register a typed prepare handler for events matching `key` in
    /// the current domain. The handler enumerates destination covers to
    /// fetch; undecodable payloads yield no destinations.
    pub fn prepare<E, H>(mut self, key: impl Into<String>, handler: H) -> Self
    where
        E: Message + Default + 'static,
        H: Fn(&E, Option<Uuid>) -> Vec<Cover> + Send + Sync + 'static,
    {
        let erased: PrepareFn = Box::new(move |any, root| match E::decode(any.value.as_slice()) {
            Ok(event) => handler(&event, root),
            Err(_) => Vec::new(),
        });
        self.current("prepare").prepares.push((key.into(), erased));
        self
    }

    /// Register a typed react handler for events matching `key` in the
    /// current domain.
    ///
    /// The handler receives the decoded event, the source root, the
    /// source correlation ID, and the fetched destination books; it
    /// returns the command books to emit.
    pub fn on<E, H>(mut self, key: impl Into<String>, handler: H) -> Self
    where
        E: Message + Default + 'static,
        H: Fn(&E, Option<Uuid>, &str, &[EventBook]) -> HandlerResult<Vec<CommandBook>>
            + Send
            + Sync
            + 'static,
    {
        let erased: ReactFn = Box::new(move |any, root, correlation_id, destinations| {
            let event = E::decode(any.value.as_slice())
                .map_err(|e| HandlerError::Decode(format!("{}: {e}", any.type_url)))?;
            handler(&event, root, correlation_id, destinations)
        });
        self.current("on").reacts.push((key.into(), erased));
        self
    }

    /// The saga's logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscriptions derived from registrations, in registration order:
    /// each source domain with every type name registered under it.
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

    fn registrations_for(&self, domain: &str) -> Option<&DomainRegistrations> {
        self.domains.iter().find(|d| d.domain == domain)
    }

    /// Phase 1: enumerate destination covers for a source book.
    ///
    /// Routes by the source cover's domain, runs the matching prepare
    /// handler for every page, and concatenates the returned covers.
    pub fn prepare_destinations(&self, source: &EventBook) -> Vec<Cover> {
        let Some(registrations) = self.registrations_for(source.domain()) else {
            return Vec::new();
        };

        let root = source.root_uuid();
        let mut destinations = Vec::new();

        for page in &source.pages {
            let Some(event) = &page.event else { continue };
            let trailing = crate::convert::type_name(&event.type_url);
            if let Some((_, handler)) = registrations
                .prepares
                .iter()
                .find(|(key, _)| name_matches(trailing, key))
            {
                destinations.extend(handler(event, root));
            }
        }
        destinations
    }

    /// Phase 2: translate source events into command books.
    ///
    /// Routes by source domain; pages are processed in order and the
    /// resulting command books concatenated. An unregistered source
    /// domain or unmatched event type yields nothing.
    pub fn dispatch(
        &self,
        source: &EventBook,
        destinations: &[EventBook],
    ) -> HandlerResult<Vec<CommandBook>> {
        let Some(registrations) = self.registrations_for(source.domain()) else {
            debug!(saga = %self.name, domain = %source.domain(), "no registrations for source domain");
            return Ok(Vec::new());
        };

        let root = source.root_uuid();
        let correlation_id = source.correlation_id();
        let mut commands = Vec::new();

        for page in &source.pages {
            let Some(event) = &page.event else { continue };
            let trailing = crate::convert::type_name(&event.type_url);
            if let Some((_, handler)) = registrations
                .reacts
                .iter()
                .find(|(key, _)| name_matches(trailing, key))
            {
                commands.extend(handler(event, root, correlation_id, destinations)?);
            }
        }
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{pack_as, uuid_to_proto};
    use crate::proto::EventPage;
    use crate::router::command_book_for;

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct Completed {
        #[prost(string, tag = "1")]
        order_id: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct Ship {
        #[prost(string, tag = "1")]
        order_id: String,
    }

    fn source_book(domain: &str, correlation_id: &str, pages: Vec<EventPage>) -> EventBook {
        EventBook {
            cover: Some(Cover {
                domain: domain.to_string(),
                root: Some(uuid_to_proto(Uuid::new_v4())),
                correlation_id: correlation_id.to_string(),
                edition: String::new(),
            }),
            snapshot: None,
            pages,
        }
    }

    fn completed_page(seq: u32, order_id: &str) -> EventPage {
        EventPage {
            sequence: seq,
            created_at: None,
            event: Some(pack_as(
                &Completed {
                    order_id: order_id.to_string(),
                },
                "examples.Completed",
            )),
        }
    }

    fn router() -> EventRouter {
        EventRouter::new("saga-order-fulfillment")
            .domain("order")
            .prepare(
                "Completed",
                |event: &Completed, _root: Option<Uuid>| {
                    vec![Cover {
                        domain: "fulfillment".to_string(),
                        correlation_id: event.order_id.clone(),
                        ..Default::default()
                    }]
                },
            )
            .on(
                "Completed",
                |event: &Completed, root: Option<Uuid>, correlation_id: &str, _dests: &[EventBook]| {
                    Ok(vec![command_book_for(
                        "fulfillment",
                        root,
                        correlation_id,
                        0,
                        pack_as(
                            &Ship {
                                order_id: event.order_id.clone(),
                            },
                            "examples.Ship",
                        ),
                    )])
                },
            )
    }

    #[test]
    fn dispatch_routes_by_source_domain() {
        let book = source_book("order", "corr-1", vec![completed_page(0, "o-1")]);
        let commands = router().dispatch(&book, &[]).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].cover.as_ref().unwrap().domain, "fulfillment");
        assert_eq!(commands[0].cover.as_ref().unwrap().correlation_id, "corr-1");
    }

    #[test]
    fn unregistered_source_domain_yields_nothing() {
        let book = source_book("inventory", "corr-1", vec![completed_page(0, "o-1")]);
        let commands = router().dispatch(&book, &[]).unwrap();
        assert!(commands.is_empty());
    }

    #[test]
    fn unmatched_event_types_are_skipped() {
        let page = EventPage {
            sequence: 0,
            created_at: None,
            event: Some(pack_as(&Ship::default(), "examples.SomethingElse")),
        };
        let book = source_book("order", "corr-1", vec![page]);
        let commands = router().dispatch(&book, &[]).unwrap();
        assert!(commands.is_empty());
    }

    #[test]
    fn every_page_is_dispatched_in_order() {
        let book = source_book(
            "order",
            "corr-1",
            vec![completed_page(0, "o-1"), completed_page(1, "o-2")],
        );
        let commands = router().dispatch(&book, &[]).unwrap();
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn saga_runs_without_correlation_id() {
        let book = source_book("order", "", vec![completed_page(0, "o-1")]);
        let commands = router().dispatch(&book, &[]).unwrap();
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn prepare_collects_covers_per_page() {
        let book = source_book(
            "order",
            "corr-1",
            vec![completed_page(0, "o-1"), completed_page(1, "o-2")],
        );
        let covers = router().prepare_destinations(&book);
        assert_eq!(covers.len(), 2);
        assert!(covers.iter().all(|c| c.domain == "fulfillment"));
    }

    #[test]
    fn prepare_ignores_unregistered_domain() {
        let book = source_book("inventory", "corr-1", vec![completed_page(0, "o-1")]);
        assert!(router().prepare_destinations(&book).is_empty());
    }

    #[test]
    fn subscriptions_cover_all_registered_types() {
        let router = router().domain("inventory").on(
            "Reserved",
            |_event: &Completed, _root, _corr: &str, _dests: &[EventBook]| Ok(Vec::new()),
        );
        let subs = router.subscriptions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].0, "order");
        assert_eq!(subs[0].1, vec!["Completed".to_string()]);
        assert_eq!(subs[1].0, "inventory");
        assert_eq!(subs[1].1, vec!["Reserved".to_string()]);
    }

    #[test]
    #[should_panic(expected = "call domain() before on()")]
    fn registering_without_domain_panics() {
        let _ = EventRouter::new("saga-bad").on(
            "Completed",
            |_event: &Completed, _root, _corr: &str, _dests: &[EventBook]| Ok(Vec::new()),
        );
    }
}
