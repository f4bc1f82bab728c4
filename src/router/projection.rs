//! Projection dispatch: events to key/value projection deltas.
//!
//! Projectors have no feedback into the aggregate layer: each matched
//! event maps to one [`Projection`] delta, either an upsert of `value`
//! under `key` or a tombstone for `key`. The speculative mode performs
//! the same computation with results tagged so downstream writers do
//! not persist them.

use prost::Message;
use prost_types::Any;

use crate::convert::name_matches;
use crate::error::{HandlerError, HandlerResult};
use crate::proto::{EventBook, Projection};
use crate::proto_ext::CoverExt;

type ProjectFn = Box<dyn Fn(&Any) -> HandlerResult<Projection> + Send + Sync>;

struct DomainRegistrations {
    domain: String,
    handlers: Vec<(String, ProjectFn)>,
}

/// Projection router for one projector.
///
/// ```rust,ignore
/// let router = ProjectionRouter::new("prj-stock-levels")
///     .domain("inventory")
///     .on("StockReserved", project_stock_reserved)
///     .on("StockReleased", project_stock_released);
/// ```
pub struct ProjectionRouter {
    name: String,
    domains: Vec<DomainRegistrations>,
    cursor: Option<usize>,
}

impl ProjectionRouter {
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
                handlers: Vec::new(),
            });
            self.domains.len() - 1
        }));
        self
    }

    /// Register a typed handler for events matching `key` in the
    /// current domain.
    pub fn on<E, H>(mut self, key: impl Into<String>, handler: H) -> Self
    where
        E: Message + Default + 'static,
        H: Fn(&E) -> Projection + Send + Sync + 'static,
    {
        let index = self
            .cursor
            .unwrap_or_else(|| panic!("call domain() before on()"));
        let erased: ProjectFn = Box::new(move |any| {
            let event = E::decode(any.value.as_slice())
                .map_err(|e| HandlerError::Decode(format!("{}: {e}", any.type_url)))?;
            Ok(handler(&event))
        });
        self.domains[index].handlers.push((key.into(), erased));
        self
    }

    /// The projector's logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscriptions derived from registrations, in registration order.
    pub fn subscriptions(&self) -> Vec<(String, Vec<String>)> {
        self.domains
            .iter()
            .filter(|d| !d.handlers.is_empty())
            .map(|d| {
                (
                    d.domain.clone(),
                    d.handlers.iter().map(|(k, _)| k.clone()).collect(),
                )
            })
            .collect()
    }

    /// Map each matched event page to a projection delta; unmatched
    /// pages are skipped.
    pub fn dispatch(&self, book: &EventBook) -> HandlerResult<Vec<Projection>> {
        let Some(registrations) = self.domains.iter().find(|d| d.domain == book.domain()) else {
            return Ok(Vec::new());
        };

        let mut projections = Vec::new();
        for page in &book.pages {
            let Some(event) = &page.event else { continue };
            let trailing = crate::convert::type_name(&event.type_url);
            if let Some((_, handler)) = registrations
                .handlers
                .iter()
                .find(|(key, _)| name_matches(trailing, key))
            {
                projections.push(handler(event)?);
            }
        }
        Ok(projections)
    }

    /// Same computation as [`ProjectionRouter::dispatch`] with every
    /// delta tagged speculative.
    pub fn dispatch_speculative(&self, book: &EventBook) -> HandlerResult<Vec<Projection>> {
        let mut projections = self.dispatch(book)?;
        for projection in &mut projections {
            projection.speculative = true;
        }
        Ok(projections)
    }
}

/// Upsert delta for `key`.
pub fn upsert(key: impl Into<String>, value: Any) -> Projection {
    Projection {
        key: key.into(),
        value: Some(value),
        tombstone: false,
        speculative: false,
    }
}

/// Tombstone delta for `key`.
pub fn tombstone(key: impl Into<String>) -> Projection {
    Projection {
        key: key.into(),
        value: None,
        tombstone: true,
        speculative: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::pack_as;
    use crate::proto::{Cover, EventPage};

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct StockReserved {
        #[prost(string, tag = "1")]
        sku: String,
        #[prost(int64, tag = "2")]
        remaining: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct StockDepleted {
        #[prost(string, tag = "1")]
        sku: String,
    }

    fn router() -> ProjectionRouter {
        ProjectionRouter::new("prj-stock")
            .domain("inventory")
            .on("StockReserved", |event: &StockReserved| {
                upsert(event.sku.clone(), pack_as(event, "examples.StockReserved"))
            })
            .on("StockDepleted", |event: &StockDepleted| {
                tombstone(event.sku.clone())
            })
    }

    fn book(pages: Vec<EventPage>) -> EventBook {
        EventBook {
            cover: Some(Cover {
                domain: "inventory".to_string(),
                ..Default::default()
            }),
            snapshot: None,
            pages,
        }
    }

    fn reserved_page(seq: u32, sku: &str) -> EventPage {
        EventPage {
            sequence: seq,
            created_at: None,
            event: Some(pack_as(
                &StockReserved {
                    sku: sku.to_string(),
                    remaining: 5,
                },
                "examples.StockReserved",
            )),
        }
    }

    #[test]
    fn collects_upserts_and_tombstones() {
        let depleted = EventPage {
            sequence: 1,
            created_at: None,
            event: Some(pack_as(
                &StockDepleted {
                    sku: "sku-1".to_string(),
                },
                "examples.StockDepleted",
            )),
        };
        let projections = router()
            .dispatch(&book(vec![reserved_page(0, "sku-1"), depleted]))
            .unwrap();

        assert_eq!(projections.len(), 2);
        assert!(!projections[0].tombstone);
        assert!(projections[0].value.is_some());
        assert!(projections[1].tombstone);
        assert!(projections[1].value.is_none());
        assert_eq!(projections[1].key, "sku-1");
    }

    #[test]
    fn skips_unmatched_events() {
        let unknown = EventPage {
            sequence: 0,
            created_at: None,
            event: Some(pack_as(
                &StockDepleted {
                    sku: "sku-1".to_string(),
                },
                "examples.SomethingElse",
            )),
        };
        assert!(router().dispatch(&book(vec![unknown])).unwrap().is_empty());
    }

    #[test]
    fn other_domains_produce_nothing() {
        let mut b = book(vec![reserved_page(0, "sku-1")]);
        b.cover.as_mut().unwrap().domain = "order".to_string();
        assert!(router().dispatch(&b).unwrap().is_empty());
    }

    #[test]
    fn speculative_dispatch_tags_every_delta() {
        let projections = router()
            .dispatch_speculative(&book(vec![reserved_page(0, "sku-1")]))
            .unwrap();
        assert!(projections.iter().all(|p| p.speculative));

        // The plain dispatch stays untagged.
        let projections = router()
            .dispatch(&book(vec![reserved_page(0, "sku-1")]))
            .unwrap();
        assert!(projections.iter().all(|p| !p.speculative));
    }
}
