//! Forward-only event version transforms.
//!
//! An upcaster sits between storage and the rebuilder: old event
//! versions are rewritten to their current shape before appliers see
//! them. Pages without a registered transform pass through unchanged;
//! sequence numbers and timestamps are always preserved.

use prost::Message;
use prost_types::Any;

use crate::convert::{name_matches, pack_as};
use crate::error::{HandlerError, HandlerResult};
use crate::proto::{EventBook, EventPage};

type UpcastFn = Box<dyn Fn(&Any) -> HandlerResult<Any> + Send + Sync>;

/// Upcaster router for one domain's event history.
///
/// ```rust,ignore
/// let router = UpcasterRouter::new("order")
///     .on("OrderCreatedV1", "examples.OrderCreated", upcast_created);
/// ```
pub struct UpcasterRouter {
    domain: String,
    handlers: Vec<(String, UpcastFn)>,
}

impl UpcasterRouter {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            handlers: Vec::new(),
        }
    }

    /// Register a transform from events matching `old_key` to
    /// `new_type_name`. The first matching transform wins; chains are
    /// registered as a single old-to-current hop.
    pub fn on<Old, New, H>(
        mut self,
        old_key: impl Into<String>,
        new_type_name: impl Into<String>,
        handler: H,
    ) -> Self
    where
        Old: Message + Default + 'static,
        New: Message + 'static,
        H: Fn(Old) -> New + Send + Sync + 'static,
    {
        let new_type_name = new_type_name.into();
        let erased: UpcastFn = Box::new(move |any| {
            let old = Old::decode(any.value.as_slice())
                .map_err(|e| HandlerError::Decode(format!("{}: {e}", any.type_url)))?;
            Ok(pack_as(&handler(old), &new_type_name))
        });
        self.handlers.push((old_key.into(), erased));
        self
    }

    /// The domain whose history this upcaster rewrites.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Old event type names with registered transforms.
    pub fn event_types(&self) -> Vec<String> {
        self.handlers.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Rewrite one page, preserving sequence and timestamp.
    pub fn upcast_page(&self, page: EventPage) -> HandlerResult<EventPage> {
        let Some(event) = &page.event else {
            return Ok(page);
        };

        let trailing = crate::convert::type_name(&event.type_url);
        let Some((_, handler)) = self
            .handlers
            .iter()
            .find(|(key, _)| name_matches(trailing, key))
        else {
            return Ok(page);
        };

        let rewritten = handler(event)?;
        Ok(EventPage {
            sequence: page.sequence,
            created_at: page.created_at,
            event: Some(rewritten),
        })
    }

    /// Rewrite a page sequence in order.
    pub fn upcast(&self, pages: Vec<EventPage>) -> HandlerResult<Vec<EventPage>> {
        pages
            .into_iter()
            .map(|page| self.upcast_page(page))
            .collect()
    }

    /// Rewrite a whole book's pages, leaving cover and snapshot alone.
    pub fn upcast_book(&self, book: EventBook) -> HandlerResult<EventBook> {
        Ok(EventBook {
            cover: book.cover,
            snapshot: book.snapshot,
            pages: self.upcast(book.pages)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::type_name;

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct CreatedV1 {
        #[prost(string, tag = "1")]
        order_id: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct Created {
        #[prost(string, tag = "1")]
        order_id: String,
        #[prost(int64, tag = "2")]
        total: i64,
    }

    fn router() -> UpcasterRouter {
        UpcasterRouter::new("order").on(
            "CreatedV1",
            "examples.Created",
            |old: CreatedV1| Created {
                order_id: old.order_id,
                total: 0,
            },
        )
    }

    fn v1_page(seq: u32) -> EventPage {
        EventPage {
            sequence: seq,
            created_at: Some(prost_types::Timestamp {
                seconds: 1700000000,
                nanos: 42,
            }),
            event: Some(pack_as(
                &CreatedV1 {
                    order_id: "o-1".to_string(),
                },
                "examples.CreatedV1",
            )),
        }
    }

    #[test]
    fn rewrites_matched_pages_preserving_metadata() {
        let page = router().upcast_page(v1_page(7)).unwrap();
        assert_eq!(page.sequence, 7);
        assert_eq!(page.created_at.as_ref().unwrap().nanos, 42);

        let event = page.event.unwrap();
        assert_eq!(type_name(&event.type_url), "examples.Created");
        let created = Created::decode(event.value.as_slice()).unwrap();
        assert_eq!(created.order_id, "o-1");
        assert_eq!(created.total, 0);
    }

    #[test]
    fn unmatched_pages_pass_through() {
        let page = EventPage {
            sequence: 3,
            created_at: None,
            event: Some(pack_as(
                &Created {
                    order_id: "o-2".to_string(),
                    total: 10,
                },
                "examples.Created",
            )),
        };
        let out = router().upcast_page(page.clone()).unwrap();
        assert_eq!(out, page);
    }

    #[test]
    fn upcasts_pages_in_order() {
        let pages = router().upcast(vec![v1_page(0), v1_page(1)]).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].sequence, 0);
        assert_eq!(pages[1].sequence, 1);
    }
}
