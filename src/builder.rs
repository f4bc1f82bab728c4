//! Fluent builders for commands and queries.
//!
//! Builders construct well-formed envelopes and execute them through
//! the injected client traits, so the same business code runs against
//! a live coordinator or a mock.

use prost::Message;
use uuid::Uuid;

use crate::convert::{parse_timestamp, uuid_to_proto};
use crate::error::{ClientError, Result};
use crate::proto::{
    query::Selection, temporal_query::PointInTime, CommandBook, CommandPage, CommandResponse,
    Cover, EventBook, EventPage, Query, SequenceRange, TemporalQuery,
};
use crate::traits;

/// Builder for constructing and executing commands.
pub struct CommandBuilder<'a, C: traits::GatewayClient> {
    client: &'a C,
    domain: String,
    root: Option<Uuid>,
    correlation_id: Option<String>,
    sequence: u32,
    command: Option<prost_types::Any>,
}

impl<'a, C: traits::GatewayClient> CommandBuilder<'a, C> {
    pub(crate) fn new(client: &'a C, domain: impl Into<String>, root: Option<Uuid>) -> Self {
        Self {
            client,
            domain: domain.into(),
            root,
            correlation_id: None,
            sequence: 0,
            command: None,
        }
    }

    /// Target a specific aggregate instance.
    pub fn with_root(mut self, root: Uuid) -> Self {
        self.root = Some(root);
        self
    }

    /// Link this command into an existing workflow. A fresh v4 UUID is
    /// generated when unset.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Expected next sequence of the target aggregate.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Set the command payload under the given type URL.
    pub fn with_command<M: Message>(mut self, type_url: impl Into<String>, message: &M) -> Self {
        self.command = Some(prost_types::Any {
            type_url: type_url.into(),
            value: message.encode_to_vec(),
        });
        self
    }

    /// Build the command book without executing.
    pub fn build(self) -> Result<CommandBook> {
        self.build_inner()
    }

    fn build_inner(&self) -> Result<CommandBook> {
        let command = self
            .command
            .clone()
            .filter(|c| !c.type_url.is_empty())
            .ok_or_else(|| ClientError::InvalidArgument("command not set".to_string()))?;

        let correlation_id = self
            .correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(CommandBook {
            cover: Some(Cover {
                domain: self.domain.clone(),
                root: self.root.map(uuid_to_proto),
                correlation_id,
                edition: String::new(),
            }),
            pages: vec![CommandPage {
                sequence: self.sequence,
                command: Some(command),
            }],
        })
    }

    /// Build and send through the injected gateway client.
    pub async fn execute(self) -> Result<CommandResponse> {
        let command = self.build_inner()?;
        self.client.execute(command).await
    }
}

/// Builder for constructing and executing queries.
pub struct QueryBuilder<'a, C: traits::QueryClient> {
    client: &'a C,
    domain: String,
    root: Option<Uuid>,
    correlation_id: Option<String>,
    edition: Option<String>,
    selection: Option<Selection>,
}

impl<'a, C: traits::QueryClient> std::fmt::Debug for QueryBuilder<'a, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("domain", &self.domain)
            .field("root", &self.root)
            .field("correlation_id", &self.correlation_id)
            .field("edition", &self.edition)
            .field("selection", &self.selection)
            .finish()
    }
}

impl<'a, C: traits::QueryClient> QueryBuilder<'a, C> {
    pub(crate) fn new(client: &'a C, domain: impl Into<String>, root: Option<Uuid>) -> Self {
        Self {
            client,
            domain: domain.into(),
            root,
            correlation_id: None,
            edition: None,
            selection: None,
        }
    }

    /// Query one aggregate instance. Clears any correlation-ID filter;
    /// the two are mutually exclusive.
    pub fn with_root(mut self, root: Uuid) -> Self {
        self.root = Some(root);
        self.correlation_id = None;
        self
    }

    /// Query by workflow instead of instance. Clears any root filter.
    pub fn by_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self.root = None;
        self
    }

    /// Query a diverged timeline.
    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = Some(edition.into());
        self
    }

    /// Sequence range from `lower` (inclusive), unbounded above.
    /// Clears any temporal filter.
    pub fn range(mut self, lower: u32) -> Self {
        self.selection = Some(Selection::Range(SequenceRange { lower, upper: None }));
        self
    }

    /// Sequence range `lower..=upper`. Clears any temporal filter.
    pub fn range_to(mut self, lower: u32, upper: u32) -> Self {
        self.selection = Some(Selection::Range(SequenceRange {
            lower,
            upper: Some(upper),
        }));
        self
    }

    /// State as of a sequence number. Clears any range filter.
    pub fn as_of_sequence(mut self, sequence: u32) -> Self {
        self.selection = Some(Selection::Temporal(TemporalQuery {
            point_in_time: Some(PointInTime::AsOfSequence(sequence)),
        }));
        self
    }

    /// State as of an instant in the simplified RFC3339 UTC form
    /// `YYYY-MM-DDTHH:MM:SSZ`. Clears any range filter.
    pub fn as_of_time(mut self, rfc3339: &str) -> Result<Self> {
        let timestamp = parse_timestamp(rfc3339)?;
        self.selection = Some(Selection::Temporal(TemporalQuery {
            point_in_time: Some(PointInTime::AsOfTime(timestamp)),
        }));
        Ok(self)
    }

    /// Build the query without executing.
    pub fn build(self) -> Query {
        self.build_inner()
    }

    fn build_inner(&self) -> Query {
        Query {
            cover: Some(Cover {
                domain: self.domain.clone(),
                root: self.root.map(uuid_to_proto),
                correlation_id: self.correlation_id.clone().unwrap_or_default(),
                edition: self.edition.clone().unwrap_or_default(),
            }),
            selection: self.selection.clone(),
        }
    }

    /// Execute and return a single event book.
    pub async fn get_event_book(self) -> Result<EventBook> {
        let query = self.build_inner();
        self.client.get_event_book(query).await
    }

    /// Execute and return all matching event books.
    pub async fn get_events(self) -> Result<Vec<EventBook>> {
        let query = self.build_inner();
        self.client.get_events(query).await
    }

    /// Execute and return just the event pages.
    pub async fn get_pages(self) -> Result<Vec<EventPage>> {
        let query = self.build_inner();
        let book = self.client.get_event_book(query).await?;
        Ok(book.pages)
    }
}

/// Entry points for building commands on any gateway client.
pub trait CommandBuilderExt: traits::GatewayClient + Sized {
    /// Start a command for an existing aggregate.
    fn command(&self, domain: impl Into<String>, root: Uuid) -> CommandBuilder<'_, Self> {
        CommandBuilder::new(self, domain, Some(root))
    }

    /// Start a command for a new aggregate (no root yet).
    fn command_new(&self, domain: impl Into<String>) -> CommandBuilder<'_, Self> {
        CommandBuilder::new(self, domain, None)
    }
}

impl<T: traits::GatewayClient> CommandBuilderExt for T {}

/// Entry points for building queries on any query client.
pub trait QueryBuilderExt: traits::QueryClient + Sized {
    /// Start a query for one aggregate instance.
    fn query(&self, domain: impl Into<String>, root: Uuid) -> QueryBuilder<'_, Self> {
        QueryBuilder::new(self, domain, Some(root))
    }

    /// Start a domain query (combine with `by_correlation_id`).
    fn query_domain(&self, domain: impl Into<String>) -> QueryBuilder<'_, Self> {
        QueryBuilder::new(self, domain, None)
    }
}

impl<T: traits::QueryClient> QueryBuilderExt for T {}

/// Event pages carried by a command response.
pub fn events_from_response(response: &CommandResponse) -> &[EventPage] {
    response
        .events
        .as_ref()
        .map(|book| book.pages.as_slice())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{SpeculateAggregateRequest, SyncCommandBook};
    use crate::proto_ext::CoverExt;
    use async_trait::async_trait;

    struct MockClient;

    #[async_trait]
    impl traits::GatewayClient for MockClient {
        async fn execute(&self, command: CommandBook) -> Result<CommandResponse> {
            Ok(CommandResponse {
                events: Some(EventBook {
                    cover: command.cover,
                    ..Default::default()
                }),
            })
        }

        async fn execute_sync(&self, _command: SyncCommandBook) -> Result<CommandResponse> {
            Ok(CommandResponse::default())
        }

        async fn execute_speculative(
            &self,
            _request: SpeculateAggregateRequest,
        ) -> Result<CommandResponse> {
            Ok(CommandResponse::default())
        }
    }

    #[async_trait]
    impl traits::QueryClient for MockClient {
        async fn get_event_book(&self, query: Query) -> Result<EventBook> {
            Ok(EventBook {
                cover: query.cover,
                ..Default::default()
            })
        }

        async fn get_events(&self, _query: Query) -> Result<Vec<EventBook>> {
            Ok(Vec::new())
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct Ping {
        #[prost(string, tag = "1")]
        note: String,
    }

    #[test]
    fn build_without_command_is_invalid_argument() {
        let client = MockClient;
        let err = client.command_new("tally").build().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn missing_correlation_id_is_generated() {
        let client = MockClient;
        let book = client
            .command_new("tally")
            .with_command("type.googleapis.com/tests.Ping", &Ping::default())
            .build()
            .unwrap();

        let correlation_id = book.correlation_id();
        assert_eq!(correlation_id.len(), 36);
        assert!(Uuid::parse_str(correlation_id).is_ok());
    }

    #[test]
    fn explicit_fields_land_on_the_book() {
        let client = MockClient;
        let root = Uuid::new_v4();
        let book = client
            .command("tally", root)
            .with_correlation_id("corr-9")
            .with_sequence(4)
            .with_command("type.googleapis.com/tests.Ping", &Ping::default())
            .build()
            .unwrap();

        assert_eq!(book.domain(), "tally");
        assert_eq!(book.root_uuid(), Some(root));
        assert_eq!(book.correlation_id(), "corr-9");
        assert_eq!(book.pages[0].sequence, 4);
    }

    #[tokio::test]
    async fn execute_sends_the_built_book() {
        let client = MockClient;
        let response = client
            .command_new("tally")
            .with_command("type.googleapis.com/tests.Ping", &Ping::default())
            .execute()
            .await
            .unwrap();
        assert_eq!(response.events.unwrap().domain(), "tally");
    }

    #[test]
    fn root_and_correlation_are_mutually_exclusive() {
        let client = MockClient;
        let root = Uuid::new_v4();

        let query = client.query("tally", root).by_correlation_id("corr-1").build();
        let cover = query.cover.as_ref().unwrap();
        assert!(cover.root.is_none());
        assert_eq!(cover.correlation_id, "corr-1");

        let query = client
            .query_domain("tally")
            .by_correlation_id("corr-1")
            .with_root(root)
            .build();
        let cover = query.cover.as_ref().unwrap();
        assert!(cover.root.is_some());
        assert_eq!(cover.correlation_id, "");
    }

    #[test]
    fn range_and_temporal_are_mutually_exclusive() {
        let client = MockClient;
        let root = Uuid::new_v4();

        let query = client
            .query("tally", root)
            .range(5)
            .as_of_sequence(9)
            .build();
        assert!(matches!(query.selection, Some(Selection::Temporal(_))));

        let query = client
            .query("tally", root)
            .as_of_sequence(9)
            .range_to(0, 5)
            .build();
        match query.selection {
            Some(Selection::Range(range)) => {
                assert_eq!(range.lower, 0);
                assert_eq!(range.upper, Some(5));
            }
            other => panic!("expected range selection, got {other:?}"),
        }
    }

    #[test]
    fn as_of_time_parses_strict_utc() {
        let client = MockClient;
        let root = Uuid::new_v4();

        let query = client
            .query("tally", root)
            .as_of_time("2024-01-15T10:30:00Z")
            .unwrap()
            .build();
        match query.selection {
            Some(Selection::Temporal(t)) => match t.point_in_time {
                Some(PointInTime::AsOfTime(ts)) => {
                    assert_eq!(ts.seconds, 1705314600);
                    assert_eq!(ts.nanos, 0);
                }
                other => panic!("expected as-of-time, got {other:?}"),
            },
            other => panic!("expected temporal selection, got {other:?}"),
        }

        let err = client
            .query("tally", root)
            .as_of_time("not-a-timestamp")
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidTimestamp(_)));
    }

    #[test]
    fn with_edition_lands_on_cover() {
        let client = MockClient;
        let query = client.query_domain("tally").with_edition("v2").build();
        assert_eq!(query.cover.as_ref().unwrap().edition, "v2");
    }
}
