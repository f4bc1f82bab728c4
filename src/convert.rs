//! Type-URL matching, payload packing, and conversion helpers.
//!
//! The type-URL prefix is spelled exactly once, here. Every dispatch
//! site resolves registrations through [`name_matches`] so suffix
//! semantics stay uniform across routers.

use chrono::NaiveDateTime;
use prost::Message;
use prost_types::{Any, Timestamp};
use uuid::Uuid;

use crate::error::{ClientError, HandlerError};
use crate::proto::Uuid as ProtoUuid;

/// Fixed type-URL prefix for all packed payloads.
///
/// Alternative prefixes are a configuration error; [`matches`] never
/// accepts them.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Build a fully-qualified type URL from a message type name.
///
/// ```
/// use folio_client::convert::type_url;
/// assert_eq!(type_url("examples.ReserveStock"), "type.googleapis.com/examples.ReserveStock");
/// ```
pub fn type_url(type_name: &str) -> String {
    format!("{TYPE_URL_PREFIX}{type_name}")
}

/// Extract the trailing type name from a type URL.
///
/// Returns the part after the last `/`, or the whole string if no `/`
/// is present.
pub fn type_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// True iff `url` is exactly the fixed prefix followed by `name`.
pub fn matches(url: &str, name: &str) -> bool {
    url.strip_prefix(TYPE_URL_PREFIX) == Some(name)
}

/// Match a trailing type name against a registration key.
///
/// Keys may be fully qualified (`"examples.ReserveStock"`) or the final
/// segment alone (`"ReserveStock"`). Partial segments never match:
/// `"Stock"` does not claim `"examples.ReserveStock"`.
pub fn name_matches(trailing: &str, key: &str) -> bool {
    trailing == key
        || trailing
            .strip_suffix(key)
            .is_some_and(|rest| rest.ends_with('.'))
}

/// Pack a message into an `Any` under the fixed prefix, using the
/// message's fully qualified name.
pub fn pack<M: Message + prost::Name>(msg: &M) -> Any {
    Any {
        type_url: type_url(&M::full_name()),
        value: msg.encode_to_vec(),
    }
}

/// Pack a message into an `Any` under the fixed prefix with an explicit
/// type name.
pub fn pack_as<M: Message>(msg: &M, name: &str) -> Any {
    Any {
        type_url: type_url(name),
        value: msg.encode_to_vec(),
    }
}

/// Unpack an `Any` as a specific message type.
///
/// Fails with [`HandlerError::Decode`] when the envelope's type name
/// does not name `M` or the body is malformed.
pub fn unpack_as<M: Message + Default + prost::Name>(any: &Any) -> Result<M, HandlerError> {
    let trailing = type_name(&any.type_url);
    if trailing != M::full_name() && !name_matches(trailing, M::NAME) {
        return Err(HandlerError::Decode(format!(
            "expected {}, found {}",
            M::full_name(),
            any.type_url
        )));
    }
    M::decode(any.value.as_slice())
        .map_err(|e| HandlerError::Decode(format!("{}: {e}", any.type_url)))
}

/// Convert a UUID to its wire representation.
pub fn uuid_to_proto(uuid: Uuid) -> ProtoUuid {
    ProtoUuid {
        value: uuid.as_bytes().to_vec(),
    }
}

/// Convert a wire UUID to a standard UUID.
pub fn proto_to_uuid(proto: &ProtoUuid) -> Result<Uuid, ClientError> {
    Uuid::from_slice(&proto.value)
        .map_err(|e| ClientError::InvalidArgument(format!("invalid UUID: {e}")))
}

/// Parse the simplified RFC3339 UTC form `YYYY-MM-DDTHH:MM:SSZ`.
///
/// Offsets, fractional seconds, and any other variation fail with
/// [`ClientError::InvalidTimestamp`].
///
/// ```
/// use folio_client::convert::parse_timestamp;
/// let ts = parse_timestamp("2024-01-15T10:30:00Z").unwrap();
/// assert_eq!(ts.seconds, 1705314600);
/// assert_eq!(ts.nanos, 0);
/// ```
pub fn parse_timestamp(rfc3339: &str) -> Result<Timestamp, ClientError> {
    let dt = NaiveDateTime::parse_from_str(rfc3339, "%Y-%m-%dT%H:%M:%SZ")
        .map_err(|e| ClientError::InvalidTimestamp(format!("{rfc3339}: {e}")))?;

    Ok(Timestamp {
        seconds: dt.and_utc().timestamp(),
        nanos: 0,
    })
}

/// Current time as a wire timestamp.
pub fn now() -> Timestamp {
    let elapsed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();

    Timestamp {
        seconds: elapsed.as_secs() as i64,
        nanos: elapsed.subsec_nanos() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::Revocation;

    #[test]
    fn type_url_prefixes_name() {
        assert_eq!(
            type_url("examples.ReserveStock"),
            "type.googleapis.com/examples.ReserveStock"
        );
    }

    #[test]
    fn type_name_takes_trailing_segment() {
        assert_eq!(
            type_name("type.googleapis.com/examples.ReserveStock"),
            "examples.ReserveStock"
        );
        assert_eq!(type_name("ReserveStock"), "ReserveStock");
    }

    #[test]
    fn matches_requires_exact_prefix() {
        assert!(matches(
            "type.googleapis.com/examples.ReserveStock",
            "examples.ReserveStock"
        ));
        assert!(!matches(
            "type.example.org/examples.ReserveStock",
            "examples.ReserveStock"
        ));
        assert!(!matches("examples.ReserveStock", "examples.ReserveStock"));
    }

    #[test]
    fn name_matches_full_and_short_keys() {
        assert!(name_matches("examples.ReserveStock", "examples.ReserveStock"));
        assert!(name_matches("examples.ReserveStock", "ReserveStock"));
        assert!(!name_matches("examples.ReserveStock", "Stock"));
        assert!(!name_matches("examples.ReserveStock", "examples"));
    }

    #[test]
    fn pack_unpack_round_trip() {
        let msg = Revocation {
            emit_system_revocation: true,
            reason: "r".to_string(),
        };
        let any = pack(&msg);
        assert_eq!(any.type_url, "type.googleapis.com/folio.Revocation");
        let back: Revocation = unpack_as(&any).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn unpack_rejects_wrong_type_name() {
        let msg = Revocation::default();
        let any = pack_as(&msg, "examples.SomethingElse");
        let err = unpack_as::<Revocation>(&any).unwrap_err();
        assert!(matches!(err, HandlerError::Decode(_)));
    }

    #[test]
    fn uuid_round_trip() {
        let uuid = Uuid::new_v4();
        let proto = uuid_to_proto(uuid);
        assert_eq!(proto_to_uuid(&proto).unwrap(), uuid);
    }

    #[test]
    fn uuid_rejects_short_bytes() {
        let proto = ProtoUuid {
            value: vec![1, 2, 3],
        };
        assert!(proto_to_uuid(&proto).is_err());
    }

    #[test]
    fn parse_timestamp_simplified_utc() {
        let ts = parse_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(ts.seconds, 1705314600);
        assert_eq!(ts.nanos, 0);
    }

    #[test]
    fn parse_timestamp_rejects_other_forms() {
        assert!(parse_timestamp("not-a-timestamp").is_err());
        assert!(parse_timestamp("2024-01-15T10:30:00+00:00").is_err());
        assert!(parse_timestamp("2024-01-15T10:30:00.123Z").is_err());
        assert!(parse_timestamp("2024-01-15 10:30:00Z").is_err());
    }
}
