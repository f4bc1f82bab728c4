//! Closed error taxonomy and gRPC status mapping.
//!
//! [`HandlerError`] is raised inside dispatch (by the runtime or by a
//! handler's guard/validate phases); [`ClientError`] wraps failures at
//! the client boundary. The status mapping is the wire contract:
//!
//! | Error | Status |
//! |---|---|
//! | `Rejected` | `FAILED_PRECONDITION` |
//! | `InvalidArgument` / `Decode` | `INVALID_ARGUMENT` |
//! | `NotFound` | `NOT_FOUND` |
//! | `Connection` / `Transport` | `UNAVAILABLE` |
//! | `Internal` | `INTERNAL` |

use tonic::{Code, Status};

/// Result type for handler and dispatch operations.
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised inside a dispatch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HandlerError {
    /// A business-rule violation detected by a handler's guard phase.
    #[error("command rejected: {0}")]
    Rejected(String),

    /// Malformed or incomplete input: missing type URL, failed unpack,
    /// out-of-range value, unknown command type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Targeted aggregate instance or referenced sub-entity is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Payload bytes cannot be parsed into the declared type.
    #[error("decode failure: {0}")]
    Decode(String),

    /// A bug: an unexpected failure inside dispatch.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Shorthand for a guard-phase rejection.
    pub fn rejected(reason: impl Into<String>) -> Self {
        HandlerError::Rejected(reason.into())
    }
}

impl From<HandlerError> for Status {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Rejected(msg) => Status::failed_precondition(msg),
            HandlerError::InvalidArgument(msg) => Status::invalid_argument(msg),
            HandlerError::Decode(msg) => Status::invalid_argument(msg),
            HandlerError::NotFound(msg) => Status::not_found(msg),
            HandlerError::Internal(msg) => Status::internal(msg),
        }
    }
}

/// Errors that can occur during client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Failed to establish a connection to the server.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Transport-level failure from tonic.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// gRPC error returned by the server.
    #[error("grpc error: {0}")]
    Grpc(Box<Status>),

    /// Invalid argument provided by the caller.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Timestamp string not in the simplified RFC3339 UTC form.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl From<Status> for ClientError {
    fn from(status: Status) -> Self {
        ClientError::Grpc(Box::new(status))
    }
}

impl ClientError {
    /// The gRPC status code, if this is a gRPC error.
    pub fn code(&self) -> Option<Code> {
        match self {
            ClientError::Grpc(s) => Some(s.code()),
            _ => None,
        }
    }

    /// The underlying gRPC status, if this is a gRPC error.
    pub fn status(&self) -> Option<&Status> {
        match self {
            ClientError::Grpc(s) => Some(s),
            _ => None,
        }
    }

    /// True for a rejected command or failed guard precondition.
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self.code(), Some(Code::FailedPrecondition))
    }

    /// True for malformed input, including decode failures.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.code(), Some(Code::InvalidArgument))
            || matches!(self, ClientError::InvalidArgument(_))
    }

    /// True when the targeted instance does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.code(), Some(Code::NotFound))
    }

    /// True for connection or transport failures.
    pub fn is_connection_error(&self) -> bool {
        matches!(self.code(), Some(Code::Unavailable))
            || matches!(self, ClientError::Connection(_) | ClientError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_maps_to_failed_precondition() {
        let status = Status::from(HandlerError::rejected("Player already exists"));
        assert_eq!(status.code(), Code::FailedPrecondition);
        assert_eq!(status.message(), "Player already exists");
    }

    #[test]
    fn decode_maps_to_invalid_argument() {
        let status = Status::from(HandlerError::Decode("bad bytes".to_string()));
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[test]
    fn not_found_maps_to_not_found() {
        let status = Status::from(HandlerError::NotFound("no such root".to_string()));
        assert_eq!(status.code(), Code::NotFound);
    }

    #[test]
    fn client_predicates_branch_on_code() {
        let err = ClientError::from(Status::failed_precondition("nope"));
        assert!(err.is_precondition_failed());
        assert!(!err.is_not_found());

        let err = ClientError::from(Status::invalid_argument("bad"));
        assert!(err.is_invalid_argument());

        let err = ClientError::from(Status::not_found("gone"));
        assert!(err.is_not_found());

        let err = ClientError::Connection("refused".to_string());
        assert!(err.is_connection_error());
        assert!(err.code().is_none());
    }

    #[test]
    fn invalid_argument_variant_counts_without_code() {
        let err = ClientError::InvalidArgument("command payload not set".to_string());
        assert!(err.is_invalid_argument());
    }
}
