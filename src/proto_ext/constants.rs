//! Constants shared across the proto extensions.

/// Fallback domain when a cover is missing or has no domain set.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Name of the main timeline. An empty edition on a cover is treated as
/// equivalent to this value.
pub const MAIN_EDITION: &str = "folio";
