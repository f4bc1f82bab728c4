//! Cover accessor trait for envelope types.

use uuid::Uuid;

use crate::proto::{CommandBook, Cover, EventBook, Query};

use super::constants::{MAIN_EDITION, UNKNOWN_DOMAIN};

/// Accessors for types carrying an optional [`Cover`].
///
/// Avoids the `.cover.as_ref().map(...)` chains otherwise repeated at
/// every dispatch site.
pub trait CoverExt {
    fn cover(&self) -> Option<&Cover>;

    /// The domain, or [`UNKNOWN_DOMAIN`] if the cover is missing.
    fn domain(&self) -> &str {
        self.cover()
            .map(|c| c.domain.as_str())
            .filter(|d| !d.is_empty())
            .unwrap_or(UNKNOWN_DOMAIN)
    }

    /// The correlation ID, or empty if missing.
    fn correlation_id(&self) -> &str {
        self.cover()
            .map(|c| c.correlation_id.as_str())
            .unwrap_or("")
    }

    fn has_correlation_id(&self) -> bool {
        !self.correlation_id().is_empty()
    }

    /// The root as a standard UUID, if present and well-formed.
    fn root_uuid(&self) -> Option<Uuid> {
        self.cover()
            .and_then(|c| c.root.as_ref())
            .and_then(|u| Uuid::from_slice(&u.value).ok())
    }

    /// The edition name, defaulting to the main timeline.
    fn edition(&self) -> &str {
        self.cover()
            .map(|c| c.edition.as_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(MAIN_EDITION)
    }
}

impl CoverExt for EventBook {
    fn cover(&self) -> Option<&Cover> {
        self.cover.as_ref()
    }
}

impl CoverExt for CommandBook {
    fn cover(&self) -> Option<&Cover> {
        self.cover.as_ref()
    }
}

impl CoverExt for Query {
    fn cover(&self) -> Option<&Cover> {
        self.cover.as_ref()
    }
}

impl CoverExt for Cover {
    fn cover(&self) -> Option<&Cover> {
        Some(self)
    }
}
