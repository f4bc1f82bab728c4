//! Page accessor traits for event and command pages.

use prost::Message;

use crate::convert::name_matches;
use crate::proto::{CommandPage, EventPage};

/// Accessors for event pages.
pub trait EventPageExt {
    fn sequence_num(&self) -> u32;

    /// Type URL of the event payload, if present.
    fn type_url(&self) -> Option<&str>;

    /// Raw payload bytes, if present.
    fn payload(&self) -> Option<&[u8]>;

    /// Decode the payload as `M` when the type name matches `key`.
    ///
    /// Returns `None` when the payload is absent, the name does not
    /// match, or decoding fails.
    fn decode<M: Message + Default>(&self, key: &str) -> Option<M>;
}

impl EventPageExt for EventPage {
    fn sequence_num(&self) -> u32 {
        self.sequence
    }

    fn type_url(&self) -> Option<&str> {
        self.event.as_ref().map(|e| e.type_url.as_str())
    }

    fn payload(&self) -> Option<&[u8]> {
        self.event.as_ref().map(|e| e.value.as_slice())
    }

    fn decode<M: Message + Default>(&self, key: &str) -> Option<M> {
        let event = self.event.as_ref()?;
        if !name_matches(crate::convert::type_name(&event.type_url), key) {
            return None;
        }
        M::decode(event.value.as_slice()).ok()
    }
}

/// Accessors for command pages.
pub trait CommandPageExt {
    fn sequence_num(&self) -> u32;
    fn type_url(&self) -> Option<&str>;
    fn payload(&self) -> Option<&[u8]>;
    fn decode<M: Message + Default>(&self, key: &str) -> Option<M>;
}

impl CommandPageExt for CommandPage {
    fn sequence_num(&self) -> u32 {
        self.sequence
    }

    fn type_url(&self) -> Option<&str> {
        self.command.as_ref().map(|c| c.type_url.as_str())
    }

    fn payload(&self) -> Option<&[u8]> {
        self.command.as_ref().map(|c| c.value.as_slice())
    }

    fn decode<M: Message + Default>(&self, key: &str) -> Option<M> {
        let command = self.command.as_ref()?;
        if !name_matches(crate::convert::type_name(&command.type_url), key) {
            return None;
        }
        M::decode(command.value.as_slice()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::pack_as;
    use crate::proto::Revocation;

    #[test]
    fn decode_matches_by_type_name() {
        let inner = Revocation {
            emit_system_revocation: false,
            reason: "r".to_string(),
        };
        let page = EventPage {
            sequence: 3,
            created_at: None,
            event: Some(pack_as(&inner, "folio.Revocation")),
        };

        assert_eq!(page.sequence_num(), 3);
        assert_eq!(
            page.type_url(),
            Some("type.googleapis.com/folio.Revocation")
        );
        let decoded: Revocation = page.decode("Revocation").unwrap();
        assert_eq!(decoded, inner);
    }

    #[test]
    fn decode_rejects_mismatched_name() {
        let page = EventPage {
            sequence: 0,
            created_at: None,
            event: Some(pack_as(&Revocation::default(), "folio.Revocation")),
        };
        assert!(page.decode::<Revocation>("Notification").is_none());
    }

    #[test]
    fn accessors_handle_missing_payload() {
        let page = CommandPage::default();
        assert_eq!(page.type_url(), None);
        assert_eq!(page.payload(), None);
        assert!(page.decode::<Revocation>("Revocation").is_none());
    }
}
