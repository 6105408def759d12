//! The link-propagation wire message.
//!
//! A [`LinkEnvelope`] carries a pair of identifiers whose combination encodes
//! "link event E to note N" or "unlink note N from every event referencing
//! it." The value of `target` alone selects the interpretation; `note` is
//! always the Note-side identifier.
//!
//! Envelopes are immutable once published, carry no version or sequence
//! number, and are never persisted. Delivery is at-least-once with no
//! ordering guarantee across publishing connections, so consumers must
//! tolerate duplicates and reordering.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::ids::{self, SENTINEL};

/// Name of the single queue carrying all note↔event link envelopes.
pub const LINK_QUEUE: &str = "note-event-links";

/// Content-type marker used for envelope payloads on the bus.
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// The two-field message encoding a link or unlink intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEnvelope {
    /// The event to link (`SENTINEL` turns the envelope into an unlink).
    #[serde(with = "hex_id")]
    pub target: Uuid,
    /// The Note-side identifier; never interpreted as an event.
    #[serde(with = "hex_id")]
    pub note: Uuid,
}

impl LinkEnvelope {
    /// Envelope requesting that event `target`'s note reference be set to `note`.
    pub fn link(target: Uuid, note: Uuid) -> Self {
        Self { target, note }
    }

    /// Envelope requesting that every event referencing `note` be unlinked.
    pub fn unlink(note: Uuid) -> Self {
        Self {
            target: SENTINEL,
            note,
        }
    }

    /// Whether this envelope is an unlink request.
    ///
    /// `target` alone selects the semantics; at most one interpretation
    /// applies per envelope.
    pub fn is_unlink(&self) -> bool {
        ids::is_sentinel(self.target)
    }

    /// Serialize to the flat text wire format.
    pub fn encode(&self) -> String {
        // Two fixed-hex string fields; cannot fail for in-memory values.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode an envelope from a bus payload.
    ///
    /// Malformed identifiers (wrong width, non-hex) and malformed JSON are
    /// structural errors ([`crate::Error::Envelope`]), not business failures.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| crate::Error::Envelope(format!("payload is not UTF-8: {}", e)))?;
        serde_json::from_str(text)
            .map_err(|e| crate::Error::Envelope(format!("malformed envelope: {}", e)))
    }
}

/// Serde adapter rendering identifiers as strict fixed-width hex strings.
mod hex_id {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    use crate::ids::{decode_id, encode_id};

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_id(*id))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_id(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::new_id;

    #[test]
    fn test_link_envelope_round_trip() {
        let e = LinkEnvelope::link(new_id(), new_id());
        let decoded = LinkEnvelope::decode(e.encode().as_bytes()).unwrap();
        assert_eq!(decoded, e);
        assert!(!decoded.is_unlink());
    }

    #[test]
    fn test_unlink_envelope_round_trip() {
        let e = LinkEnvelope::unlink(new_id());
        let decoded = LinkEnvelope::decode(e.encode().as_bytes()).unwrap();
        assert_eq!(decoded, e);
        assert!(decoded.is_unlink());
    }

    #[test]
    fn test_wire_shape_is_flat_hex_object() {
        let note = new_id();
        let encoded = LinkEnvelope::unlink(note).encode();
        let expected = format!(
            "{{\"target\":\"{}\",\"note\":\"{}\"}}",
            "0".repeat(32),
            note.simple()
        );
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_decode_rejects_wrong_width_identifier() {
        let payload = br#"{"target":"abc","note":"000000000000000000000000000000000"}"#;
        assert!(LinkEnvelope::decode(payload).is_err());
    }

    #[test]
    fn test_decode_rejects_non_hex_identifier() {
        let payload = format!(
            "{{\"target\":\"{}\",\"note\":\"{}\"}}",
            "z".repeat(32),
            "0".repeat(32)
        );
        assert!(LinkEnvelope::decode(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_rejects_hyphenated_identifier() {
        let payload = format!(
            "{{\"target\":\"00000000-0000-0000-0000-000000000000\",\"note\":\"{}\"}}",
            "0".repeat(32)
        );
        assert!(LinkEnvelope::decode(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let payload = format!("{{\"note\":\"{}\"}}", "0".repeat(32));
        assert!(LinkEnvelope::decode(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(LinkEnvelope::decode(b"not json at all").is_err());
        assert!(LinkEnvelope::decode(&[0xff, 0xfe, 0x00]).is_err());
        assert!(LinkEnvelope::decode(b"").is_err());
    }

    #[test]
    fn test_target_alone_selects_semantics() {
        let note = new_id();
        assert!(LinkEnvelope::link(SENTINEL, note).is_unlink());
        assert!(!LinkEnvelope::link(new_id(), note).is_unlink());
    }
}
