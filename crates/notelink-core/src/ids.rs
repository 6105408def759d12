//! Entity identifiers and the sentinel value.
//!
//! Identifiers are UUIDs rendered on the wire as fixed-width 32-character
//! lowercase hex (the `simple` format, no hyphens). The sentinel is the
//! all-zero identifier and means "no reference" in either direction.
//!
//! Generated identifiers are v4, whose version and variant bits can never be
//! all zero, so the sentinel is unambiguous as an "unset" marker.

use uuid::Uuid;

use crate::error::{Error, Result};

/// Reserved all-zero identifier meaning "no reference."
pub const SENTINEL: Uuid = Uuid::nil();

/// Wire width of an encoded identifier in hex characters.
pub const ID_HEX_WIDTH: usize = 32;

/// Generate a fresh identifier. Never returns [`SENTINEL`].
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// Whether an identifier is the sentinel ("no reference").
pub fn is_sentinel(id: Uuid) -> bool {
    id.is_nil()
}

/// Encode an identifier as fixed-width lowercase hex.
pub fn encode_id(id: Uuid) -> String {
    id.simple().to_string()
}

/// Decode a fixed-width hex identifier.
///
/// Strict: exactly [`ID_HEX_WIDTH`] hex characters, nothing else. Hyphenated
/// or braced UUID renderings are rejected so that every envelope field has a
/// single canonical shape on the wire.
pub fn decode_id(s: &str) -> Result<Uuid> {
    if s.len() != ID_HEX_WIDTH {
        return Err(Error::Envelope(format!(
            "identifier must be {} hex characters, got {}",
            ID_HEX_WIDTH,
            s.len()
        )));
    }
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::Envelope(format!(
            "identifier contains non-hex characters: {:?}",
            s
        )));
    }
    Uuid::try_parse(s).map_err(|e| Error::Envelope(format!("invalid identifier: {}", e)))
}
