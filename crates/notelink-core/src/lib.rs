//! # notelink-core
//!
//! Core types, traits, and abstractions shared by the notelink services.
//!
//! This crate defines the link-propagation protocol (sentinel identifier and
//! [`LinkEnvelope`]) and the store traits the note and agenda services
//! implement against.

pub mod envelope;
pub mod error;
pub mod ids;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use envelope::{LinkEnvelope, CONTENT_TYPE_TEXT, LINK_QUEUE};
pub use error::{Error, Result};
pub use ids::{decode_id, encode_id, is_sentinel, new_id, SENTINEL};
pub use models::*;
pub use traits::{EventStore, NoteStore};
