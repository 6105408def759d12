//! Entity models and request types for the note and agenda services.
//!
//! The note↔event cross-reference is a weak back-reference: it is recorded
//! only as `Event::note_id` plus a lookup contract, never as an ownership
//! relation, and neither store enforces it. The link-propagation protocol
//! ([`crate::LinkEnvelope`]) is the single source of truth for keeping it
//! consistent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note, owned by the note service.
///
/// No field tracks whether a note is linked to an event; linkage is recorded
/// only on the event side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tag_id: Option<Uuid>,
    pub title: String,
    pub content: String,
}

/// A calendar event, owned by the agenda service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tag_id: Option<Uuid>,
    /// Back-reference to the linked note; [`crate::SENTINEL`] when unlinked.
    pub note_id: Uuid,
    pub time: DateTime<Utc>,
    pub title: String,
}

impl Event {
    /// Whether this event currently references a note.
    pub fn is_linked(&self) -> bool {
        !crate::ids::is_sentinel(self.note_id)
    }
}

/// Request for creating a new note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub user_id: Uuid,
    pub tag_id: Option<Uuid>,
    pub title: String,
    pub content: String,
}

/// Request for replacing a note's content only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateContentRequest {
    pub content: String,
}

/// Request for creating a new event.
///
/// Events are created unlinked; the back-reference is set only through the
/// link-propagation protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub user_id: Uuid,
    pub tag_id: Option<Uuid>,
    pub time: DateTime<Utc>,
    pub title: String,
}

/// Request for linking a note to an event (note-service surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEventRequest {
    pub event_id: Uuid,
}

/// Request for attaching a tag to a note or event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTagRequest {
    pub tag_id: Uuid,
}
