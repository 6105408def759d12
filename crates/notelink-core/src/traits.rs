//! Store traits for the note and agenda services.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. Every mutation maps
//! to a single atomic store-level operation; the consumer relies on that
//! rather than application-level locking.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

/// Store for note CRUD operations (owned by the note service).
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a new note and return its identifier.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid>;

    /// Fetch a note by identifier.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// Replace an existing note wholesale.
    async fn replace(&self, note: Note) -> Result<Note>;

    /// Delete a note. Returns `Error::NoteNotFound` if it does not exist.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Replace a note's content only.
    async fn set_content(&self, id: Uuid, content: &str) -> Result<()>;

    /// Attach a tag to a note.
    async fn set_tag(&self, id: Uuid, tag_id: Uuid) -> Result<()>;
}

/// Store for event CRUD and link-reference operations (owned by the agenda
/// service).
///
/// The two link operations return the number of documents matched. Zero is a
/// successful no-op: applying a stale envelope to an already-deleted entity
/// is expected under at-least-once, unordered delivery. Callers log the
/// count for diagnosis but never treat zero as a failure.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a new event (unlinked) and return its identifier.
    async fn insert(&self, req: CreateEventRequest) -> Result<Uuid>;

    /// Fetch an event by identifier.
    async fn fetch(&self, id: Uuid) -> Result<Event>;

    /// Replace an existing event wholesale. The stored `note_id` is
    /// preserved; it changes only through the link operations below.
    async fn replace(&self, event: Event) -> Result<Event>;

    /// Delete an event. Returns `Error::EventNotFound` if it does not exist.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// List all events belonging to a user (dashboard view).
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Event>>;

    /// Attach a tag to an event.
    async fn set_tag(&self, id: Uuid, tag_id: Uuid) -> Result<()>;

    /// Set the note back-reference on the single event `event_id`.
    ///
    /// Idempotent: reapplying sets the same value. Returns the matched count
    /// (0 when the event no longer exists).
    async fn link_note(&self, event_id: Uuid, note_id: Uuid) -> Result<u64>;

    /// Reset the note back-reference to the sentinel on every event
    /// currently pointing at `note_id`.
    ///
    /// Idempotent: a second application matches nothing. Returns the matched
    /// count.
    async fn unlink_note(&self, note_id: Uuid) -> Result<u64>;
}
