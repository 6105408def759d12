//! In-memory store implementations.
//!
//! Used by integration tests across the workspace and by single-process
//! development runs. Always compiled so `tests/` directories in other crates
//! can depend on them. Semantics mirror the PostgreSQL stores, including the
//! matched-count contract of the link operations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use notelink_core::{
    new_id, CreateEventRequest, CreateNoteRequest, Error, Event, EventStore, Note, NoteStore,
    Result, SENTINEL,
};

/// In-memory implementation of [`NoteStore`].
#[derive(Clone, Default)]
pub struct MemoryNoteStore {
    notes: Arc<RwLock<HashMap<Uuid, Note>>>,
}

impl MemoryNoteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notes currently stored.
    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid> {
        let id = new_id();
        let note = Note {
            id,
            user_id: req.user_id,
            tag_id: req.tag_id,
            title: req.title,
            content: req.content,
        };
        self.notes.write().await.insert(id, note);
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        self.notes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::NoteNotFound(id))
    }

    async fn replace(&self, note: Note) -> Result<Note> {
        let mut notes = self.notes.write().await;
        if !notes.contains_key(&note.id) {
            return Err(Error::NoteNotFound(note.id));
        }
        notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.notes
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NoteNotFound(id))
    }

    async fn set_content(&self, id: Uuid, content: &str) -> Result<()> {
        let mut notes = self.notes.write().await;
        let note = notes.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
        note.content = content.to_string();
        Ok(())
    }

    async fn set_tag(&self, id: Uuid, tag_id: Uuid) -> Result<()> {
        let mut notes = self.notes.write().await;
        let note = notes.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
        note.tag_id = Some(tag_id);
        Ok(())
    }
}

/// In-memory implementation of [`EventStore`].
#[derive(Clone, Default)]
pub struct MemoryEventStore {
    events: Arc<RwLock<HashMap<Uuid, Event>>>,
}

impl MemoryEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-built event, preserving its identifier. Test helper.
    pub async fn insert_event(&self, event: Event) {
        self.events.write().await.insert(event.id, event);
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, req: CreateEventRequest) -> Result<Uuid> {
        let id = new_id();
        let event = Event {
            id,
            user_id: req.user_id,
            tag_id: req.tag_id,
            note_id: SENTINEL,
            time: req.time,
            title: req.title,
        };
        self.events.write().await.insert(id, event);
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Event> {
        self.events
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::EventNotFound(id))
    }

    async fn replace(&self, event: Event) -> Result<Event> {
        let mut events = self.events.write().await;
        let existing = events
            .get(&event.id)
            .ok_or(Error::EventNotFound(event.id))?;
        // The back-reference changes only through the link operations.
        let stored = Event {
            note_id: existing.note_id,
            ..event
        };
        events.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.events
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::EventNotFound(id))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Event>> {
        let events = self.events.read().await;
        let mut result: Vec<Event> = events
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.time);
        Ok(result)
    }

    async fn set_tag(&self, id: Uuid, tag_id: Uuid) -> Result<()> {
        let mut events = self.events.write().await;
        let event = events.get_mut(&id).ok_or(Error::EventNotFound(id))?;
        event.tag_id = Some(tag_id);
        Ok(())
    }

    async fn link_note(&self, event_id: Uuid, note_id: Uuid) -> Result<u64> {
        let mut events = self.events.write().await;
        match events.get_mut(&event_id) {
            Some(event) => {
                event.note_id = note_id;
                Ok(1)
            }
            // Stale envelope against a deleted event: successful no-op.
            None => Ok(0),
        }
    }

    async fn unlink_note(&self, note_id: Uuid) -> Result<u64> {
        let mut events = self.events.write().await;
        let mut matched = 0;
        for event in events.values_mut() {
            if event.note_id == note_id {
                event.note_id = SENTINEL;
                matched += 1;
            }
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note_request() -> CreateNoteRequest {
        CreateNoteRequest {
            user_id: new_id(),
            tag_id: None,
            title: "groceries".to_string(),
            content: "milk, eggs".to_string(),
        }
    }

    fn event_request(user_id: Uuid) -> CreateEventRequest {
        CreateEventRequest {
            user_id,
            tag_id: None,
            time: Utc::now(),
            title: "standup".to_string(),
        }
    }

    #[tokio::test]
    async fn test_note_crud() {
        let store = MemoryNoteStore::new();
        let id = store.insert(note_request()).await.unwrap();

        let mut note = store.fetch(id).await.unwrap();
        assert_eq!(note.title, "groceries");

        note.title = "errands".to_string();
        store.replace(note).await.unwrap();
        assert_eq!(store.fetch(id).await.unwrap().title, "errands");

        store.set_content(id, "bread").await.unwrap();
        assert_eq!(store.fetch(id).await.unwrap().content, "bread");

        store.delete(id).await.unwrap();
        assert!(matches!(
            store.fetch(id).await,
            Err(Error::NoteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_note_is_an_error() {
        let store = MemoryNoteStore::new();
        assert!(matches!(
            store.delete(new_id()).await,
            Err(Error::NoteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_events_created_unlinked() {
        let store = MemoryEventStore::new();
        let id = store.insert(event_request(new_id())).await.unwrap();
        let event = store.fetch(id).await.unwrap();
        assert_eq!(event.note_id, SENTINEL);
        assert!(!event.is_linked());
    }

    #[tokio::test]
    async fn test_replace_preserves_back_reference() {
        let store = MemoryEventStore::new();
        let id = store.insert(event_request(new_id())).await.unwrap();
        let note_id = new_id();
        store.link_note(id, note_id).await.unwrap();

        let mut event = store.fetch(id).await.unwrap();
        event.title = "retro".to_string();
        event.note_id = SENTINEL; // caller-supplied value must be ignored
        let stored = store.replace(event).await.unwrap();

        assert_eq!(stored.title, "retro");
        assert_eq!(stored.note_id, note_id);
    }

    #[tokio::test]
    async fn test_link_note_matched_counts() {
        let store = MemoryEventStore::new();
        let id = store.insert(event_request(new_id())).await.unwrap();

        assert_eq!(store.link_note(id, new_id()).await.unwrap(), 1);
        assert_eq!(store.link_note(new_id(), new_id()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unlink_note_fan_out() {
        let store = MemoryEventStore::new();
        let note_id = new_id();
        let e1 = store.insert(event_request(new_id())).await.unwrap();
        let e2 = store.insert(event_request(new_id())).await.unwrap();
        let e3 = store.insert(event_request(new_id())).await.unwrap();
        store.link_note(e1, note_id).await.unwrap();
        store.link_note(e2, note_id).await.unwrap();

        assert_eq!(store.unlink_note(note_id).await.unwrap(), 2);
        assert_eq!(store.fetch(e1).await.unwrap().note_id, SENTINEL);
        assert_eq!(store.fetch(e2).await.unwrap().note_id, SENTINEL);
        assert_eq!(store.fetch(e3).await.unwrap().note_id, SENTINEL);

        // Second application matches nothing.
        assert_eq!(store.unlink_note(note_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_for_user_sorted_by_time() {
        let store = MemoryEventStore::new();
        let user_id = new_id();
        store.insert(event_request(user_id)).await.unwrap();
        store.insert(event_request(user_id)).await.unwrap();
        store.insert(event_request(new_id())).await.unwrap();

        let dashboard = store.list_for_user(user_id).await.unwrap();
        assert_eq!(dashboard.len(), 2);
        assert!(dashboard.windows(2).all(|w| w[0].time <= w[1].time));
    }
}
