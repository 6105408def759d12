//! Event store implementation.
//!
//! The link operations are single UPDATE statements, so each is atomic at
//! the store level. Concurrent HTTP-driven updates to the same row rely on
//! the same guarantee; no application locking is layered on top.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use notelink_core::{
    new_id, CreateEventRequest, Error, Event, EventStore, Result, SENTINEL,
};

/// PostgreSQL implementation of [`EventStore`].
#[derive(Clone)]
pub struct PgEventStore {
    pool: Pool<Postgres>,
}

impl PgEventStore {
    /// Create a new PgEventStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_event(row: PgRow) -> Event {
    Event {
        id: row.get("id"),
        user_id: row.get("user_id"),
        tag_id: row.get("tag_id"),
        note_id: row.get("note_id"),
        time: row.get("time"),
        title: row.get("title"),
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, req: CreateEventRequest) -> Result<Uuid> {
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO event (id, user_id, tag_id, note_id, time, title)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(req.user_id)
        .bind(req.tag_id)
        .bind(SENTINEL)
        .bind(req.time)
        .bind(&req.title)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Event> {
        let row = sqlx::query(
            "SELECT id, user_id, tag_id, note_id, time, title FROM event WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::EventNotFound(id))?;

        Ok(map_row_to_event(row))
    }

    async fn replace(&self, event: Event) -> Result<Event> {
        // note_id is deliberately not part of the SET list; the back-reference
        // changes only through link_note/unlink_note.
        let row = sqlx::query(
            r#"
            UPDATE event
            SET user_id = $2, tag_id = $3, time = $4, title = $5
            WHERE id = $1
            RETURNING id, user_id, tag_id, note_id, time, title
            "#,
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(event.tag_id)
        .bind(event.time)
        .bind(&event.title)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::EventNotFound(event.id))?;

        Ok(map_row_to_event(row))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM event WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::EventNotFound(id));
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, tag_id, note_id, time, title
            FROM event
            WHERE user_id = $1
            ORDER BY time ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_row_to_event).collect())
    }

    async fn set_tag(&self, id: Uuid, tag_id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE event SET tag_id = $2 WHERE id = $1")
            .bind(id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::EventNotFound(id));
        }
        Ok(())
    }

    async fn link_note(&self, event_id: Uuid, note_id: Uuid) -> Result<u64> {
        let result = sqlx::query("UPDATE event SET note_id = $2 WHERE id = $1")
            .bind(event_id)
            .bind(note_id)
            .execute(&self.pool)
            .await?;

        let matched = result.rows_affected();
        debug!(
            subsystem = "db",
            op = "link_note",
            event_id = %event_id,
            note_id = %note_id,
            matched,
            "Set note back-reference"
        );
        Ok(matched)
    }

    async fn unlink_note(&self, note_id: Uuid) -> Result<u64> {
        let result = sqlx::query("UPDATE event SET note_id = $2 WHERE note_id = $1")
            .bind(note_id)
            .bind(SENTINEL)
            .execute(&self.pool)
            .await?;

        let matched = result.rows_affected();
        debug!(
            subsystem = "db",
            op = "unlink_note",
            note_id = %note_id,
            matched,
            "Cleared note back-reference"
        );
        Ok(matched)
    }
}
