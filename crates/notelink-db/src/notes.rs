//! Note store implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use notelink_core::{new_id, CreateNoteRequest, Error, Note, NoteStore, Result};

/// PostgreSQL implementation of [`NoteStore`].
#[derive(Clone)]
pub struct PgNoteStore {
    pool: Pool<Postgres>,
}

impl PgNoteStore {
    /// Create a new PgNoteStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_note(row: PgRow) -> Note {
    Note {
        id: row.get("id"),
        user_id: row.get("user_id"),
        tag_id: row.get("tag_id"),
        title: row.get("title"),
        content: row.get("content"),
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid> {
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO note (id, user_id, tag_id, title, content)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(req.user_id)
        .bind(req.tag_id)
        .bind(&req.title)
        .bind(&req.content)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let row = sqlx::query(
            "SELECT id, user_id, tag_id, title, content FROM note WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NoteNotFound(id))?;

        Ok(map_row_to_note(row))
    }

    async fn replace(&self, note: Note) -> Result<Note> {
        let result = sqlx::query(
            r#"
            UPDATE note
            SET user_id = $2, tag_id = $3, title = $4, content = $5
            WHERE id = $1
            "#,
        )
        .bind(note.id)
        .bind(note.user_id)
        .bind(note.tag_id)
        .bind(&note.title)
        .bind(&note.content)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(note.id));
        }
        Ok(note)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn set_content(&self, id: Uuid, content: &str) -> Result<()> {
        let result = sqlx::query("UPDATE note SET content = $2 WHERE id = $1")
            .bind(id)
            .bind(content)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn set_tag(&self, id: Uuid, tag_id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE note SET tag_id = $2 WHERE id = $1")
            .bind(id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }
}
