//! # notelink-db
//!
//! PostgreSQL store layer for notelink.
//!
//! This crate provides:
//! - Connection pool management
//! - `PgNoteStore` / `PgEventStore` implementations of the core store traits
//! - Embedded migrations per service
//! - In-memory store implementations for tests and single-process runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use notelink_db::NoteDatabase;
//! use notelink_core::{CreateNoteRequest, NoteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = NoteDatabase::connect("postgres://localhost/notelink_notes").await?;
//!     db.migrate().await?;
//!
//!     let note_id = db.notes.insert(CreateNoteRequest {
//!         user_id: notelink_core::new_id(),
//!         tag_id: None,
//!         title: "Hello".to_string(),
//!         content: "Hello, world!".to_string(),
//!     }).await?;
//!
//!     println!("Created note: {}", note_id);
//!     Ok(())
//! }
//! ```

pub mod events;
pub mod memory;
pub mod notes;
pub mod pool;

// Re-export core types
pub use notelink_core::*;

pub use events::PgEventStore;
pub use memory::{MemoryEventStore, MemoryNoteStore};
pub use notes::PgNoteStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

/// Note-service database handle: pool plus store.
#[derive(Clone)]
pub struct NoteDatabase {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note store for CRUD operations.
    pub notes: PgNoteStore,
}

impl NoteDatabase {
    /// Create a handle from an existing pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteStore::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Ok(Self::new(create_pool(database_url).await?))
    }

    /// Run pending migrations for the note schema.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("migrations/notes")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(e.into()))
    }
}

/// Agenda-service database handle: pool plus store.
#[derive(Clone)]
pub struct EventDatabase {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Event store for CRUD and link-reference operations.
    pub events: PgEventStore,
}

impl EventDatabase {
    /// Create a handle from an existing pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            events: PgEventStore::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Ok(Self::new(create_pool(database_url).await?))
    }

    /// Run pending migrations for the event schema.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("migrations/agenda")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(e.into()))
    }
}
