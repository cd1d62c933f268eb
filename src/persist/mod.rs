/// In-memory backend for tests and embedding.
pub mod memory;
/// Hosted Postgres backend.
pub mod postgres;
/// Embedded SQLite file backend.
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::{
    config::Backend,
    rsvp::RsvpRecord,
    types::RsvpId,
};

use self::{postgres::PostgresRsvpStore, sqlite::SqliteRsvpStore};

/// Any failure inside a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite driver error.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Postgres driver error.
    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),
    /// Stored timestamp could not be parsed.
    #[error("bad timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    /// An update targeted an id that does not exist.
    #[error("no rsvp with id {0}")]
    MissingRsvp(RsvpId),
    /// The SQLite worker thread is gone.
    #[error("storage worker closed")]
    WorkerClosed,
    /// Anything else.
    #[error("{0}")]
    Message(String),
}

/// Result alias for storage calls.
pub type StorageResult<T> = Result<T, StorageError>;

/// Backend-agnostic operations over the `rsvps` table.
///
/// Implementations must order [`RsvpStore::query_all`] newest first and must
/// never store an empty dish; callers pass already-normalized values.
#[async_trait]
pub trait RsvpStore: Send + Sync {
    /// Creates the table if absent. Safe to call on every start.
    async fn ensure_schema(&self) -> StorageResult<()>;

    /// All records, `created_at` descending.
    async fn query_all(&self) -> StorageResult<Vec<RsvpRecord>>;

    /// First record whose name matches `name` ignoring case.
    async fn find_by_name_case_insensitive(&self, name: &str)
    -> StorageResult<Option<RsvpRecord>>;

    /// Inserts a record and returns its assigned id.
    async fn insert(&self, name: &str, attending: bool, dish: Option<&str>) -> StorageResult<RsvpId>;

    /// Overwrites `attending` and `dish` of an existing record.
    async fn update(&self, id: RsvpId, attending: bool, dish: Option<&str>) -> StorageResult<()>;

    /// Removes every record, returning how many were deleted.
    async fn delete_all(&self) -> StorageResult<usize>;
}

/// Opens the configured backend and ensures its schema.
///
/// This is the only place that looks at which backend is in use.
pub async fn open_store(backend: &Backend) -> StorageResult<Arc<dyn RsvpStore>> {
    let store: Arc<dyn RsvpStore> = match backend {
        Backend::Postgres { url } => {
            info!("Using Postgres");
            Arc::new(PostgresRsvpStore::connect(url).await?)
        }
        Backend::Sqlite { path } => {
            info!(path = %path.display(), "Using SQLite");
            Arc::new(SqliteRsvpStore::open(path)?)
        }
    };
    store.ensure_schema().await?;
    Ok(store)
}
