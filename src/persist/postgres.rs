//! Hosted Postgres backend over a `sqlx` connection pool.

use async_trait::async_trait;
use sqlx::{
    FromRow, PgPool,
    postgres::PgPoolOptions,
};

use crate::{
    rsvp::RsvpRecord,
    types::{RsvpId, Timestamp},
};

use super::{RsvpStore, StorageError, StorageResult};

const MAX_CONNECTIONS: u32 = 5;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS rsvps (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    attending BOOLEAN NOT NULL,
    dish TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS rsvps_created_at ON rsvps(created_at)";

/// Casts keep older `SERIAL`/`TIMESTAMP` tables readable.
const SELECT_COLUMNS: &str = "SELECT id::BIGINT AS id, name, attending, dish, \
     created_at::TIMESTAMPTZ AS created_at FROM rsvps";

#[derive(Debug, FromRow)]
struct RsvpRow {
    id: i64,
    name: String,
    attending: bool,
    dish: Option<String>,
    created_at: Timestamp,
}

impl From<RsvpRow> for RsvpRecord {
    fn from(row: RsvpRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            attending: row.attending,
            dish: row.dish,
            created_at: row.created_at,
        }
    }
}

/// Postgres implementation of [`RsvpStore`].
#[derive(Clone)]
pub struct PostgresRsvpStore {
    pool: PgPool,
}

impl PostgresRsvpStore {
    /// Connects a pool to `url`.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RsvpStore for PostgresRsvpStore {
    async fn ensure_schema(&self) -> StorageResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    async fn query_all(&self) -> StorageResult<Vec<RsvpRecord>> {
        let rows: Vec<RsvpRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RsvpRecord::from).collect())
    }

    async fn find_by_name_case_insensitive(
        &self,
        name: &str,
    ) -> StorageResult<Option<RsvpRecord>> {
        let row: Option<RsvpRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE LOWER(name) = LOWER($1) ORDER BY id ASC LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(RsvpRecord::from))
    }

    async fn insert(&self, name: &str, attending: bool, dish: Option<&str>) -> StorageResult<RsvpId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO rsvps (name, attending, dish) VALUES ($1, $2, $3) RETURNING id::BIGINT",
        )
        .bind(name)
        .bind(attending)
        .bind(dish)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update(&self, id: RsvpId, attending: bool, dish: Option<&str>) -> StorageResult<()> {
        let result = sqlx::query("UPDATE rsvps SET attending = $1, dish = $2 WHERE id = $3")
            .bind(attending)
            .bind(dish)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::MissingRsvp(id));
        }
        Ok(())
    }

    async fn delete_all(&self) -> StorageResult<usize> {
        let result = sqlx::query("DELETE FROM rsvps").execute(&self.pool).await?;
        Ok(result.rows_affected() as usize)
    }
}
