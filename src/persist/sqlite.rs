//! SQLite file backend driven by a single worker thread.
//!
//! One [`Connection`] is owned by a dedicated thread; every handle clone sends
//! commands over a bounded channel and awaits a oneshot reply, so all reads
//! and writes for the process are serialized through that connection.

use std::{path::Path, thread};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, functions::FunctionFlags, params};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::{
    rsvp::{RsvpRecord, name_key},
    types::{RsvpId, Timestamp},
};

use super::{RsvpStore, StorageError, StorageResult};

const COMMAND_QUEUE_BOUND: usize = 256;

const SELECT_COLUMNS: &str = "SELECT id, name, attending, dish, created_at FROM rsvps";

/// SQL name of the Unicode-aware guest key; the built-in `LOWER` only folds ASCII.
const NAME_KEY_FN: &str = "rsvp_name_key";

enum Command {
    EnsureSchema {
        resp: oneshot::Sender<StorageResult<()>>,
    },
    QueryAll {
        resp: oneshot::Sender<StorageResult<Vec<RsvpRecord>>>,
    },
    FindByName {
        name: String,
        resp: oneshot::Sender<StorageResult<Option<RsvpRecord>>>,
    },
    Insert {
        name: String,
        attending: bool,
        dish: Option<String>,
        resp: oneshot::Sender<StorageResult<RsvpId>>,
    },
    Update {
        id: RsvpId,
        attending: bool,
        dish: Option<String>,
        resp: oneshot::Sender<StorageResult<()>>,
    },
    DeleteAll {
        resp: oneshot::Sender<StorageResult<usize>>,
    },
}

/// SQLite implementation of [`RsvpStore`].
#[derive(Clone)]
pub struct SqliteRsvpStore {
    cmd_tx: mpsc::Sender<Command>,
}

impl SqliteRsvpStore {
    /// Opens or creates the database file at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        Self::spawn(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::spawn(Connection::open_in_memory()?)
    }

    fn spawn(conn: Connection) -> StorageResult<Self> {
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        register_name_key(&conn)?;

        let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(COMMAND_QUEUE_BOUND);
        thread::Builder::new()
            .name("rsvp-sqlite".to_string())
            .spawn(move || {
                while let Some(cmd) = cmd_rx.blocking_recv() {
                    handle_command(&conn, cmd);
                }
                debug!("sqlite worker stopped");
            })
            .map_err(|e| StorageError::Message(format!("spawn sqlite worker: {e}")))?;

        Ok(Self { cmd_tx })
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<StorageResult<T>>) -> Command,
    ) -> StorageResult<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| StorageError::WorkerClosed)?;
        rx.await.map_err(|_| StorageError::WorkerClosed)?
    }
}

#[async_trait]
impl RsvpStore for SqliteRsvpStore {
    async fn ensure_schema(&self) -> StorageResult<()> {
        self.request(|resp| Command::EnsureSchema { resp }).await
    }

    async fn query_all(&self) -> StorageResult<Vec<RsvpRecord>> {
        self.request(|resp| Command::QueryAll { resp }).await
    }

    async fn find_by_name_case_insensitive(
        &self,
        name: &str,
    ) -> StorageResult<Option<RsvpRecord>> {
        let name = name.to_string();
        self.request(|resp| Command::FindByName { name, resp }).await
    }

    async fn insert(&self, name: &str, attending: bool, dish: Option<&str>) -> StorageResult<RsvpId> {
        let name = name.to_string();
        let dish = dish.map(str::to_string);
        self.request(|resp| Command::Insert {
            name,
            attending,
            dish,
            resp,
        })
        .await
    }

    async fn update(&self, id: RsvpId, attending: bool, dish: Option<&str>) -> StorageResult<()> {
        let dish = dish.map(str::to_string);
        self.request(|resp| Command::Update {
            id,
            attending,
            dish,
            resp,
        })
        .await
    }

    async fn delete_all(&self) -> StorageResult<usize> {
        self.request(|resp| Command::DeleteAll { resp }).await
    }
}

fn handle_command(conn: &Connection, cmd: Command) {
    // A dropped receiver means the caller went away; nothing to report.
    match cmd {
        Command::EnsureSchema { resp } => {
            let _ = resp.send(ensure_schema(conn));
        }
        Command::QueryAll { resp } => {
            let _ = resp.send(query_all(conn));
        }
        Command::FindByName { name, resp } => {
            let _ = resp.send(find_by_name(conn, &name));
        }
        Command::Insert {
            name,
            attending,
            dish,
            resp,
        } => {
            let _ = resp.send(insert(conn, &name, attending, dish.as_deref()));
        }
        Command::Update {
            id,
            attending,
            dish,
            resp,
        } => {
            let _ = resp.send(update(conn, id, attending, dish.as_deref()));
        }
        Command::DeleteAll { resp } => {
            let _ = resp.send(delete_all(conn));
        }
    }
}

fn register_name_key(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        NAME_KEY_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let name: String = ctx.get(0)?;
            Ok(name_key(&name))
        },
    )
}

fn ensure_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(include_str!("schema.sql"))?;
    Ok(())
}

fn query_all(conn: &Connection) -> StorageResult<Vec<RsvpRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], record_from_row)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn find_by_name(conn: &Connection, name: &str) -> StorageResult<Option<RsvpRecord>> {
    let record = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE {NAME_KEY_FN}(name) = ?1 ORDER BY id ASC LIMIT 1"),
            params![name_key(name)],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

fn insert(conn: &Connection, name: &str, attending: bool, dish: Option<&str>) -> StorageResult<RsvpId> {
    conn.execute(
        "INSERT INTO rsvps (name, attending, dish) VALUES (?1, ?2, ?3)",
        params![name, attending, dish],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update(conn: &Connection, id: RsvpId, attending: bool, dish: Option<&str>) -> StorageResult<()> {
    let changed = conn.execute(
        "UPDATE rsvps SET attending = ?1, dish = ?2 WHERE id = ?3",
        params![attending, dish, id],
    )?;
    if changed == 0 {
        return Err(StorageError::MissingRsvp(id));
    }
    Ok(())
}

fn delete_all(conn: &Connection) -> StorageResult<usize> {
    let count = conn.execute("DELETE FROM rsvps", [])?;
    Ok(count)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<RsvpRecord> {
    let raw_created: String = row.get(4)?;
    let created_at = parse_timestamp(&raw_created).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(RsvpRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        attending: row.get(2)?,
        dish: row.get(3)?,
        created_at,
    })
}

/// Accepts RFC 3339 text and SQLite's `CURRENT_TIMESTAMP` layout, both UTC.
fn parse_timestamp(raw: &str) -> Result<Timestamp, chrono::ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|naive| naive.and_utc())
}
