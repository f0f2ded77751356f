//! Relational Backend
//!
//! Stores events as rows of a single SQLite table.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, Row};

use crate::error::{KeyvalError, Result};

use super::{Event, EventId, EventKind, WalBackend};

const TABLE_NAME: &str = "events";

const TABLE_EXISTS: &str = "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1";

const CREATE_TABLE: &str = "CREATE TABLE events (
    event_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    event_type INTEGER NOT NULL,
    event_key TEXT NOT NULL,
    event_value TEXT NOT NULL
)";

// event_id is assigned by the database
const INSERT_EVENT: &str =
    "INSERT INTO events (event_type, event_key, event_value) VALUES (?1, ?2, ?3)";

const SELECT_EVENTS: &str =
    "SELECT event_id, event_type, event_key, event_value FROM events ORDER BY event_id ASC";

/// Event log kept in an SQLite database
pub struct SqliteBackend {
    conn: Connection,

    /// Highest id read or inserted through this handle
    last_event_id: EventId,
}

impl SqliteBackend {
    /// Open or create the database at `path`, creating the events table if
    /// it is missing
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened sqlite WAL");
        Self::with_connection(conn)
    }

    /// A private, non-durable database (tests and tooling)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        if !table_exists(&conn)? {
            conn.execute(CREATE_TABLE, [])?;
            tracing::debug!(table = TABLE_NAME, "created WAL table");
        }

        Ok(Self {
            conn,
            last_event_id: 0,
        })
    }
}

impl WalBackend for SqliteBackend {
    fn append(&mut self, event: &Event) -> Result<EventId> {
        {
            let mut stmt = self.conn.prepare_cached(INSERT_EVENT)?;
            stmt.execute(params![
                i64::from(event.kind.code()),
                event.key,
                event.value
            ])?;
        }

        let id = decode_id(self.conn.last_insert_rowid())?;
        self.last_event_id = id;
        Ok(id)
    }

    fn read_all(&mut self, visit: &mut dyn FnMut(Event) -> Result<()>) -> Result<()> {
        let mut stmt = self.conn.prepare(SELECT_EVENTS)?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let event = decode_row(row)?;
            self.last_event_id = self.last_event_id.max(event.id);
            visit(event)?;
        }

        Ok(())
    }

    fn last_event_id(&self) -> EventId {
        self.last_event_id
    }
}

fn table_exists(conn: &Connection) -> Result<bool> {
    let mut stmt = conn.prepare(TABLE_EXISTS)?;
    Ok(stmt.exists([TABLE_NAME])?)
}

fn decode_row(row: &Row<'_>) -> Result<Event> {
    let id: i64 = row.get(0)?;
    let kind: i64 = row.get(1)?;

    Ok(Event {
        id: decode_id(id)?,
        kind: EventKind::try_from(kind)?,
        key: row.get(2)?,
        value: row.get(3)?,
    })
}

fn decode_id(id: i64) -> Result<EventId> {
    match EventId::try_from(id) {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(KeyvalError::WalDecode(format!("invalid event id {}", id))),
    }
}
