//! Write-Ahead Log (WAL) Module
//!
//! Records every store mutation so state can be rebuilt after a restart.
//!
//! ## Responsibilities
//! - Append events durably, in order, with backend-assigned ids
//! - Scan all events back in ascending id order
//! - Drain a bounded queue of events on a single background worker
//! - Replay history into a store before live logging starts
//!
//! ## Backends
//! ```text
//! Sequential file (wal.log), one event per line:
//! ┌──────┬────┬──────┬────┬──────┬────┬───────┬────┐
//! │  id  │ \t │ kind │ \t │ key  │ \t │ value │ \n │
//! └──────┴────┴──────┴────┴──────┴────┴───────┴────┘
//!
//! SQLite (wal.db):
//! events(event_id INTEGER PRIMARY KEY AUTOINCREMENT,
//!        event_type INTEGER NOT NULL,
//!        event_key TEXT NOT NULL,
//!        event_value TEXT NOT NULL)
//! ```
//!
//! `kind` / `event_type` is 1 for put and 2 for delete.

mod event;
mod file;
mod sqlite;
mod pipeline;
mod recovery;

pub use event::{Event, EventId, EventKind};
pub use file::{FileBackend, EMPTY_VALUE_PLACEHOLDER};
pub use sqlite::SqliteBackend;
pub use pipeline::{WritePipeline, ERROR_CHANNEL_CAPACITY};
pub use recovery::{read_events, RecoveryResult, ReplayStream, ReplayTarget, WalRecovery};

use crate::config::{BackendKind, Config};
use crate::error::Result;

/// Synchronous check run on the caller's thread before an event is queued
pub type EventCheck = fn(&Event) -> Result<()>;

/// Durable, ordered event storage
///
/// A backend owns exactly one durable resource. It is moved between the
/// replay scanner and the write worker, never shared between them.
pub trait WalBackend: Send + 'static {
    /// Persist one event and return the id the backend assigned to it.
    /// The id carried by `event` is ignored.
    fn append(&mut self, event: &Event) -> Result<EventId>;

    /// Stream every stored event, in ascending id order, into `visit`.
    ///
    /// Stops at the first decode, ordering or I/O error, or at the first
    /// error returned by `visit`. Never modifies the log.
    fn read_all(&mut self, visit: &mut dyn FnMut(Event) -> Result<()>) -> Result<()>;

    /// Highest id this handle has read or written
    fn last_event_id(&self) -> EventId;

    /// Rejects events this backend could never append
    ///
    /// The write pipeline runs it before queueing, so a bad event is
    /// returned to the caller instead of stopping the writer.
    fn event_check(&self) -> EventCheck {
        accept_any
    }
}

fn accept_any(_event: &Event) -> Result<()> {
    Ok(())
}

/// The configured backend, chosen once at open time
pub enum Backend {
    File(FileBackend),
    Sqlite(SqliteBackend),
}

impl Backend {
    /// Open (or create) the backend the config selects
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.wal_path();
        match config.backend {
            BackendKind::File => Ok(Backend::File(FileBackend::open(
                &path,
                config.wal_sync_strategy,
            )?)),
            BackendKind::Sqlite => Ok(Backend::Sqlite(SqliteBackend::open(&path)?)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::File(_) => BackendKind::File,
            Backend::Sqlite(_) => BackendKind::Sqlite,
        }
    }
}

impl WalBackend for Backend {
    fn append(&mut self, event: &Event) -> Result<EventId> {
        match self {
            Backend::File(backend) => backend.append(event),
            Backend::Sqlite(backend) => backend.append(event),
        }
    }

    fn read_all(&mut self, visit: &mut dyn FnMut(Event) -> Result<()>) -> Result<()> {
        match self {
            Backend::File(backend) => backend.read_all(visit),
            Backend::Sqlite(backend) => backend.read_all(visit),
        }
    }

    fn last_event_id(&self) -> EventId {
        match self {
            Backend::File(backend) => backend.last_event_id(),
            Backend::Sqlite(backend) => backend.last_event_id(),
        }
    }

    fn event_check(&self) -> EventCheck {
        match self {
            Backend::File(backend) => backend.event_check(),
            Backend::Sqlite(backend) => backend.event_check(),
        }
    }
}

/// Read every event of a backend into memory
///
/// Convenience for tools and tests; replay goes through [`WalRecovery`].
pub fn collect_events<B: WalBackend + ?Sized>(backend: &mut B) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    backend.read_all(&mut |event| {
        events.push(event);
        Ok(())
    })?;
    Ok(events)
}
