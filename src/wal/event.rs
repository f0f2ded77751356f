//! WAL Event definitions
//!
//! Defines the durable unit of change recorded by every backend.

use std::fmt;

use crate::error::{KeyvalError, Result};

/// Identifier assigned to an event by the backend that stored it
pub type EventId = u64;

/// A single recorded mutation
///
/// Events built by callers carry `id == 0`; the backend assigns the real id
/// on append and hands it back on replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Backend-assigned, strictly increasing
    pub id: EventId,

    /// The mutation kind
    pub kind: EventKind,

    /// Never empty once logged
    pub key: String,

    /// Only meaningful for [`EventKind::Put`]
    pub value: String,
}

/// Mutations that can be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Put,
    Delete,
}

impl EventKind {
    /// Integer code used by both on-disk formats
    pub fn code(self) -> u8 {
        match self {
            EventKind::Put => 1,
            EventKind::Delete => 2,
        }
    }
}

impl TryFrom<i64> for EventKind {
    type Error = KeyvalError;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            1 => Ok(EventKind::Put),
            2 => Ok(EventKind::Delete),
            other => Err(KeyvalError::WalDecode(format!(
                "unknown event kind {}",
                other
            ))),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Put => f.write_str("PUT"),
            EventKind::Delete => f.write_str("DELETE"),
        }
    }
}

impl Event {
    /// An unassigned put event
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind: EventKind::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    /// An unassigned delete event (empty value)
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind: EventKind::Delete,
            key: key.into(),
            value: String::new(),
        }
    }

    /// Copy of this event carrying a backend-assigned id
    pub fn with_id(&self, id: EventId) -> Self {
        Self { id, ..self.clone() }
    }
}
