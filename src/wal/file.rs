//! Sequential-File Backend
//!
//! Appends events as tab-separated text lines.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{KeyvalError, Result};

use super::{Event, EventCheck, EventId, EventKind, WalBackend};

/// Written in place of an empty value
///
/// The line format cannot tell an empty trailing field from a missing one,
/// so a put with an empty value replays with this string as its value.
pub const EMPTY_VALUE_PLACEHOLDER: &str = "placeholder";

const FIELD_SEPARATOR: char = '\t';

/// Append-only text log, one event per line
pub struct FileBackend {
    path: PathBuf,

    /// Opened read + append; appends always land at the end regardless of
    /// the read cursor
    file: File,

    /// Source of the next id on append, and the floor for ids on read
    last_event_id: EventId,

    sync_strategy: WalSyncStrategy,

    /// Lines written since the last fsync
    unsynced: usize,
}

impl FileBackend {
    /// Open or create the log file at `path`
    ///
    /// Existing lines are kept. The id counter starts at 0, so the log must
    /// be read through once before appending to a non-empty file.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        tracing::debug!(path = %path.display(), "opened file WAL");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            last_event_id: 0,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Force written lines to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn maybe_sync(&mut self) -> Result<()> {
        match self.sync_strategy {
            WalSyncStrategy::EveryWrite => self.sync(),
            WalSyncStrategy::EveryNEntries { count } if self.unsynced >= count => self.sync(),
            WalSyncStrategy::EveryNEntries { .. } => Ok(()),
        }
    }
}

impl WalBackend for FileBackend {
    fn append(&mut self, event: &Event) -> Result<EventId> {
        check_encodable(event)?;

        self.last_event_id += 1;
        let line = encode_line(self.last_event_id, event);

        // One write call per line so a line is never interleaved
        self.file.write_all(line.as_bytes())?;
        self.unsynced += 1;
        self.maybe_sync()?;

        Ok(self.last_event_id)
    }

    fn read_all(&mut self, visit: &mut dyn FnMut(Event) -> Result<()>) -> Result<()> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(0))?;

        let reader = BufReader::new(file);
        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = line.map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData => {
                    KeyvalError::WalDecode(format!("line {}: not valid UTF-8", line_number))
                }
                _ => KeyvalError::Io(e),
            })?;

            let event = decode_line(&line).map_err(|e| match e {
                KeyvalError::WalDecode(reason) => {
                    KeyvalError::WalDecode(format!("line {}: {}", line_number, reason))
                }
                other => other,
            })?;

            if event.id <= self.last_event_id {
                return Err(KeyvalError::WalOutOfOrder {
                    previous: self.last_event_id,
                    found: event.id,
                });
            }
            self.last_event_id = event.id;

            visit(event)?;
        }

        Ok(())
    }

    fn last_event_id(&self) -> EventId {
        self.last_event_id
    }

    fn event_check(&self) -> EventCheck {
        check_encodable
    }
}

fn check_encodable(event: &Event) -> Result<()> {
    if event.key.contains(&[FIELD_SEPARATOR, '\n', '\r'][..]) {
        return Err(KeyvalError::WalEncode(format!(
            "key {:?} contains a tab or line break",
            event.key
        )));
    }
    if event.value.contains(&['\n', '\r'][..]) {
        return Err(KeyvalError::WalEncode(format!(
            "value for key {:?} contains a line break",
            event.key
        )));
    }
    Ok(())
}

fn encode_line(id: EventId, event: &Event) -> String {
    let value = if event.value.is_empty() {
        EMPTY_VALUE_PLACEHOLDER
    } else {
        event.value.as_str()
    };

    format!(
        "{}{sep}{}{sep}{}{sep}{}\n",
        id,
        event.kind.code(),
        event.key,
        value,
        sep = FIELD_SEPARATOR
    )
}

fn decode_line(line: &str) -> Result<Event> {
    let mut fields = line.splitn(4, FIELD_SEPARATOR);
    let (Some(id), Some(kind), Some(key), Some(value)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(KeyvalError::WalDecode(
            "expected 4 tab-separated fields".to_string(),
        ));
    };

    let id = id
        .parse::<EventId>()
        .map_err(|e| KeyvalError::WalDecode(format!("bad id {:?}: {}", id, e)))?;
    let kind = kind
        .parse::<i64>()
        .map_err(|e| KeyvalError::WalDecode(format!("bad kind {:?}: {}", kind, e)))
        .and_then(EventKind::try_from)?;

    if key.is_empty() {
        return Err(KeyvalError::WalDecode("empty key".to_string()));
    }
    if value.is_empty() {
        return Err(KeyvalError::WalDecode("empty value".to_string()));
    }

    Ok(Event {
        id,
        kind,
        key: key.to_string(),
        value: value.to_string(),
    })
}
