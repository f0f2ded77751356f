//! WAL Recovery
//!
//! Rebuilds store state at startup by replaying the log, then hands the
//! backend to a [`WritePipeline`] for live logging.
//!
//! ```text
//!   Replaying ──(scan finished, no error)──▶ Live
//!       │
//!       └──(read or apply error)──▶ startup fails
//! ```
//!
//! Replay happens once per process. There is no way back from Live.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, never, select, Receiver};

use crate::error::{KeyvalError, Result};

use super::{Event, EventId, EventKind, WalBackend, WritePipeline, ERROR_CHANNEL_CAPACITY};

/// Something replayed events are applied to
pub trait ReplayTarget {
    fn put(&self, key: &str, value: &str) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;
}

/// Result of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of events applied to the target
    pub events_replayed: u64,

    pub puts: u64,

    pub deletes: u64,

    /// Highest id applied, 0 if the log was empty
    pub last_event_id: EventId,
}

impl RecoveryResult {
    fn apply<T: ReplayTarget + ?Sized>(&mut self, event: Event, target: &T) -> Result<()> {
        if event.id <= self.last_event_id {
            return Err(KeyvalError::WalOutOfOrder {
                previous: self.last_event_id,
                found: event.id,
            });
        }

        match event.kind {
            EventKind::Put => {
                target.put(&event.key, &event.value)?;
                self.puts += 1;
            }
            EventKind::Delete => {
                target.delete(&event.key)?;
                self.deletes += 1;
            }
        }

        self.last_event_id = event.id;
        self.events_replayed += 1;
        Ok(())
    }
}

/// Events scanned from a backend on a background thread
///
/// `events` is unbuffered; `errors` holds at most one error. Both close
/// when the scan ends.
pub struct ReplayStream<B> {
    pub events: Receiver<Event>,

    pub errors: Receiver<KeyvalError>,

    scanner: JoinHandle<B>,
}

impl<B> ReplayStream<B> {
    /// Wait for the scanner and take the backend back
    ///
    /// Safe to call before the stream is consumed: the receivers are
    /// dropped first, which stops the scan.
    pub fn finish(self) -> Result<B> {
        let ReplayStream {
            events,
            errors,
            scanner,
        } = self;
        drop(events);
        drop(errors);

        scanner
            .join()
            .map_err(|_| KeyvalError::ReplayAborted("replay thread panicked".to_string()))
    }
}

/// Start scanning `backend` from the beginning on a background thread
pub fn read_events<B: WalBackend>(backend: B) -> Result<ReplayStream<B>> {
    let (events_tx, events_rx) = bounded(0);
    let (errors_tx, errors_rx) = bounded(ERROR_CHANNEL_CAPACITY);

    let scanner = thread::Builder::new()
        .name("wal-replay".to_string())
        .spawn(move || {
            let mut backend = backend;
            let scanned = backend.read_all(&mut |event| {
                events_tx
                    .send(event)
                    .map_err(|_| KeyvalError::ReplayAborted("event receiver dropped".to_string()))
            });
            if let Err(e) = scanned {
                let _ = errors_tx.send(e);
            }
            backend
        })?;

    Ok(ReplayStream {
        events: events_rx,
        errors: errors_rx,
        scanner,
    })
}

/// Replay coordinator
pub struct WalRecovery;

impl WalRecovery {
    /// Apply every logged event to `target` in id order
    ///
    /// Any read, ordering or apply error aborts the replay; `target` is then
    /// left partially replayed. On success the backend is returned, ready
    /// to append after the last replayed id.
    ///
    /// Ids must rise strictly within this pass. Whether a handle may be read
    /// again after appending is up to the backend.
    pub fn replay<B, T>(backend: B, target: &T) -> Result<(B, RecoveryResult)>
    where
        B: WalBackend,
        T: ReplayTarget + ?Sized,
    {
        let mut result = RecoveryResult::default();

        let stream = read_events(backend)?;
        let applied = apply_stream(&stream, target, &mut result);
        let backend = stream.finish()?;

        if let Err(e) = applied {
            tracing::error!(
                error = %e,
                events_replayed = result.events_replayed,
                last_event_id = result.last_event_id,
                "WAL replay failed"
            );
            return Err(e);
        }

        tracing::info!(
            events_replayed = result.events_replayed,
            puts = result.puts,
            deletes = result.deletes,
            last_event_id = result.last_event_id,
            "WAL replay complete"
        );

        Ok((backend, result))
    }

    /// Replay into `target`, then start live logging on the same backend
    pub fn start<B, T>(
        backend: B,
        target: &T,
        capacity: usize,
    ) -> Result<(WritePipeline, RecoveryResult)>
    where
        B: WalBackend,
        T: ReplayTarget + ?Sized,
    {
        let (backend, result) = Self::replay(backend, target)?;
        let pipeline = WritePipeline::start(backend, capacity)?;
        tracing::debug!(capacity, "WAL writer started");
        Ok((pipeline, result))
    }
}

/// Drive the stream to completion, one event or one error per iteration
fn apply_stream<B, T>(
    stream: &ReplayStream<B>,
    target: &T,
    result: &mut RecoveryResult,
) -> Result<()>
where
    T: ReplayTarget + ?Sized,
{
    // Closed channels are swapped for `never` so select stops firing on them
    let closed_events = never::<Event>();
    let closed_errors = never::<KeyvalError>();
    let mut events_open = true;
    let mut errors_open = true;

    while events_open || errors_open {
        let events = if events_open { &stream.events } else { &closed_events };
        let errors = if errors_open { &stream.errors } else { &closed_errors };

        select! {
            recv(events) -> msg => match msg {
                Ok(event) => result.apply(event, target)?,
                Err(_) => events_open = false,
            },
            recv(errors) -> msg => match msg {
                Ok(e) => return Err(e),
                Err(_) => errors_open = false,
            },
        }
    }

    Ok(())
}
