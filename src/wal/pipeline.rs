//! WAL Write Pipeline
//!
//! A bounded queue drained by one background worker that appends each
//! event to the backend in the order it was queued.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::error::{KeyvalError, Result};

use super::{Event, EventCheck, WalBackend};

/// Capacity of the worker's error channel
///
/// The worker reports at most one error before it stops.
pub const ERROR_CHANNEL_CAPACITY: usize = 1;

/// Queue + single writer thread in front of a [`WalBackend`]
///
/// ## Failure model
/// The worker stops for good on the first backend error and sends that
/// error on [`err`](Self::err). Events still queued at that point are
/// dropped (their count is logged) and later enqueues fail with
/// [`KeyvalError::WalClosed`]. Nothing is retried; a new pipeline has to
/// be built from a freshly opened and replayed backend.
pub struct WritePipeline {
    /// `None` once shutdown has started
    events: Option<Sender<Event>>,

    errors: Receiver<KeyvalError>,

    worker: Option<JoinHandle<()>>,

    /// The backend's pre-queue check
    check: EventCheck,
}

impl WritePipeline {
    /// Start the writer thread, taking ownership of the backend
    pub fn start<B: WalBackend>(backend: B, capacity: usize) -> Result<Self> {
        let check = backend.event_check();
        let (events_tx, events_rx) = bounded(capacity);
        let (errors_tx, errors_rx) = bounded(ERROR_CHANNEL_CAPACITY);

        let worker = thread::Builder::new()
            .name("wal-writer".to_string())
            .spawn(move || drain(backend, events_rx, errors_tx))?;

        Ok(Self {
            events: Some(events_tx),
            errors: errors_rx,
            worker: Some(worker),
            check,
        })
    }

    /// Queue a put; blocks while the queue is full
    ///
    /// Events the backend cannot encode are rejected here and never queued.
    pub fn write_put(&self, key: &str, value: &str) -> Result<()> {
        self.enqueue(Event::put(key, value))
    }

    /// Queue a delete; blocks while the queue is full
    pub fn write_delete(&self, key: &str) -> Result<()> {
        self.enqueue(Event::delete(key))
    }

    /// Errors raised by the worker (at most one)
    pub fn err(&self) -> &Receiver<KeyvalError> {
        &self.errors
    }

    /// Whether the worker is still draining the queue
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|worker| !worker.is_finished())
            .unwrap_or(false)
    }

    /// Number of events waiting for the worker
    pub fn queued(&self) -> usize {
        self.events.as_ref().map(Sender::len).unwrap_or(0)
    }

    /// Close the queue and wait until every queued event is appended
    ///
    /// Returns the worker's error if it stopped and the error was not
    /// already taken from [`err`](Self::err).
    pub fn shutdown(mut self) -> Result<()> {
        self.stop_worker()?;
        match self.errors.try_recv() {
            Ok(e) => Err(e),
            Err(_) => Ok(()),
        }
    }

    fn enqueue(&self, event: Event) -> Result<()> {
        (self.check)(&event)?;
        let events = self.events.as_ref().ok_or(KeyvalError::WalClosed)?;
        events.send(event).map_err(|_| KeyvalError::WalClosed)
    }

    fn stop_worker(&mut self) -> Result<()> {
        // Dropping the only sender ends the worker's loop once it is drained
        self.events.take();

        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| KeyvalError::WalWrite("WAL writer thread panicked".to_string()))?;
        }
        Ok(())
    }
}

impl Drop for WritePipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop_worker() {
            tracing::error!(error = %e, "WAL writer did not stop cleanly");
        }
    }
}

fn drain<B: WalBackend>(mut backend: B, events: Receiver<Event>, errors: Sender<KeyvalError>) {
    for event in events.iter() {
        match backend.append(&event) {
            Ok(id) => {
                tracing::trace!(id, kind = %event.kind, key = %event.key, "event appended");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    key = %event.key,
                    orphaned = events.len(),
                    "WAL append failed, writer stopped"
                );
                // Capacity 1 and a single send, so this never blocks
                let _ = errors.send(e);
                return;
            }
        }
    }

    tracing::debug!(last_event_id = backend.last_event_id(), "WAL writer finished");
}
