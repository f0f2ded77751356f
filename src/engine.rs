//! Engine Module
//!
//! Ties the store to its write-ahead log.
//!
//! ## Responsibilities
//! - Open the configured WAL backend
//! - Replay the log into a fresh store before serving anything
//! - Log every successful mutation through the write pipeline
//! - Drain the pipeline on close

use std::fs;
use std::path::Path;

use crossbeam::channel::Receiver;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{KeyvalError, Result};
use crate::store::Store;
use crate::wal::{Backend, RecoveryResult, WalRecovery, WritePipeline};

/// Store + WAL
///
/// ## Write ordering
/// `put` and `delete` hold `write_lock` while they validate, queue the
/// event and then update the store, so the log records mutations in the
/// order the store applied them. A mutation the WAL refuses never reaches
/// the store. Reads only take the store's read lock.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// The in-memory map (internal RwLock)
    store: Store,

    /// Live WAL writer
    wal: WritePipeline,

    /// What startup replay restored
    recovery: RecoveryResult,

    /// Serializes write operations (put/delete)
    write_lock: Mutex<()>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open the configured WAL backend
    /// 3. Replay every logged event into an empty store
    /// 4. Start the WAL writer
    ///
    /// Any replay failure is returned and nothing is served.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.data_dir)?;

        let backend = Backend::open(&config)?;
        tracing::info!(
            backend = ?backend.kind(),
            path = %config.wal_path().display(),
            "opened WAL"
        );

        let store = Store::new();
        let (wal, recovery) = WalRecovery::start(backend, &store, config.queue_capacity)?;

        Ok(Self {
            config,
            store,
            wal,
            recovery,
            write_lock: Mutex::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Result<String> {
        self.store.get(key)
    }

    /// Put a key-value pair
    ///
    /// Only mutations that pass validation and are queued for the WAL
    /// are applied.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        Store::check_put(key, value)?;
        self.wal.write_put(key, value)?;
        self.store.put(key, value)
    }

    /// Delete a key
    pub fn delete(&self, key: &str) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        Store::check_key(key)?;
        self.wal.write_delete(key)?;
        self.store.delete(key)
    }

    /// Asynchronous WAL failures
    ///
    /// A value here means the writer has stopped; callers should treat the
    /// engine as no longer durable.
    pub fn wal_errors(&self) -> &Receiver<KeyvalError> {
        self.wal.err()
    }

    /// Whether the WAL writer is still appending
    pub fn is_wal_running(&self) -> bool {
        self.wal.is_running()
    }

    /// Close the engine gracefully
    ///
    /// Waits until every queued event is written
    pub fn close(self) -> Result<()> {
        let Engine { wal, .. } = self;
        wal.shutdown()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// What startup replay restored
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// The underlying store
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
