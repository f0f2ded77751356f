//! Configuration for keyval
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KeyvalError, Result};

/// Main configuration for a keyval instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the write-ahead log
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (sequential-file backend)
    ///     └── wal.db           (sqlite backend)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Which durable backend records events
    pub backend: BackendKind,

    /// Sync strategy: how often to fsync the sequential-file WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// Capacity of the queue between writers and the WAL worker
    pub queue_capacity: usize,
}

/// WAL backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Tab-separated text lines in an append-only file
    File,

    /// Rows in a single SQLite table
    Sqlite,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./keyval_data"),
            backend: BackendKind::Sqlite,
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            queue_capacity: Config::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

    const FILE_WAL_NAME: &'static str = "wal.log";
    const SQLITE_WAL_NAME: &'static str = "wal.db";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Location of the WAL for the configured backend
    pub fn wal_path(&self) -> PathBuf {
        match self.backend {
            BackendKind::File => self.data_dir.join(Self::FILE_WAL_NAME),
            BackendKind::Sqlite => self.data_dir.join(Self::SQLITE_WAL_NAME),
        }
    }

    /// Reject settings the WAL cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(KeyvalError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(KeyvalError::Config(
                "EveryNEntries count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for the WAL)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Select the WAL backend
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the WAL queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
