//! Error types for keyval
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KeyvalError
pub type Result<T> = std::result::Result<T, KeyvalError>;

/// Unified error type for keyval operations
#[derive(Debug, Error)]
pub enum KeyvalError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    // -------------------------------------------------------------------------
    // WAL Format Errors
    // -------------------------------------------------------------------------
    /// A persisted record could not be decoded into an event
    #[error("WAL decode failed: {0}")]
    WalDecode(String),

    /// An event cannot be represented in the backend's format
    #[error("WAL encode failed: {0}")]
    WalEncode(String),

    /// A decoded event id did not increase
    #[error("WAL ids out of order: {found} after {previous}")]
    WalOutOfOrder { previous: u64, found: u64 },

    // -------------------------------------------------------------------------
    // Pipeline / Replay Errors
    // -------------------------------------------------------------------------
    /// The write pipeline no longer accepts events
    #[error("WAL writer is closed")]
    WalClosed,

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    #[error("WAL replay aborted: {0}")]
    ReplayAborted(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Empty keys are not allowed")]
    EmptyKey,

    #[error("Empty values are not allowed")]
    EmptyValue,

    #[error("No such key")]
    NoSuchKey,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
