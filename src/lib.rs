//! # keyval
//!
//! An in-memory key-value store made durable by a write-ahead log:
//! - Pluggable WAL backends (append-only text file or SQLite table)
//! - A bounded queue drained by a single background writer
//! - Startup replay that rebuilds the store before logging resumes
//!
//! ## Architecture Overview
//!
//! ```text
//!                ┌───────────────────────┐
//!                │        Engine         │
//!                │   put / get / delete  │
//!                └───────────┬───────────┘
//!                            │
//!          ┌─────────────────┴─────────────────┐
//!          │                                   │
//!          ▼                                   ▼
//!   ┌─────────────┐   queue (16)    ┌──────────────────────┐
//!   │    Store    │ ──── events ──▶ │    WritePipeline     │
//!   │  (RwLock)   │                 │ (wal-writer thread)  │
//!   └──────▲──────┘                 └──────────┬───────────┘
//!          │                                   │ append
//!          │ replay (startup)                  ▼
//!   ┌──────┴──────┐    read_all      ┌──────────────────────┐
//!   │ WalRecovery │ ◀─────────────── │ Backend: File/Sqlite │
//!   └─────────────┘                  └──────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod store;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KeyvalError, Result};
pub use config::{BackendKind, Config};
pub use engine::Engine;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of keyval
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
