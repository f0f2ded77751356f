//! Store Module
//!
//! The in-memory map that the WAL protects.
//!
//! ## Responsibilities
//! - Validate keys and values before anything is logged
//! - Fast reads and writes in memory
//! - Act as the replay target during recovery
//!
//! ## Data Structure Choice
//! A `HashMap` behind a `parking_lot::RwLock`: many concurrent readers,
//! one writer at a time. Ordering is only needed for `snapshot`.

mod table;

pub use table::Store;
