//! Rumor Mill Storage Layer
//!
//! Implements the `RumorRepository` trait twice: a SQLite store for
//! persistent state and an in-memory store for tests and embedding.
//!
//! # Architecture
//!
//! - A rumor record (rumor, variants, beliefs) is written and read as a unit
//! - Every write carries the version it was loaded at; a mismatch reports
//!   `UpdateStatus::Stale` instead of overwriting
//! - Deleting a rumor removes its variants and beliefs with it
//!
//! # Examples
//!
//! ```no_run
//! use rumor_store::SqliteStore;
//!
//! let store = SqliteStore::new("rumors.db").unwrap();
//! // Store is now ready for rumor operations
//! ```

#![warn(missing_docs)]

mod error;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
