//! # stovepanel-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `StateStore` port as a table of path-addressed JSON documents,
//!   with merge-patch updates done by `SQLite`'s `json_patch`
//! - Implement the coordination event log ports (append + recent query)
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//!
//! ## Dependency rule
//! Depends on `stovepanel-app` (for port traits) and `stovepanel-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod event_log;
mod pool;
mod state_store;

pub use error::StorageError;
pub use event_log::SqliteCoordinationEventLog;
pub use pool::{Config, Database};
pub use state_store::SqliteStateStore;
