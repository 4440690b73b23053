//! Pulse Storage - Persistence Adapter and archive files
//!
//! # Backends
//!
//! Every backend implements [`PersistenceBackend`]:
//!
//! - [`FileBackend`]: one JSON document, load-merge-rewrite
//! - [`SqliteBackend`]: embedded tables in WAL mode with secondary indexes
//! - [`PostgresBackend`]: same schema over a connection pool
//!
//! Bulk `save_*`/`load_*` replace whole collections. Incremental writes
//! (`add_log`, `add_monitoring_entry`, ...) may answer
//! [`WriteOutcome::NotHandled`], in which case the caller does a bulk save.
//!
//! # Fallback
//!
//! [`Persistence`] wraps the configured backend together with a flat-file
//! backend. If the configured backend fails to connect, or any single
//! operation fails, that operation is redone against the file. Failures are
//! logged and counted, never returned to ingestion callers.
//!
//! # Archives
//!
//! [`ArchiveStore`] writes sealed archive documents as flat files
//! (optionally LZ4 framed) regardless of the configured backend, and lists,
//! reads and prunes them.

mod archive;
mod backend;
mod error;
mod file;
mod manager;
mod postgres;
mod records;
mod schema;
mod sqlite;

pub use archive::{ArchiveInfo, ArchiveStore, PruneReport, archive_base_name};
pub use backend::{LiveSnapshot, LiveState, PersistenceBackend, WriteOutcome};
pub use error::{Result, StorageError};
pub use file::FileBackend;
pub use manager::{Persistence, PersistenceStats};
pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;

#[cfg(test)]
mod testutil;
