//! Pulse Protocol - Core types that flow through the ingestion pipeline
//!
//! This crate provides the records shared by every other pulse crate:
//! - `LogEntry` - A structured log line with an `EntryQuality` tag
//! - `MonitoringEntry` - One observation of a variable/state/function/property/event
//! - `Source` - Registration record for an application pushing entries
//! - `ArchiveDocument` / `LiveDocument` - On-disk document layouts
//!
//! # Wire Format
//!
//! All types serialize as camelCase JSON. Timestamps are carried twice:
//! `time` as an RFC 3339 string and `timestamp` as Unix milliseconds. The
//! millisecond value is the ordering key used by the index.
//!
//! Entries are immutable once enriched. The pipeline shares them as
//! `Arc<LogEntry>` / `Arc<MonitoringEntry>` between the live set, the
//! indexes and the fan-out layer.

mod archive;
mod log;
mod monitoring;
mod source;

pub use archive::{ARCHIVE_FORMAT_VERSION, ArchiveDocument, ArchiveMetadata, LiveDocument};
pub use log::{EntryQuality, LogEntry};
pub use monitoring::{MonitoringEntry, MonitoringKind};
pub use source::{DEFAULT_SOURCE_ID, Source};

#[cfg(test)]
mod log_test;
