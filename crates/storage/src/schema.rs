//! Relational schema shared by the SQLite and PostgreSQL backends
//!
//! Types are chosen so the same DDL is valid for both engines. JSON payloads
//! are stored as TEXT and timestamps as RFC 3339 TEXT plus a BIGINT
//! millisecond column. Entries reload in insertion order, not by timestamp:
//! SQLite orders by rowid, PostgreSQL by the `seq` column added below.

pub(crate) const LOG_COLUMNS: &str = "id, message, level, time, source_id, source_type, \
     source_version, script_id, data, quality, server_received_at, timestamp";

pub(crate) const MONITORING_COLUMNS: &str = "id, module_id, script_id, kind, name, value, \
     previous_value, timestamp, time, source_id, metadata";

pub(crate) const SOURCE_COLUMNS: &str = "source_id, source_type, source_version, metadata, \
     registered_at, last_seen, log_count, monitoring_count";

/// Rows per multi-row INSERT
///
/// 500 rows × 12 columns stays under PostgreSQL's 65535 bind limit.
pub(crate) const INSERT_CHUNK_ROWS: usize = 500;

pub(crate) const CREATE_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS logs (
        id TEXT PRIMARY KEY,
        message TEXT NOT NULL,
        level TEXT NOT NULL,
        time TEXT NOT NULL,
        source_id TEXT NOT NULL,
        source_type TEXT NOT NULL,
        source_version TEXT NOT NULL,
        script_id TEXT,
        data TEXT,
        quality TEXT NOT NULL DEFAULT 'normal',
        server_received_at TEXT NOT NULL,
        timestamp BIGINT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_logs_level ON logs(level)",
    "CREATE INDEX IF NOT EXISTS idx_logs_source_id ON logs(source_id)",
    "CREATE INDEX IF NOT EXISTS idx_logs_script_id ON logs(script_id)",
    r#"
    CREATE TABLE IF NOT EXISTS monitoring (
        id TEXT PRIMARY KEY,
        module_id TEXT NOT NULL,
        script_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        name TEXT NOT NULL,
        value TEXT NOT NULL,
        previous_value TEXT,
        timestamp BIGINT NOT NULL,
        time TEXT NOT NULL,
        source_id TEXT NOT NULL,
        metadata TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_monitoring_timestamp ON monitoring(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_monitoring_module_id ON monitoring(module_id)",
    "CREATE INDEX IF NOT EXISTS idx_monitoring_script_id ON monitoring(script_id)",
    r#"
    CREATE TABLE IF NOT EXISTS sources (
        source_id TEXT PRIMARY KEY,
        source_type TEXT NOT NULL,
        source_version TEXT NOT NULL,
        metadata TEXT NOT NULL,
        registered_at TEXT NOT NULL,
        last_seen TEXT NOT NULL,
        log_count BIGINT NOT NULL DEFAULT 0,
        monitoring_count BIGINT NOT NULL DEFAULT 0
    )
    "#,
];

/// Insertion counter for PostgreSQL, which has no rowid
pub(crate) const POSTGRES_SEQ_STATEMENTS: &[&str] = &[
    "ALTER TABLE logs ADD COLUMN IF NOT EXISTS seq BIGSERIAL",
    "ALTER TABLE monitoring ADD COLUMN IF NOT EXISTS seq BIGSERIAL",
];
