//! Embedded relational backend (SQLite via sqlx)
//!
//! WAL journal with `synchronous = NORMAL`. A whole-state save replaces all
//! three tables inside one transaction; incremental writes use
//! `INSERT OR REPLACE`. Entries load back in insertion (rowid) order.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info};

use pulse_protocol::{LogEntry, MonitoringEntry, Source};

use crate::backend::{LiveSnapshot, PersistenceBackend, WriteOutcome};
use crate::error::{Result, StorageError};
use crate::records::{LogRow, MonitoringRow, SourceRow};
use crate::schema::{
    CREATE_STATEMENTS, INSERT_CHUNK_ROWS, LOG_COLUMNS, MONITORING_COLUMNS, SOURCE_COLUMNS,
};

/// SQLite-backed persistence
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open or create the database at `path`
    pub async fn connect<P: AsRef<Path>>(path: P, max_connections: u32) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!(path = %path.display(), "SQLite database opened");
        Ok(Self { pool })
    }
}

pub(crate) fn insert_logs(rows: &[LogRow]) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("INSERT OR REPLACE INTO logs ({LOG_COLUMNS}) "));
    qb.push_values(rows, |mut b, row| {
        b.push_bind(row.id.clone())
            .push_bind(row.message.clone())
            .push_bind(row.level.clone())
            .push_bind(row.time.clone())
            .push_bind(row.source_id.clone())
            .push_bind(row.source_type.clone())
            .push_bind(row.source_version.clone())
            .push_bind(row.script_id.clone())
            .push_bind(row.data.clone())
            .push_bind(row.quality.clone())
            .push_bind(row.server_received_at.clone())
            .push_bind(row.timestamp);
    });
    qb
}

pub(crate) fn insert_monitoring(rows: &[MonitoringRow]) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT OR REPLACE INTO monitoring ({MONITORING_COLUMNS}) "
    ));
    qb.push_values(rows, |mut b, row| {
        b.push_bind(row.id.clone())
            .push_bind(row.module_id.clone())
            .push_bind(row.script_id.clone())
            .push_bind(row.kind.clone())
            .push_bind(row.name.clone())
            .push_bind(row.value.clone())
            .push_bind(row.previous_value.clone())
            .push_bind(row.timestamp)
            .push_bind(row.time.clone())
            .push_bind(row.source_id.clone())
            .push_bind(row.metadata.clone());
    });
    qb
}

pub(crate) fn insert_sources(rows: &[SourceRow]) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT OR REPLACE INTO sources ({SOURCE_COLUMNS}) "
    ));
    qb.push_values(rows, |mut b, row| {
        b.push_bind(row.source_id.clone())
            .push_bind(row.source_type.clone())
            .push_bind(row.source_version.clone())
            .push_bind(row.metadata.clone())
            .push_bind(row.registered_at.clone())
            .push_bind(row.last_seen.clone())
            .push_bind(row.log_count)
            .push_bind(row.monitoring_count);
    });
    qb
}

fn delete_ids(table: &str, ids: &[String]) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {table} WHERE id IN ("));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");
    qb
}

/// Delete every row of `table` and insert `rows` in order
///
/// Rows get ascending rowids, which is the order loads return them in.
async fn replace_rows<R, F>(
    conn: &mut SqliteConnection,
    table: &str,
    rows: &[R],
    build: F,
) -> Result<()>
where
    R: Sync,
    F: Fn(&[R]) -> QueryBuilder<'static, Sqlite> + Send + Sync,
{
    sqlx::query(&format!("DELETE FROM {table}"))
        .execute(&mut *conn)
        .await?;
    for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
        build(chunk).build().execute(&mut *conn).await?;
    }
    debug!(table, rows = rows.len(), "SQLite table replaced");
    Ok(())
}

impl SqliteBackend {
    async fn replace_table<R, F>(&self, table: &str, rows: &[R], build: F) -> Result<()>
    where
        R: Sync,
        F: Fn(&[R]) -> QueryBuilder<'static, Sqlite> + Send + Sync,
    {
        let mut tx = self.pool.begin().await?;
        replace_rows(&mut tx, table, rows, build).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn initialize(&self) -> Result<()> {
        for statement in CREATE_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("SQLite schema initialized");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    async fn save_all(&self, snapshot: &LiveSnapshot) -> Result<()> {
        let logs: Vec<_> = snapshot.logs.iter().map(|e| LogRow::from_entry(e)).collect();
        let monitoring: Vec<_> = snapshot
            .monitoring
            .iter()
            .map(|e| MonitoringRow::from_entry(e))
            .collect();
        let sources: Vec<_> = snapshot.sources.iter().map(SourceRow::from_source).collect();

        let mut tx = self.pool.begin().await?;
        replace_rows(&mut tx, "logs", &logs, insert_logs).await?;
        replace_rows(&mut tx, "monitoring", &monitoring, insert_monitoring).await?;
        replace_rows(&mut tx, "sources", &sources, insert_sources).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_logs(&self, logs: &[Arc<LogEntry>]) -> Result<()> {
        let rows: Vec<_> = logs.iter().map(|e| LogRow::from_entry(e)).collect();
        self.replace_table("logs", &rows, insert_logs).await
    }

    async fn load_logs(&self) -> Result<Vec<Arc<LogEntry>>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOG_COLUMNS} FROM logs ORDER BY rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| LogRow::decode(row)?.into_entry().map(Arc::new))
            .collect()
    }

    async fn save_monitoring(&self, entries: &[Arc<MonitoringEntry>]) -> Result<()> {
        let rows: Vec<_> = entries.iter().map(|e| MonitoringRow::from_entry(e)).collect();
        self.replace_table("monitoring", &rows, insert_monitoring)
            .await
    }

    async fn load_monitoring(&self) -> Result<Vec<Arc<MonitoringEntry>>> {
        let rows = sqlx::query(&format!(
            "SELECT {MONITORING_COLUMNS} FROM monitoring ORDER BY rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| MonitoringRow::decode(row)?.into_entry().map(Arc::new))
            .collect()
    }

    async fn save_sources(&self, sources: &[Source]) -> Result<()> {
        let rows: Vec<_> = sources.iter().map(SourceRow::from_source).collect();
        self.replace_table("sources", &rows, insert_sources).await
    }

    async fn load_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources ORDER BY registered_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| SourceRow::decode(row)?.into_source())
            .collect()
    }

    async fn add_log(&self, entry: &LogEntry) -> Result<WriteOutcome> {
        insert_logs(&[LogRow::from_entry(entry)])
            .build()
            .execute(&self.pool)
            .await?;
        Ok(WriteOutcome::Handled)
    }

    async fn add_monitoring_entry(&self, entry: &MonitoringEntry) -> Result<WriteOutcome> {
        insert_monitoring(&[MonitoringRow::from_entry(entry)])
            .build()
            .execute(&self.pool)
            .await?;
        Ok(WriteOutcome::Handled)
    }

    async fn remove_logs(&self, ids: &[String]) -> Result<WriteOutcome> {
        if !ids.is_empty() {
            delete_ids("logs", ids).build().execute(&self.pool).await?;
        }
        Ok(WriteOutcome::Handled)
    }

    async fn remove_monitoring(&self, ids: &[String]) -> Result<WriteOutcome> {
        if !ids.is_empty() {
            delete_ids("monitoring", ids)
                .build()
                .execute(&self.pool)
                .await?;
        }
        Ok(WriteOutcome::Handled)
    }

    async fn upsert_source(&self, source: &Source) -> Result<WriteOutcome> {
        insert_sources(&[SourceRow::from_source(source)])
            .build()
            .execute(&self.pool)
            .await?;
        Ok(WriteOutcome::Handled)
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
