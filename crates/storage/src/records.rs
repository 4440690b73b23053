//! Flat row forms of the protocol types
//!
//! Both SQL backends bind and decode these. Decoding is generic over the
//! sqlx row type so the column mapping exists once.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{ColumnIndex, Decode, Row, Type};

use pulse_protocol::{EntryQuality, LogEntry, MonitoringEntry, MonitoringKind, Source};

use crate::error::{Result, StorageError};

#[derive(Debug, Clone)]
pub(crate) struct LogRow {
    pub id: String,
    pub message: String,
    pub level: String,
    pub time: String,
    pub source_id: String,
    pub source_type: String,
    pub source_version: String,
    pub script_id: Option<String>,
    pub data: Option<String>,
    pub quality: String,
    pub server_received_at: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct MonitoringRow {
    pub id: String,
    pub module_id: String,
    pub script_id: String,
    pub kind: String,
    pub name: String,
    pub value: String,
    pub previous_value: Option<String>,
    pub timestamp: i64,
    pub time: String,
    pub source_id: String,
    pub metadata: String,
}

#[derive(Debug, Clone)]
pub(crate) struct SourceRow {
    pub source_id: String,
    pub source_type: String,
    pub source_version: String,
    pub metadata: String,
    pub registered_at: String,
    pub last_seen: String,
    pub log_count: i64,
    pub monitoring_count: i64,
}

fn parse_time(table: &'static str, id: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::corrupt(table, id, e))
}

fn parse_json(table: &'static str, id: &str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| StorageError::corrupt(table, id, e))
}

impl LogRow {
    pub(crate) fn from_entry(entry: &LogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            message: entry.message.clone(),
            level: entry.level.clone(),
            time: entry.time.to_rfc3339(),
            source_id: entry.source_id.clone(),
            source_type: entry.source_type.clone(),
            source_version: entry.source_version.clone(),
            script_id: entry.script_id.clone(),
            data: entry.data.as_ref().map(Value::to_string),
            quality: entry.quality.as_str().to_string(),
            server_received_at: entry.server_received_at.to_rfc3339(),
            timestamp: entry.timestamp,
        }
    }

    pub(crate) fn into_entry(self) -> Result<LogEntry> {
        let time = parse_time("logs", &self.id, &self.time)?;
        let server_received_at = parse_time("logs", &self.id, &self.server_received_at)?;
        let data = match self.data.as_deref() {
            Some(raw) => Some(parse_json("logs", &self.id, raw)?),
            None => None,
        };

        Ok(LogEntry {
            quality: EntryQuality::parse(&self.quality).unwrap_or_default(),
            id: self.id,
            message: self.message,
            level: self.level,
            time,
            source_id: self.source_id,
            source_type: self.source_type,
            source_version: self.source_version,
            script_id: self.script_id,
            data,
            server_received_at,
            timestamp: self.timestamp,
        })
    }

    pub(crate) fn decode<'r, R>(row: &'r R) -> Result<Self>
    where
        R: Row,
        for<'a> &'a str: ColumnIndex<R>,
        String: Decode<'r, R::Database> + Type<R::Database>,
        i64: Decode<'r, R::Database> + Type<R::Database>,
    {
        Ok(Self {
            id: row.try_get("id")?,
            message: row.try_get("message")?,
            level: row.try_get("level")?,
            time: row.try_get("time")?,
            source_id: row.try_get("source_id")?,
            source_type: row.try_get("source_type")?,
            source_version: row.try_get("source_version")?,
            script_id: row.try_get("script_id")?,
            data: row.try_get("data")?,
            quality: row.try_get("quality")?,
            server_received_at: row.try_get("server_received_at")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

impl MonitoringRow {
    pub(crate) fn from_entry(entry: &MonitoringEntry) -> Self {
        Self {
            id: entry.id.clone(),
            module_id: entry.module_id.clone(),
            script_id: entry.script_id.clone(),
            kind: entry.kind.as_str().to_string(),
            name: entry.name.clone(),
            value: entry.value.to_string(),
            previous_value: entry.previous_value.as_ref().map(Value::to_string),
            timestamp: entry.timestamp,
            time: entry.time.to_rfc3339(),
            source_id: entry.source_id.clone(),
            metadata: entry.metadata.to_string(),
        }
    }

    pub(crate) fn into_entry(self) -> Result<MonitoringEntry> {
        let kind = MonitoringKind::parse(&self.kind).ok_or_else(|| {
            StorageError::corrupt("monitoring", &self.id, format!("unknown type '{}'", self.kind))
        })?;
        let time = parse_time("monitoring", &self.id, &self.time)?;
        let value = parse_json("monitoring", &self.id, &self.value)?;
        let previous_value = match self.previous_value.as_deref() {
            Some(raw) => Some(parse_json("monitoring", &self.id, raw)?),
            None => None,
        };
        let metadata = parse_json("monitoring", &self.id, &self.metadata)?;

        Ok(MonitoringEntry {
            id: self.id,
            module_id: self.module_id,
            script_id: self.script_id,
            kind,
            name: self.name,
            value,
            previous_value,
            timestamp: self.timestamp,
            time,
            source_id: self.source_id,
            metadata,
        })
    }

    pub(crate) fn decode<'r, R>(row: &'r R) -> Result<Self>
    where
        R: Row,
        for<'a> &'a str: ColumnIndex<R>,
        String: Decode<'r, R::Database> + Type<R::Database>,
        i64: Decode<'r, R::Database> + Type<R::Database>,
    {
        Ok(Self {
            id: row.try_get("id")?,
            module_id: row.try_get("module_id")?,
            script_id: row.try_get("script_id")?,
            kind: row.try_get("kind")?,
            name: row.try_get("name")?,
            value: row.try_get("value")?,
            previous_value: row.try_get("previous_value")?,
            timestamp: row.try_get("timestamp")?,
            time: row.try_get("time")?,
            source_id: row.try_get("source_id")?,
            metadata: row.try_get("metadata")?,
        })
    }
}

impl SourceRow {
    pub(crate) fn from_source(source: &Source) -> Self {
        Self {
            source_id: source.source_id.clone(),
            source_type: source.source_type.clone(),
            source_version: source.source_version.clone(),
            metadata: source.metadata.to_string(),
            registered_at: source.registered_at.to_rfc3339(),
            last_seen: source.last_seen.to_rfc3339(),
            log_count: i64::try_from(source.log_count).unwrap_or(i64::MAX),
            monitoring_count: i64::try_from(source.monitoring_count).unwrap_or(i64::MAX),
        }
    }

    pub(crate) fn into_source(self) -> Result<Source> {
        let id = self.source_id.as_str();
        Ok(Source {
            metadata: parse_json("sources", id, &self.metadata)?,
            registered_at: parse_time("sources", id, &self.registered_at)?,
            last_seen: parse_time("sources", id, &self.last_seen)?,
            log_count: u64::try_from(self.log_count).unwrap_or_default(),
            monitoring_count: u64::try_from(self.monitoring_count).unwrap_or_default(),
            source_type: self.source_type,
            source_version: self.source_version,
            source_id: self.source_id,
        })
    }

    pub(crate) fn decode<'r, R>(row: &'r R) -> Result<Self>
    where
        R: Row,
        for<'a> &'a str: ColumnIndex<R>,
        String: Decode<'r, R::Database> + Type<R::Database>,
        i64: Decode<'r, R::Database> + Type<R::Database>,
    {
        Ok(Self {
            source_id: row.try_get("source_id")?,
            source_type: row.try_get("source_type")?,
            source_version: row.try_get("source_version")?,
            metadata: row.try_get("metadata")?,
            registered_at: row.try_get("registered_at")?,
            last_seen: row.try_get("last_seen")?,
            log_count: row.try_get("log_count")?,
            monitoring_count: row.try_get("monitoring_count")?,
        })
    }
}

#[cfg(test)]
#[path = "records_test.rs"]
mod tests;
