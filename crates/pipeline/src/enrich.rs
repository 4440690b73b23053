//! Validation and enrichment
//!
//! Turns raw JSON submissions into canonical entries:
//!
//! | Input                         | Result                                  |
//! |-------------------------------|-----------------------------------------|
//! | object, valid                 | `quality = normal`                      |
//! | object, invalid, degrade on   | `quality = malformed`, original in data |
//! | object, invalid, degrade off  | `PipelineError::Validation`             |
//! | string / number / array / ... | `quality = raw-text`, text as message   |
//!
//! Server-assigned ids are `{sourceId}_{unixMillis}_{suffix}`. A caller
//! supplied `id` is kept so that import and replay stay idempotent.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::{Map, Value, json};

use pulse_config::IngestConfig;
use pulse_protocol::{DEFAULT_SOURCE_ID, EntryQuality, LogEntry, MonitoringEntry, MonitoringKind};

use crate::error::{PipelineError, Result};

/// Length of the random id suffix
const ID_SUFFIX_LEN: usize = 9;

/// Default for `sourceType`, `sourceVersion` and monitoring `scriptId`
const UNKNOWN: &str = "unknown";

/// Level given to raw-text entries
const RAW_TEXT_LEVEL: &str = "info";

/// Level given to malformed entries
const MALFORMED_LEVEL: &str = "warn";

/// Generate a server-side entry id
pub fn generate_id(source_id: &str, millis: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{source_id}_{millis}_{suffix}")
}

/// Validates raw input and fills in server-side fields
#[derive(Debug, Clone)]
pub struct Enricher {
    valid_levels: Vec<String>,
    accept_malformed: bool,
}

impl Enricher {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            valid_levels: config
                .valid_levels
                .iter()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
            accept_malformed: config.accept_malformed,
        }
    }

    /// Whether invalid objects are degraded instead of rejected
    pub fn accepts_malformed(&self) -> bool {
        self.accept_malformed
    }

    /// Enrich a log submission, rejecting invalid objects
    ///
    /// Non-object input is still accepted as raw text.
    pub fn log(
        &self,
        raw: Value,
        source_header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LogEntry> {
        match raw {
            Value::Object(map) => self.structured_log(&map, source_header, now),
            other => Ok(raw_text_log(other, source_header, now)),
        }
    }

    /// Enrich a single log submission, degrading invalid objects to
    /// `quality = malformed` when configured to
    pub fn log_or_degrade(
        &self,
        raw: Value,
        source_header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LogEntry> {
        let Value::Object(map) = raw else {
            return Ok(raw_text_log(raw, source_header, now));
        };

        match self.structured_log(&map, source_header, now) {
            Ok(entry) => Ok(entry),
            Err(e) if self.accept_malformed => Ok(malformed_log(map, &e, source_header, now)),
            Err(e) => Err(e),
        }
    }

    /// Enrich a monitoring submission
    pub fn monitoring(
        &self,
        raw: Value,
        source_header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<MonitoringEntry> {
        let Value::Object(map) = raw else {
            return Err(PipelineError::validation(
                "body",
                "monitoring entry must be a JSON object",
            ));
        };

        let module_id = required_str(&map, "moduleId")?;
        let name = required_str(&map, "name")?;
        let kind_name = required_str(&map, "type")?;
        let kind = MonitoringKind::parse(&kind_name.to_lowercase()).ok_or_else(|| {
            let kinds: Vec<&str> = MonitoringKind::ALL.iter().map(|k| k.as_str()).collect();
            PipelineError::validation(
                "type",
                format!("'{kind_name}' is not one of {}", kinds.join(", ")),
            )
        })?;

        let time = resolve_time(&map, &["timestamp", "time"], now)?;
        let source_id = resolve_source(&map, source_header);
        let id = optional_str(&map, "id")
            .map(str::to_string)
            .unwrap_or_else(|| generate_id(&source_id, now.timestamp_millis()));

        let metadata = match map.get("metadata") {
            None | Some(Value::Null) => json!({}),
            Some(Value::Object(m)) => Value::Object(m.clone()),
            Some(_) => {
                return Err(PipelineError::validation(
                    "metadata",
                    "must be a JSON object",
                ));
            }
        };

        Ok(MonitoringEntry {
            id,
            module_id: module_id.to_string(),
            script_id: optional_str(&map, "scriptId").unwrap_or(UNKNOWN).to_string(),
            kind,
            name: name.to_string(),
            value: map.get("value").cloned().unwrap_or(Value::Null),
            previous_value: map.get("previousValue").filter(|v| !v.is_null()).cloned(),
            timestamp: time.timestamp_millis(),
            time,
            source_id,
            metadata,
        })
    }

    fn structured_log(
        &self,
        map: &Map<String, Value>,
        source_header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LogEntry> {
        let message = required_str(map, "message")?;
        let level = required_str(map, "level")?.to_lowercase();
        if !self.valid_levels.contains(&level) {
            return Err(PipelineError::validation(
                "level",
                format!("'{level}' is not one of {}", self.valid_levels.join(", ")),
            ));
        }

        let time = resolve_time(map, &["time", "timestamp"], now)?;
        let source_id = resolve_source(map, source_header);
        let id = optional_str(map, "id")
            .map(str::to_string)
            .unwrap_or_else(|| generate_id(&source_id, now.timestamp_millis()));

        Ok(LogEntry {
            id,
            message: message.to_string(),
            level,
            time,
            source_type: optional_str(map, "sourceType").unwrap_or(UNKNOWN).to_string(),
            source_version: optional_str(map, "sourceVersion")
                .unwrap_or(UNKNOWN)
                .to_string(),
            source_id,
            script_id: optional_str(map, "scriptId").map(str::to_string),
            data: map.get("data").filter(|v| !v.is_null()).cloned(),
            quality: EntryQuality::Normal,
            server_received_at: now,
            timestamp: time.timestamp_millis(),
        })
    }
}

fn raw_text_log(raw: Value, source_header: Option<&str>, now: DateTime<Utc>) -> LogEntry {
    let message = match raw {
        Value::String(s) if s.trim().is_empty() => "(empty)".to_string(),
        Value::String(s) => s,
        other => other.to_string(),
    };
    let source_id = source_header
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SOURCE_ID)
        .to_string();

    LogEntry {
        id: generate_id(&source_id, now.timestamp_millis()),
        message,
        level: RAW_TEXT_LEVEL.to_string(),
        time: now,
        source_id,
        source_type: UNKNOWN.to_string(),
        source_version: UNKNOWN.to_string(),
        script_id: None,
        data: None,
        quality: EntryQuality::RawText,
        server_received_at: now,
        timestamp: now.timestamp_millis(),
    }
}

fn malformed_log(
    map: Map<String, Value>,
    error: &PipelineError,
    source_header: Option<&str>,
    now: DateTime<Utc>,
) -> LogEntry {
    let source_id = resolve_source(&map, source_header);
    let id = optional_str(&map, "id")
        .map(str::to_string)
        .unwrap_or_else(|| generate_id(&source_id, now.timestamp_millis()));
    let message = optional_str(&map, "message")
        .unwrap_or("Malformed log entry")
        .to_string();
    let source_type = optional_str(&map, "sourceType").unwrap_or(UNKNOWN).to_string();
    let source_version = optional_str(&map, "sourceVersion")
        .unwrap_or(UNKNOWN)
        .to_string();
    let script_id = optional_str(&map, "scriptId").map(str::to_string);

    LogEntry {
        id,
        message,
        level: MALFORMED_LEVEL.to_string(),
        time: now,
        source_id,
        source_type,
        source_version,
        script_id,
        data: Some(json!({
            "original": Value::Object(map),
            "validationError": error.to_string(),
        })),
        quality: EntryQuality::Malformed,
        server_received_at: now,
        timestamp: now.timestamp_millis(),
    }
}

/// Non-empty trimmed string field
fn optional_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn required_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    match map.get(key) {
        None | Some(Value::Null) => Err(PipelineError::validation(key, "is required")),
        Some(Value::String(_)) => optional_str(map, key)
            .ok_or_else(|| PipelineError::validation(key, "must not be empty")),
        Some(_) => Err(PipelineError::validation(key, "must be a string")),
    }
}

/// Payload `sourceId`, then the request header, then "unknown"
fn resolve_source(map: &Map<String, Value>, source_header: Option<&str>) -> String {
    optional_str(map, "sourceId")
        .or(source_header.map(str::trim).filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_SOURCE_ID)
        .to_string()
}

/// First present key wins; RFC 3339 strings and Unix milliseconds are both
/// accepted
fn resolve_time(
    map: &Map<String, Value>,
    keys: &[&str],
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let Some((key, value)) = keys
        .iter()
        .find_map(|k| map.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))
    else {
        return Ok(now);
    };

    let parsed = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
            .or_else(|| s.trim().parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    };

    parsed.ok_or_else(|| {
        PipelineError::validation(key, "must be an RFC 3339 time or Unix milliseconds")
    })
}

#[cfg(test)]
#[path = "enrich_test.rs"]
mod tests;
