//! Configuration validation
//!
//! Validates config consistency:
//! - Live-set caps and batch sizes are non-zero
//! - At least one valid level is configured
//! - The selected storage backend has what it needs
//! - Scheduler and limiter intervals are usable
//! - Replay sizes fit in the replay buffer

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::storage::StorageBackendKind;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_ingest(config)?;
    validate_storage(config)?;
    validate_rotation(config)?;
    validate_rate_limit(config)?;
    validate_stream(config)?;
    Ok(())
}

fn validate_ingest(config: &Config) -> Result<()> {
    let ingest = &config.ingest;

    if ingest.max_logs == 0 {
        return Err(ConfigError::invalid_value(
            "ingest",
            "max_logs",
            "must be greater than 0",
        ));
    }

    if ingest.max_monitoring_entries == 0 {
        return Err(ConfigError::invalid_value(
            "ingest",
            "max_monitoring_entries",
            "must be greater than 0",
        ));
    }

    if ingest.max_batch_size == 0 {
        return Err(ConfigError::invalid_value(
            "ingest",
            "max_batch_size",
            "must be greater than 0",
        ));
    }

    if ingest.valid_levels.iter().all(|l| l.trim().is_empty()) {
        return Err(ConfigError::invalid_value(
            "ingest",
            "valid_levels",
            "at least one level is required",
        ));
    }

    Ok(())
}

fn validate_storage(config: &Config) -> Result<()> {
    let storage = &config.storage;

    if storage.backend == StorageBackendKind::Postgres
        && storage.postgres_url.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::missing_field("storage", "postgres_url"));
    }

    if storage.file_name.is_empty() {
        return Err(ConfigError::missing_field("storage", "file_name"));
    }

    if storage.max_connections == 0 {
        return Err(ConfigError::invalid_value(
            "storage",
            "max_connections",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_rotation(config: &Config) -> Result<()> {
    let rotation = &config.rotation;

    if rotation.poll_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "rotation",
            "poll_interval",
            "must be greater than 0",
        ));
    }

    if rotation.max_archives == 0 {
        return Err(ConfigError::invalid_value(
            "rotation",
            "max_archives",
            "must keep at least one archive",
        ));
    }

    Ok(())
}

fn validate_rate_limit(config: &Config) -> Result<()> {
    let limit = &config.rate_limit;
    if !limit.enabled {
        return Ok(());
    }

    if limit.window_ms == 0 {
        return Err(ConfigError::invalid_value(
            "rate_limit",
            "window_ms",
            "must be greater than 0",
        ));
    }

    if limit.max_requests == 0 {
        return Err(ConfigError::invalid_value(
            "rate_limit",
            "max_requests",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_stream(config: &Config) -> Result<()> {
    let stream = &config.stream;

    if stream.channel_buffer == 0 {
        return Err(ConfigError::invalid_value(
            "stream",
            "channel_buffer",
            "must be greater than 0",
        ));
    }

    for (field, size) in [
        ("log_replay", stream.log_replay),
        ("monitoring_replay", stream.monitoring_replay),
    ] {
        if size > stream.replay_capacity {
            return Err(ConfigError::invalid_value(
                "stream",
                field,
                format!(
                    "{} exceeds replay_capacity {}",
                    size, stream.replay_capacity
                ),
            ));
        }
    }

    Ok(())
}
