//! Fan-out configuration

use std::time::Duration;

use serde::Deserialize;

/// Push-stream and pull-stream settings
///
/// ```toml
/// [stream]
/// log_replay = 50
/// monitoring_replay = 20
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Recent logs replayed to a new pull-stream client
    pub log_replay: usize,

    /// Recent monitoring entries replayed to a new pull-stream client
    pub monitoring_replay: usize,

    /// Entries kept per kind in the replay buffer
    pub replay_capacity: usize,

    /// Per-subscriber channel depth; entries are dropped when full
    pub channel_buffer: usize,

    /// Maximum concurrent stream clients
    pub max_subscribers: usize,

    /// Keep-alive interval for idle connections
    #[serde(with = "humantime_serde")]
    pub heartbeat: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            log_replay: 50,
            monitoring_replay: 20,
            replay_capacity: 1000,
            channel_buffer: 256,
            max_subscribers: 100,
            heartbeat: Duration::from_secs(30),
        }
    }
}
