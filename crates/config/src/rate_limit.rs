//! Rate limiter configuration

use std::time::Duration;

use serde::Deserialize;

/// Fixed-window admission control, keyed by source id
///
/// ```toml
/// [rate_limit]
/// window_ms = 60000
/// max_requests = 1000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Window length in milliseconds
    pub window_ms: u64,

    /// Requests admitted per window per source
    pub max_requests: u32,

    /// How often expired windows are purged
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            max_requests: 1000,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}
