//! HTTP server configuration

use std::time::Duration;

use serde::Deserialize;

/// HTTP listener settings
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 3100
/// cors = true
/// shutdown_timeout = "10s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_payload_bytes: usize,

    /// Answer cross-origin requests from any origin
    pub cors: bool,

    /// How long to wait for background tasks on shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3100,
            max_payload_bytes: 10 * 1024 * 1024,
            cors: true,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
