//! Logging configuration
//!
//! Controls the server's own tracing output, not the entries it ingests.

use serde::Deserialize;

/// Minimum level for the server's own output
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Console,
    /// One JSON object per line, for log shippers
    Json,
}

/// `[log]` section
///
/// ```toml
/// [log]
/// level = "info"
/// format = "json"
/// directives = ["sqlx=warn", "tower_http=debug"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,

    pub format: LogFormat,

    /// Per-target overrides in `EnvFilter` syntax, applied after `level`
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            // sqlx logs every statement at info
            directives: vec!["sqlx=warn".into()],
        }
    }
}

impl LogConfig {
    /// Filter string for `level` followed by the per-target overrides
    ///
    /// `level` is taken separately so a command-line override keeps the
    /// configured directives.
    pub fn filter_for(&self, level: &str) -> String {
        std::iter::once(level)
            .chain(
                self.directives
                    .iter()
                    .map(|d| d.trim())
                    .filter(|d| !d.is_empty()),
            )
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty() {
        let config: LogConfig = toml::from_str("").unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Console);
        assert_eq!(config.filter_for("info"), "info,sqlx=warn");
    }

    #[test]
    fn test_level_names_round_trip() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            let toml = format!("level = \"{}\"", level.as_str());
            let config: LogConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config.level, level);
        }
    }

    #[test]
    fn test_filter_keeps_directives_under_override() {
        let config: LogConfig =
            toml::from_str("level = \"warn\"\ndirectives = [\"pulse_api=debug\", \" \"]").unwrap();

        assert_eq!(config.filter_for(config.level.as_str()), "warn,pulse_api=debug");
        assert_eq!(config.filter_for("trace"), "trace,pulse_api=debug");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(toml::from_str::<LogConfig>("format = \"xml\"").is_err());
    }
}
