//! Storage backend configuration

use std::path::PathBuf;

use serde::Deserialize;

/// Which durable backend holds the live state
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// Single JSON document (default, also the fallback)
    #[default]
    File,
    /// Embedded SQLite database (WAL mode)
    Sqlite,
    /// Networked PostgreSQL database
    Postgres,
}

impl StorageBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

/// Storage settings
///
/// ```toml
/// [storage]
/// backend = "sqlite"
/// data_dir = "data"
/// sqlite_path = "data/pulse.db"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Selected backend
    pub backend: StorageBackendKind,

    /// Directory for the flat-file document
    pub data_dir: PathBuf,

    /// Flat-file document name inside `data_dir`
    pub file_name: String,

    /// SQLite database path
    pub sqlite_path: PathBuf,

    /// PostgreSQL connection URL (required for `backend = "postgres"`)
    pub postgres_url: Option<String>,

    /// Pool size for relational backends
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::File,
            data_dir: PathBuf::from("data"),
            file_name: "logs.json".into(),
            sqlite_path: PathBuf::from("data/pulse.db"),
            postgres_url: None,
            max_connections: 5,
        }
    }
}

impl StorageConfig {
    /// Full path of the flat-file document
    pub fn file_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}
