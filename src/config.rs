//! Engine configuration
//!
//! Where the schema file lives, where table data is stored, and where the
//! shell keeps its history.

use std::path::{Path, PathBuf};

/// Default schema file name
pub const DEFAULT_SCHEMA_PATH: &str = "schema.json";

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// JSON schema file
    pub schema_path: PathBuf,
    /// Directory holding `<schema name>/<table>/` trees
    pub data_dir: PathBuf,
    /// Shell history file, if history should be persisted
    pub history_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            data_dir: PathBuf::from("."),
            history_file: None,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema file
    pub fn schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = path.into();
        self
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the history file
    pub fn history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_file = Some(path.into());
        self
    }

    /// Directory of a schema's tables
    pub fn schema_dir(&self, schema_name: &str) -> PathBuf {
        schema_dir(&self.data_dir, schema_name)
    }
}

/// `<data_dir>/<schema_name>`
pub fn schema_dir(data_dir: &Path, schema_name: &str) -> PathBuf {
    data_dir.join(schema_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.schema_path, PathBuf::from("schema.json"));
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert!(config.history_file.is_none());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .schema_path("/etc/flatdb/shop.json")
            .data_dir("/var/lib/flatdb")
            .history_file("/tmp/.flatdb_history");

        assert_eq!(config.schema_path, PathBuf::from("/etc/flatdb/shop.json"));
        assert_eq!(
            config.schema_dir("shop"),
            PathBuf::from("/var/lib/flatdb/shop")
        );
        assert_eq!(
            config.history_file,
            Some(PathBuf::from("/tmp/.flatdb_history"))
        );
    }
}
