use crate::core::{Result, UserDbError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Path SQLite recognises as a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
}

/// Connection parameters handed to `QueryExecutor::connect`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:`.
    pub path: String,
    /// Open the file without write access. The file must already exist.
    #[serde(default)]
    pub read_only: bool,
    /// How long to wait on a locked database before failing, in milliseconds.
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
}

fn default_foreign_keys() -> bool {
    true
}

impl DatabaseConfig {
    /// Read-write configuration for the database file at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        DatabaseConfig {
            path: path.into(),
            read_only: false,
            busy_timeout_ms: None,
            foreign_keys: default_foreign_keys(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = userdb::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config.database);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| UserDbError::Config(e.to_string()))
}

/// Location of the per-user configuration file, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("userdb").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[database]
path = "/var/lib/userdb/users.db"
read_only = true
busy_timeout_ms = 2500
foreign_keys = false
"#;

    #[test]
    fn test_load_config_from_str() {
        let config = parse_config(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.database.path, "/var/lib/userdb/users.db");
        assert!(config.database.read_only);
        assert_eq!(config.database.busy_timeout_ms, Some(2500));
        assert!(!config.database.foreign_keys);
    }

    #[test]
    fn test_optional_keys_take_defaults() {
        let config = parse_config("[database]\npath = \"users.db\"\n").unwrap();
        assert_eq!(config.database, DatabaseConfig::new("users.db"));
        assert!(config.database.foreign_keys);
    }

    #[test]
    fn test_missing_database_table_is_config_error() {
        match parse_config("[ui]\ntheme = \"dark\"\n") {
            Err(UserDbError::Config(msg)) => assert!(msg.contains("database")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/userdb/config.toml");
        assert!(matches!(result, Err(UserDbError::Io(_))));
    }

    #[test]
    fn test_in_memory() {
        assert!(DatabaseConfig::in_memory().is_in_memory());
        assert!(!DatabaseConfig::new("users.db").is_in_memory());
    }

    #[test]
    fn test_default_config_path_file_name() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("userdb/config.toml"));
        }
    }
}
