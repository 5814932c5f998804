//! Environment-driven storage configuration
//!
//! The engine is configured once, process-wide, at startup. Which backend is
//! active is decided by a single fact: whether an external database
//! connection string is present.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the flat-file data directory
pub const ENV_DATA_DIR: &str = "DOCSTORE_DATA_DIR";

/// Environment variable holding the external database connection string.
/// When set, the MongoDB backend is selected at startup.
pub const ENV_DATABASE_URL: &str = "DOCSTORE_DATABASE_URL";

/// Environment variable naming the external database
pub const ENV_DATABASE_NAME: &str = "DOCSTORE_DATABASE_NAME";

/// Storage engine configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the flat-file collection files
    pub data_dir: PathBuf,
    /// External database connection string; presence selects the MongoDB backend
    pub database_url: Option<String>,
    /// Database name used by the MongoDB backend
    pub database_name: String,
}

impl StorageConfig {
    /// Load configuration from the process environment.
    ///
    /// # Arguments
    /// * `env_file` - Path to a `.env` file. If None, only the existing
    ///   process environment is consulted.
    pub fn load(env_file: Option<&Path>) -> Self {
        // Only load a .env file if an explicit path was provided. This avoids
        // picking up repository or system .env files during unit tests which
        // expect default values.
        if let Some(env_path) = env_file {
            if env_path.exists() {
                if let Err(e) = dotenv::from_path(env_path) {
                    eprintln!("Warning: Failed to load .env file: {}", e);
                }
            }
        }

        Self {
            data_dir: env::var(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            database_url: env::var(ENV_DATABASE_URL).ok().filter(|s| !s.is_empty()),
            database_name: env::var(ENV_DATABASE_NAME)
                .unwrap_or_else(|_| "docstore".to_string()),
        }
    }

    /// Configuration for a flat-file deployment rooted at `data_dir`
    pub fn file_backed<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            database_url: None,
            database_name: "docstore".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::load(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backed_selects_no_database() {
        let config = StorageConfig::file_backed("/tmp/data");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/data"));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_empty_connection_string_means_absent() {
        env::set_var(ENV_DATABASE_URL, "");
        let config = StorageConfig::load(None);
        assert!(config.database_url.is_none());
        env::remove_var(ENV_DATABASE_URL);
    }
}
