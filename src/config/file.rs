//! Configuration file support for tablescope
//!
//! This module provides TOML configuration file parsing. Values merge with
//! CLI arguments in [`super::merge`].
//!
//! ## Priority Order
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values
//!
//! ## Example Configuration
//!
//! ```toml
//! # tablescope.toml
//!
//! [server]
//! http_addr = "127.0.0.1:8001"
//! log_level = "info"
//! hash_urls = false
//!
//! [query]
//! page_size = 100
//! max_returned_rows = 1000
//! sql_time_limit_ms = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults::DEFAULT_CONFIG_FILE;
use crate::error::{BrowseError, Result};

/// Root configuration structure for TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Server configuration
    pub server: ServerSection,

    /// Query limits
    pub query: QuerySection,
}

/// Server section configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// HTTP API listen address
    pub http_addr: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,

    /// Serve databases under content-hash paths
    pub hash_urls: Option<bool>,
}

/// Query section configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySection {
    /// Rows per table or view page
    pub page_size: Option<usize>,

    /// Cap on rows returned by an ad hoc query
    pub max_returned_rows: Option<usize>,

    /// Default statement time budget in milliseconds
    pub sql_time_limit_ms: Option<u64>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BrowseError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            BrowseError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Try to load `tablescope.toml` from the working directory
    pub fn load_default() -> Option<Self> {
        let path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if !path.exists() {
            return None;
        }
        match Self::load(&path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {:?}: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_empty_config() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert!(config.server.http_addr.is_none());
        assert!(config.query.page_size.is_none());
    }

    #[test]
    fn test_parse_sections() {
        let toml = r#"
            [server]
            http_addr = "0.0.0.0:8080"
            log_level = "debug"
            hash_urls = true

            [query]
            page_size = 50
            max_returned_rows = 100
            sql_time_limit_ms = 20
        "#;
        let config: ConfigFile = toml::from_str(toml).unwrap();
        assert_eq!(config.server.http_addr, Some("0.0.0.0:8080".to_string()));
        assert_eq!(config.server.log_level, Some("debug".to_string()));
        assert_eq!(config.server.hash_urls, Some(true));
        assert_eq!(config.query.page_size, Some(50));
        assert_eq!(config.query.max_returned_rows, Some(100));
        assert_eq!(config.query.sql_time_limit_ms, Some(20));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[query]\npage_size = 7").unwrap();
        let config = ConfigFile::load(file.path()).unwrap();
        assert_eq!(config.query.page_size, Some(7));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[query\npage_size = ").unwrap();
        let err = ConfigFile::load(file.path()).unwrap_err();
        assert!(matches!(err, BrowseError::Config(_)));
    }
}
