//! Configuration module for tablescope
//!
//! This module is organized into submodules:
//! - `defaults` - Default constants and values
//! - `args` - CLI argument definitions
//! - `file` - TOML configuration file
//! - `merge` - Merging file values into CLI arguments

mod args;
mod defaults;
pub mod file;
mod merge;

pub use args::ServeArgs;
pub use defaults::*;
pub use file::ConfigFile;
pub use merge::merge_config_with_args;

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{BrowseError, Result};
use defaults::DEFAULT_HTTP_SOCKET_ADDR;

/// Query limits shared by every database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Rows per table or view page.
    pub page_size: usize,
    /// Cap on rows returned by an ad hoc query. Also the ceiling for `_size`.
    pub max_returned_rows: usize,
    /// Default statement time budget in milliseconds.
    pub sql_time_limit_ms: u64,
    /// Address databases by `{name}-{content hash}` and redirect bare names.
    pub hash_urls: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_returned_rows: DEFAULT_MAX_RETURNED_ROWS,
            sql_time_limit_ms: DEFAULT_SQL_TIME_LIMIT_MS,
            hash_urls: DEFAULT_HASH_URLS,
        }
    }
}

impl BrowserConfig {
    /// Validate the limits, returning an error describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(BrowseError::Config("page_size must be at least 1".to_string()));
        }
        if self.max_returned_rows == 0 {
            return Err(BrowseError::Config(
                "max_returned_rows must be at least 1".to_string(),
            ));
        }
        if self.sql_time_limit_ms == 0 {
            return Err(BrowseError::Config(
                "sql_time_limit_ms must be at least 1".to_string(),
            ));
        }
        if self.page_size > self.max_returned_rows {
            return Err(BrowseError::Config(format!(
                "page_size ({}) must not exceed max_returned_rows ({})",
                self.page_size, self.max_returned_rows
            )));
        }
        Ok(())
    }
}

/// Complete server configuration.
///
/// # Configuration Sources
///
/// 1. **CLI arguments** (highest priority)
/// 2. **Environment variables** - `TABLESCOPE_*` prefix
/// 3. **Config file** - TOML configuration file
/// 4. **Built-in defaults** (lowest priority)
///
/// # Example
///
/// ```rust,ignore
/// use tablescope::config::{ServerConfig, ServeArgs};
///
/// let args = ServeArgs::parse();
/// let config = ServerConfig::from_args(args)?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on for HTTP API
    pub http_addr: SocketAddr,

    /// Log level
    pub log_level: String,

    /// Database files to serve
    pub files: Vec<PathBuf>,

    /// Query limits
    pub browser: BrowserConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_SOCKET_ADDR,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            files: Vec::new(),
            browser: BrowserConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration from command-line arguments
    pub fn from_args(args: ServeArgs) -> Result<Self> {
        let http_addr: SocketAddr = args
            .http_addr
            .parse()
            .map_err(|e| BrowseError::Config(format!("Invalid HTTP address: {}", e)))?;

        let config = Self {
            http_addr,
            log_level: args.log_level,
            files: args.files,
            browser: BrowserConfig {
                page_size: args.page_size,
                max_returned_rows: args.max_returned_rows,
                sql_time_limit_ms: args.sql_time_limit_ms,
                hash_urls: args.hash_urls,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration, catching problems at startup.
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(BrowseError::Config(
                "at least one database file is required".to_string(),
            ));
        }
        for file in &self.files {
            if !file.is_file() {
                return Err(BrowseError::Config(format!(
                    "database file not found: {}",
                    file.display()
                )));
            }
        }
        self.browser.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_browser_config_defaults_are_valid() {
        let config = BrowserConfig::default();
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_returned_rows, 1000);
        assert_eq!(config.sql_time_limit_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_browser_config_rejects_bad_limits() {
        let zero_page = BrowserConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(zero_page.validate().is_err());

        let zero_time = BrowserConfig {
            sql_time_limit_ms: 0,
            ..Default::default()
        };
        assert!(zero_time.validate().is_err());

        let page_over_cap = BrowserConfig {
            page_size: 200,
            max_returned_rows: 100,
            ..Default::default()
        };
        assert!(page_over_cap.validate().is_err());
    }

    #[test]
    fn test_from_args() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let args = ServeArgs::parse_from(["tablescope", &path, "--page-size", "50"]);
        let config = ServerConfig::from_args(args).unwrap();
        assert_eq!(config.http_addr, DEFAULT_HTTP_SOCKET_ADDR);
        assert_eq!(config.browser.page_size, 50);
        assert_eq!(config.files.len(), 1);
    }

    #[test]
    fn test_from_args_rejects_bad_addr_and_missing_file() {
        let args = ServeArgs::parse_from(["tablescope", "a.db", "--http-addr", "nope"]);
        assert!(matches!(
            ServerConfig::from_args(args),
            Err(BrowseError::Config(_))
        ));

        let args = ServeArgs::parse_from(["tablescope", "/definitely/missing.db"]);
        assert!(matches!(
            ServerConfig::from_args(args),
            Err(BrowseError::Config(_))
        ));
    }
}
