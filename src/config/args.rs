//! Command-line arguments for the tablescope server
//!
//! This module defines the CLI arguments structure using clap.

use clap::Parser;
use std::path::PathBuf;

use super::defaults::*;

/// Command-line arguments for the tablescope server
#[derive(Parser, Debug, Clone)]
#[command(name = "tablescope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Read-only JSON browser for SQLite database files")]
pub struct ServeArgs {
    /// SQLite database files to serve
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Path to configuration file (TOML format)
    /// If not specified, looks for tablescope.toml in the current directory
    #[arg(short, long, env = "TABLESCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on for HTTP API
    #[arg(long, env = "TABLESCOPE_HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
    pub http_addr: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TABLESCOPE_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Rows per page when listing a table or view
    #[arg(long, env = "TABLESCOPE_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Maximum rows returned by an ad hoc query; also caps `_size`
    #[arg(long, env = "TABLESCOPE_MAX_RETURNED_ROWS", default_value_t = DEFAULT_MAX_RETURNED_ROWS)]
    pub max_returned_rows: usize,

    /// Default time budget per statement in milliseconds.
    /// Requests may override it with `_sql_time_limit_ms`.
    #[arg(long, env = "TABLESCOPE_SQL_TIME_LIMIT_MS", default_value_t = DEFAULT_SQL_TIME_LIMIT_MS)]
    pub sql_time_limit_ms: u64,

    /// Serve each database under `{name}-{hash}` (hash of the file contents)
    /// and redirect bare database names there
    #[arg(long, env = "TABLESCOPE_HASH_URLS")]
    pub hash_urls: bool,
}
