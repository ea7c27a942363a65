//! Default constants for tablescope configuration
//!
//! These constants define the default values used throughout the configuration
//! system when no explicit value is provided.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default listen address for the HTTP API
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8001";

/// Default HTTP socket address (const, no parsing needed)
pub(crate) const DEFAULT_HTTP_SOCKET_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8001);

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default number of rows per table or view page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default cap on rows returned by an ad hoc query
pub const DEFAULT_MAX_RETURNED_ROWS: usize = 1000;

/// Default statement time budget in milliseconds
pub const DEFAULT_SQL_TIME_LIMIT_MS: u64 = 1000;

/// Content-hash database URLs are off unless asked for
pub const DEFAULT_HASH_URLS: bool = false;

/// Name of the config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tablescope.toml";
