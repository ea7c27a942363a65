#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # tablescope
//!
//! A read-only JSON browser for SQLite database files.
//!
//! ## Features
//!
//! - **Path-safe names**: database, table and row-key strings of any shape
//!   (slashes, spaces, leading digits, compound keys) round-trip through a
//!   single URL path segment
//! - **Hard time budgets**: every statement runs under a watchdog that
//!   interrupts it once its budget elapses, without touching other queries
//! - **Stable pagination**: keyset pages over tables, chained by
//!   continuation tokens; ad hoc SQL is capped and flagged as truncated
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve two databases on the default address (127.0.0.1:8001)
//! $ tablescope fixtures.db other.db
//!
//! # List tables
//! $ curl http://127.0.0.1:8001/fixtures.json
//!
//! # Page through a table, rows as objects
//! $ curl 'http://127.0.0.1:8001/fixtures/no_primary_key.jsono?_size=50'
//!
//! # Ad hoc SQL with a named parameter and a tighter time budget
//! $ curl 'http://127.0.0.1:8001/fixtures.json?sql=select+*+from+t+where+id=:id&id=3&_sql_time_limit_ms=50'
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use tablescope::{Browser, BrowserConfig, FunctionRegistry, RequestOptions};
//! use tablescope::codec::Format;
//!
//! fn main() -> tablescope::Result<()> {
//!     let browser = Browser::open(
//!         BrowserConfig::default(),
//!         &["fixtures.db".into()],
//!         &FunctionRegistry::new(),
//!     )?;
//!     let payload = browser.query(
//!         "fixtures",
//!         "select 1 + 1 as two",
//!         &RequestOptions::default(),
//!         Format::Objects,
//!     )?;
//!     println!("{}", serde_json::to_string(&payload).unwrap_or_default());
//!     Ok(())
//! }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod browser;
pub mod codec;
pub mod config;
pub mod error;
pub mod pagination;
pub mod response;
pub mod server;
pub mod sqlite;

pub use browser::{Browser, DatabaseRoute, RequestOptions, RequestTarget};
pub use config::{BrowserConfig, ServeArgs, ServerConfig};
pub use error::{BrowseError, Result};
pub use server::Server;
pub use sqlite::{Database, FunctionRegistry, QueryRequest, QueryResult};
