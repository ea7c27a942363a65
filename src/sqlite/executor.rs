//! Read-only statement execution

use serde::{Deserialize, Serialize};

use super::{Database, Params, QueryResult};
use crate::error::{BrowseError, Result};

/// One statement to run, with its parameters and time budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub sql: String,
    #[serde(default)]
    pub params: Params,
    pub time_limit_ms: u64,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>, time_limit_ms: u64) -> Self {
        Self {
            sql: sql.into(),
            params: Params::new(),
            time_limit_ms,
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// Reject anything whose trimmed, case-folded text does not start with
/// `select`. Statements opening with `with` are rejected too.
pub fn ensure_select(sql: &str) -> Result<()> {
    let head: String = sql.trim_start().chars().take(6).collect();
    if head.eq_ignore_ascii_case("select") {
        Ok(())
    } else {
        Err(BrowseError::NotSelect)
    }
}

/// Validate and run a read-only statement on `db`.
///
/// Row capping is the caller's job: `fetch_limit` is passed straight through
/// to the connection.
pub fn execute_read_only(
    db: &Database,
    request: &QueryRequest,
    fetch_limit: Option<usize>,
) -> Result<QueryResult> {
    ensure_select(&request.sql)?;
    db.run_bounded(
        &request.sql,
        &request.params,
        request.time_limit_ms,
        fetch_limit,
    )
}
