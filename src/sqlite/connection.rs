//! Connection manager
//!
//! A [`Database`] owns the single read-only connection to one database file,
//! the watchdog bound to that connection, and the catalog discovered at
//! open. `rusqlite::Connection` is not `Sync`, so the connection sits behind
//! a `Mutex` that doubles as the execution slot: holding the lock is what
//! makes a statement "the one in flight" for the watchdog.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rusqlite::{Connection, OpenFlags};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::catalog::{self, Table};
use super::functions::FunctionRegistry;
use super::watchdog::Watchdog;
use super::{to_json, to_sql_value, Params, QueryResult, QueryResultRow};
use crate::error::{BrowseError, Result};

/// Characters that may introduce a named parameter.
const PARAM_PREFIXES: &[char] = &[':', '@', '$'];

/// Hex digits of the content hash kept in database URLs.
const HASH_LEN: usize = 7;

/// One database file and its long-lived connection.
pub struct Database {
    name: String,
    path: PathBuf,
    hash: String,
    conn: Mutex<Connection>,
    watchdog: Watchdog,
    tables: RwLock<Vec<Table>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open `path` read-only, install `functions`, and discover its tables.
    ///
    /// The database name is the file stem. The content hash is taken once,
    /// here; later changes to the file do not update it.
    pub fn open(path: &Path, functions: &FunctionRegistry) -> Result<Self> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                BrowseError::Config(format!("not a database file: {}", path.display()))
            })?;

        let hash = content_hash(path)?;
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.pragma_update(None, "query_only", 1)?;
        functions.install(&conn)?;

        let tables = catalog::discover(&conn)?;
        let watchdog = Watchdog::spawn(&name, conn.get_interrupt_handle())?;

        info!(
            database = %name,
            path = %path.display(),
            hash = %hash,
            tables = tables.len(),
            functions = functions.len(),
            "Opened database"
        );

        Ok(Self {
            name,
            path: path.to_path_buf(),
            hash,
            conn: Mutex::new(conn),
            watchdog,
            tables: RwLock::new(tables),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Leading hex digits of the SHA-256 of the file contents.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Snapshot of the discovered tables and views, sorted by name.
    pub fn tables(&self) -> Vec<Table> {
        self.tables.read().clone()
    }

    /// Look up a table or view by exact name.
    pub fn table(&self, name: &str) -> Option<Table> {
        self.tables.read().iter().find(|t| t.name == name).cloned()
    }

    /// Recount rows of every table and view, each count bounded by
    /// `time_limit_ms`.
    pub fn refresh_counts(&self, time_limit_ms: u64) {
        let snapshot = self.tables();
        let mut counts = Vec::with_capacity(snapshot.len());
        for table in &snapshot {
            let sql = table.count_sql();
            let count = match self.run_bounded(&sql, &Params::new(), time_limit_ms, Some(1)) {
                Ok(result) => result
                    .rows
                    .first()
                    .and_then(|row| row.values.first())
                    .and_then(|v| v.as_u64()),
                Err(e) => {
                    warn!(
                        database = %self.name,
                        table = %table.name,
                        error = %e,
                        "Row count unavailable"
                    );
                    None
                }
            };
            counts.push((table.name.clone(), count));
        }

        let mut tables = self.tables.write();
        for (name, count) in counts {
            if let Some(table) = tables.iter_mut().find(|t| t.name == name) {
                table.row_count = count;
            }
        }
    }

    /// Run `sql` with `params` under a wall-clock budget.
    ///
    /// At most `fetch_limit` rows are pulled from the engine when given. The
    /// call holds this connection's execution slot for its whole duration;
    /// if the budget elapses first the statement is interrupted and the call
    /// fails with [`BrowseError::Interrupted`].
    pub fn run_bounded(
        &self,
        sql: &str,
        params: &Params,
        time_limit_ms: u64,
        fetch_limit: Option<usize>,
    ) -> Result<QueryResult> {
        let conn = self.conn.lock();
        let start = Instant::now();

        let ticket = self.watchdog.arm(Duration::from_millis(time_limit_ms));
        let outcome = fetch(&conn, sql, params, fetch_limit);
        let fired = self.watchdog.disarm(ticket);
        drop(conn);

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if fired {
            warn!(
                database = %self.name,
                time_limit_ms,
                elapsed_ms,
                "Statement exceeded time limit"
            );
            return Err(BrowseError::Interrupted);
        }

        let result = outcome?;
        debug!(
            database = %self.name,
            rows = result.rows.len(),
            elapsed_ms,
            "Statement executed"
        );
        Ok(result)
    }
}

fn content_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(HASH_LEN);
    Ok(digest)
}

/// Prepare, bind, and step one statement. The statement is finalized before
/// this returns.
fn fetch(
    conn: &Connection,
    sql: &str,
    params: &Params,
    fetch_limit: Option<usize>,
) -> Result<QueryResult> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut bound = Params::new();
    for index in 1..=stmt.parameter_count() {
        let name = stmt
            .parameter_name(index)
            .ok_or_else(|| BrowseError::Sql(format!("parameter {index} must be named")))?
            .trim_start_matches(PARAM_PREFIXES)
            .to_string();
        let value = params
            .get(&name)
            .ok_or_else(|| BrowseError::Sql(format!("missing value for parameter :{name}")))?;
        stmt.raw_bind_parameter(index, to_sql_value(value))?;
        bound.insert(name, value.clone());
    }

    let limit = fetch_limit.unwrap_or(usize::MAX);
    let mut rows = Vec::new();
    let mut cursor = stmt.raw_query();
    while rows.len() < limit {
        let Some(row) = cursor.next()? else {
            break;
        };
        let values = (0..columns.len())
            .map(|i| row.get_ref(i).map(to_json))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.push(QueryResultRow { values });
    }

    Ok(QueryResult {
        columns,
        rows,
        params: bound,
        truncated: false,
        next: None,
    })
}
