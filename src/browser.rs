//! Request-level facade
//!
//! [`Browser`] owns every opened [`Database`] and answers the four request
//! kinds: the index, a database listing (or ad hoc query), a table or view
//! page, and a single-row lookup. Every method blocks on the engine, so the
//! HTTP layer calls them from blocking worker threads.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::codec::{decode, decode_name, encode, ensure_unambiguous, split_format, Format};
use crate::config::BrowserConfig;
use crate::error::{BrowseError, Result};
use crate::pagination::{
    ad_hoc_fetch_limit, cap_ad_hoc, effective_page_size, next_url, plan_listing,
    plan_row_lookup, NEXT_PARAM,
};
use crate::response::{
    row_path, DatabaseEntry, DatabasePayload, IndexPayload, RowOutcome, RowsPayload, TableEntry,
};
use crate::sqlite::{execute_read_only, Database, FunctionRegistry, Params, QueryRequest, Table};

/// Query parameter carrying ad hoc SQL.
pub const SQL_PARAM: &str = "sql";
/// Query parameter overriding the page size of a listing.
pub const SIZE_PARAM: &str = "_size";
/// Query parameter overriding the statement time budget.
pub const TIME_LIMIT_PARAM: &str = "_sql_time_limit_ms";

/// Options carried in a request's query string.
///
/// Parameters starting with `_` are reserved for the browser itself; every
/// other parameter except `sql` is a candidate SQL parameter value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub sql: Option<String>,
    pub next: Option<String>,
    pub size: Option<usize>,
    pub time_limit_ms: Option<u64>,
    pub params: Params,
}

impl RequestOptions {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let mut options = Self::default();
        for (name, value) in pairs {
            match name.as_str() {
                SQL_PARAM => options.sql = Some(value.clone()),
                NEXT_PARAM => options.next = Some(value.clone()),
                SIZE_PARAM => options.size = Some(parse_positive(name, value)?),
                TIME_LIMIT_PARAM => options.time_limit_ms = Some(parse_positive(name, value)?),
                reserved if reserved.starts_with('_') => {}
                _ => {
                    options
                        .params
                        .insert(name.clone(), serde_json::Value::String(value.clone()));
                }
            }
        }
        Ok(options)
    }
}

fn parse_positive<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(BrowseError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Where a listing was requested from, for building `next_url`.
#[derive(Debug, Clone, Default)]
pub struct RequestTarget {
    /// Path exactly as requested, still percent-encoded.
    pub path: String,
    /// Raw query string, if any.
    pub query: Option<String>,
}

/// How a request path named its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseRoute {
    /// By encoded name alone.
    Name,
    /// By encoded name plus content hash. The response can be cached for as
    /// long as the file is served unchanged.
    Hashed,
    /// By name alone while hashed URLs are on; the request belongs under
    /// this token instead.
    Redirect(String),
}

/// All databases being served.
#[derive(Debug)]
pub struct Browser {
    config: BrowserConfig,
    databases: Vec<Arc<Database>>,
}

impl Browser {
    /// Open every file in `files`, install `functions` on each connection and
    /// run the startup checks.
    ///
    /// Fails with [`BrowseError::AmbiguousIdentifier`] when two databases, or
    /// two tables of one database, share a path token.
    pub fn open(
        config: BrowserConfig,
        files: &[PathBuf],
        functions: &FunctionRegistry,
    ) -> Result<Self> {
        config.validate()?;

        let databases = files
            .iter()
            .map(|path| Database::open(path, functions).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        ensure_unambiguous(databases.iter().map(|db| db.name()))?;
        for db in &databases {
            let tables = db.tables();
            ensure_unambiguous(tables.iter().map(|t| t.name.as_str()))?;
            db.refresh_counts(config.sql_time_limit_ms);
        }

        info!(databases = databases.len(), "Browser ready");
        Ok(Self { config, databases })
    }

    /// Resolve a database path token: the encoded name, optionally followed
    /// by `-` and the content hash.
    pub fn database(&self, token: &str) -> Result<Arc<Database>> {
        self.resolve(token).map(|(db, _)| db)
    }

    fn resolve(&self, token: &str) -> Result<(Arc<Database>, bool)> {
        let hashed = self.databases.iter().find(|db| {
            token
                .strip_suffix(db.hash())
                .and_then(|rest| rest.strip_suffix('-'))
                .and_then(decode)
                .is_some_and(|name| name == db.name())
        });
        if let Some(db) = hashed {
            return Ok((db.clone(), true));
        }

        let name = decode_name("database", token)?;
        self.databases
            .iter()
            .find(|db| db.name() == name)
            .map(|db| (db.clone(), false))
            .ok_or_else(|| BrowseError::not_found("database", &name))
    }

    /// Classify how `token` names its database.
    pub fn route(&self, token: &str) -> Result<DatabaseRoute> {
        let (db, hashed) = self.resolve(token)?;
        Ok(if hashed {
            DatabaseRoute::Hashed
        } else if self.config.hash_urls {
            DatabaseRoute::Redirect(hashed_token(&db))
        } else {
            DatabaseRoute::Name
        })
    }

    /// Path token under which `db` is served.
    fn path_token(&self, db: &Database) -> String {
        if self.config.hash_urls {
            hashed_token(db)
        } else {
            encode(db.name())
        }
    }

    fn table(db: &Database, token: &str) -> Result<Table> {
        let name = decode_name("table", token)?;
        db.table(&name)
            .ok_or_else(|| BrowseError::not_found("table", &name))
    }

    fn time_limit(&self, options: &RequestOptions) -> u64 {
        options.time_limit_ms.unwrap_or(self.config.sql_time_limit_ms)
    }

    /// `GET /`
    pub fn index(&self) -> IndexPayload {
        let databases = self
            .databases
            .iter()
            .map(|db| {
                let tables = db.tables();
                let views_count = tables.iter().filter(|t| t.is_view).count();
                DatabaseEntry {
                    name: db.name().to_string(),
                    hash: db.hash().to_string(),
                    path: format!("/{}", self.path_token(db)),
                    tables_count: tables.len() - views_count,
                    views_count,
                }
            })
            .collect();
        IndexPayload { databases }
    }

    /// `GET /{database}` without `sql`: its tables and views.
    pub fn database_listing(&self, db_token: &str) -> Result<DatabasePayload> {
        let db = self.database(db_token)?;
        let token = self.path_token(&db);
        let tables = db
            .tables()
            .iter()
            .map(|table| TableEntry::new(&token, table))
            .collect();
        Ok(DatabasePayload {
            ok: true,
            database: db.name().to_string(),
            tables,
        })
    }

    /// `GET /{database}?sql=...`: run ad hoc SQL, capped at
    /// `max_returned_rows`.
    pub fn query(
        &self,
        db_token: &str,
        sql: &str,
        options: &RequestOptions,
        format: Format,
    ) -> Result<RowsPayload> {
        let db = self.database(db_token)?;
        let request =
            QueryRequest::new(sql, self.time_limit(options)).with_params(options.params.clone());
        let max = self.config.max_returned_rows;

        debug!(database = %db.name(), sql = %sql, "Running ad hoc query");
        let result = execute_read_only(&db, &request, Some(ad_hoc_fetch_limit(max)))?;
        let result = cap_ad_hoc(result, max);
        Ok(RowsPayload::new(db.name(), sql, result, format))
    }

    /// `GET /{database}/{table}`: one page of a table or view.
    pub fn table_page(
        &self,
        db_token: &str,
        table_segment: &str,
        options: &RequestOptions,
        target: &RequestTarget,
    ) -> Result<RowsPayload> {
        let (table_token, format) = split_format(table_segment);
        let db = self.database(db_token)?;
        let table = Self::table(&db, table_token)?;

        let page_size = effective_page_size(
            options.size,
            self.config.page_size,
            self.config.max_returned_rows,
        );
        let plan = plan_listing(&table, page_size, options.next.as_deref())?;
        let request =
            QueryRequest::new(plan.sql.clone(), self.time_limit(options)).with_params(plan.params.clone());
        let result = execute_read_only(&db, &request, Some(plan.fetch_limit()))?;
        let result = plan.paginate(result)?;

        let url = result
            .next
            .as_deref()
            .map(|token| next_url(&target.path, target.query.as_deref(), token));
        Ok(RowsPayload::new(db.name(), &plan.sql, result, format)
            .for_table(&table)
            .with_next_url(url))
    }

    /// `GET /{database}/{table}/{row}`: one row by key.
    ///
    /// A key that decodes to an existing row but is not in canonical form
    /// yields [`RowOutcome::Redirect`] to the canonical path.
    pub fn row(
        &self,
        db_token: &str,
        table_token: &str,
        row_segment: &str,
        options: &RequestOptions,
    ) -> Result<RowOutcome> {
        let (key_token, format) = split_format(row_segment);
        let suffix = &row_segment[key_token.len()..];
        let db = self.database(db_token)?;
        let table = Self::table(&db, table_token)?;

        let plan = plan_row_lookup(&table, key_token)?;
        let request =
            QueryRequest::new(plan.sql.clone(), self.time_limit(options)).with_params(plan.params);
        let mut result = execute_read_only(&db, &request, Some(1))?;
        if result.rows.is_empty() {
            return Err(BrowseError::not_found("row", key_token));
        }

        let canonical = plan.key.key_of(&result, 0)?;
        if canonical != key_token {
            let location = row_path(&self.path_token(&db), &table.name, &canonical, suffix);
            debug!(from = %key_token, to = %location, "Redirecting to canonical row");
            return Ok(RowOutcome::Redirect(location));
        }
        plan.key.strip_hidden(&mut result);

        Ok(RowOutcome::Found(
            RowsPayload::new(db.name(), &plan.sql, result, format).for_table(&table),
        ))
    }
}

fn hashed_token(db: &Database) -> String {
    format!("{}-{}", encode(db.name()), db.hash())
}
