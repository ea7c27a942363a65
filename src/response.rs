//! Response assembler
//!
//! Turns executor output into the JSON payloads served to clients. Rows come
//! out either as arrays aligned to `columns` or as column-keyed objects,
//! depending on the requested [`Format`].

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::codec::{encode, Format};
use crate::sqlite::{Params, QueryResult, Table};

/// The statement a payload was produced by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEcho {
    pub sql: String,
    /// Only parameters the statement actually bound.
    pub params: Params,
}

/// Body of a table listing, row lookup or ad hoc query.
#[derive(Debug, Clone, Serialize)]
pub struct RowsPayload {
    pub ok: bool,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_keys: Option<Vec<String>>,
    pub query: QueryEcho,
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
    pub truncated: bool,
    pub next: Option<String>,
    pub next_url: Option<String>,
}

impl RowsPayload {
    /// Assemble a payload from `result`, shaping rows for `format`.
    pub fn new(database: &str, sql: &str, result: QueryResult, format: Format) -> Self {
        let rows = shape_rows(&result, format);
        Self {
            ok: true,
            database: database.to_string(),
            table: None,
            primary_keys: None,
            query: QueryEcho {
                sql: sql.to_string(),
                params: result.params,
            },
            columns: result.columns,
            rows,
            truncated: result.truncated,
            next: result.next,
            next_url: None,
        }
    }

    pub fn for_table(mut self, table: &Table) -> Self {
        self.table = Some(table.name.clone());
        self.primary_keys = Some(table.primary_keys.clone());
        self
    }

    pub fn with_next_url(mut self, next_url: Option<String>) -> Self {
        self.next_url = next_url;
        self
    }
}

/// Rows of `result` in the shape `format` asks for.
pub fn shape_rows(result: &QueryResult, format: Format) -> Vec<Value> {
    match format {
        Format::Arrays => result
            .rows
            .iter()
            .map(|row| Value::Array(row.values.clone()))
            .collect(),
        Format::Objects => (0..result.rows.len())
            .filter_map(|i| result.mapping(i))
            .map(Value::Object)
            .collect(),
    }
}

/// One table or view in a database listing.
#[derive(Debug, Clone, Serialize)]
pub struct TableEntry {
    pub name: String,
    pub path: String,
    pub columns: Vec<String>,
    pub primary_keys: Vec<String>,
    pub is_view: bool,
    /// Approximate row count, `null` when counting ran out of time.
    pub table_rows: Option<u64>,
}

impl TableEntry {
    /// Entry for `table` in the database served under `db_token`.
    pub fn new(db_token: &str, table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            path: format!("/{}/{}", db_token, encode(&table.name)),
            columns: table.columns.clone(),
            primary_keys: table.primary_keys.clone(),
            is_view: table.is_view,
            table_rows: table.row_count,
        }
    }
}

/// Body of `GET /{database}` without `sql`.
#[derive(Debug, Clone, Serialize)]
pub struct DatabasePayload {
    pub ok: bool,
    pub database: String,
    pub tables: Vec<TableEntry>,
}

/// One database in the index.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseEntry {
    pub name: String,
    pub hash: String,
    pub path: String,
    pub tables_count: usize,
    pub views_count: usize,
}

/// Body of `GET /`: an object with one entry per database, keyed by name,
/// in the order the databases were opened.
#[derive(Debug, Clone, Default)]
pub struct IndexPayload {
    pub databases: Vec<DatabaseEntry>,
}

impl Serialize for IndexPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.databases.len()))?;
        for db in &self.databases {
            map.serialize_entry(&db.name, db)?;
        }
        map.end()
    }
}

/// Body of every failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub ok: bool,
    pub error: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: message.into(),
        }
    }
}

/// Outcome of a single-row lookup.
#[derive(Debug, Clone)]
pub enum RowOutcome {
    Found(RowsPayload),
    /// The supplied key was not canonical; the client should go here instead.
    Redirect(String),
}

/// Canonical path of one row in the database served under `db_token`.
pub fn row_path(db_token: &str, table: &str, key: &str, suffix: &str) -> String {
    format!("/{}/{}/{}{}", db_token, encode(table), key, suffix)
}
