//! SQLite access layer
//!
//! Each database file gets exactly one long-lived, read-only
//! [`Database`] connection for the life of the process. All statements on a
//! connection run one at a time through its execution slot, under a
//! watchdog that interrupts anything running past its time budget.
//!
//! ## Layout
//!
//! - [`functions`]: extension scalar functions installed at open time
//! - [`watchdog`]: the per-connection interrupt timer
//! - [`connection`]: the connection manager and `run_bounded`
//! - [`catalog`]: one-time discovery of tables, views and keys
//! - [`executor`]: read-only statement validation on top of `run_bounded`

pub mod catalog;
pub mod connection;
pub mod executor;
pub mod functions;
pub mod watchdog;

use std::collections::BTreeMap;

use base64::Engine;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use catalog::{Affinity, Table};
pub use connection::Database;
pub use executor::{execute_read_only, QueryRequest};
pub use functions::{ExtensionFunction, FunctionRegistry};

/// Named statement parameters, keyed without their `:`/`@`/`$` prefix.
///
/// Values from a query string are always JSON strings. Key values planned
/// from a row key or continuation token keep the type the row had.
pub type Params = BTreeMap<String, Value>;

/// Result of a statement execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in engine-reported order.
    pub columns: Vec<String>,
    /// Row data, each row aligned positionally with `columns`.
    pub rows: Vec<QueryResultRow>,
    /// Parameters that were actually bound.
    pub params: Params,
    /// More rows existed past the applied cap (ad hoc queries only).
    pub truncated: bool,
    /// Continuation token (table/view listings only).
    pub next: Option<String>,
}

/// A single result row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResultRow {
    pub values: Vec<Value>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of `column` in the result, if present.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value of `column` in `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.values.get(idx)
    }

    /// Row `row` as a column-keyed mapping, column order preserved.
    pub fn mapping(&self, row: usize) -> Option<Map<String, Value>> {
        let row = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.values.iter().cloned())
                .collect(),
        )
    }
}

/// Convert an engine value into its JSON form.
///
/// Blobs become standard base64 strings.
pub fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::String(base64::engine::general_purpose::STANDARD.encode(b)),
    }
}

/// Convert a parameter value into the engine value it binds as.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// Render a JSON cell as plain text, as rowid keys carry it.
pub fn key_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Quote an identifier for use in SQL unless it is a plain, non-reserved name.
pub fn escape_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_keyword(name);
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

const KEYWORDS: &[&str] = &[
    "abort", "action", "add", "after", "all", "alter", "always", "analyze", "and", "as", "asc",
    "attach", "autoincrement", "before", "begin", "between", "by", "cascade", "case", "cast",
    "check", "collate", "column", "commit", "conflict", "constraint", "create", "cross",
    "current", "current_date", "current_time", "current_timestamp", "database", "default",
    "deferrable", "deferred", "delete", "desc", "detach", "distinct", "do", "drop", "each",
    "else", "end", "escape", "except", "exclude", "exclusive", "exists", "explain", "fail",
    "filter", "first", "following", "for", "foreign", "from", "full", "generated", "glob",
    "group", "groups", "having", "if", "ignore", "immediate", "in", "index", "indexed",
    "initially", "inner", "insert", "instead", "intersect", "into", "is", "isnull", "join",
    "key", "last", "left", "like", "limit", "match", "materialized", "natural", "no", "not",
    "nothing", "notnull", "null", "nulls", "of", "offset", "on", "or", "order", "others",
    "outer", "over", "partition", "plan", "pragma", "preceding", "primary", "query", "raise",
    "range", "recursive", "references", "regexp", "reindex", "release", "rename", "replace",
    "restrict", "returning", "right", "rollback", "row", "rows", "savepoint",
    "select", "set", "table", "temp", "temporary", "then", "ties", "to", "transaction",
    "trigger", "unbounded", "union", "unique", "update", "using", "vacuum", "values", "view",
    "virtual", "when", "where", "window", "with", "without",
];

fn is_keyword(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    KEYWORDS.contains(&lower.as_str())
}
