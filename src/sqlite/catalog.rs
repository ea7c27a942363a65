//! Table and view discovery
//!
//! Runs once per database at startup. Row counts go through the bounded
//! execution path, so a pathological view cannot stall startup; a count that
//! runs out of budget is recorded as unknown.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::escape_identifier;
use crate::error::Result;

/// Type affinity of a column, derived from its declared type the way the
/// engine derives it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affinity {
    Text,
    Numeric,
    Integer,
    Real,
    /// No declared type. Values are compared exactly as stored, so `1` and
    /// `'1'` are different keys.
    #[default]
    Blob,
}

impl Affinity {
    pub fn of_declared(declared: &str) -> Self {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("INT") {
            Affinity::Integer
        } else if ["CHAR", "CLOB", "TEXT"].iter().any(|t| declared.contains(t)) {
            Affinity::Text
        } else if declared.is_empty() || declared.contains("BLOB") {
            Affinity::Blob
        } else if ["REAL", "FLOA", "DOUB"].iter().any(|t| declared.contains(t)) {
            Affinity::Real
        } else {
            Affinity::Numeric
        }
    }
}

/// A table or view and the key used to order and address its rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    /// Primary-key columns in declared key order. Empty means the table is
    /// addressed by `rowid` (or, for views, by position).
    pub primary_keys: Vec<String>,
    /// Affinity of each primary-key column, aligned with `primary_keys`.
    pub key_affinities: Vec<Affinity>,
    pub is_view: bool,
    /// Rows carry a `rowid` (false for views and `WITHOUT ROWID` tables).
    pub has_rowid: bool,
    /// Some primary-key column may hold NULL. The engine only enforces
    /// NOT NULL keys on `WITHOUT ROWID` tables and `INTEGER PRIMARY KEY`.
    pub nullable_key: bool,
    /// Approximate row count; `None` when counting ran out of time budget.
    pub row_count: Option<u64>,
}

impl Table {
    /// `select count(*)` for this table.
    pub fn count_sql(&self) -> String {
        format!("select count(*) from {}", escape_identifier(&self.name))
    }
}

/// Read table and view definitions from `sqlite_master`, sorted by name.
///
/// Row counts are left unset; see `Database::refresh_counts`.
pub fn discover(conn: &Connection) -> Result<Vec<Table>> {
    let mut stmt = conn.prepare(
        "select name, type from sqlite_master \
         where type in ('table', 'view') and name not like 'sqlite_%' \
         order by name",
    )?;
    let entries = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut info = conn.prepare(
        "select name, type, \"notnull\", pk from pragma_table_info(?1) order by cid",
    )?;
    let mut tables = Vec::with_capacity(entries.len());
    for (name, kind) in entries {
        let described = info
            .query_map([&name], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    declared: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    not_null: row.get::<_, i64>(2)? != 0,
                    pk: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let is_view = kind == "view";
        let columns = described.iter().map(|c| c.name.clone()).collect();
        let mut keyed: Vec<&ColumnInfo> = described.iter().filter(|c| c.pk > 0).collect();
        keyed.sort_by_key(|c| c.pk);

        let has_rowid = !is_view && has_rowid(conn, &name);
        let rowid_alias = keyed.len() == 1 && keyed[0].declared.eq_ignore_ascii_case("INTEGER");
        let nullable_key = has_rowid && !rowid_alias && keyed.iter().any(|c| !c.not_null);

        tables.push(Table {
            name,
            columns,
            primary_keys: keyed.iter().map(|c| c.name.clone()).collect(),
            key_affinities: keyed.iter().map(|c| Affinity::of_declared(&c.declared)).collect(),
            is_view,
            has_rowid,
            nullable_key,
            row_count: None,
        });
    }
    Ok(tables)
}

struct ColumnInfo {
    name: String,
    declared: String,
    not_null: bool,
    pk: i64,
}

/// `WITHOUT ROWID` tables refuse to prepare a `rowid` reference.
fn has_rowid(conn: &Connection, table: &str) -> bool {
    conn.prepare(&format!("select rowid from {} limit 0", escape_identifier(table)))
        .is_ok()
}
