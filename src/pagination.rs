//! Pagination planner
//!
//! Two capping policies live here:
//!
//! - **Listings** of a table or view fetch `page_size + 1` rows in ascending
//!   ordering-key order. The extra row only signals that another page exists;
//!   it is dropped and a continuation token is built from the last kept row.
//!   Listings never set `truncated`.
//! - **Ad hoc SQL** fetches `max_returned_rows + 1` rows. The extra row is
//!   dropped and `truncated` is set. Ad hoc results never carry a token.

use serde_json::{Number, Value};

use crate::codec::{
    decode, decode_row_key, encode, encode_row_key, KEY_SEPARATOR, NULL_COMPONENT, TEXT_TAG,
};
use crate::error::{BrowseError, Result};
use crate::sqlite::{escape_identifier, key_text, Affinity, Params, QueryResult, Table};

/// Name of the query-string parameter carrying the continuation token.
pub const NEXT_PARAM: &str = "_next";

/// A primary-key column and the affinity its key values are read with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub name: String,
    pub affinity: Affinity,
}

/// How rows of a table or view are ordered and addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingKey {
    /// Declared primary-key columns, in key order. With `tiebreak`, `rowid`
    /// is appended to the ordering and selected as a hidden column, and keys
    /// holding NULL carry the rowid as a trailing component.
    PrimaryKey { columns: Vec<KeyColumn>, tiebreak: bool },
    /// The engine's implicit `rowid`.
    RowId,
    /// Position in engine-native order. Used for views, which have no rowid.
    Position,
}

impl OrderingKey {
    pub fn for_table(table: &Table) -> Self {
        if table.is_view {
            OrderingKey::Position
        } else if table.primary_keys.is_empty() {
            OrderingKey::RowId
        } else {
            let columns = table
                .primary_keys
                .iter()
                .enumerate()
                .map(|(i, name)| KeyColumn {
                    name: name.clone(),
                    affinity: table.key_affinities.get(i).copied().unwrap_or_default(),
                })
                .collect();
            OrderingKey::PrimaryKey {
                columns,
                tiebreak: table.nullable_key,
            }
        }
    }

    fn selects_rowid(&self) -> bool {
        matches!(
            self,
            OrderingKey::RowId | OrderingKey::PrimaryKey { tiebreak: true, .. }
        )
    }

    fn select_list(&self) -> &'static str {
        if self.selects_rowid() {
            "rowid, *"
        } else {
            "*"
        }
    }

    /// Drop the tiebreak `rowid` column, which is selected only to build keys.
    pub fn strip_hidden(&self, result: &mut QueryResult) {
        if !matches!(self, OrderingKey::PrimaryKey { tiebreak: true, .. }) {
            return;
        }
        if result.columns.first().map(String::as_str) == Some("rowid") {
            result.columns.remove(0);
            for row in &mut result.rows {
                if !row.values.is_empty() {
                    row.values.remove(0);
                }
            }
        }
    }

    /// Key of row `row` in `result`, as a row-key token.
    pub fn key_of(&self, result: &QueryResult, row: usize) -> Result<String> {
        let value = |column: &str| {
            result.get(row, column).ok_or_else(|| {
                BrowseError::Sql(format!("ordering column {column} missing from result"))
            })
        };
        match self {
            OrderingKey::PrimaryKey { columns, tiebreak } => {
                let mut parts = Vec::with_capacity(columns.len() + 1);
                let mut has_null = false;
                for column in columns {
                    let v = value(&column.name)?;
                    has_null |= v.is_null();
                    parts.push(encode_key_value(v, column.affinity));
                }
                if has_null && *tiebreak {
                    parts.push(key_text(value("rowid")?));
                }
                Ok(parts.join(&KEY_SEPARATOR.to_string()))
            }
            OrderingKey::RowId => Ok(encode_row_key(&[key_text(value("rowid")?)])),
            OrderingKey::Position => Err(BrowseError::Sql(
                "rows ordered by position have no key".to_string(),
            )),
        }
    }
}

/// Parse `text` as the number it spells, if it spells one.
fn numeric_value(text: &str) -> Option<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    let numeric = !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !numeric {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Encode one key value as a row-key component.
///
/// Columns without a declared type compare values exactly as stored, so
/// there text that reads as a number is tagged to keep it text.
pub fn encode_key_value(value: &Value, affinity: Affinity) -> String {
    match value {
        Value::Null => NULL_COMPONENT.to_string(),
        Value::String(s) if affinity == Affinity::Blob && numeric_value(s).is_some() => {
            format!("{TEXT_TAG}{}", encode(s))
        }
        Value::String(s) => encode(s),
        other => encode(&other.to_string()),
    }
}

/// Decode one row-key component into the value it binds as.
///
/// For typed columns the engine converts text to the column's affinity, so
/// untagged components bind as text. Untyped columns get numbers back as
/// numbers.
pub fn decode_key_value(part: &str, affinity: Affinity) -> Option<Value> {
    if part == NULL_COMPONENT {
        return Some(Value::Null);
    }
    if let Some(text) = part.strip_prefix(TEXT_TAG) {
        return decode(text).map(Value::String);
    }
    let text = decode(part)?;
    if affinity == Affinity::Blob {
        if let Some(number) = numeric_value(&text) {
            return Some(number);
        }
    }
    Some(Value::String(text))
}

/// Typed values of a decoded primary-key token.
#[derive(Debug, Clone, PartialEq)]
struct KeyValues {
    values: Vec<Value>,
    /// Tiebreak rowid, present exactly when some value is NULL.
    rowid: Option<i64>,
}

impl KeyValues {
    fn decode(token: &str, columns: &[KeyColumn], tiebreak: bool) -> Result<Self> {
        let parts: Vec<&str> = token.split(KEY_SEPARATOR).collect();
        let arity = columns.len();
        let (key_parts, rowid_part) = match parts.len() {
            n if n == arity => (&parts[..], None),
            n if tiebreak && n == arity + 1 => (&parts[..arity], Some(parts[arity])),
            n => {
                return Err(BrowseError::malformed_key(
                    token,
                    format!("expected {arity} component(s), got {n}"),
                ))
            }
        };

        let values = key_parts
            .iter()
            .zip(columns)
            .map(|(part, column)| {
                decode_key_value(part, column.affinity)
                    .ok_or_else(|| BrowseError::malformed_key(token, "invalid escape"))
            })
            .collect::<Result<Vec<_>>>()?;
        let rowid = rowid_part.map(parse_rowid).transpose()?;

        match (values.iter().any(Value::is_null), rowid) {
            (true, None) => Err(BrowseError::malformed_key(
                token,
                "a key holding NULL must end with a rowid",
            )),
            (false, Some(_)) => Err(BrowseError::malformed_key(token, "unexpected rowid")),
            _ => Ok(Self { values, rowid }),
        }
    }

    fn placeholder(&self, i: usize) -> String {
        format!(":p{i}")
    }

    fn rowid_placeholder(&self) -> String {
        self.placeholder(self.values.len())
    }

    /// `column = value`, or `column is null` for a NULL component.
    fn equals(&self, names: &[String], i: usize) -> String {
        if self.values[i].is_null() {
            format!("{} is null", names[i])
        } else {
            format!("{} = {}", names[i], self.placeholder(i))
        }
    }

    /// `column` sorts after this component. NULL sorts first.
    fn after(&self, names: &[String], i: usize) -> String {
        if self.values[i].is_null() {
            format!("{} is not null", names[i])
        } else {
            format!("{} > {}", names[i], self.placeholder(i))
        }
    }

    /// Filter selecting rows strictly after this key in key order.
    fn after_filter(&self, names: &[String]) -> String {
        let n = names.len();
        if self.rowid.is_none() {
            // NULL keys sort first and compare unknown, so a NULL-free
            // bound excludes them from a row-value comparison.
            let marks: Vec<String> = (0..n).map(|i| self.placeholder(i)).collect();
            return if n == 1 {
                format!("{} > {}", names[0], marks[0])
            } else {
                format!("({}) > ({})", names.join(", "), marks.join(", "))
            };
        }

        let mut terms: Vec<String> = (0..n)
            .map(|i| {
                let mut conds: Vec<String> = (0..i).map(|j| self.equals(names, j)).collect();
                conds.push(self.after(names, i));
                conds.join(" and ")
            })
            .collect();
        let mut same_key: Vec<String> = (0..n).map(|j| self.equals(names, j)).collect();
        same_key.push(format!("rowid > {}", self.rowid_placeholder()));
        terms.push(same_key.join(" and "));
        terms
            .iter()
            .map(|t| format!("({t})"))
            .collect::<Vec<_>>()
            .join(" or ")
    }

    /// Filter selecting exactly the row with this key.
    fn equals_filter(&self, names: &[String]) -> String {
        let mut conds: Vec<String> = (0..names.len()).map(|i| self.equals(names, i)).collect();
        if self.rowid.is_some() {
            conds.push(format!("rowid = {}", self.rowid_placeholder()));
        }
        conds.join(" and ")
    }

    fn params(&self) -> Params {
        let mut params: Params = self
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (format!("p{i}"), v.clone()))
            .collect();
        if let Some(rowid) = self.rowid {
            params.insert(format!("p{}", self.values.len()), Value::from(rowid));
        }
        params
    }
}

fn rowid_params(rowid: i64) -> Params {
    Params::from([("p0".to_string(), Value::from(rowid))])
}

fn parse_rowid(token: &str) -> Result<i64> {
    let parts = decode_row_key(token, 1)?;
    parts[0]
        .parse::<i64>()
        .map_err(|_| BrowseError::malformed_key(token, "rowid must be an integer"))
}

/// Clamp a requested page size into `1..=max_returned_rows`.
pub fn effective_page_size(requested: Option<usize>, default: usize, max_returned_rows: usize) -> usize {
    requested.unwrap_or(default).clamp(1, max_returned_rows.max(1))
}

/// A planned listing page.
#[derive(Debug, Clone)]
pub struct ListingPlan {
    pub sql: String,
    pub params: Params,
    pub page_size: usize,
    key: OrderingKey,
    offset: u64,
}

impl ListingPlan {
    /// Rows to pull from the engine: one more than the page holds.
    pub fn fetch_limit(&self) -> usize {
        self.page_size + 1
    }

    /// Cut `result` down to one page and attach the continuation token.
    pub fn paginate(&self, mut result: QueryResult) -> Result<QueryResult> {
        result.truncated = false;
        result.next = None;
        if result.rows.len() > self.page_size {
            result.rows.truncate(self.page_size);
            let next = match self.key {
                OrderingKey::Position => (self.offset + self.page_size as u64).to_string(),
                _ => self.key.key_of(&result, self.page_size - 1)?,
            };
            result.next = Some(next);
        }
        self.key.strip_hidden(&mut result);
        Ok(result)
    }
}

/// Plan one page of `table`, resuming after `token` when given.
pub fn plan_listing(table: &Table, page_size: usize, token: Option<&str>) -> Result<ListingPlan> {
    let page_size = page_size.max(1);
    let key = OrderingKey::for_table(table);
    let from = escape_identifier(&table.name);
    let limit = page_size + 1;

    let mut params = Params::new();
    let mut offset = 0;
    let sql = match &key {
        OrderingKey::PrimaryKey { columns, tiebreak } => {
            let names: Vec<String> = columns.iter().map(|c| escape_identifier(&c.name)).collect();
            let mut order = names.join(", ");
            if *tiebreak {
                order.push_str(", rowid");
            }
            let filter = match token {
                Some(token) => {
                    let after = KeyValues::decode(token, columns, *tiebreak)?;
                    params = after.params();
                    format!(" where {}", after.after_filter(&names))
                }
                None => String::new(),
            };
            format!(
                "select {} from {from}{filter} order by {order} limit {limit}",
                key.select_list()
            )
        }
        OrderingKey::RowId => {
            let filter = match token {
                Some(token) => {
                    params = rowid_params(parse_rowid(token)?);
                    " where rowid > :p0".to_string()
                }
                None => String::new(),
            };
            format!(
                "select {} from {from}{filter} order by rowid limit {limit}",
                key.select_list()
            )
        }
        OrderingKey::Position => {
            if let Some(token) = token {
                offset = token
                    .parse::<u64>()
                    .map_err(|_| BrowseError::malformed_key(token, "expected a row position"))?;
            }
            if offset > 0 {
                format!("select * from {from} limit {limit} offset {offset}")
            } else {
                format!("select * from {from} limit {limit}")
            }
        }
    };

    Ok(ListingPlan {
        sql,
        params,
        page_size,
        key,
        offset,
    })
}

/// A planned single-row lookup.
#[derive(Debug, Clone)]
pub struct RowPlan {
    pub sql: String,
    pub params: Params,
    pub key: OrderingKey,
}

/// Plan the lookup of the row addressed by `token` in `table`.
pub fn plan_row_lookup(table: &Table, token: &str) -> Result<RowPlan> {
    let key = OrderingKey::for_table(table);
    let from = escape_identifier(&table.name);
    let (sql, params) = match &key {
        OrderingKey::PrimaryKey { columns, tiebreak } => {
            let names: Vec<String> = columns.iter().map(|c| escape_identifier(&c.name)).collect();
            let wanted = KeyValues::decode(token, columns, *tiebreak)?;
            (
                format!(
                    "select {} from {from} where {}",
                    key.select_list(),
                    wanted.equals_filter(&names)
                ),
                wanted.params(),
            )
        }
        OrderingKey::RowId => (
            format!("select {} from {from} where rowid = :p0", key.select_list()),
            rowid_params(parse_rowid(token)?),
        ),
        OrderingKey::Position => {
            return Err(BrowseError::not_found("row in view", &table.name));
        }
    };
    Ok(RowPlan { sql, params, key })
}

/// Build the URL of the next page: `path` with every existing query
/// parameter kept verbatim except `_next`, which is replaced by `token` and
/// placed last.
pub fn next_url(path: &str, raw_query: Option<&str>, token: &str) -> String {
    let next = format!("{NEXT_PARAM}={token}");
    let mut pairs: Vec<&str> = raw_query
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some(NEXT_PARAM))
        .collect();
    pairs.push(&next);
    format!("{}?{}", path, pairs.join("&"))
}

/// Rows to pull for an ad hoc query.
pub fn ad_hoc_fetch_limit(max_returned_rows: usize) -> usize {
    max_returned_rows.saturating_add(1)
}

/// Apply the ad hoc cap: keep `max_returned_rows` and flag truncation if the
/// engine produced more.
pub fn cap_ad_hoc(mut result: QueryResult, max_returned_rows: usize) -> QueryResult {
    result.truncated = result.rows.len() > max_returned_rows;
    result.rows.truncate(max_returned_rows);
    result.next = None;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::QueryResultRow;
    use serde_json::Value;

    fn table(name: &str, pks: &[&str], is_view: bool) -> Table {
        Table {
            name: name.into(),
            columns: vec!["content".into()],
            primary_keys: pks.iter().map(|s| s.to_string()).collect(),
            key_affinities: vec![Affinity::Text; pks.len()],
            is_view,
            has_rowid: !is_view,
            ..Default::default()
        }
    }

    /// Keyed table whose key columns may hold NULL.
    fn nullable(name: &str, pks: &[&str], affinity: Affinity) -> Table {
        Table {
            key_affinities: vec![affinity; pks.len()],
            nullable_key: true,
            ..table(name, pks, false)
        }
    }

    fn result(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            rows: rows.into_iter().map(|values| QueryResultRow { values }).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_page_sql_single_pk() {
        let plan = plan_listing(&table("simple_primary_key", &["pk"], false), 50, None).unwrap();
        assert_eq!(plan.sql, "select * from simple_primary_key order by pk limit 51");
        assert!(plan.params.is_empty());
        assert_eq!(plan.fetch_limit(), 51);
    }

    #[test]
    fn test_resumed_page_sql_compound_pk() {
        let plan =
            plan_listing(&table("compound", &["pk1", "pk2"], false), 10, Some("a,b~2Cc")).unwrap();
        assert_eq!(
            plan.sql,
            "select * from compound where (pk1, pk2) > (:p0, :p1) order by pk1, pk2 limit 11"
        );
        assert_eq!(plan.params.get("p0"), Some(&Value::from("a")));
        assert_eq!(plan.params.get("p1"), Some(&Value::from("b,c")));
    }

    #[test]
    fn test_rowid_listing_sql() {
        let t = table("123_starts_with_digits", &[], false);
        let plan = plan_listing(&t, 50, None).unwrap();
        assert_eq!(
            plan.sql,
            "select rowid, * from \"123_starts_with_digits\" order by rowid limit 51"
        );
        let plan = plan_listing(&t, 50, Some("50")).unwrap();
        assert_eq!(
            plan.sql,
            "select rowid, * from \"123_starts_with_digits\" where rowid > :p0 order by rowid limit 51"
        );
        assert!(matches!(
            plan_listing(&t, 50, Some("abc")),
            Err(BrowseError::MalformedRowKey(_))
        ));
    }

    #[test]
    fn test_view_listing_sql() {
        let v = table("paginated_view", &[], true);
        assert_eq!(
            plan_listing(&v, 50, None).unwrap().sql,
            "select * from paginated_view limit 51"
        );
        assert_eq!(
            plan_listing(&v, 50, Some("100")).unwrap().sql,
            "select * from paginated_view limit 51 offset 100"
        );
    }

    #[test]
    fn test_token_arity_mismatch() {
        let err = plan_listing(&table("c", &["a", "b"], false), 10, Some("only-one")).unwrap_err();
        assert!(matches!(err, BrowseError::MalformedRowKey(_)));
    }

    #[test]
    fn test_paginate_sets_token_from_last_kept_row() {
        let plan = plan_listing(&table("t", &["pk"], false), 2, None).unwrap();
        let page = plan
            .paginate(result(
                &["pk", "content"],
                vec![
                    vec![Value::from("a/1"), Value::from("x")],
                    vec![Value::from("a/2"), Value::from("y")],
                    vec![Value::from("a/3"), Value::from("z")],
                ],
            ))
            .unwrap();
        assert_eq!(page.row_count(), 2);
        assert!(!page.truncated);
        assert_eq!(page.next.as_deref(), Some("a~2F2"));
    }

    #[test]
    fn test_paginate_final_page_has_no_token() {
        let plan = plan_listing(&table("t", &[], false), 2, None).unwrap();
        let page = plan
            .paginate(result(&["rowid", "content"], vec![vec![Value::from(7), Value::Null]]))
            .unwrap();
        assert_eq!(page.row_count(), 1);
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_paginate_view_token_is_position() {
        let plan = plan_listing(&table("v", &[], true), 2, Some("4")).unwrap();
        let rows = (0..3).map(|i| vec![Value::from(i)]).collect();
        let page = plan.paginate(result(&["content"], rows)).unwrap();
        assert_eq!(page.next.as_deref(), Some("6"));
    }

    #[test]
    fn test_row_lookup_plans() {
        let plan = plan_row_lookup(&table("t", &["pk1", "pk2"], false), "a,b").unwrap();
        assert_eq!(plan.sql, "select * from t where pk1 = :p0 and pk2 = :p1");
        let plan = plan_row_lookup(&table("t", &[], false), "01").unwrap();
        assert_eq!(plan.sql, "select rowid, * from t where rowid = :p0");
        assert_eq!(plan.params.get("p0"), Some(&Value::from(1)));
        assert!(matches!(
            plan_row_lookup(&table("t", &["pk"], false), "a,b"),
            Err(BrowseError::MalformedRowKey(_))
        ));
        assert!(matches!(
            plan_row_lookup(&table("v", &[], true), "1"),
            Err(BrowseError::NotFound(_))
        ));
    }

    #[test]
    fn test_untyped_key_binds_numbers_as_numbers() {
        let t = nullable("t", &["id"], Affinity::Blob);
        let plan = plan_listing(&t, 2, Some("2")).unwrap();
        assert_eq!(
            plan.sql,
            "select rowid, * from t where id > :p0 order by id, rowid limit 3"
        );
        assert_eq!(plan.params.get("p0"), Some(&Value::from(2)));

        let plan = plan_row_lookup(&t, "~T2").unwrap();
        assert_eq!(plan.params.get("p0"), Some(&Value::from("2")));
        let plan = plan_row_lookup(&t, "2~2E5").unwrap();
        assert_eq!(plan.params.get("p0"), Some(&Value::from(2.5)));
    }

    #[test]
    fn test_typed_key_keeps_text() {
        let t = nullable("t", &["pk"], Affinity::Text);
        let plan = plan_row_lookup(&t, "007").unwrap();
        assert_eq!(plan.sql, "select rowid, * from t where pk = :p0");
        assert_eq!(plan.params.get("p0"), Some(&Value::from("007")));
    }

    #[test]
    fn test_key_value_components() {
        assert_eq!(encode_key_value(&Value::from(3), Affinity::Blob), "3");
        assert_eq!(encode_key_value(&Value::from("3"), Affinity::Blob), "~T3");
        assert_eq!(encode_key_value(&Value::from("3"), Affinity::Text), "3");
        assert_eq!(encode_key_value(&Value::from("1e5"), Affinity::Blob), "~T1e5");
        assert_eq!(encode_key_value(&Value::from("a.b"), Affinity::Blob), "a~2Eb");
        assert_eq!(encode_key_value(&Value::Null, Affinity::Text), "~N");
        assert_eq!(encode_key_value(&Value::from("~N"), Affinity::Text), "~7EN");

        for (value, affinity) in [
            (Value::from(-4), Affinity::Blob),
            (Value::from(2.5), Affinity::Blob),
            (Value::from("12"), Affinity::Blob),
            (Value::from("a,b"), Affinity::Blob),
            (Value::Null, Affinity::Blob),
            (Value::from("12"), Affinity::Text),
        ] {
            let part = encode_key_value(&value, affinity);
            assert_eq!(decode_key_value(&part, affinity), Some(value), "{part}");
        }
    }

    #[test]
    fn test_null_key_resumes_within_null_group() {
        let t = nullable("t", &["pk"], Affinity::Text);
        let plan = plan_listing(&t, 1, Some("~N,1")).unwrap();
        assert_eq!(
            plan.sql,
            "select rowid, * from t where (pk is not null) or (pk is null and rowid > :p1) \
             order by pk, rowid limit 2"
        );
        assert_eq!(plan.params.len(), 1);
        assert_eq!(plan.params.get("p1"), Some(&Value::from(1)));

        let c = nullable("c", &["a", "b"], Affinity::Text);
        let plan = plan_listing(&c, 1, Some("x,~N,9")).unwrap();
        assert_eq!(
            plan.sql,
            "select rowid, * from c where (a > :p0) or (a = :p0 and b is not null) \
             or (a = :p0 and b is null and rowid > :p2) order by a, b, rowid limit 2"
        );
    }

    #[test]
    fn test_null_key_needs_rowid() {
        let t = nullable("t", &["pk"], Affinity::Text);
        assert!(matches!(
            plan_listing(&t, 1, Some("~N")),
            Err(BrowseError::MalformedRowKey(_))
        ));
        assert!(matches!(
            plan_row_lookup(&t, "a,3"),
            Err(BrowseError::MalformedRowKey(_))
        ));
        let plan = plan_row_lookup(&t, "~N,3").unwrap();
        assert_eq!(plan.sql, "select rowid, * from t where pk is null and rowid = :p1");
    }

    #[test]
    fn test_tiebreak_rowid_is_hidden_and_keys_null_rows() {
        let t = nullable("t", &["pk"], Affinity::Text);
        let plan = plan_listing(&t, 1, None).unwrap();
        let page = plan
            .paginate(result(
                &["rowid", "pk", "content"],
                vec![
                    vec![Value::from(1), Value::Null, Value::from("x")],
                    vec![Value::from(2), Value::Null, Value::from("y")],
                ],
            ))
            .unwrap();
        assert_eq!(page.next.as_deref(), Some("~N,1"));
        assert_eq!(page.columns, ["pk", "content"]);
        assert_eq!(page.rows[0].values, [Value::Null, Value::from("x")]);
    }

    #[test]
    fn test_next_url_preserves_other_params() {
        assert_eq!(next_url("/db/t", None, "5"), "/db/t?_next=5");
        assert_eq!(
            next_url("/db/t.jsono", Some("_size=2&_next=3&x=a%20b"), "5"),
            "/db/t.jsono?_size=2&x=a%20b&_next=5"
        );
        assert_eq!(next_url("/db/t", Some(""), "a~2Cb"), "/db/t?_next=a~2Cb");
    }

    #[test]
    fn test_cap_ad_hoc() {
        let rows: Vec<Vec<Value>> = (0..101).map(|i| vec![Value::from(i)]).collect();
        let capped = cap_ad_hoc(result(&["n"], rows), 100);
        assert!(capped.truncated);
        assert_eq!(capped.row_count(), 100);
        assert_eq!(capped.next, None);

        let rows: Vec<Vec<Value>> = (0..2).map(|i| vec![Value::from(i)]).collect();
        let capped = cap_ad_hoc(result(&["n"], rows), 100);
        assert!(!capped.truncated);
        assert_eq!(capped.row_count(), 2);
    }

    #[test]
    fn test_effective_page_size() {
        assert_eq!(effective_page_size(None, 100, 1000), 100);
        assert_eq!(effective_page_size(Some(5000), 100, 1000), 1000);
        assert_eq!(effective_page_size(Some(0), 100, 1000), 1);
    }
}
