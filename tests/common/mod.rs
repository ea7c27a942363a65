//! Shared test fixtures for tablescope integration tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```
//!
//! The fixture database carries tables whose names exercise the identifier
//! codec (slashes, spaces, leading digits), tables keyed every supported way
//! (single, compound, integer and no primary key), two views, and a
//! `sleep(seconds)` extension function for time-budget tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tablescope::server::{create_router, AppState};
use tablescope::sqlite::functions::as_seconds;
use tablescope::{Browser, BrowserConfig, FunctionRegistry};

/// Rows in `no_primary_key` (and so in `paginated_view`).
pub const NO_PK_ROWS: usize = 201;

pub const FIXTURE_SQL: &str = r#"
CREATE TABLE simple_primary_key (
  pk varchar(30) primary key,
  content text
);

CREATE TABLE compound_primary_key (
  pk1 varchar(30),
  pk2 varchar(30),
  content text,
  PRIMARY KEY (pk1, pk2)
);

CREATE TABLE int_primary_key (
  id integer primary key,
  content text
);

CREATE TABLE no_primary_key (
  content text
);

CREATE TABLE empty_table (
  pk integer primary key,
  content text
);

CREATE TABLE [123_starts_with_digits] (
  content text
);

CREATE TABLE "Table With Space In Name" (
  pk varchar(30) primary key,
  content text
);

CREATE TABLE "table/with/slashes.csv" (
  pk varchar(30) primary key,
  content text
);

CREATE VIEW paginated_view AS
  SELECT content, '- ' || content || ' -' AS content_extra
  FROM no_primary_key;

CREATE VIEW simple_view AS
  SELECT content, upper(content) AS upper_content FROM simple_primary_key;

INSERT INTO simple_primary_key VALUES ('1', 'hello');
INSERT INTO simple_primary_key VALUES ('2', 'world');

INSERT INTO compound_primary_key VALUES ('a', 'b', 'c');
INSERT INTO compound_primary_key VALUES ('a/b', 'c,d', 'e');

INSERT INTO int_primary_key VALUES (1, 'one');
INSERT INTO int_primary_key VALUES (2, 'two');

INSERT INTO "Table With Space In Name" VALUES ('1', 'spaced');

INSERT INTO "table/with/slashes.csv" VALUES ('3', 'hey');

WITH RECURSIVE seq(i) AS (SELECT 0 UNION ALL SELECT i + 1 FROM seq WHERE i < 200)
INSERT INTO no_primary_key SELECT 'row ' || i FROM seq;
"#;

/// Limits used by most tests: small enough to exercise paging and capping.
pub fn test_config() -> BrowserConfig {
    BrowserConfig {
        page_size: 50,
        max_returned_rows: 100,
        sql_time_limit_ms: 1000,
        hash_urls: false,
    }
}

/// Write the fixture database as `<dir>/<name>.db`.
pub fn create_fixture_db(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{name}.db"));
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(FIXTURE_SQL).unwrap();
    path
}

/// Registry with `sleep(seconds)`, which blocks and returns NULL.
pub fn sleep_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.register("sleep", 1, |args| {
        let secs = as_seconds(&args[0]).unwrap_or(0.0).max(0.0);
        std::thread::sleep(Duration::from_secs_f64(secs));
        Ok(SqlValue::Null)
    });
    registry
}

/// A browser over one fixture database named `fixtures`.
pub fn fixture_browser(config: BrowserConfig) -> (TempDir, Arc<Browser>) {
    let dir = TempDir::new().unwrap();
    let path = create_fixture_db(dir.path(), "fixtures");
    let browser = Browser::open(config, &[path], &sleep_registry()).unwrap();
    (dir, Arc::new(browser))
}

/// The HTTP app over one fixture database named `fixtures`.
pub fn fixture_app(config: BrowserConfig) -> (TempDir, Router) {
    let (dir, browser) = fixture_browser(config);
    (dir, create_router(AppState { browser }))
}

/// The HTTP app over a database named `name` built from `sql`.
pub fn custom_app(name: &str, sql: &str, config: BrowserConfig) -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(format!("{name}.db"));
    Connection::open(&path).unwrap().execute_batch(sql).unwrap();
    let browser = Browser::open(config, &[path], &sleep_registry()).unwrap();
    (dir, create_router(AppState { browser: Arc::new(browser) }))
}

/// Send a GET request and return (status, headers, body bytes).
pub async fn get_raw(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

/// Send a GET request and parse the JSON body.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get_raw(app, uri).await;
    let json = serde_json::from_slice(&body)
        .unwrap_or_else(|e| panic!("{uri} returned non-JSON body ({e}): {body:?}"));
    (status, json)
}

/// `Location` header of a response, if any.
pub fn location(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Percent-encode a query-string value.
pub fn q(value: &str) -> String {
    value
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect()
}
