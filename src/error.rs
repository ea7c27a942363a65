//! Error types for tablescope
//!
//! Every failure a request can hit is a variant of [`BrowseError`]. The HTTP
//! layer maps each variant onto a status code via [`BrowseError::status_code`]
//! and renders it as `{"ok": false, "error": <message>}`.

use axum::http::StatusCode;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type alias for tablescope operations
pub type Result<T> = std::result::Result<T, BrowseError>;

/// Main error type for tablescope
#[derive(Error, Debug)]
pub enum BrowseError {
    /// The statement text does not start with `select`.
    #[error("Statement must begin with SELECT")]
    NotSelect,

    /// The statement ran past its time budget and was interrupted.
    #[error("interrupted")]
    Interrupted,

    /// Engine-reported syntax or runtime failure, message passed through.
    #[error("{0}")]
    Sql(String),

    /// A row key or continuation token that cannot be decoded for its table.
    #[error("Malformed row key: {0}")]
    MalformedRowKey(String),

    /// Two distinct names share a path token. Fatal at startup.
    #[error("Ambiguous identifier: {first:?} and {second:?} both encode to {token:?}")]
    AmbiguousIdentifier {
        first: String,
        second: String,
        token: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    /// A reserved `_`-prefixed query parameter with an unusable value.
    #[error("Invalid parameter {name}: {value:?}")]
    InvalidParameter { name: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl BrowseError {
    /// Create a not-found error for a named kind of resource
    ///
    /// # Example
    /// ```ignore
    /// BrowseError::not_found("table", "orders")
    /// // produces: "Not found: table orders"
    /// ```
    pub fn not_found(kind: &str, name: impl AsRef<str>) -> Self {
        BrowseError::NotFound(format!("{} {}", kind, name.as_ref()))
    }

    /// Create a malformed row key error with context
    pub fn malformed_key(key: &str, detail: impl Into<String>) -> Self {
        BrowseError::MalformedRowKey(format!("{:?}: {}", key, detail.into()))
    }

    /// HTTP status for this error at the request boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BrowseError::NotSelect
            | BrowseError::Interrupted
            | BrowseError::Sql(_)
            | BrowseError::MalformedRowKey(_)
            | BrowseError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            BrowseError::NotFound(_) => StatusCode::NOT_FOUND,
            BrowseError::AmbiguousIdentifier { .. }
            | BrowseError::Io(_)
            | BrowseError::Config(_)
            | BrowseError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check whether this error is recoverable at the request boundary
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<rusqlite::Error> for BrowseError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref inner, _)
                if inner.code == ErrorCode::OperationInterrupted =>
            {
                BrowseError::Interrupted
            }
            rusqlite::Error::SqliteFailure(_, Some(message)) => BrowseError::Sql(message),
            other => BrowseError::Sql(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_wire_contract() {
        assert_eq!(
            BrowseError::NotSelect.to_string(),
            "Statement must begin with SELECT"
        );
        assert_eq!(BrowseError::Interrupted.to_string(), "interrupted");
        assert_eq!(
            BrowseError::Sql("no such table: nope".into()).to_string(),
            "no such table: nope"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(BrowseError::NotSelect.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(BrowseError::Interrupted.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            BrowseError::malformed_key("a,b", "expected 1 component").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BrowseError::not_found("table", "t").status_code(),
            StatusCode::NOT_FOUND
        );
        assert!(!BrowseError::Config("bad".into()).is_client_error());
    }

    #[test]
    fn test_interrupt_code_maps_to_interrupted() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
            Some("interrupted".into()),
        );
        assert!(matches!(BrowseError::from(err), BrowseError::Interrupted));
    }

    #[test]
    fn test_engine_message_passes_through() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some("near \"selec\": syntax error".into()),
        );
        match BrowseError::from(err) {
            BrowseError::Sql(msg) => assert_eq!(msg, "near \"selec\": syntax error"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
