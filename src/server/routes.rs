//! HTTP routes for browsing databases
//!
//! ## Endpoints
//!
//! - `GET /`                                 - Index of databases (also `/.json`)
//! - `GET /{database}[.json|.jsono]`         - Tables and views, or ad hoc SQL with `?sql=`
//! - `GET /{database}/{table}[.json|.jsono]` - One page of a table or view
//! - `GET /{database}/{table}/{row}[.json|.jsono]` - One row by key
//!
//! Every handler hands the request to [`Browser`] on a blocking worker
//! thread, so a slow statement never stalls the async executor.
//!
//! A database may also be addressed as `{name}-{hash}`, the hash taken from
//! the file contents at startup. Responses under such paths are marked
//! cacheable. With `hash_urls` on, a bare name redirects there.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{debug, error};

use crate::browser::{Browser, DatabaseRoute, RequestOptions, RequestTarget};
use crate::codec::split_format;
use crate::error::BrowseError;
use crate::response::{ErrorPayload, RowOutcome};

/// Shared state for browse handlers.
#[derive(Clone)]
pub struct AppState {
    pub browser: Arc<Browser>,
}

type QueryPairs = Query<Vec<(String, String)>>;

/// Cache policy for responses under a content-hash database path.
const HASHED_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Build the axum router for the browse API.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/:database", get(database_handler))
        .route("/:database/:table", get(table_handler))
        .route("/:database/:table/:row", get(row_handler))
        .with_state(state)
}

/// Run `work` on the blocking pool and surface its error as an [`ApiError`].
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| BrowseError::Server(format!("worker failed: {e}")))?
        .map_err(ApiError::from)
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Redirect a bare database name to its hashed token, keeping the format
/// suffix, the rest of the path and the query string.
fn redirect_to_hashed(route: &DatabaseRoute, uri: &Uri) -> Option<Response> {
    let DatabaseRoute::Redirect(token) = route else {
        return None;
    };
    let path = uri.path().trim_start_matches('/');
    let (segment, tail) = path.split_at(path.find('/').unwrap_or(path.len()));
    let (stem, _) = split_format(segment);
    let suffix = &segment[stem.len()..];

    let mut location = format!("/{token}{suffix}{tail}");
    if let Some(query) = uri.query() {
        location.push('?');
        location.push_str(query);
    }
    debug!(to = %location, "Redirecting to hashed database path");
    Some(found(location))
}

fn with_cache_headers(mut response: Response, route: &DatabaseRoute) -> Response {
    if *route == DatabaseRoute::Hashed {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(HASHED_CACHE_CONTROL),
        );
    }
    response
}

/// `GET /`
async fn index_handler(State(state): State<AppState>) -> Response {
    Json(state.browser.index()).into_response()
}

/// `GET /{database}`
async fn database_handler(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(pairs): QueryPairs,
    uri: Uri,
) -> Result<Response, ApiError> {
    let (token, format) = split_format(&segment);
    if token.is_empty() {
        return Ok(Json(state.browser.index()).into_response());
    }

    let route = state.browser.route(token)?;
    if let Some(redirect) = redirect_to_hashed(&route, &uri) {
        return Ok(redirect);
    }

    let options = RequestOptions::from_pairs(&pairs)?;
    let token = token.to_string();
    let browser = state.browser.clone();
    let response = blocking(move || match options.sql.as_deref() {
        Some(sql) => browser
            .query(&token, sql, &options, format)
            .map(|payload| Json(payload).into_response()),
        None => browser
            .database_listing(&token)
            .map(|payload| Json(payload).into_response()),
    })
    .await?;
    Ok(with_cache_headers(response, &route))
}

/// `GET /{database}/{table}`
async fn table_handler(
    State(state): State<AppState>,
    Path((database, table)): Path<(String, String)>,
    Query(pairs): QueryPairs,
    uri: Uri,
) -> Result<Response, ApiError> {
    let route = state.browser.route(&database)?;
    if let Some(redirect) = redirect_to_hashed(&route, &uri) {
        return Ok(redirect);
    }

    let options = RequestOptions::from_pairs(&pairs)?;
    let target = RequestTarget {
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
    };
    let browser = state.browser.clone();
    let payload =
        blocking(move || browser.table_page(&database, &table, &options, &target)).await?;
    Ok(with_cache_headers(Json(payload).into_response(), &route))
}

/// `GET /{database}/{table}/{row}`
async fn row_handler(
    State(state): State<AppState>,
    Path((database, table, row)): Path<(String, String, String)>,
    Query(pairs): QueryPairs,
    uri: Uri,
) -> Result<Response, ApiError> {
    let route = state.browser.route(&database)?;
    if let Some(redirect) = redirect_to_hashed(&route, &uri) {
        return Ok(redirect);
    }

    let options = RequestOptions::from_pairs(&pairs)?;
    let browser = state.browser.clone();
    let outcome = blocking(move || browser.row(&database, &table, &row, &options)).await?;
    Ok(match outcome {
        RowOutcome::Found(payload) => with_cache_headers(Json(payload).into_response(), &route),
        RowOutcome::Redirect(location) => found(location),
    })
}

/// API error wrapper rendering `{"ok": false, "error": ...}`.
#[derive(Debug)]
pub struct ApiError(pub BrowseError);

impl From<BrowseError> for ApiError {
    fn from(err: BrowseError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_client_error() {
            debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        } else {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        }
        (status, Json(ErrorPayload::new(self.0.to_string()))).into_response()
    }
}
