//! HTTP front end for repository search.
//!
//! ## Endpoints
//!
//! - `GET /search-repos?q=<query>&engines=<a,b>`: search the named backends
//! - `GET /available-engines`: list registered backend names
//!
//! A query that is present but malformed is rejected with `422`. A request
//! naming an unknown backend is then rejected with `400` before any
//! backend is contacted, even when `q` is missing. Backend failures never change the status code:
//! they are listed in the `errors` field of a `200` response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use repo_search::{Aggregator, BackendRegistry, NormalizedResult, SearchError, parse_backend_list};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{Result, ServiceError};

/// Backends searched when a request does not name any.
pub const DEFAULT_ENGINES: &str = "gitea";

/// Minimum query length in characters.
pub const MIN_QUERY_CHARS: usize = 2;

/// Maximum query length in characters.
pub const MAX_QUERY_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Query-string parameters of `GET /search-repos`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// The search text.
    pub q: Option<String>,
    /// Comma-separated backend names, e.g. `gitea,github`.
    pub engines: Option<String>,
}

/// Body of a successful `GET /search-repos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Merged results, sorted case-insensitively by name.
    pub repos: Vec<NormalizedResult>,
    /// One message per failed backend.
    pub errors: Vec<String>,
}

/// Body of a rejected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<BackendRegistry>,
    aggregator: Aggregator,
}

impl AppState {
    /// Bundle a finished registry and an aggregator.
    pub fn new(registry: BackendRegistry, aggregator: Aggregator) -> Self {
        Self {
            registry: Arc::new(registry),
            aggregator,
        }
    }
}

/// Build the router without binding, for embedding or tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search-repos", get(handle_search))
        .route("/available-engines", get(handle_available_engines))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// SearchServer
// ---------------------------------------------------------------------------

/// Repository search HTTP server running in a background task.
pub struct SearchServer {
    /// The address the server is listening on.
    addr: SocketAddr,
    /// Signals graceful shutdown.
    shutdown: Option<oneshot::Sender<()>>,
    /// Handle to the background server task.
    handle: Option<JoinHandle<()>>,
}

impl SearchServer {
    /// Start the search server.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign)
    /// and begins serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(state: AppState, config: &ServerConfig) -> Result<Self> {
        let app = router(state);

        let bind_addr = config.bind_addr();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ServiceError::Server(format!("bind to {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| ServiceError::Server(format!("failed to get local addr: {e}")))?;

        info!("search server listening on http://{addr}");

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = rx.await;
            });
            if let Err(e) = serve.await {
                tracing::error!("search server error: {e}");
            }
        });

        Ok(Self {
            addr,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("search server task ended abnormally: {e}");
            }
        }
        info!("search server stopped");
    }
}

impl Drop for SearchServer {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check the query text: 2 to 50 characters, ASCII letters, digits and `_`.
///
/// # Errors
///
/// Returns the reason the query was rejected.
pub fn validate_query(q: &str) -> std::result::Result<&str, String> {
    let len = q.chars().count();
    if len < MIN_QUERY_CHARS {
        return Err(format!("query must have at least {MIN_QUERY_CHARS} characters"));
    }
    if len > MAX_QUERY_CHARS {
        return Err(format!("query must have at most {MAX_QUERY_CHARS} characters"));
    }
    if !q.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("query may only contain letters, digits and underscores".into());
    }
    Ok(q)
}

fn reject(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// `GET /search-repos`: search one or more backends.
async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = match params.q.as_deref().map(validate_query).transpose() {
        Ok(q) => q,
        Err(detail) => return reject(StatusCode::UNPROCESSABLE_ENTITY, detail),
    };

    let names = parse_backend_list(params.engines.as_deref().unwrap_or(DEFAULT_ENGINES));
    let backends = match state.registry.resolve(&names) {
        Ok(backends) => backends,
        Err(err @ SearchError::UnknownBackend(_)) => {
            return reject(StatusCode::BAD_REQUEST, err.to_string());
        }
        Err(err) => return reject(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    };

    let Some(query) = query else {
        return reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "query parameter `q` is required",
        );
    };

    let response = state.aggregator.run(query, &backends).await;
    Json(SearchResponse {
        repos: response.results,
        errors: response.errors,
    })
    .into_response()
}

/// `GET /available-engines`: sorted backend names.
async fn handle_available_engines(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.registry.list_names())
}
