//! Error types for the repo-search crate.
//!
//! Request-level errors ([`SearchError`]) stop a query before any backend
//! is contacted. Backend-level errors ([`BackendError`]) are scoped to one
//! backend and end up as a message in the aggregate response. No tokens or
//! credentials appear in error messages.

use std::time::Duration;

/// Errors that abort a search request or a registry operation.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request named a backend that is not registered.
    #[error("unknown engine {0}")]
    UnknownBackend(String),

    /// Invalid configuration or registry construction.
    #[error("config error: {0}")]
    Config(String),
}

/// A failure of a single backend for a single query.
///
/// Displays as `"{backend}: {kind}"`, which is the text placed into the
/// aggregate `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{backend}: {kind}")]
pub struct BackendError {
    /// Registered name of the backend that failed.
    pub backend: String,
    /// What went wrong.
    pub kind: BackendErrorKind,
}

impl BackendError {
    /// Create a new backend error.
    pub fn new(backend: impl Into<String>, kind: BackendErrorKind) -> Self {
        Self {
            backend: backend.into(),
            kind,
        }
    }
}

/// The reason a backend search failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendErrorKind {
    /// The backend could not be initialised at startup. The reason is kept
    /// for diagnostics but not shown in the message.
    #[error("not initialized")]
    NotInitialized {
        /// Why construction failed (e.g. which env var is missing).
        reason: String,
    },

    /// The backend's own request timeout elapsed.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Connection or protocol failure before a status was received.
    #[error("request failed: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status.
    #[error("unexpected response status {0}")]
    Status(u16),

    /// The response body could not be decoded into a list of items.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The aggregate deadline elapsed while this backend was outstanding.
    #[error("no response within {}ms deadline", .0.as_millis())]
    DeadlineExceeded(Duration),
}

/// Convenience type alias for repo-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
