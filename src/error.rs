//! Error types for the search service.

use repo_search::SearchError;

/// Top-level error type for the search service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry construction or request resolution error.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// HTTP listener error.
    #[error("server error: {0}")]
    Server(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ServiceError>;
