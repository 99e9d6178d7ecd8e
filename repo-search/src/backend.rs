//! Trait definition for pluggable repository search backends.
//!
//! Each remote service (GitHub, Gitea) implements [`SearchBackend`] to
//! provide a uniform interface for querying and normalising results.

use async_trait::async_trait;

use crate::error::{BackendError, BackendErrorKind};
use crate::types::NormalizedResult;

/// A pluggable repository search backend.
///
/// Implementors own their HTTP client and configuration, issue one request
/// per query, and normalise the raw items into [`NormalizedResult`] values.
/// Each backend handles its own:
///
/// - URL construction and query encoding
/// - authentication headers
/// - request timeout
/// - per-item normalisation, dropping malformed items
///
/// Implementations are shared across concurrent queries and must be
/// `Send + Sync`; `search` takes `&self` and must not keep per-query state.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// The registered name of this backend, used as the prefix of its error
    /// messages.
    fn name(&self) -> &str;

    /// Search the remote service for repositories matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the backend was never initialised, the
    /// request fails or times out, the service answers with a non-success
    /// status, or the body has no item list.
    async fn search(&self, query: &str) -> Result<Vec<NormalizedResult>, BackendError>;
}

/// Construction-time state of a backend.
///
/// Backends fail soft: a missing credential produces an [`Readiness::Unusable`]
/// value instead of an error at startup, and the reason surfaces on the
/// first `search` call.
#[derive(Debug)]
pub enum Readiness<T> {
    /// Fully configured and ready to issue requests.
    Ready(T),
    /// Could not be configured.
    Unusable {
        /// Human-readable cause, e.g. `"GITEA_TOKEN is not set"`.
        reason: String,
    },
}

impl<T> Readiness<T> {
    /// Mark a backend unusable, logging the reason once at construction.
    pub fn unusable(backend: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!(backend, %reason, "backend not initialized");
        Self::Unusable { reason }
    }

    /// Returns `true` if the backend can issue requests.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Borrow the ready state, or produce the configuration error for
    /// `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendErrorKind::NotInitialized`] for an unusable backend.
    pub fn get(&self, backend: &str) -> Result<&T, BackendError> {
        match self {
            Self::Ready(inner) => Ok(inner),
            Self::Unusable { reason } => Err(BackendError::new(
                backend,
                BackendErrorKind::NotInitialized {
                    reason: reason.clone(),
                },
            )),
        }
    }
}
