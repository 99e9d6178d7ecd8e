//! # repo-search
//!
//! Repository search across several source-control hosting APIs behind one
//! call.
//!
//! ## Design
//!
//! - Each remote service is a [`SearchBackend`] (GitHub, Gitea) that owns its
//!   HTTP client, credential, and timeout
//! - Backends are registered by name in a [`BackendRegistry`]
//! - The [`Aggregator`] queries the selected backends concurrently and waits
//!   for all of them, whatever their outcome
//! - Raw items are normalised one by one; a malformed item is dropped, never
//!   the whole backend
//! - Results are merged and sorted case-insensitively by repository name;
//!   failures are reported per backend alongside the results
//!
//! ## Security
//!
//! - Tokens are never logged or included in `Debug` output
//! - Search queries are logged only at trace level
//! - Response bodies are size-limited per backend

pub mod aggregator;
pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod http;
pub mod registry;
pub mod types;

pub use aggregator::{Aggregator, BackendOutcome};
pub use backend::{Readiness, SearchBackend};
pub use backends::{GiteaBackend, GithubBackend};
pub use config::{GiteaConfig, GithubConfig};
pub use error::{BackendError, BackendErrorKind, Result, SearchError};
pub use registry::{parse_backend_list, BackendRegistry};
pub use types::{AggregateResponse, NormalizedResult};

/// Search the named backends of `registry` for `query`.
///
/// Every name is resolved before anything is dispatched, so an unknown name
/// fails the whole request without contacting any backend.
///
/// # Errors
///
/// Returns [`SearchError::UnknownBackend`] if any name is not registered.
/// Backend failures are not errors; they are reported in
/// [`AggregateResponse::errors`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> repo_search::Result<()> {
/// use std::sync::Arc;
/// use repo_search::{Aggregator, BackendRegistry, GithubBackend, GithubConfig};
///
/// let mut registry = BackendRegistry::new();
/// registry.register("github", Arc::new(GithubBackend::new(GithubConfig::default())))?;
///
/// let response = repo_search::search(&registry, &Aggregator::new(), "tokio", &["github"]).await?;
/// for repo in &response.results {
///     println!("{} ({})", repo.name, repo.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search<S: AsRef<str>>(
    registry: &BackendRegistry,
    aggregator: &Aggregator,
    query: &str,
    names: &[S],
) -> Result<AggregateResponse> {
    let backends = registry.resolve(names)?;
    Ok(aggregator.run(query, &backends).await)
}
