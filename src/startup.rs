//! Startup wiring: builds the backend registry and aggregator from config.
//!
//! Backends are constructed once here and shared for the life of the
//! process. A backend that cannot be configured is still registered so that
//! requests naming it get a per-backend `not initialized` error instead of
//! an unknown-backend rejection.

use std::sync::Arc;

use repo_search::{Aggregator, BackendRegistry, GiteaBackend, GithubBackend};
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::Result;

/// Build the registry with every supported backend.
///
/// # Errors
///
/// Returns an error only if two backends share a name.
pub fn build_registry(config: &ServiceConfig) -> Result<BackendRegistry> {
    let github = GithubBackend::new(config.github_config());
    let gitea = GiteaBackend::new(config.gitea_config());

    log_readiness(GithubBackend::NAME, github.is_ready());
    log_readiness(GiteaBackend::NAME, gitea.is_ready());

    let mut registry = BackendRegistry::new();
    registry.register(GithubBackend::NAME, Arc::new(github))?;
    registry.register(GiteaBackend::NAME, Arc::new(gitea))?;
    Ok(registry)
}

/// Build the aggregator, applying the optional global deadline.
pub fn build_aggregator(config: &ServiceConfig) -> Aggregator {
    match config.deadline() {
        Some(deadline) => Aggregator::new().with_deadline(deadline),
        None => Aggregator::new(),
    }
}

fn log_readiness(backend: &str, ready: bool) {
    if ready {
        info!(backend, "backend ready");
    } else {
        warn!(
            backend,
            "backend registered but unusable; searches will report it as not initialized"
        );
    }
}
