//! Backend configuration with sensible defaults.
//!
//! [`GithubConfig`] and [`GiteaConfig`] carry everything a backend needs at
//! construction: base URL, credential, timeout and response size limit.
//! Credentials are never printed by the `Debug` impls.

use std::fmt;
use std::time::Duration;

use crate::error::SearchError;
use crate::http::DEFAULT_MAX_RESPONSE_BYTES;

/// Public GitHub REST API root.
pub const GITHUB_DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Default GitHub request timeout.
pub const GITHUB_DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default Gitea request timeout.
pub const GITEA_DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the GitHub backend. A token is optional; without one
/// the unauthenticated rate limit applies.
#[derive(Clone)]
pub struct GithubConfig {
    /// API root, e.g. `https://api.github.com` or a GitHub Enterprise URL.
    pub base_url: String,
    /// Optional personal access token, sent as a bearer token.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on the response body size.
    pub max_response_bytes: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: GITHUB_DEFAULT_BASE_URL.into(),
            token: None,
            timeout: GITHUB_DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl GithubConfig {
    /// Set a custom API root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the access token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the numeric limits.
    pub fn validate(&self) -> Result<(), SearchError> {
        validate_limits("github", self.timeout, self.max_response_bytes)
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}

/// Configuration for the Gitea backend.
///
/// Both `base_url` and `token` are required for a usable backend, but their
/// absence is not an error here: the backend is built in an unusable state
/// and reports `not initialized` when searched.
#[derive(Clone)]
pub struct GiteaConfig {
    /// Instance root, e.g. `https://gitea.example.org`.
    pub base_url: Option<String>,
    /// Access token, sent as `Authorization: token <token>`.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on the response body size.
    pub max_response_bytes: usize,
}

impl Default for GiteaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout: GITEA_DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl GiteaConfig {
    /// Create a config for the instance at `base_url` using `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the numeric limits. Missing credentials are not checked.
    pub fn validate(&self) -> Result<(), SearchError> {
        validate_limits("gitea", self.timeout, self.max_response_bytes)
    }
}

impl fmt::Debug for GiteaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GiteaConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}

fn validate_limits(backend: &str, timeout: Duration, max_bytes: usize) -> Result<(), SearchError> {
    if timeout.is_zero() {
        return Err(SearchError::Config(format!(
            "{backend} timeout must be greater than 0"
        )));
    }
    if max_bytes == 0 {
        return Err(SearchError::Config(format!(
            "{backend} max_response_bytes must be greater than 0"
        )));
    }
    Ok(())
}
