//! Gitea repository search via `/api/v1/repos/search`.
//!
//! Gitea mirrors GitHub's repository schema but wraps the list in a
//! top-level `data` array and authenticates with `Authorization: token ...`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::backend::{Readiness, SearchBackend};
use crate::config::GiteaConfig;
use crate::error::BackendError;
use crate::http;
use crate::types::{validate_http_url, NormalizedResult};

const ITEMS_KEY: &str = "data";
const SEARCH_PATH: &str = "/api/v1/repos/search";

/// Gitea search backend.
///
/// Requires both an instance URL and a token. When either is missing the
/// backend is still constructed, but every search fails with
/// `gitea: not initialized`.
pub struct GiteaBackend {
    state: Readiness<GiteaClient>,
}

struct GiteaClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    max_response_bytes: usize,
}

impl GiteaBackend {
    /// Registered name of this backend.
    pub const NAME: &'static str = "gitea";

    /// Build the backend, failing soft on missing or invalid configuration.
    pub fn new(config: GiteaConfig) -> Self {
        let state = match GiteaClient::build(&config) {
            Ok(client) => Readiness::Ready(client),
            Err(reason) => Readiness::unusable(Self::NAME, reason),
        };
        Self { state }
    }

    /// Returns `true` if the backend can issue requests.
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }
}

impl GiteaClient {
    fn build(config: &GiteaConfig) -> Result<Self, String> {
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or("GITEA_TOKEN is not set")?;
        let base_url = config
            .base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or("GITEA_URL is not set")?;
        let base = validate_http_url(base_url)
            .ok_or_else(|| format!("invalid GITEA_URL {base_url:?}"))?;
        let endpoint = format!("{}{SEARCH_PATH}", base.trim_end_matches('/'));

        let mut auth = HeaderValue::from_str(&format!("token {token}"))
            .map_err(|_| "GITEA_TOKEN contains invalid header characters".to_owned())?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = http::build_client(config.timeout, headers)?;
        Ok(Self {
            client,
            endpoint,
            timeout: config.timeout,
            max_response_bytes: config.max_response_bytes,
        })
    }
}

#[async_trait]
impl SearchBackend for GiteaBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn search(&self, query: &str) -> Result<Vec<NormalizedResult>, BackendError> {
        let gitea = self.state.get(Self::NAME)?;
        tracing::trace!(query, "Gitea search");

        let request = gitea.client.get(&gitea.endpoint).query(&[("q", query)]);

        http::fetch_items(
            Self::NAME,
            request,
            ITEMS_KEY,
            gitea.timeout,
            gitea.max_response_bytes,
        )
        .await
    }
}

impl fmt::Debug for GiteaBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("GiteaBackend");
        match &self.state {
            Readiness::Ready(c) => s.field("endpoint", &c.endpoint).field("timeout", &c.timeout),
            Readiness::Unusable { reason } => s.field("unusable", reason),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendErrorKind;

    #[test]
    fn configured_backend_is_ready() {
        let backend = GiteaBackend::new(GiteaConfig::new("https://gitea.example.org", "t0k"));
        assert!(backend.is_ready());
        assert!(format!("{backend:?}").contains("https://gitea.example.org/api/v1/repos/search"));
    }

    #[tokio::test]
    async fn missing_token_reports_not_initialized() {
        let config = GiteaConfig {
            base_url: Some("https://gitea.example.org".into()),
            ..Default::default()
        };
        let backend = GiteaBackend::new(config);
        assert!(!backend.is_ready());

        let err = backend.search("octo").await.unwrap_err();
        assert_eq!(err.to_string(), "gitea: not initialized");
        assert_eq!(
            err.kind,
            BackendErrorKind::NotInitialized {
                reason: "GITEA_TOKEN is not set".into()
            }
        );
    }

    #[tokio::test]
    async fn missing_url_reports_not_initialized() {
        let config = GiteaConfig {
            token: Some("t0k".into()),
            ..Default::default()
        };
        let err = GiteaBackend::new(config).search("octo").await.unwrap_err();
        assert_eq!(
            err.kind,
            BackendErrorKind::NotInitialized {
                reason: "GITEA_URL is not set".into()
            }
        );
    }

    #[test]
    fn empty_token_is_unusable() {
        let backend = GiteaBackend::new(GiteaConfig::new("https://gitea.example.org", ""));
        assert!(!backend.is_ready());
    }

    #[test]
    fn invalid_url_is_unusable() {
        let backend = GiteaBackend::new(GiteaConfig::new("gitea.example.org", "t0k"));
        assert!(!backend.is_ready());
        assert!(format!("{backend:?}").contains("invalid GITEA_URL"));
    }

    #[test]
    fn debug_does_not_leak_token() {
        let backend = GiteaBackend::new(GiteaConfig::new("https://gitea.example.org", "s3cret"));
        assert!(!format!("{backend:?}").contains("s3cret"));
    }

    #[test]
    fn is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GiteaBackend>();
    }
}
