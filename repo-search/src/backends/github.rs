//! GitHub repository search via the REST `search/repositories` endpoint.
//!
//! Restricts matches to repository names (`in:name`) and reads results from
//! the top-level `items` array.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::backend::{Readiness, SearchBackend};
use crate::config::GithubConfig;
use crate::error::BackendError;
use crate::http;
use crate::types::{validate_http_url, NormalizedResult};

const ITEMS_KEY: &str = "items";
const ACCEPT_V3: &str = "application/vnd.github.v3+json";

/// GitHub search backend.
///
/// Works without a token; a configured token is sent as a bearer token to
/// lift the anonymous rate limit.
pub struct GithubBackend {
    state: Readiness<GithubClient>,
}

struct GithubClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    max_response_bytes: usize,
}

impl GithubBackend {
    /// Registered name of this backend.
    pub const NAME: &'static str = "github";

    /// Build the backend. Never fails: an invalid base URL or token leaves
    /// the backend unusable and the problem is reported on first search.
    pub fn new(config: GithubConfig) -> Self {
        let state = match GithubClient::build(&config) {
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

impl GithubClient {
    fn build(config: &GithubConfig) -> Result<Self, String> {
        let base = validate_http_url(&config.base_url)
            .ok_or_else(|| format!("invalid GitHub base URL {:?}", config.base_url))?;
        let endpoint = format!("{}/search/repositories", base.trim_end_matches('/'));

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| "GITHUB_TOKEN contains invalid header characters".to_owned())?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = http::build_client(config.timeout, headers)?;
        Ok(Self {
            client,
            endpoint,
            timeout: config.timeout,
            max_response_bytes: config.max_response_bytes,
        })
    }
}

/// GitHub search qualifier restricting matches to repository names.
fn name_query(query: &str) -> String {
    format!("{query} in:name")
}

#[async_trait]
impl SearchBackend for GithubBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn search(&self, query: &str) -> Result<Vec<NormalizedResult>, BackendError> {
        let github = self.state.get(Self::NAME)?;
        tracing::trace!(query, "GitHub search");

        let request = github
            .client
            .get(&github.endpoint)
            .query(&[("q", name_query(query))]);

        http::fetch_items(
            Self::NAME,
            request,
            ITEMS_KEY,
            github.timeout,
            github.max_response_bytes,
        )
        .await
    }
}

impl fmt::Debug for GithubBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("GithubBackend");
        match &self.state {
            Readiness::Ready(c) => s.field("endpoint", &c.endpoint).field("timeout", &c.timeout),
            Readiness::Unusable { reason } => s.field("unusable", reason),
        };
        s.finish()
    }
}
