//! Configuration types for the search service.
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables. Tokens are read from the environment only: they
//! are skipped by serde and redacted in `Debug` output.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use repo_search::config::{GITEA_DEFAULT_TIMEOUT, GITHUB_DEFAULT_BASE_URL, GITHUB_DEFAULT_TIMEOUT};
use repo_search::http::DEFAULT_MAX_RESPONSE_BYTES;
use repo_search::{GiteaConfig, GithubConfig};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "OCTOSEARCH_CONFIG";

/// Top-level configuration for the search service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Fan-out settings.
    pub search: SearchSettings,
    /// GitHub backend settings.
    pub github: GithubSettings,
    /// Gitea backend settings.
    pub gitea: GiteaSettings,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind, e.g. `127.0.0.1`.
    pub host: String,
    /// Port to bind. `0` picks a free port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// The `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Aggregator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Optional deadline for a whole fan-out, in seconds. Backends still
    /// running when it elapses are reported as failed.
    pub deadline_secs: Option<u64>,
}

/// GitHub backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    /// API root.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Upper bound on a response body.
    pub max_response_bytes: usize,
    /// Optional token, from `GITHUB_TOKEN`.
    #[serde(skip)]
    pub token: Option<Secret>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            base_url: GITHUB_DEFAULT_BASE_URL.into(),
            timeout_secs: GITHUB_DEFAULT_TIMEOUT.as_secs(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            token: None,
        }
    }
}

/// Gitea backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GiteaSettings {
    /// Instance root. Without it the Gitea backend is unusable.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Upper bound on a response body.
    pub max_response_bytes: usize,
    /// Token, from `GITEA_TOKEN`. Without it the Gitea backend is unusable.
    #[serde(skip)]
    pub token: Option<Secret>,
}

impl Default for GiteaSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: GITEA_DEFAULT_TIMEOUT.as_secs(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            token: None,
        }
    }
}

/// A credential that never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a credential.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Build the effective configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceConfig::load_with`].
    pub fn from_env() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Build the effective configuration using `lookup` for variables.
    ///
    /// Reads the file named by `OCTOSEARCH_CONFIG` if set, applies
    /// environment overrides, then validates. A missing Gitea token or URL
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or invalid, an
    /// override cannot be parsed, or validation fails.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the current values.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if a numeric variable does not parse.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("OCTOSEARCH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("OCTOSEARCH_PORT") {
            self.server.port = parse_number("OCTOSEARCH_PORT", &port)?;
        }
        if let Some(secs) = get("OCTOSEARCH_DEADLINE_SECS") {
            self.search.deadline_secs = Some(parse_number("OCTOSEARCH_DEADLINE_SECS", &secs)?);
        }

        if let Some(url) = get("GITHUB_URL") {
            self.github.base_url = url;
        }
        if let Some(secs) = get("GITHUB_TIMEOUT_SECS") {
            self.github.timeout_secs = parse_number("GITHUB_TIMEOUT_SECS", &secs)?;
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(Secret::new(token));
        }

        if let Some(url) = get("GITEA_URL") {
            self.gitea.base_url = Some(url);
        }
        if let Some(secs) = get("GITEA_TIMEOUT_SECS") {
            self.gitea.timeout_secs = parse_number("GITEA_TIMEOUT_SECS", &secs)?;
        }
        if let Some(token) = get("GITEA_TOKEN") {
            self.gitea.token = Some(Secret::new(token));
        }
        Ok(())
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `server.host` must not be empty
    /// - `search.deadline_secs`, if set, must be greater than 0
    /// - backend timeouts and body limits must be greater than 0
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(ServiceError::Config("server.host must not be empty".into()));
        }
        if self.search.deadline_secs == Some(0) {
            return Err(ServiceError::Config(
                "search.deadline_secs must be greater than 0".into(),
            ));
        }
        self.github_config().validate()?;
        self.gitea_config().validate()?;
        Ok(())
    }

    /// The aggregate deadline, if configured.
    pub fn deadline(&self) -> Option<Duration> {
        self.search.deadline_secs.map(Duration::from_secs)
    }

    /// Backend configuration for GitHub.
    pub fn github_config(&self) -> GithubConfig {
        GithubConfig {
            base_url: self.github.base_url.clone(),
            token: self.github.token.as_ref().map(|t| t.expose().to_owned()),
            timeout: Duration::from_secs(self.github.timeout_secs),
            max_response_bytes: self.github.max_response_bytes,
        }
    }

    /// Backend configuration for Gitea.
    pub fn gitea_config(&self) -> GiteaConfig {
        GiteaConfig {
            base_url: self.gitea.base_url.clone(),
            token: self.gitea.token.as_ref().map(|t| t.expose().to_owned()),
            timeout: Duration::from_secs(self.gitea.timeout_secs),
            max_response_bytes: self.gitea.max_response_bytes,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ServiceError::Config(format!("{key} must be a number, got {value:?}")))
}
