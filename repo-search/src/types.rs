//! Core types: the normalised repository record and the aggregate response.
//!
//! Every backend turns its raw JSON items into [`NormalizedResult`] values
//! through [`normalize_item`], so the field defaults and validation rules
//! live in exactly one place.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// One repository found by a backend.
///
/// Values are only built through [`normalize_item`] (or [`NormalizedResult::new`]
/// in tests), so a record with an empty name or an invalid URL never reaches
/// a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResult {
    /// Fully-qualified repository name, e.g. `"owner/repo"`.
    pub name: String,
    /// Repository size in backend-defined units. Missing in raw data maps to 0.
    pub size: u64,
    /// Absolute `http`/`https` URL of the repository page.
    pub url: String,
    /// Login of the owning account, or empty if the backend omitted it.
    pub owner: String,
}

impl NormalizedResult {
    /// Build a record directly from known-good parts.
    pub fn new(
        name: impl Into<String>,
        size: u64,
        url: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            url: url.into(),
            owner: owner.into(),
        }
    }
}

/// Why a single raw item was dropped during normalisation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedItem {
    /// The item is not a JSON object.
    #[error("item is not an object")]
    NotAnObject,
    /// `full_name` is missing, empty, or not a string.
    #[error("missing full_name")]
    MissingName,
    /// `size` is present but not a non-negative integer.
    #[error("invalid size {0}")]
    InvalidSize(String),
    /// `html_url` is missing or not a string.
    #[error("missing html_url")]
    MissingUrl,
    /// `html_url` is not an absolute http(s) URL.
    #[error("invalid html_url {0:?}")]
    InvalidUrl(String),
}

/// Normalise one raw repository item from a GitHub- or Gitea-style API.
///
/// Field mapping:
///
/// | raw            | normalised | when absent          |
/// |----------------|------------|----------------------|
/// | `full_name`    | `name`     | item dropped         |
/// | `size`         | `size`     | `0`                  |
/// | `html_url`     | `url`      | item dropped         |
/// | `owner.login`  | `owner`    | `""`                 |
///
/// # Errors
///
/// Returns [`MalformedItem`] when the item cannot satisfy the
/// [`NormalizedResult`] invariants. Callers drop that item and keep the rest.
pub fn normalize_item(item: &Value) -> Result<NormalizedResult, MalformedItem> {
    let obj = item.as_object().ok_or(MalformedItem::NotAnObject)?;

    let name = obj
        .get("full_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(MalformedItem::MissingName)?;

    let size = match obj.get("size") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .ok_or_else(|| MalformedItem::InvalidSize(v.to_string()))?,
    };

    let raw_url = obj
        .get("html_url")
        .and_then(Value::as_str)
        .ok_or(MalformedItem::MissingUrl)?;
    let url = validate_http_url(raw_url)
        .ok_or_else(|| MalformedItem::InvalidUrl(raw_url.to_owned()))?;

    // Chained default: a missing owner object and a missing login both give "".
    let owner = obj
        .get("owner")
        .and_then(|o| o.get("login"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(NormalizedResult {
        name: name.to_owned(),
        size,
        url,
        owner: owner.to_owned(),
    })
}

/// Parse `raw` and return its serialised form if it is an absolute
/// `http`/`https` URL with a host.
pub fn validate_http_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let is_http = matches!(parsed.scheme(), "http" | "https");
    if !is_http || parsed.host_str().is_none() {
        return None;
    }
    Some(parsed.into())
}

/// The merged outcome of one query across the selected backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResponse {
    /// Results from every successful backend, sorted case-insensitively by name.
    pub results: Vec<NormalizedResult>,
    /// One message per failed backend, in selection order.
    pub errors: Vec<String>,
}
