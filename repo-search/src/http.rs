//! Shared HTTP plumbing for the JSON search backends.
//!
//! Provides a configured [`reqwest::Client`] per backend and the common
//! "send, check status, read a bounded body, normalise each item" path.

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::{BackendError, BackendErrorKind};
use crate::types::{normalize_item, NormalizedResult};

/// User-Agent sent with every backend request. GitHub rejects requests
/// without one.
pub const USER_AGENT: &str = concat!("repo-search/", env!("CARGO_PKG_VERSION"));

/// Default upper bound on a response body.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 5 * 1024 * 1024;

/// Build a [`reqwest::Client`] for one backend.
///
/// The client has:
/// - the backend's request timeout
/// - the backend's default headers (auth, accept)
/// - gzip decompression
///
/// The client holds a connection pool and is meant to be created once and
/// shared by every query to that backend.
///
/// # Errors
///
/// Returns a description of the failure if the client cannot be built
/// (e.g. the TLS backend fails to initialise).
pub fn build_client(timeout: Duration, headers: HeaderMap) -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| format!("failed to build HTTP client: {e}"))
}

/// Send `request` and normalise the item array found under `items_key`.
///
/// Malformed items are dropped and logged at debug level; the rest of the
/// list is still returned.
///
/// # Errors
///
/// Returns [`BackendError`] for timeouts, connection failures, non-success
/// statuses, oversized bodies, and bodies without an item array.
pub async fn fetch_items(
    backend: &str,
    request: reqwest::RequestBuilder,
    items_key: &str,
    timeout: Duration,
    max_response_bytes: usize,
) -> Result<Vec<NormalizedResult>, BackendError> {
    let fail = |kind| BackendError::new(backend, kind);

    let mut response = request
        .send()
        .await
        .map_err(|e| fail(classify_transport_error(&e, timeout)))?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(backend, status = status.as_u16(), "unexpected response status");
        return Err(fail(BackendErrorKind::Status(status.as_u16())));
    }

    if let Some(len) = response.content_length() {
        if len > max_response_bytes as u64 {
            return Err(fail(oversized(max_response_bytes)));
        }
    }

    // Chunked and decompressed bodies carry no usable length, so the limit
    // is enforced while reading.
    let capacity = response
        .content_length()
        .map_or(0, |len| len.min(max_response_bytes as u64) as usize);
    let mut body = Vec::with_capacity(capacity);
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| fail(classify_transport_error(&e, timeout)))?
    {
        if body.len() + chunk.len() > max_response_bytes {
            return Err(fail(oversized(max_response_bytes)));
        }
        body.extend_from_slice(&chunk);
    }

    tracing::trace!(backend, bytes = body.len(), "response received");

    let parsed: Value = serde_json::from_slice(&body)
        .map_err(|e| fail(BackendErrorKind::Decode(format!("not JSON: {e}"))))?;

    let items = extract_items(&parsed, items_key).map_err(fail)?;
    Ok(normalize_items(backend, items))
}

/// Find the item array under `items_key` in a parsed response body.
///
/// # Errors
///
/// Returns [`BackendErrorKind::Decode`] if the key is missing or does not
/// hold an array.
pub fn extract_items<'a>(
    body: &'a Value,
    items_key: &str,
) -> Result<&'a [Value], BackendErrorKind> {
    body.get(items_key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| BackendErrorKind::Decode(format!("missing `{items_key}` array")))
}

/// Normalise every item independently, dropping the malformed ones.
pub fn normalize_items(backend: &str, items: &[Value]) -> Vec<NormalizedResult> {
    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match normalize_item(item) {
            Ok(result) => results.push(result),
            Err(reason) => {
                tracing::debug!(backend, index, %reason, "dropping malformed item");
            }
        }
    }
    tracing::debug!(
        backend,
        count = results.len(),
        dropped = items.len() - results.len(),
        "items normalised"
    );
    results
}

fn classify_transport_error(err: &reqwest::Error, timeout: Duration) -> BackendErrorKind {
    if err.is_timeout() {
        BackendErrorKind::Timeout(timeout)
    } else {
        BackendErrorKind::Transport(err.to_string())
    }
}

fn oversized(limit: usize) -> BackendErrorKind {
    BackendErrorKind::Decode(format!("response body exceeds {limit} bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_client_with_empty_headers() {
        let client = build_client(Duration::from_secs(5), HeaderMap::new());
        assert!(client.is_ok());
    }

    #[test]
    fn user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("repo-search/"));
    }

    #[test]
    fn extract_items_finds_array() {
        let body = json!({"total_count": 1, "items": [{"full_name": "a/b"}]});
        let items = extract_items(&body, "items").expect("array present");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn extract_items_rejects_missing_key() {
        let body = json!({"ok": true});
        let err = extract_items(&body, "data").unwrap_err();
        assert_eq!(err, BackendErrorKind::Decode("missing `data` array".into()));
    }

    #[test]
    fn extract_items_rejects_non_array() {
        let body = json!({"data": {"full_name": "a/b"}});
        assert!(extract_items(&body, "data").is_err());
    }

    #[test]
    fn normalize_items_drops_only_bad_items() {
        let items = vec![
            json!({"full_name": "a/one", "html_url": "https://x.io/a/one"}),
            json!({"full_name": "a/two"}),
            json!({"full_name": "a/three", "html_url": "https://x.io/a/three", "size": 9}),
        ];
        let results = normalize_items("test", &items);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "a/one");
        assert_eq!(results[1].name, "a/three");
        assert_eq!(results[1].size, 9);
    }
}
