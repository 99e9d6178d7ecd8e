//! Concurrent fan-out to the selected backends and deterministic merge.
//!
//! Every backend is queried at once and the join waits for all of them to
//! settle. A failing or slow backend never cancels its siblings; its error
//! becomes one message in [`AggregateResponse::errors`].

use std::sync::Arc;
use std::time::Duration;

use crate::backend::SearchBackend;
use crate::error::{BackendError, BackendErrorKind};
use crate::types::{AggregateResponse, NormalizedResult};

/// The settled result of one backend for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    /// The backend returned (possibly zero) normalised results.
    Success(Vec<NormalizedResult>),
    /// The backend failed; the error carries its name.
    Failure(BackendError),
}

impl From<Result<Vec<NormalizedResult>, BackendError>> for BackendOutcome {
    fn from(result: Result<Vec<NormalizedResult>, BackendError>) -> Self {
        match result {
            Ok(results) => Self::Success(results),
            Err(err) => Self::Failure(err),
        }
    }
}

/// Dispatches one query to many backends and merges the outcomes.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    deadline: Option<Duration>,
}

impl Aggregator {
    /// An aggregator that relies only on each backend's own timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the whole fan-out by `deadline`. Backends still outstanding when
    /// it elapses are reported as [`BackendErrorKind::DeadlineExceeded`].
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The configured global deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Run `query` against every backend in `backends` and merge the results.
    ///
    /// # Pipeline
    ///
    /// 1. Fan out with [`futures::future::join_all`]
    /// 2. Wait for every backend to settle
    /// 3. Flatten successes, collect failure messages in dispatch order
    /// 4. Stable sort by case-insensitive name
    ///
    /// This never fails: if every backend fails the response simply has no
    /// results and one error per backend.
    pub async fn run(&self, query: &str, backends: &[Arc<dyn SearchBackend>]) -> AggregateResponse {
        tracing::trace!(query, backends = backends.len(), "dispatching search");

        let outcomes = self.dispatch(query, backends).await;
        let response = merge(outcomes);

        tracing::debug!(
            results = response.results.len(),
            errors = response.errors.len(),
            "search settled"
        );
        response
    }

    /// Query every backend concurrently and return one outcome per backend,
    /// in the same order as `backends`.
    pub async fn dispatch(
        &self,
        query: &str,
        backends: &[Arc<dyn SearchBackend>],
    ) -> Vec<BackendOutcome> {
        let futures = backends.iter().map(|backend| {
            let deadline = self.deadline;
            async move {
                let result = match deadline {
                    Some(limit) => tokio::time::timeout(limit, backend.search(query))
                        .await
                        .unwrap_or_else(|_| {
                            Err(BackendError::new(
                                backend.name(),
                                BackendErrorKind::DeadlineExceeded(limit),
                            ))
                        }),
                    None => backend.search(query).await,
                };
                match &result {
                    Ok(results) => {
                        tracing::debug!(
                            backend = backend.name(),
                            count = results.len(),
                            "backend returned results"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            backend = backend.name(),
                            error = %err,
                            "backend query failed"
                        );
                    }
                }
                BackendOutcome::from(result)
            }
        });

        futures::future::join_all(futures).await
    }
}

/// Merge settled outcomes into one response.
///
/// Successes are concatenated in dispatch order and then stable-sorted by
/// lowercased name, so equal names keep their relative order and the result
/// does not depend on which backend finished first.
pub fn merge(outcomes: Vec<BackendOutcome>) -> AggregateResponse {
    let mut results: Vec<NormalizedResult> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for outcome in outcomes {
        match outcome {
            BackendOutcome::Success(found) => results.extend(found),
            BackendOutcome::Failure(err) => errors.push(err.to_string()),
        }
    }

    results.sort_by_cached_key(|r| r.name.to_lowercase());

    AggregateResponse { results, errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str) -> NormalizedResult {
        NormalizedResult::new(name, 0, format!("https://example.com/{name}"), "")
    }

    fn names(response: &AggregateResponse) -> Vec<&str> {
        response.results.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn merge_sorts_case_insensitively() {
        let response = merge(vec![
            BackendOutcome::Success(vec![repo("Foo/Bar")]),
            BackendOutcome::Success(vec![repo("alpha/beta")]),
        ]);
        assert_eq!(names(&response), vec!["alpha/beta", "Foo/Bar"]);
        assert!(response.errors.is_empty());
    }

    #[test]
    fn merge_is_stable_for_equal_keys() {
        let mut first = repo("Same/Name");
        first.owner = "first".into();
        let mut second = repo("same/name");
        second.owner = "second".into();

        let response = merge(vec![
            BackendOutcome::Success(vec![first]),
            BackendOutcome::Success(vec![second]),
        ]);
        let owners: Vec<&str> = response.results.iter().map(|r| r.owner.as_str()).collect();
        assert_eq!(owners, vec!["first", "second"]);
    }

    #[test]
    fn merge_order_independent_for_distinct_names() {
        let a = vec![repo("zeta/z"), repo("Beta/b")];
        let b = vec![repo("alpha/a"), repo("Gamma/g")];

        let forward = merge(vec![
            BackendOutcome::Success(a.clone()),
            BackendOutcome::Success(b.clone()),
        ]);
        let reverse = merge(vec![BackendOutcome::Success(b), BackendOutcome::Success(a)]);
        assert_eq!(forward.results, reverse.results);
        assert_eq!(names(&forward), vec!["alpha/a", "Beta/b", "Gamma/g", "zeta/z"]);
    }

    #[test]
    fn merge_keeps_error_order() {
        let response = merge(vec![
            BackendOutcome::Failure(BackendError::new("gitea", BackendErrorKind::Status(502))),
            BackendOutcome::Success(vec![repo("a/b")]),
            BackendOutcome::Failure(BackendError::new(
                "github",
                BackendErrorKind::Transport("connection refused".into()),
            )),
        ]);
        assert_eq!(
            response.errors,
            vec![
                "gitea: unexpected response status 502",
                "github: request failed: connection refused"
            ]
        );
        assert_eq!(names(&response), vec!["a/b"]);
    }

    #[test]
    fn merge_all_failed_is_not_an_error() {
        let response = merge(vec![BackendOutcome::Failure(BackendError::new(
            "gitea",
            BackendErrorKind::NotInitialized {
                reason: "GITEA_TOKEN is not set".into(),
            },
        ))]);
        assert!(response.results.is_empty());
        assert_eq!(response.errors, vec!["gitea: not initialized"]);
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        assert_eq!(merge(vec![]), AggregateResponse::default());
    }

    #[test]
    fn outcome_from_result() {
        assert_eq!(
            BackendOutcome::from(Ok(vec![])),
            BackendOutcome::Success(vec![])
        );
        let err = BackendError::new("github", BackendErrorKind::Status(404));
        assert_eq!(
            BackendOutcome::from(Err(err.clone())),
            BackendOutcome::Failure(err)
        );
    }

    #[test]
    fn deadline_builder() {
        assert_eq!(Aggregator::new().deadline(), None);
        let aggregator = Aggregator::new().with_deadline(Duration::from_secs(3));
        assert_eq!(aggregator.deadline(), Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn run_with_no_backends_is_empty() {
        let response = Aggregator::new().run("rust", &[]).await;
        assert_eq!(response, AggregateResponse::default());
    }
}
