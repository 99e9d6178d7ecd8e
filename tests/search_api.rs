//! End-to-end tests for the HTTP API.
//!
//! Each test starts a real `SearchServer` on an ephemeral port, backed by
//! GitHub and Gitea backends pointed at local mock servers, and talks to it
//! over HTTP.

use std::time::Duration;

use octosearch::config::{Secret, ServerConfig, ServiceConfig};
use octosearch::startup::{build_aggregator, build_registry};
use octosearch::{AppState, SearchServer};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ephemeral() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
    }
}

fn item(name: &str) -> Value {
    json!({
        "full_name": name,
        "size": 10,
        "html_url": format!("https://example.com/{name}"),
        "owner": {"login": name.split('/').next().unwrap_or_default()}
    })
}

async fn start(config: &ServiceConfig) -> SearchServer {
    let registry = build_registry(config).expect("registry");
    let aggregator = build_aggregator(config);
    SearchServer::start(AppState::new(registry, aggregator), &ephemeral())
        .await
        .expect("server starts")
}

async fn get(server: &SearchServer, path_and_query: &str) -> (u16, Value) {
    let url = format!("http://{}{}", server.addr(), path_and_query);
    let response = reqwest::get(&url).await.expect("request succeeds");
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.expect("JSON body");
    (status, body)
}

/// GitHub and Gitea both configured against mock servers.
async fn mocked_config(github: &MockServer, gitea: &MockServer) -> ServiceConfig {
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [item("Foo/Bar")]
        })))
        .mount(github)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/repos/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [item("alpha/beta")]
        })))
        .mount(gitea)
        .await;

    let mut config = ServiceConfig::default();
    config.github.base_url = github.uri();
    config.gitea.base_url = Some(gitea.uri());
    config.gitea.token = Some(Secret::new("tea"));
    config
}

#[tokio::test]
async fn search_merges_both_backends() {
    let github = MockServer::start().await;
    let gitea = MockServer::start().await;
    let server = start(&mocked_config(&github, &gitea).await).await;

    let (status, body) = get(&server, "/search-repos?q=bar&engines=github,gitea").await;

    assert_eq!(status, 200);
    let names: Vec<&str> = body["repos"]
        .as_array()
        .expect("repos array")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert_eq!(names, vec!["alpha/beta", "Foo/Bar"]);
    assert_eq!(body["errors"], json!([]));
    assert_eq!(body["repos"][1]["owner"], "Foo");
    assert_eq!(body["repos"][1]["size"], 10);

    server.shutdown().await;
}

#[tokio::test]
async fn unconfigured_gitea_is_reported_in_errors() {
    let server = start(&ServiceConfig::default()).await;

    let (status, body) = get(&server, "/search-repos?q=octo&engines=gitea").await;

    assert_eq!(status, 200);
    assert_eq!(body["repos"], json!([]));
    assert_eq!(body["errors"], json!(["gitea: not initialized"]));
}

#[tokio::test]
async fn engines_default_to_gitea() {
    let server = start(&ServiceConfig::default()).await;

    let (status, body) = get(&server, "/search-repos?q=octo").await;

    assert_eq!(status, 200);
    assert_eq!(body["errors"], json!(["gitea: not initialized"]));
}

#[tokio::test]
async fn unknown_engine_is_a_bad_request() {
    let github = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(0)
        .mount(&github)
        .await;

    let mut config = ServiceConfig::default();
    config.github.base_url = github.uri();
    let server = start(&config).await;

    let (status, body) = get(&server, "/search-repos?q=octo&engines=github,bitbucket").await;

    assert_eq!(status, 400);
    assert_eq!(body["detail"], "unknown engine bitbucket");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn unknown_engine_is_reported_without_query() {
    let server = start(&ServiceConfig::default()).await;

    let (status, body) = get(&server, "/search-repos?engines=bitbucket").await;

    assert_eq!(status, 400);
    assert_eq!(body["detail"], "unknown engine bitbucket");
}

#[tokio::test]
async fn malformed_query_is_checked_before_engines() {
    let server = start(&ServiceConfig::default()).await;

    let (status, body) = get(&server, "/search-repos?q=x&engines=bitbucket").await;

    assert_eq!(status, 422);
    assert!(
        body["detail"]
            .as_str()
            .expect("detail")
            .contains("at least 2 characters")
    );
}

#[tokio::test]
async fn invalid_query_is_unprocessable() {
    let server = start(&ServiceConfig::default()).await;

    let (status, body) = get(&server, "/search-repos?q=").await;
    assert_eq!(status, 422);
    assert!(
        body["detail"]
            .as_str()
            .expect("detail")
            .contains("at least 2 characters")
    );

    let (status, _) = get(&server, "/search-repos?q=has%20space").await;
    assert_eq!(status, 422);

    let (status, body) = get(&server, "/search-repos").await;
    assert_eq!(status, 422);
    assert!(body["detail"].as_str().expect("detail").contains("required"));
}

#[tokio::test]
async fn failing_backend_keeps_status_ok() {
    let github = MockServer::start().await;
    let gitea = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&github)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/repos/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [item("team/repo")]
        })))
        .mount(&gitea)
        .await;

    let mut config = ServiceConfig::default();
    config.github.base_url = github.uri();
    config.gitea.base_url = Some(gitea.uri());
    config.gitea.token = Some(Secret::new("tea"));
    let server = start(&config).await;

    let (status, body) = get(&server, "/search-repos?q=repo&engines=github,gitea").await;

    assert_eq!(status, 200);
    assert_eq!(body["repos"][0]["name"], "team/repo");
    assert_eq!(
        body["errors"],
        json!(["github: unexpected response status 502"])
    );
}

#[tokio::test]
async fn deadline_reports_slow_backend() {
    let github = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": [item("slow/repo")]}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&github)
        .await;

    let mut config = ServiceConfig::default();
    config.github.base_url = github.uri();
    config.search.deadline_secs = Some(1);
    let server = start(&config).await;

    let (status, body) = get(&server, "/search-repos?q=slow&engines=github").await;

    assert_eq!(status, 200);
    assert_eq!(body["repos"], json!([]));
    assert_eq!(
        body["errors"],
        json!(["github: no response within 1000ms deadline"])
    );
}

#[tokio::test]
async fn available_engines_are_sorted() {
    let server = start(&ServiceConfig::default()).await;

    let (status, body) = get(&server, "/available-engines").await;

    assert_eq!(status, 200);
    assert_eq!(body, json!(["gitea", "github"]));
}
