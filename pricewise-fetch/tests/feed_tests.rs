//! HTTP tests for feed retrieval against a mock server.

use std::time::Duration;

use pricewise_fetch::{FeedClient, FeedSource, FetchError, HttpClient, RetryStrategy};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_attempts: u32) -> RetryStrategy {
    RetryStrategy::new(max_attempts)
        .with_base_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_millis(50))
}

fn feed_client(server: &MockServer, max_attempts: u32) -> FeedClient {
    let http = HttpClient::new()
        .unwrap()
        .with_retry_strategy(fast_retry(max_attempts));
    FeedClient::new(http, format!("{}/api.json", server.uri()))
}

fn feed_body() -> serde_json::Value {
    json!({
        "anthropic": {
            "name": "Anthropic",
            "models": {
                "claude-sonnet-4": {
                    "name": "Claude Sonnet 4",
                    "cost": {"input": 3, "output": 15, "cache_read": 0.3, "cache_write": 3.75},
                    "limit": {"context": 200_000, "output": 64_000}
                }
            }
        },
        "openai": {
            "name": "OpenAI",
            "models": {
                "gpt-4o": {"name": "GPT-4o", "cost": {"input": 2.5, "output": 10}}
            }
        }
    })
}

#[tokio::test]
async fn test_fetch_entries_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .expect(1)
        .mount(&server)
        .await;

    let entries = feed_client(&server, 3).fetch_entries().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].provider_id, "anthropic");
    assert_eq!(entries[0].limits.output, 64_000);
    assert_eq!(entries[1].model_name, "GPT-4o");
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .mount(&server)
        .await;

    let entries = feed_client(&server, 3).fetch_entries().await.unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn test_rate_limit_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let err = feed_client(&server, 2).fetch_entries().await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::RateLimited {
            retry_after: Some(0)
        }
    ));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = feed_client(&server, 3).fetch_entries().await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = feed_client(&server, 1).fetch_entries().await.unwrap_err();
    assert!(matches!(err, FetchError::Json(_)));
}

#[tokio::test]
async fn test_wrong_shape_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let err = feed_client(&server, 1).fetch_entries().await.unwrap_err();
    assert!(matches!(err, FetchError::Json(_)));
}

#[tokio::test]
async fn test_disallowed_domain_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .expect(0)
        .mount(&server)
        .await;

    let http = HttpClient::new()
        .unwrap()
        .with_allowed_domains(vec!["models.dev".to_string()]);
    let client = FeedClient::new(http, format!("{}/api.json", server.uri()));

    let err = client.fetch_entries().await.unwrap_err();
    assert!(matches!(err, FetchError::DomainNotAllowed(_)));
}
