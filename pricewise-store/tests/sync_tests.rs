//! End-to-end synchronization: mock feed over HTTP into a SQLite catalog.

use std::time::Duration;

use pricewise_core::{
    compute, find_pricing, CatalogKey, CatalogStore, MarkupConfig, MarkupResolver, MarkupRule,
    PricingPolicy, TokenUsage, UsageRecord,
};
use pricewise_fetch::{FeedClient, HttpClient, RetryStrategy};
use pricewise_store::{
    MarkupRuleStore, PricingSynchronizer, SqliteCatalogStore, StoreError, SyncError,
};
use serde_json::json;
use tempfile::TempDir;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Routes `RUST_LOG`-filtered logs to the test output. Safe to call twice.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

fn feed_client(server: &MockServer) -> FeedClient {
    let http = HttpClient::new().unwrap().with_retry_strategy(
        RetryStrategy::new(2)
            .with_base_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(20)),
    );
    FeedClient::new(http, format!("{}/api.json", server.uri()))
}

fn first_feed() -> serde_json::Value {
    json!({
        "openai": {
            "name": "OpenAI",
            "models": {
                "gpt-4o": {"name": "GPT-4o", "cost": {"input": 2.5, "output": 10}},
                "gpt-4": {"name": "GPT-4", "cost": {"input": 30, "output": 60}}
            }
        },
        "anthropic": {
            "name": "Anthropic",
            "models": {
                "claude-sonnet-4": {
                    "name": "Claude Sonnet 4",
                    "cost": {"input": 3, "output": 15},
                    "limit": {"context": 200_000, "output": 64_000}
                }
            }
        }
    })
}

fn second_feed() -> serde_json::Value {
    json!({
        "openai": {
            "name": "OpenAI",
            "models": {
                "gpt-4o": {"name": "GPT-4o", "cost": {"input": 2.0, "output": 8}}
            }
        },
        "anthropic": {
            "name": "Anthropic",
            "models": {
                "claude-sonnet-4": {
                    "name": "Claude Sonnet 4",
                    "cost": {"input": 3, "output": 15},
                    "limit": {"context": 200_000, "output": 64_000}
                }
            }
        },
        "google": {
            "name": "Google",
            "models": {"gemini-2.5-pro": {"name": "Gemini 2.5 Pro", "cost": {"input": 1.25, "output": 10}}}
        }
    })
}

async fn serve(server: &MockServer, body: serde_json::Value) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_reconciliation_cycle() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = SqliteCatalogStore::open(&dir.path().join("catalog.db"))
        .await
        .unwrap();
    let sync = PricingSynchronizer::new(store.clone());
    let server = MockServer::start().await;
    let feed = feed_client(&server);

    serve(&server, first_feed()).await;
    let report = sync.sync_from_feed(&feed).await.unwrap();
    assert_eq!(
        (report.insert_count, report.update_count, report.delete_count),
        (3, 0, 0)
    );

    // Unchanged feed: no writes.
    let report = sync.sync_from_feed(&feed).await.unwrap();
    assert!(report.is_noop());

    // M = 3, N = 3, K = 2, C = 1.
    serve(&server, second_feed()).await;
    let report = sync.sync_from_feed(&feed).await.unwrap();
    assert_eq!(
        (report.insert_count, report.update_count, report.delete_count),
        (1, 1, 1)
    );

    let keys: Vec<String> = store
        .list()
        .await
        .unwrap()
        .iter()
        .map(|e| e.key().to_string())
        .collect();
    assert_eq!(
        keys,
        vec![
            "anthropic/claude-sonnet-4",
            "google/gemini-2.5-pro",
            "openai/gpt-4o"
        ]
    );

    let gpt = store
        .get(&CatalogKey::new("openai", "gpt-4o"))
        .await
        .unwrap()
        .unwrap();
    let PricingPolicy::Tokens(pricing) = gpt.pricing else {
        panic!("expected token pricing");
    };
    assert_eq!(pricing.input, 2.0);
}

#[tokio::test]
async fn test_feed_failure_leaves_catalog_intact() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = SqliteCatalogStore::open(&dir.path().join("catalog.db"))
        .await
        .unwrap();
    let sync = PricingSynchronizer::new(store.clone());
    let server = MockServer::start().await;
    let feed = feed_client(&server);

    serve(&server, first_feed()).await;
    sync.sync_from_feed(&feed).await.unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = sync.sync_from_feed(&feed).await.unwrap_err();
    assert!(matches!(err, SyncError::Fetch(_)));
    assert_eq!(store.list().await.unwrap().len(), 3);

    // An empty but valid feed is a legitimate instruction to clear the catalog.
    serve(&server, json!({})).await;
    let report = sync.sync_from_feed(&feed).await.unwrap();
    assert_eq!(report.delete_count, 3);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_synced_pricing_drives_cost() {
    let dir = TempDir::new().unwrap();
    let store = SqliteCatalogStore::open_in_memory().unwrap();
    let sync = PricingSynchronizer::new(store.clone());
    let server = MockServer::start().await;
    serve(&server, first_feed()).await;
    sync.sync_from_feed(&feed_client(&server)).await.unwrap();

    let rules = MarkupRuleStore::new(dir.path().join("rules.json"));
    rules.upsert(MarkupRule::provider("openai", 1.25)).unwrap();
    let config = MarkupConfig::new(vec![MarkupRule::provider("openai", 3.0)]);

    let entry = find_pricing(&store, "openai", "gpt-4o").await.unwrap();
    let multiplier = MarkupResolver::new(vec![&rules, &config]).resolve(
        &entry.provider_id,
        Some(&entry.model_id),
        None,
    );
    let usage = UsageRecord::Tokens(TokenUsage::new(1_000_000, 100_000));
    let result = compute(&usage, &entry.pricing, multiplier).unwrap();

    // 2.5 + 0.1 * 10 = 3.5; 3.5 * 1.25 = 4.375
    assert_eq!(result.cost.amount, 3.5);
    assert_eq!(result.cost_for_user.amount, 4.375);

    let missing = find_pricing(&store, "openai", "gpt-9").await.unwrap_err();
    assert!(matches!(missing, StoreError::Core(_)));
}
