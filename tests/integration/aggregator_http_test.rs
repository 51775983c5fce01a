// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scoutrs::domain::search::provider::{SearchError, SearchProvider};
use scoutrs::domain::services::quality_scorer::HeuristicQualityScorer;
use scoutrs::infrastructure::search::aggregator::SearchAggregator;
use scoutrs::infrastructure::search::brave::BraveSearchProvider;
use scoutrs::infrastructure::search::tavily::TavilySearchProvider;

const TIMEOUT: Duration = Duration::from_secs(5);

fn brave_body() -> serde_json::Value {
    json!({
        "web": {
            "results": [
                {
                    "url": "https://github.com/rust-lang/book",
                    "title": "The Rust Book",
                    "description": "Official guide"
                },
                {
                    "url": "https://blog.example.com/rust",
                    "title": "Rust notes",
                    "description": "A blog post"
                }
            ]
        }
    })
}

fn tavily_body() -> serde_json::Value {
    json!({
        "results": [
            {
                "url": "https://docs.rs/tokio",
                "title": "tokio docs",
                "content": "Async runtime documentation"
            }
        ]
    })
}

async fn mock_brave(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/brave"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mock_tavily(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/tavily"))
        .respond_with(template)
        .mount(server)
        .await;
}

fn providers(server: &MockServer) -> (Arc<BraveSearchProvider>, Arc<TavilySearchProvider>) {
    let brave = Arc::new(BraveSearchProvider::with_endpoint(
        Some("brave-key".to_string()),
        &format!("{}/brave", server.uri()),
        TIMEOUT,
    ));
    let tavily = Arc::new(TavilySearchProvider::with_endpoint(
        Some("tavily-key".to_string()),
        &format!("{}/tavily", server.uri()),
        TIMEOUT,
    ));
    (brave, tavily)
}

fn aggregator(
    brave: Arc<BraveSearchProvider>,
    tavily: Arc<TavilySearchProvider>,
) -> SearchAggregator {
    SearchAggregator::new(
        vec![brave, tavily],
        Arc::new(HeuristicQualityScorer),
        None,
        4,
    )
}

#[tokio::test]
async fn test_brave_request_shape_and_parsing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/brave"))
        .and(query_param("q", "rust book"))
        .and(query_param("safesearch", "moderate"))
        .and(header("X-Subscription-Token", "brave-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brave_body()))
        .mount(&server)
        .await;

    let (brave, _) = providers(&server);
    let results = brave.search("rust book", 10).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].url, "https://github.com/rust-lang/book");
    assert_eq!(results[0].description, "Official guide");
}

#[tokio::test]
async fn test_tavily_content_field_maps_to_description() {
    let server = MockServer::start().await;
    mock_tavily(&server, ResponseTemplate::new(200).set_body_json(tavily_body())).await;

    let (_, tavily) = providers(&server);
    let results = tavily.search("tokio", 10).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].description, "Async runtime documentation");
}

#[tokio::test]
async fn test_primary_http_failure_falls_back_over_the_wire() {
    let server = MockServer::start().await;
    mock_brave(&server, ResponseTemplate::new(500)).await;
    mock_tavily(&server, ResponseTemplate::new(200).set_body_json(tavily_body())).await;

    let (brave, tavily) = providers(&server);
    let agg = aggregator(brave, tavily);

    let results = agg.search_only("tokio", 5, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source, "tavily");
}

#[tokio::test]
async fn test_auth_failure_maps_to_auth_error() {
    let server = MockServer::start().await;
    mock_brave(&server, ResponseTemplate::new(401)).await;

    let (brave, _) = providers(&server);
    match brave.search("rust", 5).await {
        Err(SearchError::AuthError(_)) => {}
        other => panic!("expected AuthError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_maps_to_rate_limited() {
    let server = MockServer::start().await;
    mock_tavily(&server, ResponseTemplate::new(429)).await;

    let (_, tavily) = providers(&server);
    match tavily.search("rust", 5).await {
        Err(SearchError::RateLimitExceeded) => {}
        other => panic!("expected RateLimitExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_key_reports_unavailable_without_network() {
    let brave = BraveSearchProvider::new(None, TIMEOUT);
    assert!(!brave.is_available());
    match brave.search("rust", 5).await {
        Err(SearchError::Unavailable(_)) => {}
        other => panic!("expected Unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_both_providers_merge_and_dedup() {
    let server = MockServer::start().await;
    mock_brave(&server, ResponseTemplate::new(200).set_body_json(brave_body())).await;
    mock_tavily(&server, ResponseTemplate::new(200).set_body_json(tavily_body())).await;

    let (brave, tavily) = providers(&server);
    let agg = aggregator(brave, tavily);

    let results = agg.search_only("rust", 10, None).await.unwrap();
    // Brave returned a full page, tavily supplements with one more unique URL
    assert_eq!(results.len(), 3);
    let github = results
        .iter()
        .find(|r| r.domain == "github.com")
        .expect("github result present");
    assert_eq!(github.quality_score, 2);
}
