//! Integration tests for `YoutubeCollector` using wiremock HTTP mocks.

use flowpulse_collectors::{FetchError, SourceCollector, YoutubeCollector};
use flowpulse_core::Platform;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_collector(base_url: &str) -> YoutubeCollector {
    YoutubeCollector::with_base_url(Some("test-key"), 9000, 30, base_url)
        .expect("collector construction should not fail")
}

fn search_body(ids: &[&str]) -> serde_json::Value {
    json!({
        "items": ids
            .iter()
            .map(|id| json!({ "id": { "videoId": id, "kind": "youtube#video" } }))
            .collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn collects_videos_with_parsed_statistics() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("type", "video"))
        .and(query_param("regionCode", "US"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["vid-a", "vid-b"])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "vid-a,vid-b"))
        .and(query_param("part", "statistics,snippet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "vid-a",
                    "snippet": { "title": "n8n Slack workflow" },
                    "statistics": {
                        "viewCount": "1000",
                        "likeCount": "50",
                        "commentCount": "10"
                    }
                },
                {
                    "id": "vid-b",
                    "snippet": { "title": "n8n webhook basics" },
                    "statistics": { "viewCount": "not-a-number" }
                }
            ]
        })))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let outcome = collector.collect("US", 2).await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.items.len(), 2);

    let first = &outcome.items[0];
    assert_eq!(first.platform, Platform::Youtube);
    assert_eq!(first.platform_id, "vid-a");
    assert_eq!(first.name, "n8n Slack workflow");
    assert_eq!(first.metrics.views, 1000);
    assert_eq!(first.metrics.like_to_view_ratio, Decimal::new(50000, 6));
    assert_eq!(first.metrics.engagement_score, Decimal::new(1500, 4));

    // Unparsable and missing counters both read as zero.
    let second = &outcome.items[1];
    assert_eq!(second.metrics.views, 0);
    assert_eq!(second.metrics.likes, 0);
    assert_eq!(second.metrics.engagement_score, Decimal::ZERO);
}

#[tokio::test]
async fn video_without_snippet_is_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["broken", "ok"])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "broken", "statistics": { "viewCount": "10" } },
                {
                    "id": "ok",
                    "snippet": { "title": "n8n automation" },
                    "statistics": { "viewCount": "10" }
                }
            ]
        })))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let outcome = collector.collect("US", 1).await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].platform_id, "ok");
}

#[tokio::test]
async fn server_error_aborts_the_pass() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let outcome = collector.collect("US", 5).await;

    assert!(outcome.items.is_empty());
    assert!(matches!(
        outcome.error,
        Some(FetchError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn malformed_search_payload_aborts_the_pass() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "items": "not-an-array" })),
        )
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let outcome = collector.collect("US", 5).await;

    assert!(outcome.items.is_empty());
    assert!(matches!(
        outcome.error,
        Some(FetchError::Deserialize { .. })
    ));
}

#[tokio::test]
async fn both_requests_of_a_keyword_pass_are_paced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["vid-a"])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "vid-a", "snippet": { "title": "A" }, "statistics": {} }
            ]
        })))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let started = std::time::Instant::now();
    let outcome = collector.collect("US", 1).await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.items.len(), 1);
    // The search and the statistics call each take one limiter slot, so the
    // second request waits out the courtesy delay.
    assert!(started.elapsed() >= std::time::Duration::from_secs(1));
}

#[tokio::test]
async fn stops_at_the_item_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("maxResults", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["a", "b", "c"])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "a", "snippet": { "title": "A" }, "statistics": {} },
                { "id": "b", "snippet": { "title": "B" }, "statistics": {} },
                { "id": "c", "snippet": { "title": "C" }, "statistics": {} }
            ]
        })))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let outcome = collector.collect("US", 3).await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.items.len(), 3);
}
