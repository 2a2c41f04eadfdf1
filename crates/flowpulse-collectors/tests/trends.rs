//! Integration tests for `TrendsCollector` using wiremock HTTP mocks.

use flowpulse_collectors::{FetchError, SourceCollector, TrendsCollector};
use flowpulse_core::{Platform, TrendDirection};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_collector(base_url: &str) -> TrendsCollector {
    TrendsCollector::with_base_url(0, 30, base_url)
        .expect("collector construction should not fail")
}

/// Wraps a JSON value in the XSSI guard the live endpoints emit.
fn guarded(body: &serde_json::Value) -> String {
    format!(")]}}'\n{body}")
}

fn explore_body(token: &str) -> String {
    guarded(&json!({
        "widgets": [
            {
                "id": "TIMESERIES",
                "token": token,
                "request": { "restriction": { "geo": { "country": "US" } } }
            },
            { "id": "RELATED_QUERIES", "token": "other" }
        ]
    }))
}

fn multiline_body(values: &[i64]) -> String {
    guarded(&json!({
        "default": {
            "timelineData": values
                .iter()
                .map(|v| json!({ "time": "1714521600", "value": [v] }))
                .collect::<Vec<_>>()
        }
    }))
}

#[tokio::test]
async fn collects_interest_series_into_trend_metrics() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/trends/api/explore"))
        .and(query_param("hl", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_string(explore_body("tok-1")))
        .mount(&server)
        .await;

    // Flat series at 40 across the whole window.
    Mock::given(method("GET"))
        .and(path("/trends/api/widgetdata/multiline"))
        .and(query_param("token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(multiline_body(&[40; 90])))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let outcome = collector.collect("US", 1).await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.items.len(), 1);

    let item = &outcome.items[0];
    assert_eq!(item.platform, Platform::Google);
    assert!(!item.platform_id.contains(' '));
    assert_eq!(item.metrics.search_volume, Some(4000));
    assert_eq!(item.metrics.views, 4000);
    assert_eq!(item.metrics.likes, 0);
    assert_eq!(item.metrics.trend_direction, Some(TrendDirection::Stable));
}

#[tokio::test]
async fn empty_series_skips_the_keyword() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/trends/api/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string(explore_body("tok-2")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/trends/api/widgetdata/multiline"))
        .respond_with(ResponseTemplate::new(200).set_body_string(multiline_body(&[])))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let outcome = collector.collect("US", 2).await;

    assert!(outcome.error.is_none());
    assert!(outcome.items.is_empty());
}

#[tokio::test]
async fn explore_without_timeseries_widget_aborts_the_pass() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/trends/api/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(&json!({
            "widgets": [{ "id": "RELATED_QUERIES", "token": "t" }]
        }))))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let outcome = collector.collect("US", 3).await;

    assert!(outcome.items.is_empty());
    assert!(matches!(outcome.error, Some(FetchError::Payload(_))));
}

#[tokio::test]
async fn upstream_rejection_aborts_the_pass() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/trends/api/explore"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let collector = test_collector(&server.uri());
    let outcome = collector.collect("US", 3).await;

    assert!(outcome.items.is_empty());
    assert!(matches!(
        outcome.error,
        Some(FetchError::Status { status: 429, .. })
    ));
}
