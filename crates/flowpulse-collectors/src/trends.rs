//! Google Trends collector.
//!
//! Trends has no official API. The flow mirrors the public web client: an
//! `explore` call returns widget descriptors including a short-lived token,
//! and `widgetdata/multiline` exchanges that token for the interest-over-time
//! series. Both endpoints prefix their JSON with an XSSI guard (`)]}'`) that
//! has to be stripped before parsing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use flowpulse_core::keywords::TREND_KEYWORDS;
use flowpulse_core::{metrics, Platform};

use crate::error::{BuildError, FetchError};
use crate::http::{build_client, expect_success, parse_base_url};
use crate::rate_limit::RateLimiter;
use crate::source::SourceCollector;
use crate::types::{CollectOutcome, CollectedItem, CollectedMetrics};

const DEFAULT_BASE_URL: &str = "https://trends.google.com/";
const EXPLORE_PATH: &str = "trends/api/explore";
const MULTILINE_PATH: &str = "trends/api/widgetdata/multiline";

/// Rolling 3-month window, matching the web client's default presets.
const TIMEFRAME: &str = "today 3-m";

/// Collector for search-interest trends on workflow keywords.
pub struct TrendsCollector {
    client: Client,
    base_url: Url,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    token: Option<String>,
    request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    #[serde(rename = "default")]
    series: Timeline,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Timeline {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    value: Vec<i64>,
}

/// Drops the XSSI guard line so the remainder parses as JSON.
fn strip_guard(body: &str) -> &str {
    body.find('{').map_or(body, |start| &body[start..])
}

fn parse_guarded<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, FetchError> {
    serde_json::from_str(strip_guard(body)).map_err(|e| FetchError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

impl TrendsCollector {
    /// Creates a collector pointed at the production endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Http`] if the client cannot be constructed.
    pub fn new(delay_ms: u64, timeout_secs: u64) -> Result<Self, BuildError> {
        Self::with_base_url(delay_ms, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Same as [`TrendsCollector::new`] with a custom base URL (for testing
    /// with wiremock).
    ///
    /// # Errors
    ///
    /// As [`TrendsCollector::new`], plus [`BuildError::InvalidBaseUrl`].
    pub fn with_base_url(
        delay_ms: u64,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            base_url: parse_base_url(base_url)?,
            limiter: RateLimiter::with_delay(Duration::from_millis(delay_ms)),
        })
    }

    /// Fetches the interest-over-time series for one keyword.
    async fn interest_over_time(
        &self,
        keyword: &str,
        country: &str,
    ) -> Result<Vec<i64>, FetchError> {
        let explore_req = serde_json::json!({
            "comparisonItem": [{ "keyword": keyword, "geo": country, "time": TIMEFRAME }],
            "category": 0,
            "property": "",
        });
        let url = format!("{}{EXPLORE_PATH}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("hl", "en-US"),
                ("tz", "0"),
                ("req", explore_req.to_string().as_str()),
            ])
            .send()
            .await?;
        let body = expect_success(response)?.text().await?;
        let explore: ExploreResponse =
            parse_guarded(&body, &format!("explore(keyword={keyword})"))?;

        let widget = explore
            .widgets
            .into_iter()
            .find(|w| w.id == "TIMESERIES")
            .ok_or_else(|| {
                FetchError::Payload(format!("explore(keyword={keyword}): no TIMESERIES widget"))
            })?;
        let (Some(token), Some(request)) = (widget.token, widget.request) else {
            return Err(FetchError::Payload(format!(
                "explore(keyword={keyword}): TIMESERIES widget without token"
            )));
        };

        let url = format!("{}{MULTILINE_PATH}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("hl", "en-US"),
                ("tz", "0"),
                ("req", request.to_string().as_str()),
                ("token", token.as_str()),
            ])
            .send()
            .await?;
        let body = expect_success(response)?.text().await?;
        let multiline: MultilineResponse =
            parse_guarded(&body, &format!("multiline(keyword={keyword})"))?;

        Ok(multiline
            .series
            .timeline_data
            .into_iter()
            .filter_map(|point| point.value.first().copied())
            .collect())
    }

    fn normalize(keyword: &str, country: &str, points: &[i64]) -> CollectedItem {
        let windows = metrics::interest_windows(points);
        let growth = metrics::growth_percentage(windows.older, windows.recent);
        let volume = metrics::estimated_search_volume(windows.average);

        CollectedItem {
            name: keyword.to_owned(),
            platform: Platform::Google,
            platform_id: keyword.replace(' ', "-"),
            country: country.to_owned(),
            metrics: CollectedMetrics {
                views: volume,
                likes: 0,
                comments: 0,
                engagement_score: metrics::trend_engagement_score(windows.average),
                search_volume: Some(volume),
                trend_direction: Some(metrics::trend_direction(growth)),
                growth_percentage: Some(growth),
                ..CollectedMetrics::default()
            },
        }
    }
}

#[async_trait]
impl SourceCollector for TrendsCollector {
    fn platform(&self) -> Platform {
        Platform::Google
    }

    async fn collect(&self, country: &str, limit: usize) -> CollectOutcome {
        let mut items = Vec::new();

        for &keyword in TREND_KEYWORDS.iter().take(limit) {
            self.limiter.acquire().await;

            let points = match self.interest_over_time(keyword, country).await {
                Ok(points) => points,
                Err(e) => {
                    tracing::error!(keyword, country, error = %e, "trend fetch failed");
                    return CollectOutcome::aborted(items, e);
                }
            };
            if points.is_empty() {
                tracing::debug!(keyword, country, "empty interest series; skipped");
                continue;
            }

            items.push(Self::normalize(keyword, country, &points));
        }

        tracing::debug!(country, count = items.len(), "trend collection pass done");
        CollectOutcome::ok(items)
    }
}
