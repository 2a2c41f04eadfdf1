//! YouTube Data API v3 collector.
//!
//! Walks the fixed keyword list, searching for workflow videos per keyword
//! and then fetching statistics for the hits in one batch call. Counter
//! fields arrive as decimal strings; anything missing or unparsable counts
//! as zero.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use flowpulse_core::keywords::YOUTUBE_KEYWORDS;
use flowpulse_core::{metrics, Platform};

use crate::error::{BuildError, FetchError};
use crate::http::{build_client, decode, expect_success, parse_base_url};
use crate::rate_limit::RateLimiter;
use crate::source::SourceCollector;
use crate::types::{CollectOutcome, CollectedItem, CollectedMetrics};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Search hits requested per keyword, capped by the remaining item budget.
const RESULTS_PER_KEYWORD: usize = 5;

/// Collector for workflow videos on YouTube.
pub struct YoutubeCollector {
    client: Client,
    base_url: Url,
    api_key: String,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    id: String,
    snippet: Option<Snippet>,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

fn parse_count(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

impl YoutubeCollector {
    /// Creates a collector pointed at the production API.
    ///
    /// # Errors
    ///
    /// [`BuildError::MissingApiKey`] when `api_key` is `None`, or
    /// [`BuildError::Http`] if the client cannot be constructed.
    pub fn new(
        api_key: Option<&str>,
        requests_per_day: u32,
        timeout_secs: u64,
    ) -> Result<Self, BuildError> {
        Self::with_base_url(api_key, requests_per_day, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Same as [`YoutubeCollector::new`] with a custom base URL (for testing
    /// with wiremock).
    ///
    /// # Errors
    ///
    /// As [`YoutubeCollector::new`], plus [`BuildError::InvalidBaseUrl`].
    pub fn with_base_url(
        api_key: Option<&str>,
        requests_per_day: u32,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, BuildError> {
        let api_key = api_key.ok_or(BuildError::MissingApiKey {
            var: "YOUTUBE_API_KEY",
        })?;
        Ok(Self {
            client: build_client(timeout_secs)?,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_owned(),
            limiter: RateLimiter::with_quota(
                Duration::from_secs(1),
                requests_per_day,
                Duration::from_secs(24 * 60 * 60),
            ),
        })
    }

    async fn search_ids(
        &self,
        keyword: &str,
        country: &str,
        max_results: usize,
    ) -> Result<Vec<String>, FetchError> {
        let url = format!("{}search", self.base_url);
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "id,snippet"),
                ("q", keyword),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("regionCode", country),
                ("relevanceLanguage", "en"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let body: serde_json::Value = expect_success(response)?.json().await?;
        let parsed: SearchResponse = decode(body, &format!("search(q={keyword})"))?;
        Ok(parsed
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }

    async fn fetch_videos(&self, ids: &[String]) -> Result<Vec<Video>, FetchError> {
        let url = format!("{}videos", self.base_url);
        let ids = ids.join(",");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "statistics,snippet"),
                ("id", ids.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let body: serde_json::Value = expect_success(response)?.json().await?;
        let parsed: VideosResponse = decode(body, "videos")?;
        Ok(parsed.items)
    }

    fn normalize(video: Video, country: &str) -> Option<CollectedItem> {
        let Some(snippet) = video.snippet else {
            tracing::warn!(video_id = %video.id, "video missing snippet; skipped");
            return None;
        };

        let views = parse_count(video.statistics.view_count.as_deref());
        let likes = parse_count(video.statistics.like_count.as_deref());
        let comments = parse_count(video.statistics.comment_count.as_deref());

        Some(CollectedItem {
            name: snippet.title,
            platform: Platform::Youtube,
            platform_id: video.id,
            country: country.to_owned(),
            metrics: CollectedMetrics {
                views,
                likes,
                comments,
                like_to_view_ratio: metrics::ratio(likes, views),
                comment_to_view_ratio: metrics::ratio(comments, views),
                engagement_score: metrics::video_engagement_score(views, likes, comments),
                ..CollectedMetrics::default()
            },
        })
    }
}

#[async_trait]
impl SourceCollector for YoutubeCollector {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    async fn collect(&self, country: &str, limit: usize) -> CollectOutcome {
        let mut items = Vec::new();

        for &keyword in YOUTUBE_KEYWORDS {
            if items.len() >= limit {
                break;
            }
            self.limiter.acquire().await;

            let budget = RESULTS_PER_KEYWORD.min(limit - items.len());
            let ids = match self.search_ids(keyword, country, budget).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::error!(keyword, country, error = %e, "video search failed");
                    return CollectOutcome::aborted(items, e);
                }
            };
            if ids.is_empty() {
                continue;
            }

            // The batch statistics call spends quota too.
            self.limiter.acquire().await;
            let videos = match self.fetch_videos(&ids).await {
                Ok(videos) => videos,
                Err(e) => {
                    tracing::error!(keyword, country, error = %e, "video statistics fetch failed");
                    return CollectOutcome::aborted(items, e);
                }
            };
            for video in videos {
                if items.len() >= limit {
                    break;
                }
                if let Some(item) = Self::normalize(video, country) {
                    items.push(item);
                }
            }
        }

        tracing::debug!(country, count = items.len(), "video collection pass done");
        CollectOutcome::ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_fails_fast() {
        let built = YoutubeCollector::new(None, 9000, 30);
        assert!(matches!(
            built,
            Err(BuildError::MissingApiKey {
                var: "YOUTUBE_API_KEY"
            })
        ));
    }

    #[test]
    fn counters_parse_or_default_to_zero() {
        assert_eq!(parse_count(Some("1234")), 1234);
        assert_eq!(parse_count(Some("not-a-number")), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let built = YoutubeCollector::with_base_url(Some("key"), 9000, 30, "not a url");
        assert!(matches!(built, Err(BuildError::InvalidBaseUrl { .. })));
    }
}
