//! Discourse community forum collector.
//!
//! Fetches one page of latest topics and normalizes each into a collected
//! item. The whole page arrives in a single response, so the rate limiter
//! paces page fetches; per-topic processing is local and needs no pauses.
//! Credentials are optional; without them the forum is read anonymously.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;

use flowpulse_core::{metrics, Platform};

use crate::error::{BuildError, FetchError};
use crate::http::{build_client, decode, expect_success, parse_base_url};
use crate::rate_limit::RateLimiter;
use crate::source::SourceCollector;
use crate::types::{CollectOutcome, CollectedItem, CollectedMetrics};

const DEFAULT_BASE_URL: &str = "https://community.n8n.io/";

/// Collector for workflow discussion topics on the community forum.
pub struct ForumCollector {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    api_username: Option<String>,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    topic_list: TopicList,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    #[serde(default)]
    topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    id: i64,
    title: Option<String>,
    #[serde(default)]
    views: i64,
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    reply_count: i64,
    #[serde(default)]
    posts_count: i64,
    participant_count: Option<i64>,
    posters_count: Option<i64>,
}

impl ForumCollector {
    /// Creates a collector pointed at the production forum.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Http`] if the client cannot be constructed.
    pub fn new(
        api_key: Option<String>,
        api_username: Option<String>,
        requests_per_minute: u32,
        timeout_secs: u64,
    ) -> Result<Self, BuildError> {
        Self::with_base_url(
            api_key,
            api_username,
            requests_per_minute,
            timeout_secs,
            DEFAULT_BASE_URL,
        )
    }

    /// Same as [`ForumCollector::new`] with a custom base URL (for testing
    /// with wiremock).
    ///
    /// # Errors
    ///
    /// As [`ForumCollector::new`], plus [`BuildError::InvalidBaseUrl`].
    pub fn with_base_url(
        api_key: Option<String>,
        api_username: Option<String>,
        requests_per_minute: u32,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            base_url: parse_base_url(base_url)?,
            api_key,
            api_username,
            limiter: RateLimiter::with_quota(
                Duration::from_millis(500),
                requests_per_minute,
                Duration::from_secs(60),
            ),
        })
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(key) = &self.api_key {
            request = request.header("Api-Key", key);
            if let Some(user) = &self.api_username {
                request = request.header("Api-Username", user);
            }
        }
        request
    }

    async fn latest_topics(&self, limit: usize) -> Result<Vec<Topic>, FetchError> {
        let url = format!("{}latest.json", self.base_url);
        let per_page = limit.to_string();
        let request = self
            .client
            .get(&url)
            .query(&[("per_page", per_page.as_str())]);
        let response = self.authenticated(request).send().await?;
        let body: serde_json::Value = expect_success(response)?.json().await?;
        let parsed: LatestResponse = decode(body, "latest.json")?;
        Ok(parsed.topic_list.topics)
    }

    fn normalize(topic: Topic, country: &str) -> Option<CollectedItem> {
        let Some(title) = topic.title else {
            tracing::warn!(topic_id = topic.id, "topic missing title; skipped");
            return None;
        };

        // participant_count is preferred; a missing one falls back to
        // posters_count, and a fully anonymous listing still counts the
        // topic author.
        let participants = topic
            .participant_count
            .filter(|&n| n > 0)
            .or(topic.posters_count)
            .unwrap_or(1);

        Some(CollectedItem {
            name: title,
            platform: Platform::Forum,
            platform_id: topic.id.to_string(),
            country: country.to_owned(),
            metrics: CollectedMetrics {
                views: topic.views,
                likes: topic.like_count,
                comments: topic.posts_count,
                like_to_view_ratio: metrics::ratio(topic.like_count, topic.views),
                comment_to_view_ratio: metrics::ratio(topic.posts_count, topic.views),
                engagement_score: metrics::forum_engagement_score(
                    topic.views,
                    topic.like_count,
                    topic.reply_count,
                    participants,
                ),
                replies: Some(topic.reply_count),
                participants: Some(participants),
                ..CollectedMetrics::default()
            },
        })
    }
}

#[async_trait]
impl SourceCollector for ForumCollector {
    fn platform(&self) -> Platform {
        Platform::Forum
    }

    async fn collect(&self, country: &str, limit: usize) -> CollectOutcome {
        self.limiter.acquire().await;

        let topics = match self.latest_topics(limit).await {
            Ok(topics) => topics,
            Err(e) => {
                tracing::error!(country, error = %e, "forum topic fetch failed");
                return CollectOutcome::aborted(Vec::new(), e);
            }
        };

        let items: Vec<CollectedItem> = topics
            .into_iter()
            .take(limit)
            .filter_map(|topic| Self::normalize(topic, country))
            .collect();

        tracing::debug!(country, count = items.len(), "forum collection pass done");
        CollectOutcome::ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn topic(participant_count: Option<i64>, posters_count: Option<i64>) -> Topic {
        Topic {
            id: 101,
            title: Some("Slack alert workflow".to_owned()),
            views: 1000,
            like_count: 12,
            reply_count: 8,
            posts_count: 9,
            participant_count,
            posters_count,
        }
    }

    #[test]
    fn participants_prefer_participant_count() {
        let item = ForumCollector::normalize(topic(Some(5), Some(3)), "US").unwrap();
        assert_eq!(item.metrics.participants, Some(5));
    }

    #[test]
    fn participants_fall_back_to_posters_then_one() {
        let item = ForumCollector::normalize(topic(None, Some(3)), "US").unwrap();
        assert_eq!(item.metrics.participants, Some(3));

        let item = ForumCollector::normalize(topic(None, None), "US").unwrap();
        assert_eq!(item.metrics.participants, Some(1));
    }

    #[test]
    fn posts_count_is_stored_as_comments() {
        let item = ForumCollector::normalize(topic(Some(5), None), "US").unwrap();
        assert_eq!(item.metrics.comments, 9);
        assert_eq!(item.metrics.replies, Some(8));
        assert_eq!(
            item.metrics.comment_to_view_ratio,
            Decimal::new(9000, 6) // 9 / 1000
        );
    }

    #[test]
    fn untitled_topic_is_skipped() {
        let mut t = topic(Some(5), None);
        t.title = None;
        assert!(ForumCollector::normalize(t, "US").is_none());
    }
}
