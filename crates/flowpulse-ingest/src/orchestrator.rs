//! The orchestrator proper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use sqlx::PgPool;
use tokio::time::Instant;

use flowpulse_collectors::{
    CollectOutcome, CollectedItem, ForumCollector, SourceCollector, TrendsCollector,
    YoutubeCollector,
};
use flowpulse_core::{AppConfig, Platform};
use flowpulse_db::{
    complete_collection_run, fail_collection_run, insert_metric_snapshot, resolve_workflow,
    start_collection_run, DbError, NewMetricSnapshot,
};

use crate::report::{UnitResult, UnitStatus};

const CANCELLED_MESSAGE: &str = "collection cancelled: deadline exceeded";

/// Runs collection passes and persists what they gather.
///
/// Holds one collector per available platform. A platform whose collector
/// could not be constructed (missing credential) is simply absent; requesting
/// it yields failed units rather than an error.
pub struct Orchestrator {
    pool: PgPool,
    collectors: HashMap<Platform, Arc<dyn SourceCollector>>,
    max_concurrent_platforms: usize,
}

impl Orchestrator {
    pub fn new(
        pool: PgPool,
        collectors: Vec<Arc<dyn SourceCollector>>,
        max_concurrent_platforms: usize,
    ) -> Self {
        let collectors = collectors
            .into_iter()
            .map(|c| (c.platform(), c))
            .collect();
        Self {
            pool,
            collectors,
            max_concurrent_platforms,
        }
    }

    /// Builds collectors from the app configuration.
    ///
    /// A collector that fails to construct is logged and left out; the
    /// remaining sources are unaffected.
    pub fn from_config(pool: PgPool, config: &AppConfig) -> Self {
        let mut collectors: Vec<Arc<dyn SourceCollector>> = Vec::new();

        match YoutubeCollector::new(
            config.youtube_api_key.as_deref(),
            config.youtube_requests_per_day,
            config.request_timeout_secs,
        ) {
            Ok(c) => collectors.push(Arc::new(c)),
            Err(e) => {
                tracing::warn!(platform = %Platform::Youtube, error = %e, "collector unavailable");
            }
        }

        match ForumCollector::new(
            config.discourse_api_key.clone(),
            config.discourse_api_username.clone(),
            config.discourse_requests_per_minute,
            config.request_timeout_secs,
        ) {
            Ok(c) => collectors.push(Arc::new(c)),
            Err(e) => {
                tracing::warn!(platform = %Platform::Forum, error = %e, "collector unavailable");
            }
        }

        match TrendsCollector::new(config.trends_delay_ms, config.request_timeout_secs) {
            Ok(c) => collectors.push(Arc::new(c)),
            Err(e) => {
                tracing::warn!(platform = %Platform::Google, error = %e, "collector unavailable");
            }
        }

        Self::new(pool, collectors, config.max_concurrent_platforms)
    }

    /// Platforms with a working collector, in canonical order.
    pub fn available_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.collectors.contains_key(p))
            .collect()
    }

    /// Runs every requested `(platform, country)` unit and reports each one.
    ///
    /// Platforms run concurrently up to the configured bound; countries
    /// within a platform run sequentially so the platform's rate limiter
    /// paces the whole pass. This call never fails; every unit ends up in
    /// the returned report, succeeded or failed.
    pub async fn run_all(
        &self,
        platforms: &[Platform],
        countries: &[String],
        limit_per_unit: usize,
        deadline: Option<Duration>,
    ) -> Vec<UnitResult> {
        let started = Instant::now();

        let per_platform: Vec<Vec<UnitResult>> = stream::iter(platforms.iter().copied())
            .map(|platform| {
                self.run_platform(platform, countries, limit_per_unit, deadline, started)
            })
            .buffer_unordered(self.max_concurrent_platforms.max(1))
            .collect()
            .await;

        let results: Vec<UnitResult> = per_platform.into_iter().flatten().collect();
        let failed = results
            .iter()
            .filter(|r| r.status == UnitStatus::Failed)
            .count();
        if failed > 0 {
            tracing::warn!(failed, total = results.len(), "some units failed");
        }
        results
    }

    async fn run_platform(
        &self,
        platform: Platform,
        countries: &[String],
        limit_per_unit: usize,
        deadline: Option<Duration>,
        started: Instant,
    ) -> Vec<UnitResult> {
        let Some(collector) = self.collectors.get(&platform) else {
            tracing::warn!(platform = %platform, "no collector available; failing requested units");
            return countries
                .iter()
                .map(|country| UnitResult {
                    platform,
                    country: country.clone(),
                    items_collected: 0,
                    status: UnitStatus::Failed,
                    error: Some("collector unavailable".to_owned()),
                })
                .collect();
        };

        let mut results = Vec::with_capacity(countries.len());
        for country in countries {
            results.push(
                self.run_unit(
                    collector.as_ref(),
                    platform,
                    country,
                    limit_per_unit,
                    deadline,
                    started,
                )
                .await,
            );
        }
        results
    }

    async fn run_unit(
        &self,
        collector: &dyn SourceCollector,
        platform: Platform,
        country: &str,
        limit: usize,
        deadline: Option<Duration>,
        started: Instant,
    ) -> UnitResult {
        tracing::info!(platform = %platform, country, limit, "collection unit starting");

        let run = match start_collection_run(&self.pool, platform).await {
            Ok(run) => run,
            Err(e) => {
                tracing::error!(platform = %platform, country, error = %e, "could not record run start");
                return UnitResult {
                    platform,
                    country: country.to_owned(),
                    items_collected: 0,
                    status: UnitStatus::Failed,
                    error: Some(format!("could not record run start: {e}")),
                };
            }
        };

        let outcome = match deadline {
            Some(total) => {
                let remaining = total.saturating_sub(started.elapsed());
                match tokio::time::timeout(remaining, collector.collect(country, limit)).await {
                    Ok(outcome) => Some(outcome),
                    Err(_) => None,
                }
            }
            None => Some(collector.collect(country, limit).await),
        };

        let (items, unit_error) = match outcome {
            Some(CollectOutcome { items, error }) => (items, error.map(|e| e.to_string())),
            None => {
                tracing::warn!(platform = %platform, country, "deadline exceeded mid-unit");
                (Vec::new(), Some(CANCELLED_MESSAGE.to_owned()))
            }
        };

        let mut persisted: i32 = 0;
        for item in &items {
            match persist_item(&self.pool, item).await {
                Ok(()) => persisted += 1,
                Err(e) => {
                    tracing::warn!(
                        platform = %platform,
                        country,
                        item = %item.platform_id,
                        error = %e,
                        "failed to persist item; skipped"
                    );
                }
            }
        }

        match unit_error {
            None => {
                if let Err(e) = complete_collection_run(&self.pool, run.id, persisted).await {
                    tracing::error!(run_id = run.id, error = %e, "could not record run completion");
                }
                tracing::info!(
                    platform = %platform,
                    country,
                    items = persisted,
                    "collection unit succeeded"
                );
                UnitResult {
                    platform,
                    country: country.to_owned(),
                    items_collected: persisted,
                    status: UnitStatus::Succeeded,
                    error: None,
                }
            }
            Some(message) => {
                if let Err(e) = fail_collection_run(&self.pool, run.id, persisted, &message).await {
                    tracing::error!(run_id = run.id, error = %e, "could not record run failure");
                }
                tracing::warn!(
                    platform = %platform,
                    country,
                    items = persisted,
                    error = %message,
                    "collection unit failed"
                );
                UnitResult {
                    platform,
                    country: country.to_owned(),
                    items_collected: persisted,
                    status: UnitStatus::Failed,
                    error: Some(message),
                }
            }
        }
    }
}

/// Resolves the item's workflow identity and appends one snapshot.
async fn persist_item(pool: &PgPool, item: &CollectedItem) -> Result<(), DbError> {
    let workflow_id = resolve_workflow(
        pool,
        item.platform,
        &item.platform_id,
        &item.country,
        &item.name,
    )
    .await?;

    let m = &item.metrics;
    let snapshot = NewMetricSnapshot {
        views: m.views,
        likes: m.likes,
        comments: m.comments,
        like_to_view_ratio: m.like_to_view_ratio,
        comment_to_view_ratio: m.comment_to_view_ratio,
        engagement_score: m.engagement_score,
        replies: m.replies,
        participants: m.participants,
        search_volume: m.search_volume,
        trend_direction: m.trend_direction,
        growth_percentage: m.growth_percentage,
    };
    insert_metric_snapshot(pool, workflow_id, &snapshot).await?;
    Ok(())
}
