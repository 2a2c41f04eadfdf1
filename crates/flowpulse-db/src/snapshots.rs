//! Append-only writes and reads for the `metric_snapshots` table.

use chrono::{DateTime, Utc};
use flowpulse_core::TrendDirection;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `metric_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MetricSnapshotRow {
    pub id: i64,
    pub workflow_id: i64,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub like_to_view_ratio: Decimal,
    pub comment_to_view_ratio: Decimal,
    pub engagement_score: Decimal,
    pub replies: Option<i64>,
    pub participants: Option<i64>,
    pub search_volume: Option<i64>,
    pub trend_direction: Option<String>,
    pub growth_percentage: Option<Decimal>,
    pub collected_at: DateTime<Utc>,
}

/// Metric fields for one new snapshot. The platform-specific optionals stay
/// `None` for sources that do not produce them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMetricSnapshot {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub like_to_view_ratio: Decimal,
    pub comment_to_view_ratio: Decimal,
    pub engagement_score: Decimal,
    pub replies: Option<i64>,
    pub participants: Option<i64>,
    pub search_volume: Option<i64>,
    pub trend_direction: Option<TrendDirection>,
    pub growth_percentage: Option<Decimal>,
}

/// Appends one snapshot for a workflow and returns the new snapshot id.
///
/// Snapshots are immutable once written; there is deliberately no update
/// counterpart to this function.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a missing
/// `workflow_id` foreign key).
pub async fn insert_metric_snapshot(
    pool: &PgPool,
    workflow_id: i64,
    metrics: &NewMetricSnapshot,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO metric_snapshots \
             (workflow_id, views, likes, comments, like_to_view_ratio, \
              comment_to_view_ratio, engagement_score, replies, participants, \
              search_volume, trend_direction, growth_percentage) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING id",
    )
    .bind(workflow_id)
    .bind(metrics.views)
    .bind(metrics.likes)
    .bind(metrics.comments)
    .bind(metrics.like_to_view_ratio)
    .bind(metrics.comment_to_view_ratio)
    .bind(metrics.engagement_score)
    .bind(metrics.replies)
    .bind(metrics.participants)
    .bind(metrics.search_volume)
    .bind(metrics.trend_direction.map(TrendDirection::as_str))
    .bind(metrics.growth_percentage)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns a workflow's snapshots ordered oldest-first (its time series).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots_for_workflow(
    pool: &PgPool,
    workflow_id: i64,
) -> Result<Vec<MetricSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, MetricSnapshotRow>(
        "SELECT id, workflow_id, views, likes, comments, like_to_view_ratio, \
                comment_to_view_ratio, engagement_score, replies, participants, \
                search_volume, trend_direction, growth_percentage, collected_at \
         FROM metric_snapshots \
         WHERE workflow_id = $1 \
         ORDER BY collected_at ASC, id ASC",
    )
    .bind(workflow_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
