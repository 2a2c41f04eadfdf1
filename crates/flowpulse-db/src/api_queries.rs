//! Read-model queries backing the query/stats API.
//!
//! The workflow listing joins each workflow with its latest snapshot only;
//! sort columns come from a whitelist enum so the caller can never inject
//! arbitrary SQL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Sortable columns for the workflow listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    EngagementScore,
    Views,
    Likes,
    Comments,
    GrowthPercentage,
    CollectedAt,
}

impl SortField {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            SortField::EngagementScore => "engagement_score",
            SortField::Views => "views",
            SortField::Likes => "likes",
            SortField::Comments => "comments",
            SortField::GrowthPercentage => "growth_percentage",
            SortField::CollectedAt => "collected_at",
        }
    }

    /// Parses a sort-field name; unknown names fall back to the default,
    /// mirroring the lenient query-parameter handling of the API.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "views" => SortField::Views,
            "likes" => SortField::Likes,
            "comments" => SortField::Comments,
            "growth_percentage" => SortField::GrowthPercentage,
            "collected_at" => SortField::CollectedAt,
            _ => SortField::EngagementScore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Desc => "DESC",
            SortOrder::Asc => "ASC",
        }
    }

    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

/// Filters and pagination for the workflow listing.
#[derive(Debug, Clone, Default)]
pub struct WorkflowListFilters<'a> {
    pub platform: Option<&'a str>,
    pub country: Option<&'a str>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

/// A workflow joined with its latest metric snapshot.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkflowWithMetricsRow {
    pub workflow_id: i64,
    pub name: String,
    pub platform: String,
    pub country: String,
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

/// Per-key count row for the stats groupings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformCountRow {
    pub key: String,
    pub count: i64,
}

const LATEST_SNAPSHOT_JOIN: &str = "FROM workflows w \
     JOIN ( \
         SELECT DISTINCT ON (workflow_id) \
             workflow_id, views, likes, comments, like_to_view_ratio, \
             comment_to_view_ratio, engagement_score, replies, participants, \
             search_volume, trend_direction, growth_percentage, collected_at \
         FROM metric_snapshots \
         ORDER BY workflow_id, collected_at DESC, id DESC \
     ) ms ON ms.workflow_id = w.id \
     WHERE ($1::TEXT IS NULL OR w.platform = $1) \
       AND ($2::TEXT IS NULL OR w.country = $2)";

/// Returns one page of workflows joined with their latest snapshot.
///
/// Ordering always ends with `w.id ASC` so equal sort keys page
/// deterministically: stepping `offset` by `limit` reproduces the full
/// result set without duplicates or gaps.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_workflows_with_latest(
    pool: &PgPool,
    filters: WorkflowListFilters<'_>,
) -> Result<Vec<WorkflowWithMetricsRow>, DbError> {
    let sql = format!(
        "SELECT w.id AS workflow_id, w.name, w.platform, w.country, \
                ms.views, ms.likes, ms.comments, ms.like_to_view_ratio, \
                ms.comment_to_view_ratio, ms.engagement_score, ms.replies, \
                ms.participants, ms.search_volume, ms.trend_direction, \
                ms.growth_percentage, ms.collected_at \
         {LATEST_SNAPSHOT_JOIN} \
         ORDER BY ms.{sort} {order} NULLS LAST, w.id ASC \
         LIMIT $3 OFFSET $4",
        sort = filters.sort_by.as_sql(),
        order = filters.order.as_sql(),
    );

    let rows = sqlx::query_as::<_, WorkflowWithMetricsRow>(&sql)
        .bind(filters.platform)
        .bind(filters.country)
        .bind(filters.limit)
        .bind(filters.offset)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Total count for the workflow listing, independent of pagination.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_workflows_with_latest(
    pool: &PgPool,
    platform: Option<&str>,
    country: Option<&str>,
) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) {LATEST_SNAPSHOT_JOIN}");
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(platform)
        .bind(country)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Workflow counts grouped by platform.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn stats_by_platform(pool: &PgPool) -> Result<Vec<PlatformCountRow>, DbError> {
    let rows = sqlx::query_as::<_, PlatformCountRow>(
        "SELECT platform AS key, COUNT(*) AS count \
         FROM workflows \
         GROUP BY platform \
         ORDER BY platform",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Workflow counts grouped by country.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn stats_by_country(pool: &PgPool) -> Result<Vec<PlatformCountRow>, DbError> {
    let rows = sqlx::query_as::<_, PlatformCountRow>(
        "SELECT country AS key, COUNT(*) AS count \
         FROM workflows \
         GROUP BY country \
         ORDER BY country",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Timestamp of the most recently collected snapshot, if any exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn stats_latest_snapshot_at(pool: &PgPool) -> Result<Option<DateTime<Utc>>, DbError> {
    let latest = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(collected_at) FROM metric_snapshots",
    )
    .fetch_one(pool)
    .await?;

    Ok(latest)
}
