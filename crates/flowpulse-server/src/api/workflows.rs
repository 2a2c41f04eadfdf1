use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use flowpulse_db::{
    count_workflows_with_latest, list_workflows_with_latest, SortField, SortOrder,
    WorkflowListFilters,
};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct WorkflowsQuery {
    pub platform: Option<String>,
    pub country: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct MetricsBody {
    views: i64,
    likes: i64,
    comments: i64,
    like_to_view_ratio: Decimal,
    comment_to_view_ratio: Decimal,
    engagement_score: Decimal,
    replies: Option<i64>,
    participants: Option<i64>,
    search_volume: Option<i64>,
    trend_direction: Option<String>,
    growth_percentage: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub(super) struct WorkflowItem {
    workflow: String,
    platform: String,
    country: String,
    popularity_metrics: MetricsBody,
    collected_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct WorkflowListData {
    total: i64,
    limit: i64,
    offset: i64,
    workflows: Vec<WorkflowItem>,
}

pub(super) async fn list_workflows(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<WorkflowsQuery>,
) -> Result<Json<ApiResponse<WorkflowListData>>, ApiError> {
    let limit = normalize_limit(query.limit);
    let offset = normalize_offset(query.offset);

    // Unknown sort fields and orders fall back to defaults rather than
    // erroring; the whitelist lives next to the query builder.
    let sort_by = query
        .sort_by
        .as_deref()
        .map(SortField::parse_lenient)
        .unwrap_or_default();
    let order = query
        .order
        .as_deref()
        .map(SortOrder::parse_lenient)
        .unwrap_or_default();

    let filters = WorkflowListFilters {
        platform: query.platform.as_deref(),
        country: query.country.as_deref(),
        sort_by,
        order,
        limit,
        offset,
    };

    let rows = list_workflows_with_latest(&state.pool, filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let total = count_workflows_with_latest(
        &state.pool,
        query.platform.as_deref(),
        query.country.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let workflows = rows
        .into_iter()
        .map(|row| WorkflowItem {
            workflow: row.name,
            platform: row.platform,
            country: row.country,
            popularity_metrics: MetricsBody {
                views: row.views,
                likes: row.likes,
                comments: row.comments,
                like_to_view_ratio: row.like_to_view_ratio,
                comment_to_view_ratio: row.comment_to_view_ratio,
                engagement_score: row.engagement_score,
                replies: row.replies,
                participants: row.participants,
                search_volume: row.search_volume,
                trend_direction: row.trend_direction,
                growth_percentage: row.growth_percentage,
            },
            collected_at: row.collected_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data: WorkflowListData {
            total,
            limit,
            offset,
            workflows,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
