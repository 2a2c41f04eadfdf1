use std::collections::HashMap;

use axum::{
    extract::State,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use flowpulse_core::Platform;
use flowpulse_db::{
    count_workflows, latest_run_status_per_platform, stats_by_country, stats_by_platform,
    stats_latest_snapshot_at,
};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct StatsData {
    total_workflows: i64,
    by_platform: HashMap<String, i64>,
    by_country: HashMap<String, i64>,
    last_updated: Option<DateTime<Utc>>,
    collection_status: HashMap<String, String>,
}

pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<StatsData>>, ApiError> {
    let total_workflows = count_workflows(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let by_platform: HashMap<String, i64> = stats_by_platform(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .into_iter()
        .map(|row| (row.key, row.count))
        .collect();

    let by_country: HashMap<String, i64> = stats_by_country(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .into_iter()
        .map(|row| (row.key, row.count))
        .collect();

    let last_updated = stats_latest_snapshot_at(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    // Every platform gets an entry; no run on record reads as "unknown".
    let latest_runs = latest_run_status_per_platform(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let mut collection_status: HashMap<String, String> = Platform::ALL
        .into_iter()
        .map(|p| (p.as_str().to_owned(), "unknown".to_owned()))
        .collect();
    for row in latest_runs {
        collection_status.insert(row.platform, row.status);
    }

    Ok(Json(ApiResponse {
        data: StatsData {
            total_workflows,
            by_platform,
            by_country,
            last_updated,
            collection_status,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
