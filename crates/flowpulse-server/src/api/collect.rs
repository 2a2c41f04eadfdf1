use std::str::FromStr;

use axum::{
    extract::State,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use flowpulse_core::Platform;
use flowpulse_ingest::UnitResult;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct CollectRequest {
    pub platforms: Option<Vec<String>>,
    pub countries: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(super) struct CollectData {
    status: &'static str,
    results: Vec<UnitResult>,
}

/// Manual collection trigger.
///
/// Runs synchronously and reports every unit. Holds the same lock as the
/// scheduled sweep, so a trigger while a sweep is in flight is rejected
/// with a conflict rather than doubling up on source quotas.
pub(super) async fn trigger_collect(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<CollectRequest>>,
) -> Result<Json<ApiResponse<CollectData>>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let platforms = match request.platforms {
        Some(names) => {
            let mut platforms = Vec::with_capacity(names.len());
            for name in &names {
                let platform = Platform::from_str(name).map_err(|e| {
                    ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
                })?;
                platforms.push(platform);
            }
            platforms
        }
        None => Platform::ALL.to_vec(),
    };
    let countries = request
        .countries
        .unwrap_or_else(|| state.config.countries.clone());

    let Ok(_guard) = state.collect_lock.try_lock() else {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "a collection run is already in progress",
        ));
    };

    tracing::info!(
        platforms = platforms.len(),
        countries = countries.len(),
        "manual collection triggered"
    );
    let results = state
        .orchestrator
        .run_all(
            &platforms,
            &countries,
            state.config.items_per_platform,
            state.config.collect_deadline(),
        )
        .await;

    Ok(Json(ApiResponse {
        data: CollectData {
            status: "completed",
            results,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
