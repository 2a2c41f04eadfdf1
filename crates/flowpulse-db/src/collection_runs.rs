//! Run-tracker operations for the `collection_runs` table.
//!
//! One row per collection unit, `running -> succeeded | failed`. A run that
//! is never ended (process crash) stays `running`; the stats API reads that
//! as a freshness signal rather than a hard failure.

use chrono::{DateTime, Utc};
use flowpulse_core::Platform;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `collection_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunRow {
    pub id: i64,
    pub platform: String,
    pub status: String,
    pub items_collected: i32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Most recent run status for one platform.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformRunStatusRow {
    pub platform: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Creates a run in `running` status with `started_at = NOW()` and returns
/// the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn start_collection_run(
    pool: &PgPool,
    platform: Platform,
) -> Result<CollectionRunRow, DbError> {
    let row = sqlx::query_as::<_, CollectionRunRow>(
        "INSERT INTO collection_runs (platform, status, started_at) \
         VALUES ($1, 'running', NOW()) \
         RETURNING id, platform, status, items_collected, error_message, \
                   started_at, completed_at, created_at",
    )
    .bind(platform.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `succeeded`, setting `completed_at = NOW()` and the final
/// item count.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_collection_run(
    pool: &PgPool,
    id: i64,
    items_collected: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'succeeded', completed_at = NOW(), items_collected = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(items_collected)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, setting `completed_at = NOW()`, the final item
/// count (items gathered before the failure), and the error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_collection_run(
    pool: &PgPool,
    id: i64,
    items_collected: i32,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'failed', completed_at = NOW(), items_collected = $1, \
             error_message = $2 \
         WHERE id = $3 AND status = 'running'",
    )
    .bind(items_collected)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_collection_run(pool: &PgPool, id: i64) -> Result<CollectionRunRow, DbError> {
    let row = sqlx::query_as::<_, CollectionRunRow>(
        "SELECT id, platform, status, items_collected, error_message, \
                started_at, completed_at, created_at \
         FROM collection_runs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CollectionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRunRow>(
        "SELECT id, platform, status, items_collected, error_message, \
                started_at, completed_at, created_at \
         FROM collection_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the latest run status for every platform that has run at least
/// once.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_run_status_per_platform(
    pool: &PgPool,
) -> Result<Vec<PlatformRunStatusRow>, DbError> {
    let rows = sqlx::query_as::<_, PlatformRunStatusRow>(
        "SELECT DISTINCT ON (platform) platform, status, created_at \
         FROM collection_runs \
         ORDER BY platform, created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
