//! Identity-resolving store for the `workflows` table.
//!
//! A workflow's identity key is `(platform, platform_id, country)`; the
//! unique constraint on that key plus `INSERT ... ON CONFLICT` makes entity
//! creation exactly-once under concurrent resolution attempts.

use chrono::{DateTime, Utc};
use flowpulse_core::Platform;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `workflows` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkflowRow {
    pub id: i64,
    pub name: String,
    pub platform: String,
    pub platform_id: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolves a workflow identity to its row id, creating the row if absent.
///
/// A single atomic conditional insert: a new key inserts the row; an existing
/// key refreshes the display name and `updated_at` without touching the key.
/// Either way the canonical id comes back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn resolve_workflow(
    pool: &PgPool,
    platform: Platform,
    platform_id: &str,
    country: &str,
    name: &str,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO workflows (name, platform, platform_id, country) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (platform, platform_id, country) DO UPDATE SET \
             name       = EXCLUDED.name, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(name)
    .bind(platform.as_str())
    .bind(platform_id)
    .bind(country)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Fetches a single workflow by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_workflow(pool: &PgPool, id: i64) -> Result<WorkflowRow, DbError> {
    let row = sqlx::query_as::<_, WorkflowRow>(
        "SELECT id, name, platform, platform_id, country, created_at, updated_at \
         FROM workflows \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Total number of workflow rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_workflows(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM workflows")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
