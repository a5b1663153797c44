//! Database operations for the `scans` table and its status state machine.
//!
//! Transitions are guarded updates (`WHERE status = $expected`); a guard
//! that matches zero rows surfaces as [`DbError::InvalidScanTransition`],
//! which keeps terminal states immutable even under concurrent callers.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::brands::BrandRow;
use crate::queries::QueryRow;
use crate::DbError;

/// A row from the `scans` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_id: i64,
    pub status: String,
    /// Weighted mean of visibility scores; set only on completion.
    pub overall_score: Option<f32>,
    pub triggered_by: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A scan together with its brand and the brand's query set, as loaded at
/// the start of orchestration. Queries added to the brand afterwards do not
/// join a running scan.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub scan: ScanRow,
    pub brand: BrandRow,
    pub queries: Vec<QueryRow>,
}

/// Creates a new scan in `pending` status and returns it.
///
/// Generates the `public_id` UUID in Rust.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scan(
    pool: &PgPool,
    brand_id: i64,
    triggered_by: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<ScanRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ScanRow>(
        "INSERT INTO scans (public_id, brand_id, status, triggered_by, expires_at) \
         VALUES ($1, $2, 'pending', $3, $4) \
         RETURNING id, public_id, brand_id, status, overall_score, triggered_by, \
                   completed_at, expires_at, created_at",
    )
    .bind(public_id)
    .bind(brand_id)
    .bind(triggered_by)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a single scan by its internal `id`, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_scan(pool: &PgPool, id: i64) -> Result<Option<ScanRow>, DbError> {
    let row = sqlx::query_as::<_, ScanRow>(
        "SELECT id, public_id, brand_id, status, overall_score, triggered_by, \
                completed_at, expires_at, created_at \
         FROM scans \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetches a single scan by its public UUID, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_scan_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<ScanRow>, DbError> {
    let row = sqlx::query_as::<_, ScanRow>(
        "SELECT id, public_id, brand_id, status, overall_score, triggered_by, \
                completed_at, expires_at, created_at \
         FROM scans \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Marks a scan as `running`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanTransition`] if the scan is not `pending`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_scan(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scans \
         SET status = 'running' \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanTransition {
            id,
            expected_status: "pending",
        });
    }

    Ok(())
}

/// Marks a scan as `completed`, recording the overall score and completion time.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanTransition`] if the scan is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scan(pool: &PgPool, id: i64, overall_score: f32) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scans \
         SET status = 'completed', overall_score = $1, completed_at = NOW() \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(overall_score)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a scan as `failed`. Failed scans carry no score.
///
/// Accepts both non-terminal states: a scan-level fault can strike between
/// creation and the start of the work phase.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanTransition`] if the scan is already
/// terminal, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scan(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scans \
         SET status = 'failed', completed_at = NOW() \
         WHERE id = $1 AND status IN ('pending', 'running')",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanTransition {
            id,
            expected_status: "pending or running",
        });
    }

    Ok(())
}

/// Loads a scan together with its brand and the brand's queries.
///
/// This is the single read the orchestrator performs before the work phase.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the scan or its brand does not exist,
/// or [`DbError::Sqlx`] if any query fails.
pub async fn get_scan_context(pool: &PgPool, scan_id: i64) -> Result<ScanContext, DbError> {
    let scan = get_scan(pool, scan_id).await?.ok_or(DbError::NotFound)?;
    let brand = crate::brands::get_brand(pool, scan.brand_id)
        .await?
        .ok_or(DbError::NotFound)?;
    let queries = crate::queries::list_queries_by_brand(pool, brand.id).await?;

    Ok(ScanContext {
        scan,
        brand,
        queries,
    })
}
