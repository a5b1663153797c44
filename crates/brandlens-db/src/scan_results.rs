//! Database operations for the `scan_results` table.
//!
//! Rows are append-only: each (scan, query, backend) cell is written exactly
//! once by the task that owns it, and the UNIQUE constraint rejects any
//! second write for the same cell.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `scan_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanResultRow {
    pub id: i64,
    pub scan_id: i64,
    pub query_id: i64,
    pub backend: String,
    pub response_text: Option<String>,
    pub brand_mentioned: bool,
    pub domain_mentioned: bool,
    pub mention_count: i32,
    pub mention_positions: Value,
    pub citations: Value,
    pub sentiment: String,
    pub visibility_score: i32,
    pub rank_position: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A result row joined with its query's prompt text, for read boundaries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanResultDetailRow {
    pub id: i64,
    pub scan_id: i64,
    pub query_id: i64,
    pub prompt_text: String,
    pub backend: String,
    pub response_text: Option<String>,
    pub brand_mentioned: bool,
    pub domain_mentioned: bool,
    pub mention_count: i32,
    pub mention_positions: Value,
    pub citations: Value,
    pub sentiment: String,
    pub visibility_score: i32,
    pub rank_position: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for one scan result.
#[derive(Debug, Clone)]
pub struct NewScanResult {
    pub scan_id: i64,
    pub query_id: i64,
    pub backend: String,
    pub response_text: String,
    pub brand_mentioned: bool,
    pub domain_mentioned: bool,
    pub mention_count: i32,
    pub mention_positions: Value,
    pub citations: Value,
    pub sentiment: String,
    pub visibility_score: i32,
    pub rank_position: Option<i32>,
}

/// Inserts one result row and returns its generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique
/// violation when the (scan, query, backend) cell already has a row.
pub async fn insert_scan_result(pool: &PgPool, result: &NewScanResult) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO scan_results \
             (scan_id, query_id, backend, response_text, brand_mentioned, domain_mentioned, \
              mention_count, mention_positions, citations, sentiment, visibility_score, \
              rank_position) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING id",
    )
    .bind(result.scan_id)
    .bind(result.query_id)
    .bind(&result.backend)
    .bind(&result.response_text)
    .bind(result.brand_mentioned)
    .bind(result.domain_mentioned)
    .bind(result.mention_count)
    .bind(&result.mention_positions)
    .bind(&result.citations)
    .bind(&result.sentiment)
    .bind(result.visibility_score)
    .bind(result.rank_position)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns all result rows for a scan, ordered by `query_id` then `backend`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_results_by_scan(
    pool: &PgPool,
    scan_id: i64,
) -> Result<Vec<ScanResultRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanResultRow>(
        "SELECT id, scan_id, query_id, backend, response_text, brand_mentioned, \
                domain_mentioned, mention_count, mention_positions, citations, sentiment, \
                visibility_score, rank_position, created_at \
         FROM scan_results \
         WHERE scan_id = $1 \
         ORDER BY query_id, backend",
    )
    .bind(scan_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns all result rows for a scan joined with their query prompt text,
/// ordered by the query's display order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_results_with_queries(
    pool: &PgPool,
    scan_id: i64,
) -> Result<Vec<ScanResultDetailRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanResultDetailRow>(
        "SELECT r.id, r.scan_id, r.query_id, q.prompt_text, r.backend, r.response_text, \
                r.brand_mentioned, r.domain_mentioned, r.mention_count, r.mention_positions, \
                r.citations, r.sentiment, r.visibility_score, r.rank_position, r.created_at \
         FROM scan_results r \
         JOIN queries q ON q.id = r.query_id \
         WHERE r.scan_id = $1 \
         ORDER BY q.sort_order, q.id, r.backend",
    )
    .bind(scan_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
