//! Database operations for the `queries` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `queries` table. Immutable once created.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueryRow {
    pub id: i64,
    pub brand_id: i64,
    pub prompt_text: String,
    /// Display ordering only; classification never looks at it.
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Creates a new query for a brand and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including the 10–500
/// character prompt length constraint).
pub async fn create_query(
    pool: &PgPool,
    brand_id: i64,
    prompt_text: &str,
    sort_order: i32,
) -> Result<QueryRow, DbError> {
    let row = sqlx::query_as::<_, QueryRow>(
        "INSERT INTO queries (brand_id, prompt_text, sort_order) \
         VALUES ($1, $2, $3) \
         RETURNING id, brand_id, prompt_text, sort_order, created_at",
    )
    .bind(brand_id)
    .bind(prompt_text)
    .bind(sort_order)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns all queries for a brand, ordered by `sort_order` then `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_queries_by_brand(pool: &PgPool, brand_id: i64) -> Result<Vec<QueryRow>, DbError> {
    let rows = sqlx::query_as::<_, QueryRow>(
        "SELECT id, brand_id, prompt_text, sort_order, created_at \
         FROM queries \
         WHERE brand_id = $1 \
         ORDER BY sort_order, id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
