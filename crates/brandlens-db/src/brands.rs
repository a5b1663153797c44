//! Database operations for the `brands` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `brands` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandRow {
    pub id: i64,
    pub public_id: Uuid,
    /// Account id from the external auth system; `None` for anonymous scans.
    pub user_id: Option<Uuid>,
    pub name: String,
    /// Bare hostname used for substring matching, not a URL.
    pub domain: Option<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// Creates a new brand row and returns it.
///
/// Generates the `public_id` UUID in Rust.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including the non-empty
/// name constraint).
pub async fn create_brand(
    pool: &PgPool,
    name: &str,
    domain: Option<&str>,
    is_anonymous: bool,
) -> Result<BrandRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, BrandRow>(
        "INSERT INTO brands (public_id, name, domain, is_anonymous) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, public_id, user_id, name, domain, is_anonymous, created_at",
    )
    .bind(public_id)
    .bind(name)
    .bind(domain)
    .bind(is_anonymous)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a single brand by its internal `id`, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand(pool: &PgPool, id: i64) -> Result<Option<BrandRow>, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "SELECT id, public_id, user_id, name, domain, is_anonymous, created_at \
         FROM brands \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
