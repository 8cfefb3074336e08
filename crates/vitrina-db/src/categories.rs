//! Database operations for `categories`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Looks up a category id by name, ignoring case and surrounding whitespace.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn category_id(pool: &PgPool, name: &str) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM categories WHERE LOWER(name) = LOWER($1) LIMIT 1",
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Returns all categories ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, created_at FROM categories ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a category unless one with the same name exists; returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn upsert_category(pool: &PgPool, name: &str) -> Result<i64, DbError> {
    let name = name.trim();
    if let Some(id) = category_id(pool, name).await? {
        return Ok(id);
    }

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name) VALUES ($1) \
         ON CONFLICT (LOWER(name)) DO UPDATE SET name = categories.name \
         RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
