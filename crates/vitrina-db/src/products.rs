//! Database operations for `products`, `product_variants`, and `product_images`.
//!
//! A product is always written together with its variant list and image
//! manifest in one transaction; child rows are replaced wholesale on update.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use vitrina_core::{ManifestEntry, ProductFields, SubmissionPayload, Variant};

use crate::DbError;

/// Name of the unique constraint on `products.slug`.
pub const PRODUCT_SLUG_CONSTRAINT: &str = "products_slug_key";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from `products`, joined with its category name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Option<i64>,
    /// `NULL` when the product has no category.
    pub category_name: Option<String>,
    pub material: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    #[must_use]
    pub fn into_fields(self) -> ProductFields {
        ProductFields {
            name: self.name,
            slug: self.slug,
            description: self.description,
            price: self.price,
            category: self.category_name,
            category_id: self.category_id,
            material: self.material,
            is_active: self.is_active,
        }
    }
}

/// A row from `product_variants`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub product_id: i64,
    pub sku: String,
    pub color: Option<String>,
    pub size: Option<String>,
    /// Non-negative by table constraint.
    pub stock: i32,
    pub price_adjustment: Decimal,
    pub material: Option<String>,
    pub position: i32,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Self {
            sku: row.sku,
            color: row.color,
            size: row.size,
            stock: u32::try_from(row.stock).unwrap_or(0),
            price_adjustment: row.price_adjustment,
            material: row.material,
        }
    }
}

/// A row from `product_images`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRow {
    pub id: i64,
    pub product_id: i64,
    pub url: String,
    pub color: Option<String>,
    pub is_primary: bool,
    pub storage_path: Option<String>,
    pub position: i32,
}

impl From<ImageRow> for ManifestEntry {
    fn from(row: ImageRow) -> Self {
        Self {
            url: row.url,
            color: row.color,
            is_primary: row.is_primary,
            storage_path: row.storage_path,
        }
    }
}

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Inserts a product with its variants and images and returns the new id.
///
/// # Errors
///
/// Returns [`DbError::SlugTaken`] when the slug constraint rejects the row,
/// [`DbError::OutOfRange`] for stock values the column cannot hold, and
/// [`DbError::Sqlx`] for any other failure. Nothing is written on error.
pub async fn create_product(pool: &PgPool, payload: &SubmissionPayload) -> Result<i64, DbError> {
    let product = &payload.product;
    let mut tx = pool.begin().await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (slug, name, description, price, category_id, material, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id",
    )
    .bind(&product.slug)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.category_id)
    .bind(&product.material)
    .bind(product.is_active)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| slug_conflict(e, &product.slug))?;

    insert_children(&mut tx, id, payload).await?;
    tx.commit().await?;

    tracing::debug!(
        product_id = id,
        variants = payload.variants.len(),
        images = payload.images.len(),
        "product inserted"
    );
    Ok(id)
}

/// Replaces a product's fields, variants, and images.
///
/// # Errors
///
/// Returns [`DbError::ProductNotFound`] when no row has `id`, plus the same
/// errors as [`create_product`]. Nothing is written on error.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    payload: &SubmissionPayload,
) -> Result<(), DbError> {
    let product = &payload.product;
    let mut tx = pool.begin().await?;

    let updated = sqlx::query_scalar::<_, i64>(
        "UPDATE products SET \
             slug        = $2, \
             name        = $3, \
             description = $4, \
             price       = $5, \
             category_id = $6, \
             material    = $7, \
             is_active   = $8, \
             updated_at  = NOW() \
         WHERE id = $1 \
         RETURNING id",
    )
    .bind(id)
    .bind(&product.slug)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.category_id)
    .bind(&product.material)
    .bind(product.is_active)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| slug_conflict(e, &product.slug))?;

    if updated.is_none() {
        return Err(DbError::ProductNotFound { id });
    }

    sqlx::query("DELETE FROM product_variants WHERE product_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM product_images WHERE product_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    insert_children(&mut tx, id, payload).await?;
    tx.commit().await?;

    tracing::debug!(product_id = id, "product updated");
    Ok(())
}

/// Returns `true` when no product other than `exclude_id` uses `slug`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn slug_available(
    pool: &PgPool,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool, DbError> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS ( \
             SELECT 1 FROM products \
             WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2) \
         )",
    )
    .bind(slug)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(!taken)
}

/// Returns the product with `id`, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT p.id, p.slug, p.name, p.description, p.price, p.category_id, \
                c.name AS category_name, p.material, p.is_active, \
                p.created_at, p.updated_at \
         FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE p.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns a product's variants in their saved order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_variants(pool: &PgPool, product_id: i64) -> Result<Vec<Variant>, DbError> {
    let rows = sqlx::query_as::<_, VariantRow>(
        "SELECT id, product_id, sku, color, size, stock, price_adjustment, material, position \
         FROM product_variants \
         WHERE product_id = $1 \
         ORDER BY position, id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Variant::from).collect())
}

/// Returns a product's image manifest in its saved order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_images(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<ManifestEntry>, DbError> {
    let rows = sqlx::query_as::<_, ImageRow>(
        "SELECT id, product_id, url, color, is_primary, storage_path, position \
         FROM product_images \
         WHERE product_id = $1 \
         ORDER BY position, id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ManifestEntry::from).collect())
}

// ---------------------------------------------------------------------------
// Child rows
// ---------------------------------------------------------------------------

async fn insert_children(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
    payload: &SubmissionPayload,
) -> Result<(), DbError> {
    for (position, variant) in payload.variants.iter().enumerate() {
        let stock = i32::try_from(variant.stock).map_err(|_| DbError::OutOfRange {
            field: "stock",
            value: variant.stock.to_string(),
        })?;
        sqlx::query(
            "INSERT INTO product_variants \
                 (product_id, sku, color, size, stock, price_adjustment, material, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(product_id)
        .bind(&variant.sku)
        .bind(&variant.color)
        .bind(&variant.size)
        .bind(stock)
        .bind(variant.price_adjustment)
        .bind(&variant.material)
        .bind(position_of(position)?)
        .execute(&mut **tx)
        .await?;
    }

    for (position, image) in payload.images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO product_images \
                 (product_id, url, color, is_primary, storage_path, position) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(product_id)
        .bind(&image.url)
        .bind(&image.color)
        .bind(image.is_primary)
        .bind(&image.storage_path)
        .bind(position_of(position)?)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

fn position_of(index: usize) -> Result<i32, DbError> {
    i32::try_from(index).map_err(|_| DbError::OutOfRange {
        field: "position",
        value: index.to_string(),
    })
}

/// Maps a unique violation on the slug constraint to [`DbError::SlugTaken`].
fn slug_conflict(error: sqlx::Error, slug: &str) -> DbError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() && db.constraint() == Some(PRODUCT_SLUG_CONSTRAINT) {
            return DbError::SlugTaken {
                slug: slug.to_string(),
            };
        }
    }
    DbError::Sqlx(error)
}
