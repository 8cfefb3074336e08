//! Offline tests for vitrina-db pool configuration and error mapping.
//! These tests do not require a live database connection.

use vitrina_core::{AppConfig, Environment, PersistenceError};
use vitrina_db::{DbError, PoolConfig, ProductRow, PRODUCT_SLUG_CONSTRAINT};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        storage_url: "http://localhost:54321".to_string(),
        storage_key: "key".to_string(),
        storage_bucket: "product-images".to_string(),
        cover_bucket: "collection-covers".to_string(),
        storage_timeout_secs: 30,
        storage_user_agent: "ua".to_string(),
        cache_control_secs: 3600,
        upload_timeout_secs: 15,
        compress_max_width: 1920,
        compress_quality: 80,
        compress_threshold_bytes: 1_000_000,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn slug_conflict_surfaces_as_persistence_slug_taken() {
    let err: PersistenceError = DbError::SlugTaken {
        slug: "collar-perla".to_string(),
    }
    .into();
    assert_eq!(
        err.to_string(),
        "slug 'collar-perla' is already used by another product"
    );
    assert_eq!(PRODUCT_SLUG_CONSTRAINT, "products_slug_key");
}

#[test]
fn product_row_becomes_form_fields() {
    use chrono::Utc;
    use rust_decimal::Decimal;

    let row = ProductRow {
        id: 3,
        slug: "anillo-solitario".to_string(),
        name: "Anillo Solitario".to_string(),
        description: None,
        price: Decimal::new(129_900, 2),
        category_id: Some(1),
        category_name: Some("Anillos".to_string()),
        material: Some("Oro 14k".to_string()),
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let fields = row.into_fields();
    assert_eq!(fields.category.as_deref(), Some("Anillos"));
    assert_eq!(fields.category_id, Some(1));
    assert_eq!(fields.slug, "anillo-solitario");
}
