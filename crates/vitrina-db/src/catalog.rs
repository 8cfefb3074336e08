//! Postgres-backed implementations of the submission collaborators.

use sqlx::PgPool;
use vitrina_core::{CategoryLookup, PersistenceError, ProductRepository, SubmissionPayload};

use crate::{categories, products};

/// Catalog access over a shared pool. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ProductRepository for PgCatalog {
    async fn create_product(&self, payload: &SubmissionPayload) -> Result<i64, PersistenceError> {
        Ok(products::create_product(&self.pool, payload).await?)
    }

    async fn update_product(
        &self,
        id: i64,
        payload: &SubmissionPayload,
    ) -> Result<(), PersistenceError> {
        Ok(products::update_product(&self.pool, id, payload).await?)
    }

    async fn slug_available(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, PersistenceError> {
        Ok(products::slug_available(&self.pool, slug, exclude_id).await?)
    }
}

impl CategoryLookup for PgCatalog {
    async fn category_id(&self, name: &str) -> Result<Option<i64>, PersistenceError> {
        Ok(categories::category_id(&self.pool, name).await?)
    }
}
