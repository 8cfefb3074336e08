//! Collaborator interfaces for the catalog database.
//!
//! Implemented against Postgres in `vitrina-db`; tests use in-memory fakes.

use std::future::Future;

use thiserror::Error;

use crate::products::SubmissionPayload;

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The slug uniqueness constraint rejected the write.
    #[error("slug '{slug}' is already used by another product")]
    SlugTaken { slug: String },

    #[error("product {id} not found")]
    NotFound { id: i64 },

    #[error("persistence backend error: {0}")]
    Backend(String),
}

/// Writes products together with their variants and image manifest.
pub trait ProductRepository: Send + Sync {
    /// Insert a new product and return its id.
    fn create_product(
        &self,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<i64, PersistenceError>> + Send;

    /// Replace an existing product's fields, variants and images.
    fn update_product(
        &self,
        id: i64,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Best-effort availability check; the uniqueness constraint at write
    /// time stays authoritative because this can race.
    fn slug_available(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
}

/// Resolves a category name to the numeric id used as the SKU prefix.
pub trait CategoryLookup: Send + Sync {
    fn category_id(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<i64>, PersistenceError>> + Send;
}

impl<T: ProductRepository> ProductRepository for &T {
    fn create_product(
        &self,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<i64, PersistenceError>> + Send {
        (**self).create_product(payload)
    }

    fn update_product(
        &self,
        id: i64,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send {
        (**self).update_product(id, payload)
    }

    fn slug_available(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send {
        (**self).slug_available(slug, exclude_id)
    }
}

impl<T: CategoryLookup> CategoryLookup for &T {
    fn category_id(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<i64>, PersistenceError>> + Send {
        (**self).category_id(name)
    }
}
