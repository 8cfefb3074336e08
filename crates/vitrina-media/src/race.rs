//! Deadline-bounded uploads.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, Either};

use crate::blob::ImageBlob;
use crate::compress::CompressionPolicy;
use crate::error::{CoverError, UploadError};
use crate::storage::{cover_key, Storage, UploadOptions};

/// Race one upload against a timer.
///
/// The transfer runs on its own task. If the timer fires first the caller
/// gets [`UploadError::Timeout`] and the transfer is left running; it may
/// still land in storage afterwards.
///
/// # Errors
///
/// - [`UploadError::Timeout`] if `timeout` elapses first.
/// - [`UploadError::Storage`] if the backend reports a failure in time.
/// - [`UploadError::Interrupted`] if the upload task panics or is aborted.
pub async fn upload_with_timeout<S>(
    storage: Arc<S>,
    key: String,
    blob: ImageBlob,
    options: UploadOptions,
    timeout: Duration,
) -> Result<String, UploadError>
where
    S: Storage + 'static,
{
    let task_key = key.clone();
    let transfer = tokio::spawn(async move { storage.upload(&task_key, &blob, &options).await });
    let timer = tokio::time::sleep(timeout);
    tokio::pin!(timer);

    match future::select(transfer, timer).await {
        Either::Left((Ok(Ok(path)), _)) => Ok(path),
        Either::Left((Ok(Err(source)), _)) => Err(UploadError::Storage { key, source }),
        Either::Left((Err(join), _)) => Err(UploadError::Interrupted {
            key,
            reason: join.to_string(),
        }),
        Either::Right(((), _pending)) => {
            tracing::warn!(key = %key, ?timeout, "upload deadline elapsed; transfer left running");
            Err(UploadError::Timeout { key, timeout })
        }
    }
}

/// Where a cover image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverUpload {
    pub url: String,
    pub storage_path: String,
}

/// Compress and upload a collection cover under a deadline.
///
/// # Errors
///
/// Returns [`CoverError::Transform`] if an oversized image cannot be
/// re-encoded and [`CoverError::Upload`] if the transfer fails or times out.
pub async fn upload_cover<S>(
    storage: Arc<S>,
    policy: &CompressionPolicy,
    collection_slug: &str,
    blob: ImageBlob,
    options: UploadOptions,
    timeout: Duration,
) -> Result<CoverUpload, CoverError>
where
    S: Storage + 'static,
{
    let blob = policy.compress_if_needed(blob)?;
    let key = cover_key(
        collection_slug,
        chrono::Utc::now().timestamp_millis(),
        blob.extension(),
    );
    tracing::info!(collection = collection_slug, key = %key, bytes = blob.len(), "uploading cover");

    let storage_path =
        upload_with_timeout(Arc::clone(&storage), key, blob, options, timeout).await?;
    let url = storage.public_url(&storage_path);
    Ok(CoverUpload { url, storage_path })
}
