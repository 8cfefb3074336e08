//! Collection cover upload.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use vitrina_core::AppConfig;
use vitrina_media::{upload_cover, CompressionPolicy, ImageBlob, StorageClient, UploadOptions};

/// Compress and upload one cover image, giving up after the configured
/// deadline. A timed-out transfer may still complete in the background.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the client cannot be built,
/// compression fails, or the upload fails or times out.
pub(crate) async fn run_cover(
    config: &AppConfig,
    collection: &str,
    file: &Path,
) -> anyhow::Result<()> {
    let blob = ImageBlob::read(file)
        .with_context(|| format!("failed to read cover image {}", file.display()))?;

    let covers = StorageClient::from_app_config(config)?.for_bucket(&config.cover_bucket);
    let cover = upload_cover(
        Arc::new(covers),
        &CompressionPolicy::from_app_config(config),
        collection,
        blob,
        UploadOptions::with_cache_secs(config.cache_control_secs),
        Duration::from_secs(config.upload_timeout_secs),
    )
    .await?;

    tracing::info!(collection, path = %cover.storage_path, "cover uploaded");
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "url": cover.url,
            "storage_path": cover.storage_path,
        }))?
    );
    Ok(())
}
