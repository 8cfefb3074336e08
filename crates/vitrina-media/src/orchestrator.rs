use vitrina_core::{ImageDescriptor, ImageOrigin, ManifestEntry};

use crate::blob::ImageBlob;
use crate::compress::CompressionPolicy;
use crate::error::{MaterializeError, TransformError, UploadError};
use crate::storage::{storage_key, RemoteFetcher, Storage, UploadOptions};
use crate::store::MediaGroupStore;
use crate::transform::bake;

/// Turns a [`MediaGroupStore`] into the ordered image manifest persisted with
/// a product, uploading whatever is not in storage yet.
pub struct UploadOrchestrator<'a, S, F> {
    storage: &'a S,
    fetcher: &'a F,
    policy: CompressionPolicy,
    options: UploadOptions,
}

impl<'a, S, F> UploadOrchestrator<'a, S, F>
where
    S: Storage,
    F: RemoteFetcher,
{
    pub fn new(storage: &'a S, fetcher: &'a F, policy: CompressionPolicy) -> Self {
        Self {
            storage,
            fetcher,
            policy,
            options: UploadOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Walk every group in order and produce one manifest entry per image.
    ///
    /// Untouched existing images are referenced as-is. Everything else is
    /// baked (when cropped), compressed, and uploaded one at a time; each
    /// uploaded descriptor is then rewritten in the store as an existing image
    /// at its new location, so a retry skips it.
    ///
    /// On return exactly one entry is primary: the first one flagged, or the
    /// first entry when none is. The store is updated to match.
    ///
    /// # Errors
    ///
    /// Stops at the first image that cannot be prepared or uploaded. Objects
    /// already uploaded by this call are left in storage.
    pub async fn materialize(
        &self,
        store: &mut MediaGroupStore,
        slug: &str,
    ) -> Result<Vec<ManifestEntry>, MaterializeError> {
        let positions = store.positions();
        let total = positions.len();
        let mut manifest = Vec::with_capacity(total);
        let mut emitted = Vec::with_capacity(total);
        let mut uploads = 0usize;

        for (n, (group, index)) in positions.iter().enumerate() {
            let position = n + 1;
            let Some(descriptor) = store.get(group, *index).cloned() else {
                continue;
            };
            let color = group.color_name().map(str::to_owned);

            if descriptor.is_untouched_existing() {
                emitted.push((group, *index));
                manifest.push(ManifestEntry {
                    url: descriptor.url,
                    color,
                    is_primary: descriptor.is_primary,
                    storage_path: descriptor.storage_path,
                });
                continue;
            }

            let prepare_failed = |source: TransformError| MaterializeError::Transform {
                group: group.to_string(),
                position,
                total,
                source,
            };
            let source = self.source_blob(store, &descriptor).await.map_err(|e| match e {
                SourceError::Missing(url) => MaterializeError::MissingLocalBlob { url },
                SourceError::Unreadable(e) => prepare_failed(e),
            })?;
            let blob = match descriptor.transform {
                Some(t) => bake(&source, t.pixel_crop),
                None => Ok(source),
            }
            .and_then(|b| self.policy.compress_if_needed(b))
            .map_err(prepare_failed)?;

            let key = storage_key(
                slug,
                group,
                chrono::Utc::now().timestamp_millis(),
                n,
                blob.extension(),
            );
            tracing::info!(position, total, group = %group, key = %key, bytes = blob.len(), "uploading image");
            let path = self
                .storage
                .upload(&key, &blob, &self.options)
                .await
                .map_err(|source| MaterializeError::Upload {
                    position,
                    total,
                    source: UploadError::Storage {
                        key: key.clone(),
                        source,
                    },
                })?;
            uploads += 1;

            let url = self.storage.public_url(&path);
            if let Err(e) = store.promote(group, *index, url.clone(), path.clone()) {
                tracing::warn!(error = %e, key = %key, "uploaded image no longer in store");
            }
            emitted.push((group, *index));
            manifest.push(ManifestEntry {
                url,
                color,
                is_primary: descriptor.is_primary,
                storage_path: Some(path),
            });
        }

        if let Some(primary) = settle_primary(&mut manifest) {
            let (group, index) = emitted[primary];
            if let Err(e) = store.set_primary(group, index) {
                tracing::warn!(error = %e, "primary image no longer in store");
            }
        }

        tracing::info!(slug, images = manifest.len(), uploads, "media materialized");
        Ok(manifest)
    }

    async fn source_blob(
        &self,
        store: &MediaGroupStore,
        descriptor: &ImageDescriptor,
    ) -> Result<ImageBlob, SourceError> {
        match descriptor.origin {
            ImageOrigin::New => store
                .local_blob(&descriptor.url)
                .cloned()
                .ok_or_else(|| SourceError::Missing(descriptor.url.clone())),
            ImageOrigin::Existing => self
                .fetcher
                .fetch(&descriptor.url)
                .await
                .map_err(SourceError::Unreadable),
        }
    }
}

enum SourceError {
    Missing(String),
    Unreadable(TransformError),
}

/// Leave exactly one entry flagged primary and return its index.
fn settle_primary(manifest: &mut [ManifestEntry]) -> Option<usize> {
    if manifest.is_empty() {
        return None;
    }
    let primary = manifest.iter().position(|e| e.is_primary).unwrap_or(0);
    for (i, entry) in manifest.iter_mut().enumerate() {
        entry.is_primary = i == primary;
    }
    Some(primary)
}
