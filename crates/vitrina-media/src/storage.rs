//! Storage collaborator interfaces and object-key layout.

use std::future::Future;

use vitrina_core::{slugify, VariantGroupKey};

use crate::blob::ImageBlob;
use crate::error::{StorageError, TransformError};

/// Per-upload options forwarded to the storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Value for the `cache-control` header, e.g. `"max-age=3600"`.
    pub cache_control: String,
    /// Overwrite an existing object at the same key.
    pub upsert: bool,
    /// Overrides the blob's own content type when set.
    pub content_type: Option<String>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::with_cache_secs(3600)
    }
}

impl UploadOptions {
    #[must_use]
    pub fn with_cache_secs(secs: u64) -> Self {
        Self {
            cache_control: format!("max-age={secs}"),
            upsert: false,
            content_type: None,
        }
    }

    #[must_use]
    pub fn content_type_for<'a>(&'a self, blob: &'a ImageBlob) -> &'a str {
        self.content_type.as_deref().unwrap_or(blob.content_type())
    }
}

/// Object storage that images are uploaded to.
pub trait Storage: Send + Sync {
    /// Store `blob` at `key` and return the storage path it was written to.
    fn upload(
        &self,
        key: &str,
        blob: &ImageBlob,
        options: &UploadOptions,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;

    /// Public URL of an object previously written with [`Storage::upload`].
    fn public_url(&self, storage_path: &str) -> String;
}

impl<S: Storage> Storage for &S {
    fn upload(
        &self,
        key: &str,
        blob: &ImageBlob,
        options: &UploadOptions,
    ) -> impl Future<Output = Result<String, StorageError>> + Send {
        (**self).upload(key, blob, options)
    }

    fn public_url(&self, storage_path: &str) -> String {
        (**self).public_url(storage_path)
    }
}

/// Reads back the pixels of an image that already lives at a remote URL.
pub trait RemoteFetcher: Send + Sync {
    /// # Errors
    ///
    /// Any failure to obtain readable bytes is
    /// [`TransformError::UnreadableSource`].
    fn fetch(&self, url: &str) -> impl Future<Output = Result<ImageBlob, TransformError>> + Send;
}

impl<F: RemoteFetcher> RemoteFetcher for &F {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<ImageBlob, TransformError>> + Send {
        (**self).fetch(url)
    }
}

/// Object key for one product image: `{slug}/{group}-{timestamp}-{position}.{ext}`.
///
/// `position` is the image's place in the whole manifest, not within its
/// group, so groups whose names slugify alike still get distinct keys. The
/// timestamp keeps keys from colliding with earlier attempts.
#[must_use]
pub fn storage_key(
    slug: &str,
    group: &VariantGroupKey,
    timestamp_ms: i64,
    position: usize,
    extension: &str,
) -> String {
    format!(
        "{slug}/{}-{timestamp_ms}-{position}.{extension}",
        group_segment(group)
    )
}

/// Object key for a collection cover: `{collection}/cover-{timestamp}.{ext}`.
#[must_use]
pub fn cover_key(collection_slug: &str, timestamp_ms: i64, extension: &str) -> String {
    format!("{collection_slug}/cover-{timestamp_ms}.{extension}")
}

fn group_segment(group: &VariantGroupKey) -> String {
    match group {
        VariantGroupKey::Default => VariantGroupKey::DEFAULT_NAME.to_string(),
        VariantGroupKey::Color(name) => {
            let slug = slugify(name);
            if slug.is_empty() {
                "color".to_string()
            } else {
                slug
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_layout() {
        let key = storage_key(
            "anillo-solitario",
            &VariantGroupKey::color("Oro Rosa"),
            1_700_000_000_123,
            2,
            "jpg",
        );
        assert_eq!(key, "anillo-solitario/oro-rosa-1700000000123-2.jpg");
    }

    #[test]
    fn default_group_and_non_ascii_colors() {
        assert_eq!(
            storage_key("dije", &VariantGroupKey::Default, 5, 0, "png"),
            "dije/default-5-0.png"
        );
        assert_eq!(
            storage_key("dije", &VariantGroupKey::color("Ñandú"), 5, 0, "jpg"),
            "dije/nandu-5-0.jpg"
        );
        assert_eq!(
            storage_key("dije", &VariantGroupKey::color("翡翠"), 5, 1, "jpg"),
            "dije/color-5-1.jpg"
        );
    }

    #[test]
    fn cover_key_layout() {
        assert_eq!(cover_key("novias", 42, "jpg"), "novias/cover-42.jpg");
    }

    #[test]
    fn options_default_and_override() {
        let blob = ImageBlob::new(vec![1], "image/png");
        let mut options = UploadOptions::default();
        assert_eq!(options.cache_control, "max-age=3600");
        assert!(!options.upsert);
        assert_eq!(options.content_type_for(&blob), "image/png");
        options.content_type = Some("image/jpeg".to_string());
        assert_eq!(options.content_type_for(&blob), "image/jpeg");
    }
}
