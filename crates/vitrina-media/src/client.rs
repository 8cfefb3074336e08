use std::fmt;
use std::time::Duration;

use reqwest::{Client, Url};
use vitrina_core::AppConfig;

use crate::blob::ImageBlob;
use crate::error::{StorageError, TransformError};
use crate::storage::{RemoteFetcher, Storage, UploadOptions};

/// HTTP client for a hosted object-storage REST API.
///
/// Objects are written with `POST {base}/storage/v1/object/{bucket}/{key}` and
/// served from `{base}/storage/v1/object/public/{bucket}/{key}`. Failed
/// uploads are reported as typed errors and never retried.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base: Url,
    bucket: String,
    api_key: String,
}

impl fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageClient")
            .field("base", &self.base.as_str())
            .field("bucket", &self.bucket)
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    /// Creates a `StorageClient` bound to one bucket.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidBaseUrl`] if `base_url` is not an absolute
    ///   http(s) URL.
    /// - [`StorageError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        base_url: &str,
        bucket: &str,
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, StorageError> {
        let base = parse_base(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base,
            bucket: bucket.to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    /// Client for the product-image bucket named in `config`.
    ///
    /// # Errors
    ///
    /// See [`StorageClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, StorageError> {
        Self::new(
            &config.storage_url,
            &config.storage_bucket,
            &config.storage_key,
            config.storage_timeout_secs,
            &config.storage_user_agent,
        )
    }

    /// Same connection and credentials, different bucket.
    #[must_use]
    pub fn for_bucket(&self, bucket: &str) -> Self {
        Self {
            bucket: bucket.to_owned(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `{base}/storage/v1/object/{scope..}/{bucket}/{key}`, each key segment
    /// percent-encoded.
    fn object_url(&self, scope: &[&str], key: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "object"])
                .extend(scope)
                .push(&self.bucket)
                .extend(key.split('/').filter(|s| !s.is_empty()));
        }
        url
    }
}

fn parse_base(base_url: &str) -> Result<Url, StorageError> {
    let invalid = |reason: String| StorageError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason,
    };
    let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }
    Ok(url)
}

impl Storage for StorageClient {
    async fn upload(
        &self,
        key: &str,
        blob: &ImageBlob,
        options: &UploadOptions,
    ) -> Result<String, StorageError> {
        let rejected = |reason: &str| StorageError::Rejected {
            key: key.to_owned(),
            reason: reason.to_owned(),
        };
        if key.trim_matches('/').is_empty() {
            return Err(rejected("empty object key"));
        }
        if blob.is_empty() {
            return Err(rejected("empty body"));
        }

        let url = self.object_url(&[], key);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header(reqwest::header::CACHE_CONTROL, &options.cache_control)
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .header(reqwest::header::CONTENT_TYPE, options.content_type_for(blob))
            .body(blob.bytes().clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UnexpectedStatus {
                status: status.as_u16(),
                key: key.to_owned(),
                body,
            });
        }

        tracing::debug!(key, bytes = blob.len(), bucket = %self.bucket, "object stored");
        Ok(key.to_owned())
    }

    fn public_url(&self, storage_path: &str) -> String {
        self.object_url(&["public"], storage_path).to_string()
    }
}

impl RemoteFetcher for StorageClient {
    async fn fetch(&self, url: &str) -> Result<ImageBlob, TransformError> {
        let unreadable = |reason: String| TransformError::UnreadableSource(format!("{url}: {reason}"));
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unreadable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unreadable(format!("HTTP {}", status.as_u16())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| unreadable(e.to_string()))?;
        Ok(ImageBlob::sniffed(bytes))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
