use std::time::Duration;

use thiserror::Error;
use vitrina_core::CropRect;

/// Failures while decoding, cropping or re-encoding image data.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The source bytes could not be fetched or decoded into pixels.
    #[error("image source cannot be read back: {0}")]
    UnreadableSource(String),

    #[error("crop {crop:?} lies outside the {width}x{height} source image")]
    EmptyCrop {
        crop: CropRect,
        width: u32,
        height: u32,
    },

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} uploading {key}: {body}")]
    UnexpectedStatus {
        status: u16,
        key: String,
        body: String,
    },

    #[error("invalid storage URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("storage rejected {key}: {reason}")]
    Rejected { key: String, reason: String },
}

/// Failures of a single object transfer.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload of {key} failed: {source}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },

    /// The deadline elapsed first. The transfer itself may still complete.
    #[error("upload of {key} did not finish within {timeout:?}")]
    Timeout { key: String, timeout: Duration },

    #[error("upload task for {key} stopped unexpectedly: {reason}")]
    Interrupted { key: String, reason: String },
}

/// Failure of a whole media materialization pass. Objects uploaded before the
/// failing item stay in storage.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("image {position} of {total} in group '{group}' could not be prepared: {source}")]
    Transform {
        group: String,
        position: usize,
        total: usize,
        #[source]
        source: TransformError,
    },

    #[error("local image {url} is no longer available")]
    MissingLocalBlob { url: String },

    #[error("image {position} of {total} failed to upload: {source}")]
    Upload {
        position: usize,
        total: usize,
        #[source]
        source: UploadError,
    },
}

#[derive(Debug, Error)]
pub enum CoverError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}
