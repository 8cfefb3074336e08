use image::imageops::FilterType;
use vitrina_core::COMPRESS_QUALITY_RANGE;

use crate::blob::ImageBlob;
use crate::error::TransformError;
use crate::transform::{decode, encode_jpeg};

const DEFAULT_MAX_WIDTH: u32 = 1200;
const DEFAULT_QUALITY: u8 = 80;
const DEFAULT_THRESHOLD_BYTES: usize = 200 * 1024;

/// Best-effort size reduction applied before transfer.
///
/// Blobs at or under `threshold_bytes` pass through untouched. Larger blobs are
/// scaled down to at most `max_width` (aspect ratio kept, never upscaled) and
/// re-encoded as JPEG at `quality`. The output is not guaranteed to end up
/// under the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPolicy {
    pub max_width: u32,
    pub quality: u8,
    pub threshold_bytes: usize,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
        }
    }
}

impl CompressionPolicy {
    /// `quality` is clamped to [`COMPRESS_QUALITY_RANGE`] and `max_width` to
    /// at least 1.
    #[must_use]
    pub fn new(max_width: u32, quality: u8, threshold_bytes: usize) -> Self {
        Self {
            max_width: max_width.max(1),
            quality: quality.clamp(
                *COMPRESS_QUALITY_RANGE.start(),
                *COMPRESS_QUALITY_RANGE.end(),
            ),
            threshold_bytes,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &vitrina_core::AppConfig) -> Self {
        Self::new(
            config.compress_max_width,
            config.compress_quality,
            config.compress_threshold_bytes,
        )
    }

    /// Re-encode `blob` if it exceeds the threshold, returning whichever of
    /// the original and the re-encoded image is smaller.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if an oversized blob cannot be decoded or
    /// re-encoded.
    pub fn compress_if_needed(&self, blob: ImageBlob) -> Result<ImageBlob, TransformError> {
        if blob.len() <= self.threshold_bytes {
            return Ok(blob);
        }

        let image = decode(&blob)?;
        let image = if image.width() > self.max_width {
            let height = scaled_height(image.width(), image.height(), self.max_width);
            image.resize_exact(self.max_width, height, FilterType::Lanczos3)
        } else {
            image
        };

        let encoded = encode_jpeg(&image, self.quality)?;
        if encoded.len() < blob.len() {
            tracing::debug!(
                before = blob.len(),
                after = encoded.len(),
                "compressed oversized image"
            );
            Ok(encoded)
        } else {
            tracing::debug!(
                before = blob.len(),
                after = encoded.len(),
                "re-encoding did not shrink image; keeping original"
            );
            Ok(blob)
        }
    }
}

/// Height that keeps the aspect ratio at `target_width`, rounded, at least 1.
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let w = u64::from(width.max(1));
    let scaled = (u64::from(height) * u64::from(target_width) + w / 2) / w;
    u32::try_from(scaled.max(1)).unwrap_or(u32::MAX)
}
