//! Encoded image bytes and the registry of session-local blob URLs.

use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

const LOCAL_URL_PREFIX: &str = "blob:vitrina/";

/// Encoded image data together with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    bytes: Bytes,
    content_type: String,
}

impl ImageBlob {
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    #[must_use]
    pub fn jpeg(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, JPEG_CONTENT_TYPE)
    }

    /// Wrap raw bytes, sniffing the MIME type from the image header.
    #[must_use]
    pub fn sniffed(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let content_type = image::guess_format(&bytes)
            .map_or("application/octet-stream", |f| f.to_mime_type());
        Self::new(bytes, content_type)
    }

    /// Read an image file from disk.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be read.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        Ok(Self::sniffed(std::fs::read(path)?))
    }

    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension matching the content type, `jpg` when unknown.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

/// Session-scoped blob URLs for images chosen locally.
///
/// Every URL handed out by [`LocalBlobs::create`] pins its bytes in memory
/// until revoked.
#[derive(Debug, Default)]
pub struct LocalBlobs {
    next_id: u64,
    blobs: HashMap<String, ImageBlob>,
}

impl LocalBlobs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_local(url: &str) -> bool {
        url.starts_with(LOCAL_URL_PREFIX)
    }

    pub fn create(&mut self, blob: ImageBlob) -> String {
        self.next_id += 1;
        let url = format!("{LOCAL_URL_PREFIX}{}", self.next_id);
        self.blobs.insert(url.clone(), blob);
        url
    }

    #[must_use]
    pub fn resolve(&self, url: &str) -> Option<&ImageBlob> {
        self.blobs.get(url)
    }

    /// Release the bytes behind `url`. Returns `false` if it was not live.
    pub fn revoke(&mut self, url: &str) -> bool {
        self.blobs.remove(url).is_some()
    }

    /// Release everything; returns how many URLs were live.
    pub fn revoke_all(&mut self) -> usize {
        let count = self.blobs.len();
        self.blobs.clear();
        count
    }

    #[must_use]
    pub fn live(&self) -> usize {
        self.blobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_resolve_revoke() {
        let mut blobs = LocalBlobs::new();
        let a = blobs.create(ImageBlob::jpeg(vec![1, 2, 3]));
        let b = blobs.create(ImageBlob::jpeg(vec![4]));

        assert_ne!(a, b);
        assert!(LocalBlobs::is_local(&a));
        assert_eq!(blobs.resolve(&a).map(ImageBlob::len), Some(3));
        assert_eq!(blobs.live(), 2);

        assert!(blobs.revoke(&a));
        assert!(!blobs.revoke(&a));
        assert!(blobs.resolve(&a).is_none());
        assert_eq!(blobs.revoke_all(), 1);
        assert_eq!(blobs.live(), 0);
    }

    #[test]
    fn remote_urls_are_not_local() {
        assert!(!LocalBlobs::is_local("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn sniffs_png_header() {
        let png_header = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let blob = ImageBlob::sniffed(png_header);
        assert_eq!(blob.content_type(), "image/png");
        assert_eq!(blob.extension(), "png");
    }

    #[test]
    fn unknown_bytes_fall_back_to_octet_stream() {
        let blob = ImageBlob::sniffed(vec![0u8; 16]);
        assert_eq!(blob.content_type(), "application/octet-stream");
        assert_eq!(blob.extension(), "jpg");
    }
}
